use std::sync::Arc;

use polysub_blob::{BlobAdapter, BlobConfig, MemoryBlobStore};
use polysub_cleaner::{Cleaner, CleanerConfig};
use polysub_core::PipelineConfig;
use polysub_ledger::MemoryLedger;
use polysub_pipeline::{DriverConfig, MemoryJobRepository, PipelineDriver};
use polysub_queue::{ConcurrencyLimits, PriorityQueue, Scheduler, SchedulerConfig};
use polysub_subtitle::SubtitleEmitter;
use polysub_translate::{FacadeConfig, HttpTranslationProvider, TranslatorFacade};

use crate::collaborators::{CommandLineTranscriber, FfmpegExtractor};

/// Everything a running process needs, constructed once from environment
/// configuration: storage backends wired up before being handed to
/// adapters.
pub struct Wiring {
    pub scheduler: Scheduler<PipelineDriver>,
    pub cleaner: Cleaner,
}

pub fn build(config: &PipelineConfig) -> Wiring {
    let repository = Arc::new(MemoryJobRepository::new());
    let ledger = Arc::new(MemoryLedger::new());
    let blobs = Arc::new(BlobAdapter::new(
        MemoryBlobStore::new(),
        BlobConfig::default().with_artifact_ttl_hours(config.artifact_ttl_hours),
    ));
    let queue = Arc::new(PriorityQueue::new());

    let extractor = Arc::new(FfmpegExtractor::new("ffprobe", "ffmpeg", std::env::temp_dir().join("polysub-audio")));
    let transcriber = Arc::new(CommandLineTranscriber::new(
        "whisper",
        config.whisper_model_free.clone(),
        config.whisper_model_paid.clone(),
    ));

    let translator = if let Ok(api_key) = std::env::var("TRANSLATION_API_KEY") {
        let endpoint = std::env::var("TRANSLATION_ENDPOINT").unwrap_or_else(|_| "http://localhost:8090".to_string());
        let facade = TranslatorFacade::new(FacadeConfig::default()).with_provider(
            "primary",
            HttpTranslationProvider::new(endpoint, config.translation_model_paid.clone(), api_key),
            1000,
        );
        Some(Arc::new(facade))
    } else {
        None
    };

    let driver = PipelineDriver::new(
        repository.clone() as Arc<dyn polysub_pipeline::JobRepository>,
        ledger.clone() as Arc<dyn polysub_ledger::QuotaLedgerBackend>,
        blobs.clone(),
        extractor,
        transcriber,
        translator,
        SubtitleEmitter::default(),
        DriverConfig::default(),
    );

    let scheduler = Scheduler::new(
        queue.clone(),
        driver,
        SchedulerConfig {
            worker_count: 4,
            empty_poll_interval: std::time::Duration::from_millis(100),
            limits: ConcurrencyLimits {
                priority: config.concurrency_priority,
                paid: config.concurrency_paid,
                free: config.concurrency_free,
            },
        },
    );

    let cleaner = Cleaner::new(blobs, repository as Arc<dyn polysub_pipeline::JobRepository>, CleanerConfig::default());

    Wiring { scheduler, cleaner }
}
