use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, instrument, warn};

use polysub_blob::{BlobAdapter, BlobKind};
use polysub_core::{seconds_to_minutes_ceil, JobId, PipelineErrorKind, ReservationId};
use polysub_ledger::{MonthKey, QuotaLedgerBackend, ReservationState};
use polysub_queue::{HandlerOutcome, JobDescriptor, JobHandler};
use polysub_subtitle::{Segment, SubtitleEmitter};
use polysub_translate::TranslatorFacade;

use crate::collaborators::{AudioExtractor, Transcriber};
use crate::config::{DriverConfig, QuotaOverrunPolicy};
use crate::error::StageError;
use crate::merge::merge_consecutive_segments;
use crate::repository::JobRepository;
use crate::types::{ArtifactSlot, JobRecord, JobStatus};

/// Walks a dequeued job through its status state machine, delegating to the
/// audio extractor, transcriber, translator facade and subtitle emitter,
/// and folding every collaborator failure into the job's terminal state.
pub struct PipelineDriver {
    repository: Arc<dyn JobRepository>,
    ledger: Arc<dyn QuotaLedgerBackend>,
    blobs: Arc<BlobAdapter>,
    extractor: Arc<dyn AudioExtractor>,
    transcriber: Arc<dyn Transcriber>,
    translator: Option<Arc<TranslatorFacade>>,
    emitter: SubtitleEmitter,
    config: DriverConfig,
}

enum DriveOutcome {
    Completed,
    Cancelled,
    Failed,
}

impl PipelineDriver {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        repository: Arc<dyn JobRepository>,
        ledger: Arc<dyn QuotaLedgerBackend>,
        blobs: Arc<BlobAdapter>,
        extractor: Arc<dyn AudioExtractor>,
        transcriber: Arc<dyn Transcriber>,
        translator: Option<Arc<TranslatorFacade>>,
        emitter: SubtitleEmitter,
        config: DriverConfig,
    ) -> Self {
        Self {
            repository,
            ledger,
            blobs,
            extractor,
            transcriber,
            translator,
            emitter,
            config,
        }
    }

    async fn with_retry<F, Fut, T>(&self, cancel: &CancellationToken, timeout: std::time::Duration, make_attempt: F) -> Result<T, StageError>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, StageError>>,
    {
        let mut attempt: u32 = 0;
        loop {
            let outcome = tokio::select! {
                res = tokio::time::timeout(timeout, make_attempt()) => {
                    res.unwrap_or_else(|_| Err(StageError::Fatal(PipelineErrorKind::Timeout, "stage timed out".to_string())))
                }
                _ = cancel.cancelled() => return Err(StageError::Fatal(PipelineErrorKind::Cancelled, "job cancelled".to_string())),
            };

            match outcome {
                Ok(value) => return Ok(value),
                Err(StageError::Transient(reason)) => {
                    attempt += 1;
                    if attempt >= self.config.retry.max_attempts {
                        return Err(StageError::Transient(reason));
                    }
                    let backoff = self.config.retry.base_backoff * 2u32.pow(attempt);
                    tokio::time::sleep(backoff).await;
                }
                Err(fatal) => return Err(fatal),
            }
        }
    }

    async fn fail(&self, job_id: &JobId, expected_version: u64, reservation_id: &ReservationId, kind: PipelineErrorKind, message: impl Into<String>) {
        let message = message.into();
        warn!(%job_id, %kind, %message, "job failed");
        if let Err(err) = self
            .repository
            .update_status(job_id, expected_version, JobStatus::Failed { kind, message: message.clone(), failed_at: Utc::now() })
            .await
        {
            error!(%job_id, %err, "failed to record terminal failure status");
        }
        if let Err(err) = self.ledger.release(reservation_id).await {
            error!(%job_id, %err, "failed to release reservation on job failure");
        }
    }

    async fn cancel(&self, job_id: &JobId, expected_version: u64, reservation_id: &ReservationId) {
        let _ = self
            .repository
            .update_status(job_id, expected_version, JobStatus::Cancelled { cancelled_at: Utc::now() })
            .await;
        let _ = self.ledger.release(reservation_id).await;
    }

    async fn fail_from_stage_error(
        &self,
        job_id: &JobId,
        expected_version: u64,
        reservation_id: &ReservationId,
        default_kind: PipelineErrorKind,
        err: StageError,
    ) -> DriveOutcome {
        let (kind, message) = match err {
            StageError::Fatal(kind, msg) => (kind, msg),
            StageError::Transient(msg) => (default_kind, msg),
        };
        if kind == PipelineErrorKind::Cancelled {
            self.cancel(job_id, expected_version, reservation_id).await;
            DriveOutcome::Cancelled
        } else {
            self.fail(job_id, expected_version, reservation_id, kind, message).await;
            DriveOutcome::Failed
        }
    }

    /// Transitions to `target` if the DAG still allows it from the record's
    /// current status, otherwise leaves the record untouched. Lets `drive`
    /// resume a crashed job from whatever status the repository persisted
    /// instead of forcing every dequeue back through `Processing`.
    async fn advance(&self, job_id: &JobId, record: JobRecord, target: JobStatus) -> Result<JobRecord, DriveOutcome> {
        if !record.status.allows_transition_to(&target) {
            return Ok(record);
        }
        match self.repository.update_status(job_id, record.version, target).await {
            Ok(updated) => Ok(updated),
            Err(err) => {
                error!(%job_id, %err, "could not advance job status");
                Err(DriveOutcome::Failed)
            }
        }
    }

    async fn write_scratch(&self, job_id: &JobId, filename: &str, content: &str) -> std::io::Result<std::path::PathBuf> {
        let dir = self.config.scratch_dir.join(job_id.as_str());
        tokio::fs::create_dir_all(&dir).await?;
        let path = dir.join(filename);
        tokio::fs::write(&path, content.as_bytes()).await?;
        Ok(path)
    }

    #[instrument(skip(self, desc, cancel), fields(job_id = %desc.job_id))]
    async fn drive(&self, desc: &JobDescriptor, cancel: CancellationToken) -> DriveOutcome {
        let job_id = &desc.job_id;

        let record = match self.repository.get(job_id).await {
            Ok(record) => record,
            Err(err) => {
                error!(%job_id, %err, "job record missing at dequeue");
                return DriveOutcome::Failed;
            }
        };

        // A job can be redelivered after a crash with any non-terminal status
        // already persisted; resume from there instead of forcing `queued`'s
        // transition to `processing` onto a job already past it.
        if record.status.is_terminal() {
            warn!(%job_id, status = ?record.status, "dequeued job already in a terminal status, skipping");
            return match record.status {
                JobStatus::Completed { .. } => DriveOutcome::Completed,
                JobStatus::Cancelled { .. } => DriveOutcome::Cancelled,
                _ => DriveOutcome::Failed,
            };
        }

        let reservation = match self.ledger.get_reservation(&desc.reservation_id).await {
            Some(reservation) if reservation.state == ReservationState::Held => reservation,
            _ => {
                self.fail(job_id, record.version, &desc.reservation_id, PipelineErrorKind::IngestFailed, "reservation no longer held").await;
                return DriveOutcome::Failed;
            }
        };

        if cancel.is_cancelled() {
            self.cancel(job_id, record.version, &desc.reservation_id).await;
            return DriveOutcome::Cancelled;
        }

        // processing: mark started_at, no-op if the job already passed this.
        let record = match self.advance(job_id, record, JobStatus::Processing).await {
            Ok(record) => record,
            Err(outcome) => return outcome,
        };

        // extracting: re-extraction is idempotent, so this always runs even
        // when resuming a job that already passed this checkpoint, since the
        // extracted audio itself isn't persisted anywhere the later stages
        // could pick it back up from.
        let record = match self.advance(job_id, record, JobStatus::Extracting).await {
            Ok(record) => record,
            Err(outcome) => return outcome,
        };

        let source_handle = record.source_handle.clone();
        let extracted = match self
            .with_retry(&cancel, self.config.timeouts.extract, || self.extractor.extract(&source_handle, cancel.clone()))
            .await
        {
            Ok(extracted) => extracted,
            Err(err) => return self.fail_from_stage_error(job_id, record.version, &desc.reservation_id, PipelineErrorKind::ExtractionFailed, err).await,
        };

        let record = match self.repository.set_duration_seconds(job_id, record.version, extracted.duration_seconds).await {
            Ok(record) => record,
            Err(err) => {
                error!(%job_id, %err, "could not record probed duration");
                return DriveOutcome::Failed;
            }
        };

        let probed_minutes = seconds_to_minutes_ceil(extracted.duration_seconds);
        if probed_minutes > reservation.amount_minutes {
            match self.config.quota_overrun {
                QuotaOverrunPolicy::Fail => {
                    self.fail(job_id, record.version, &desc.reservation_id, PipelineErrorKind::QuotaExceeded, "probed duration exceeds reserved minutes").await;
                    return DriveOutcome::Failed;
                }
                QuotaOverrunPolicy::TopUp => {
                    let extra = probed_minutes - reservation.amount_minutes;
                    let month = MonthKey::from_datetime(reservation.created_at);
                    if let Err(err) = self
                        .ledger
                        .reserve(record.tenant_id.clone(), month, extra, self.config.default_limit_minutes, record.translate)
                        .await
                    {
                        self.fail(job_id, record.version, &desc.reservation_id, PipelineErrorKind::QuotaExceeded, err.to_string()).await;
                        return DriveOutcome::Failed;
                    }
                }
            }
        }

        // transcribing: the transcript segments aren't persisted either, so
        // this re-runs on resume the same way extraction does.
        let record = match self.advance(job_id, record, JobStatus::Transcribing).await {
            Ok(record) => record,
            Err(outcome) => return outcome,
        };

        let model_tier = record.plan.name().to_string();
        let audio_path = extracted.local_path.clone();
        let source_language = record.source_language.clone();
        let transcription = match self
            .with_retry(&cancel, self.config.timeouts.transcribe, || {
                self.transcriber.transcribe(&audio_path, source_language.as_deref(), &model_tier, cancel.clone())
            })
            .await
        {
            Ok(output) => output,
            Err(err) => return self.fail_from_stage_error(job_id, record.version, &desc.reservation_id, PipelineErrorKind::TranscriptionFailed, err).await,
        };

        let segments = merge_consecutive_segments(transcription.segments);

        let record = match self
            .repository
            .set_detected_language(job_id, record.version, transcription.detected_language.clone())
            .await
        {
            Ok(record) => record,
            Err(err) => {
                error!(%job_id, %err, "could not record detected language");
                return DriveOutcome::Failed;
            }
        };

        let needs_translation = record.translate
            && record
                .target_language
                .as_deref()
                .map(|target| target != transcription.detected_language)
                .unwrap_or(false);

        let (record, translated_segments) = if needs_translation {
            let record = match self.advance(job_id, record, JobStatus::Translating).await {
                Ok(record) => record,
                Err(outcome) => return outcome,
            };

            let Some(translator) = &self.translator else {
                self.fail(job_id, record.version, &desc.reservation_id, PipelineErrorKind::TranslationFailed, "no translator configured").await;
                return DriveOutcome::Failed;
            };

            let target = record.target_language.clone().unwrap_or_default();
            let translate_result = tokio::select! {
                res = tokio::time::timeout(self.config.timeouts.translate, translator.translate(&segments, &transcription.detected_language, &target)) => {
                    res.map_err(|_| "translation stage timed out".to_string()).and_then(|inner| inner.map_err(|e| e.to_string()))
                }
                _ = cancel.cancelled() => Err("job cancelled".to_string()),
            };
            match translate_result {
                Ok(translated) => (record, Some(translated)),
                Err(message) => {
                    self.fail(job_id, record.version, &desc.reservation_id, PipelineErrorKind::TranslationFailed, message).await;
                    return DriveOutcome::Failed;
                }
            }
        } else {
            (record, None)
        };

        // emitting: already-uploaded artifact slots (e.g. a crash after the
        // srt upload but before the vtt) are skipped inside emit_and_upload
        // rather than re-written.
        let record = match self.advance(job_id, record, JobStatus::Emitting).await {
            Ok(record) => record,
            Err(outcome) => return outcome,
        };

        let mut record = record;
        let emit_result = tokio::time::timeout(
            self.config.timeouts.emit,
            self.emit_and_upload(job_id, &record, &segments, translated_segments.as_deref()),
        )
        .await;
        match emit_result {
            Ok(Ok(updated)) => record = updated,
            Ok(Err(err)) => {
                self.fail(job_id, record.version, &desc.reservation_id, PipelineErrorKind::EmitFailed, err.to_string()).await;
                return DriveOutcome::Failed;
            }
            Err(_) => {
                self.fail(job_id, record.version, &desc.reservation_id, PipelineErrorKind::Timeout, "emit stage timed out").await;
                return DriveOutcome::Failed;
            }
        }

        if let Err(err) = self
            .repository
            .update_status(job_id, record.version, JobStatus::Completed { completed_at: Utc::now() })
            .await
        {
            error!(%job_id, %err, "could not record completion");
            return DriveOutcome::Failed;
        }

        if let Err(err) = self.ledger.commit(&desc.reservation_id).await {
            error!(%job_id, %err, "could not commit reservation on completion");
        }

        info!(%job_id, "job completed");
        DriveOutcome::Completed
    }

    async fn emit_and_upload(
        &self,
        job_id: &JobId,
        record: &JobRecord,
        original_segments: &[Segment],
        translated_segments: Option<&[Segment]>,
    ) -> Result<JobRecord, Box<dyn std::error::Error + Send + Sync>> {
        let mut record = record.clone();

        let original = self.emitter.emit(original_segments)?;
        if record.artifacts.srt.is_none() {
            record = self.upload_artifact(job_id, &record, ArtifactSlot::Srt, "original.srt", &original.srt, BlobKind::SubtitlesSrt).await?;
        }
        if record.artifacts.vtt.is_none() {
            record = self.upload_artifact(job_id, &record, ArtifactSlot::Vtt, "original.vtt", &original.vtt, BlobKind::SubtitlesVtt).await?;
        }
        if record.artifacts.json.is_none() {
            record = self.upload_artifact(job_id, &record, ArtifactSlot::Json, "original.json", &original.json, BlobKind::SubtitlesJson).await?;
        }

        if let Some(translated_segments) = translated_segments {
            let translated = self.emitter.emit(translated_segments)?;
            if record.artifacts.srt_t.is_none() {
                record = self.upload_artifact(job_id, &record, ArtifactSlot::SrtTranslated, "translated.srt", &translated.srt, BlobKind::SubtitlesSrt).await?;
            }
            if record.artifacts.vtt_t.is_none() {
                record = self.upload_artifact(job_id, &record, ArtifactSlot::VttTranslated, "translated.vtt", &translated.vtt, BlobKind::SubtitlesVtt).await?;
            }
        }

        Ok(record)
    }

    async fn upload_artifact(
        &self,
        job_id: &JobId,
        record: &JobRecord,
        slot: ArtifactSlot,
        filename: &str,
        content: &str,
        kind: BlobKind,
    ) -> Result<JobRecord, Box<dyn std::error::Error + Send + Sync>> {
        let path = self.write_scratch(job_id, filename, content).await?;
        let receipt = self.blobs.put(&path, &record.tenant_id, kind, Some("text/plain")).await?;
        tokio::fs::remove_file(&path).await.ok();
        let updated = self.repository.set_artifact(job_id, record.version, slot, receipt.key).await?;
        Ok(updated)
    }
}

#[async_trait]
impl JobHandler for PipelineDriver {
    async fn run(&self, desc: JobDescriptor, cancel: CancellationToken) -> HandlerOutcome {
        match self.drive(&desc, cancel).await {
            DriveOutcome::Completed => HandlerOutcome::Completed,
            DriveOutcome::Cancelled => HandlerOutcome::Cancelled,
            DriveOutcome::Failed => HandlerOutcome::Failed,
        }
    }
}
