use std::path::PathBuf;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use polysub_subtitle::Segment;

use crate::error::StageError;

/// What the extraction stage hands to transcription.
#[derive(Debug, Clone)]
pub struct ExtractedAudio {
    pub local_path: PathBuf,
    pub duration_seconds: u64,
}

/// Probes and extracts a mono 16 kHz audio stream from a job's source
/// handle. An external collaborator the driver depends on through a trait
/// object, not a concrete engine.
#[async_trait]
pub trait AudioExtractor: Send + Sync {
    async fn extract(&self, source_handle: &str, cancel: CancellationToken) -> Result<ExtractedAudio, StageError>;
}

/// Transcription result: detected language plus ordered segments.
#[derive(Debug, Clone)]
pub struct TranscriptionOutput {
    pub detected_language: String,
    pub segments: Vec<Segment>,
}

/// Speech-to-segments engine. An external collaborator, swappable
/// per deployment.
#[async_trait]
pub trait Transcriber: Send + Sync {
    async fn transcribe(
        &self,
        audio_path: &std::path::Path,
        source_language: Option<&str>,
        model_tier: &str,
        cancel: CancellationToken,
    ) -> Result<TranscriptionOutput, StageError>;
}
