use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Language-neutral error taxonomy. This is the type the Pipeline
/// Driver folds every collaborator failure into before writing a job's
/// terminal `failed` state.
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum PipelineErrorKind {
    #[error("malformed input")]
    BadInput,

    #[error("unauthorized")]
    Unauthorized,

    #[error("forbidden")]
    Forbidden,

    #[error("not found")]
    NotFound,

    #[error("quota exceeded")]
    QuotaExceeded,

    #[error("rate limited, reset in {reset_in_secs}s")]
    RateLimited { reset_in_secs: u64 },

    #[error("ingest failed")]
    IngestFailed,

    #[error("audio extraction failed")]
    ExtractionFailed,

    #[error("transcription failed")]
    TranscriptionFailed,

    #[error("translation failed")]
    TranslationFailed,

    #[error("artifact emission failed")]
    EmitFailed,

    #[error("stage timed out")]
    Timeout,

    #[error("cancelled")]
    Cancelled,

    #[error("internal error")]
    Internal,
}

impl PipelineErrorKind {
    /// Whether a stage failure of this kind may be retried.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            PipelineErrorKind::IngestFailed
                | PipelineErrorKind::ExtractionFailed
                | PipelineErrorKind::TranscriptionFailed
                | PipelineErrorKind::TranslationFailed
                | PipelineErrorKind::EmitFailed
                | PipelineErrorKind::Internal
        )
    }

    /// HTTP status this error kind is surfaced under, kept here
    /// purely as documentation for the (out-of-scope) ingress layer.
    pub fn http_status(&self) -> u16 {
        match self {
            PipelineErrorKind::BadInput => 400,
            PipelineErrorKind::Unauthorized => 401,
            PipelineErrorKind::Forbidden => 403,
            PipelineErrorKind::NotFound => 404,
            PipelineErrorKind::QuotaExceeded => 402,
            PipelineErrorKind::RateLimited { .. } => 429,
            PipelineErrorKind::Internal => 500,
            _ => 500,
        }
    }
}

/// A terminal job error: kind plus a human-readable message.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JobErrorDescriptor {
    pub kind: PipelineErrorKind,
    pub message: String,
}

impl JobErrorDescriptor {
    pub fn new(kind: PipelineErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for JobErrorDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retryable_kinds_match_spec_retry_policy() {
        assert!(PipelineErrorKind::TranscriptionFailed.is_retryable());
        assert!(!PipelineErrorKind::QuotaExceeded.is_retryable());
        assert!(!PipelineErrorKind::BadInput.is_retryable());
    }
}
