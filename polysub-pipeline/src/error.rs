use thiserror::Error;

/// Failures from the job repository's CAS-guarded updates.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RepositoryError {
    #[error("job not found")]
    NotFound,

    #[error("version conflict: expected {expected}, found {actual}")]
    VersionConflict { expected: u64, actual: u64 },

    #[error("illegal status transition")]
    IllegalTransition,
}

pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// What a collaborator (extractor, transcriber) reports back.
#[derive(Debug, Clone)]
pub enum StageError {
    /// Network timeout, provider 5xx: eligible for backoff retry.
    Transient(String),
    /// Auth denial, quota, malformed media: fails the job immediately.
    Fatal(polysub_core::PipelineErrorKind, String),
}

impl std::fmt::Display for StageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StageError::Transient(msg) => write!(f, "transient stage error: {msg}"),
            StageError::Fatal(kind, msg) => write!(f, "fatal stage error ({kind}): {msg}"),
        }
    }
}
