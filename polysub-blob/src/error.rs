use thiserror::Error;

pub type BlobResult<T> = Result<T, BlobError>;

/// Errors raised by the blob store adapter.
#[derive(Error, Debug)]
pub enum BlobError {
    #[error("blob not found: {0}")]
    NotFound(String),

    #[error("invalid request: {0}")]
    Invalid(String),

    #[error("storage backend error: {source}")]
    Backend {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
}

impl BlobError {
    pub fn backend<E>(error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Backend {
            source: Box::new(error),
        }
    }

    pub fn not_found<S: Into<String>>(key: S) -> Self {
        Self::NotFound(key.into())
    }

    pub fn invalid<S: Into<String>>(message: S) -> Self {
        Self::Invalid(message.into())
    }
}
