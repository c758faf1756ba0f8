use thiserror::Error;

pub type TranslateResult<T> = Result<T, TranslateError>;

/// Errors surfaced by the translator facade.
#[derive(Error, Debug)]
pub enum TranslateError {
    #[error("no translation providers configured")]
    NoProviders,

    #[error("all providers exhausted or failing")]
    AllProvidersExhausted,
}

/// What a single provider call reports.
#[derive(Debug, Clone)]
pub enum ProviderError {
    /// Provider-reported rate/quota exhaustion; saturate and fail over.
    RateLimited,
    /// Any other failure (network, 5xx, malformed response).
    Hard(String),
}

impl std::fmt::Display for ProviderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProviderError::RateLimited => write!(f, "provider rate limited"),
            ProviderError::Hard(msg) => write!(f, "provider error: {msg}"),
        }
    }
}
