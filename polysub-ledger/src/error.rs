use thiserror::Error;

pub type LedgerResult<T> = Result<T, LedgerError>;

/// Errors raised by the quota ledger.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LedgerError {
    #[error("insufficient credits: requested {requested}, remaining {remaining}")]
    InsufficientCredits { requested: u64, remaining: u64 },

    #[error("reservation not found: {0}")]
    ReservationNotFound(String),

    #[error("reservation already resolved: {0}")]
    AlreadyResolved(String),
}
