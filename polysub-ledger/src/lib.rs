pub mod backend;
pub mod error;
pub mod memory;
pub mod types;

pub use backend::QuotaLedgerBackend;
pub use error::{LedgerError, LedgerResult};
pub use memory::MemoryLedger;
pub use types::{LedgerKey, MonthKey, Reservation, ReservationState, UsageLedgerRow};
