//! polysub-core: shared identifiers, error taxonomy, plan/tenant types,
//! configuration and tracing bootstrap for the polysub pipeline engine.

pub mod config;
pub mod error;
pub mod ids;
pub mod plan;
pub mod time;
pub mod tracing_init;

pub use config::PipelineConfig;
pub use error::{JobErrorDescriptor, PipelineErrorKind};
pub use ids::{BlobKey, JobId, ReservationId, TenantId};
pub use plan::{JobClass, Plan};
pub use time::seconds_to_minutes_ceil;
pub use tracing_init::init_tracing;
