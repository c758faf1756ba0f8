pub mod error;
pub mod priority_queue;
pub mod scheduler;
pub mod types;

pub use error::{QueueError, QueueResult};
pub use priority_queue::PriorityQueue;
pub use scheduler::{ConcurrencyLimits, HandlerOutcome, JobHandler, Scheduler, SchedulerConfig};
pub use types::{JobDescriptor, QueueLengths};
