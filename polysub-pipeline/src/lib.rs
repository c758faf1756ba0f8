pub mod collaborators;
pub mod config;
pub mod driver;
pub mod error;
pub mod merge;
pub mod repository;
pub mod types;

pub use collaborators::{AudioExtractor, ExtractedAudio, Transcriber, TranscriptionOutput};
pub use config::{DriverConfig, QuotaOverrunPolicy, RetryPolicy, StageTimeouts};
pub use driver::PipelineDriver;
pub use error::{RepositoryError, RepositoryResult, StageError};
pub use merge::merge_consecutive_segments;
pub use repository::{JobRepository, MemoryJobRepository};
pub use types::{ArtifactKeys, ArtifactSlot, JobKind, JobRecord, JobStatus};
