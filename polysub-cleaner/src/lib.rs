//! polysub-cleaner: cadence-driven purge of expired blobs and orphaned
//! job-scratch directories.

pub mod cleaner;
pub mod config;

pub use cleaner::{Cleaner, SweepReport};
pub use config::CleanerConfig;
