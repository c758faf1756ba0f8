use std::path::PathBuf;
use std::time::Duration;

/// Cleaner cadence and TTLs. Runs on a configured cadence, hourly by
/// default.
#[derive(Debug, Clone)]
pub struct CleanerConfig {
    pub cadence: Duration,
    /// How long an orphaned job-scratch directory survives before the
    /// cleaner removes it, independent of the blob store's own artifact TTL.
    pub scratch_ttl: Duration,
    pub scratch_dir: PathBuf,
}

impl Default for CleanerConfig {
    fn default() -> Self {
        Self {
            cadence: Duration::from_secs(3600),
            scratch_ttl: Duration::from_secs(24 * 3600),
            scratch_dir: std::env::temp_dir().join("polysub"),
        }
    }
}
