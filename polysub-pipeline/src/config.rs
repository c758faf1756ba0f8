use std::path::PathBuf;
use std::time::Duration;

/// Soft per-stage timeouts.
#[derive(Debug, Clone, Copy)]
pub struct StageTimeouts {
    pub extract: Duration,
    pub transcribe: Duration,
    pub translate: Duration,
    pub emit: Duration,
}

impl Default for StageTimeouts {
    fn default() -> Self {
        Self {
            extract: Duration::from_secs(5 * 60),
            transcribe: Duration::from_secs(60 * 60),
            translate: Duration::from_secs(30 * 60),
            emit: Duration::from_secs(2 * 60),
        }
    }
}

/// Retry policy for transient stage failures: exponential backoff up to
/// a fixed number of attempts, three by default.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_backoff: Duration::from_millis(500),
        }
    }
}

/// What the driver does when the probed duration exceeds the reservation:
/// fail the job outright, or top up the ledger for the difference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuotaOverrunPolicy {
    Fail,
    TopUp,
}

impl Default for QuotaOverrunPolicy {
    fn default() -> Self {
        QuotaOverrunPolicy::Fail
    }
}

/// Where per-job scratch files (extracted audio, rendered subtitle files
/// awaiting upload) are staged before upload.
#[derive(Debug, Clone)]
pub struct DriverConfig {
    pub timeouts: StageTimeouts,
    pub retry: RetryPolicy,
    pub quota_overrun: QuotaOverrunPolicy,
    pub scratch_dir: PathBuf,
    pub default_limit_minutes: u64,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            timeouts: StageTimeouts::default(),
            retry: RetryPolicy::default(),
            quota_overrun: QuotaOverrunPolicy::default(),
            scratch_dir: std::env::temp_dir().join("polysub"),
            default_limit_minutes: 20,
        }
    }
}
