use std::time::Duration;

/// Tunables for the translator facade.
#[derive(Debug, Clone, Copy)]
pub struct FacadeConfig {
    /// `B_call`: per-call character budget including separators.
    pub char_budget: usize,
    /// Minimum pause between block calls to avoid provider rate limits.
    pub inter_block_pacing: Duration,
    /// Whole-block retry attempts on provider hard-failure.
    pub retry_attempts: u32,
    /// Delay before the last-resort forced attempt once all providers are exhausted.
    pub exhausted_retry_delay: Duration,
}

impl Default for FacadeConfig {
    fn default() -> Self {
        Self {
            char_budget: 4000,
            inter_block_pacing: Duration::from_millis(200),
            retry_attempts: 3,
            exhausted_retry_delay: Duration::from_secs(2),
        }
    }
}
