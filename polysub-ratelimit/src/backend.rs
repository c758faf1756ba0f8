use async_trait::async_trait;
use polysub_core::Plan;

use crate::types::{CheckOutcome, RateAction};

/// Sliding-window counter store. Implementations provide a
/// fixed-window-with-TTL counter, the ingress flood check, and a temporary
/// blacklist, mirroring the original's Redis-backed `RateLimiter`.
#[async_trait]
pub trait RateLimiterBackend: Send + Sync {
    /// Atomically increments the counter for `(action, subject)` and reports
    /// whether the action is still within the plan's limit. First increment
    /// in a window sets the window's TTL.
    async fn check_and_consume(&self, subject: &str, action: RateAction, plan: Plan) -> CheckOutcome;

    /// Clears the counter for `(action, subject)`.
    async fn reset(&self, subject: &str, action: RateAction);

    /// True once `ip` has made more than `threshold` requests within `window_secs`.
    async fn is_flooding(&self, ip: &str, threshold: u64, window_secs: u64) -> bool;

    /// Temporarily denies all actions for `subject` for `ttl_secs`.
    async fn blacklist(&self, subject: &str, ttl_secs: u64);

    /// Whether `subject` is currently blacklisted.
    async fn is_blacklisted(&self, subject: &str) -> bool;
}
