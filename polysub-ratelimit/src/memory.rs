use std::collections::HashMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use parking_lot::Mutex;
use polysub_core::Plan;
use tracing::debug;

use crate::backend::RateLimiterBackend;
use crate::policy::RateLimitPolicy;
use crate::types::{CheckOutcome, RateAction, RateTier};

struct Window {
    started_at: Instant,
    window: Duration,
    count: u64,
}

impl Window {
    fn fresh(window: Duration) -> Self {
        Self {
            started_at: Instant::now(),
            window,
            count: 0,
        }
    }

    fn expired(&self) -> bool {
        self.started_at.elapsed() >= self.window
    }

    fn reset_in_secs(&self) -> u64 {
        self.window.saturating_sub(self.started_at.elapsed()).as_secs()
    }
}

/// In-memory fixed-window rate limiter, the non-distributed stand-in for
/// the original's Redis `INCR`+`EXPIRE` counters.
pub struct MemoryRateLimiter {
    policy: RateLimitPolicy,
    counters: Mutex<HashMap<String, Window>>,
    flood: Mutex<HashMap<String, Window>>,
    blacklist: Mutex<HashMap<String, Instant>>,
}

impl MemoryRateLimiter {
    pub fn new(policy: RateLimitPolicy) -> Self {
        Self {
            policy,
            counters: Mutex::new(HashMap::new()),
            flood: Mutex::new(HashMap::new()),
            blacklist: Mutex::new(HashMap::new()),
        }
    }
}

impl Default for MemoryRateLimiter {
    fn default() -> Self {
        Self::new(RateLimitPolicy::default())
    }
}

#[async_trait]
impl RateLimiterBackend for MemoryRateLimiter {
    async fn check_and_consume(&self, subject: &str, action: RateAction, plan: Plan) -> CheckOutcome {
        let tier = RateTier::from(plan);
        let limit = self.policy.limit_for(action, tier);
        let key = format!("{action}:{subject}");

        let mut counters = self.counters.lock();
        let window = counters
            .entry(key)
            .or_insert_with(|| Window::fresh(Duration::from_secs(limit.window_secs)));

        if window.expired() {
            *window = Window::fresh(Duration::from_secs(limit.window_secs));
        }

        window.count += 1;

        if window.count > limit.count {
            debug!(%subject, %action, count = window.count, limit = limit.count, "rate limit denied");
            CheckOutcome::Denied {
                reset_in_secs: window.reset_in_secs(),
            }
        } else {
            CheckOutcome::Allowed {
                remaining: limit.count - window.count,
            }
        }
    }

    async fn reset(&self, subject: &str, action: RateAction) {
        let key = format!("{action}:{subject}");
        self.counters.lock().remove(&key);
    }

    async fn is_flooding(&self, ip: &str, threshold: u64, window_secs: u64) -> bool {
        let key = format!("flood:{ip}");
        let mut flood = self.flood.lock();
        let window = flood
            .entry(key)
            .or_insert_with(|| Window::fresh(Duration::from_secs(window_secs)));

        if window.expired() {
            *window = Window::fresh(Duration::from_secs(window_secs));
        }

        window.count += 1;
        window.count > threshold
    }

    async fn blacklist(&self, subject: &str, ttl_secs: u64) {
        self.blacklist
            .lock()
            .insert(subject.to_string(), Instant::now() + Duration::from_secs(ttl_secs));
    }

    async fn is_blacklisted(&self, subject: &str) -> bool {
        self.blacklist
            .lock()
            .get(subject)
            .map(|expires_at| Instant::now() < *expires_at)
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn allows_up_to_the_limit_then_denies() {
        let limiter = MemoryRateLimiter::new(
            RateLimitPolicy::default().with_limit(
                RateAction::ApiCalls,
                RateTier::Free,
                crate::policy::Limit { count: 2, window_secs: 60 },
            ),
        );

        assert!(limiter
            .check_and_consume("tenant-1", RateAction::ApiCalls, Plan::Free)
            .await
            .is_allowed());
        assert!(limiter
            .check_and_consume("tenant-1", RateAction::ApiCalls, Plan::Free)
            .await
            .is_allowed());
        let outcome = limiter
            .check_and_consume("tenant-1", RateAction::ApiCalls, Plan::Free)
            .await;
        assert!(!outcome.is_allowed());
    }

    #[tokio::test]
    async fn reset_clears_the_counter() {
        let limiter = MemoryRateLimiter::new(
            RateLimitPolicy::default().with_limit(
                RateAction::Uploads,
                RateTier::Free,
                crate::policy::Limit { count: 1, window_secs: 60 },
            ),
        );
        limiter
            .check_and_consume("tenant-2", RateAction::Uploads, Plan::Free)
            .await;
        limiter.reset("tenant-2", RateAction::Uploads).await;
        assert!(limiter
            .check_and_consume("tenant-2", RateAction::Uploads, Plan::Free)
            .await
            .is_allowed());
    }

    #[tokio::test]
    async fn flooding_detected_past_threshold() {
        let limiter = MemoryRateLimiter::default();
        for _ in 0..10 {
            assert!(!limiter.is_flooding("1.2.3.4", 10, 60).await);
        }
        assert!(limiter.is_flooding("1.2.3.4", 10, 60).await);
    }

    #[tokio::test]
    async fn blacklist_round_trip() {
        let limiter = MemoryRateLimiter::default();
        assert!(!limiter.is_blacklisted("bad-actor").await);
        limiter.blacklist("bad-actor", 3600).await;
        assert!(limiter.is_blacklisted("bad-actor").await);
    }

    #[tokio::test]
    async fn paid_tier_gets_higher_limit_than_free() {
        let limiter = MemoryRateLimiter::default();
        for _ in 0..100 {
            limiter
                .check_and_consume("free-tenant", RateAction::ApiCalls, Plan::Free)
                .await;
        }
        let denied = limiter
            .check_and_consume("free-tenant", RateAction::ApiCalls, Plan::Free)
            .await;
        assert!(!denied.is_allowed());

        let allowed = limiter
            .check_and_consume("paid-tenant", RateAction::ApiCalls, Plan::Pro)
            .await;
        assert!(allowed.is_allowed());
    }
}
