use std::collections::HashMap;

use crate::types::{RateAction, RateTier};

/// One (limit, window_secs) pair for a tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limit {
    pub count: u64,
    pub window_secs: u64,
}

/// The configured limits table, keyed by action then tier.
#[derive(Debug, Clone)]
pub struct RateLimitPolicy {
    table: HashMap<RateAction, HashMap<RateTier, Limit>>,
}

impl RateLimitPolicy {
    pub fn limit_for(&self, action: RateAction, tier: RateTier) -> Limit {
        self.table
            .get(&action)
            .and_then(|by_tier| by_tier.get(&tier))
            .copied()
            .unwrap_or_else(|| self.table[&action][&RateTier::Free])
    }

    pub fn with_limit(mut self, action: RateAction, tier: RateTier, limit: Limit) -> Self {
        self.table.entry(action).or_default().insert(tier, limit);
        self
    }
}

impl Default for RateLimitPolicy {
    fn default() -> Self {
        let mut table: HashMap<RateAction, HashMap<RateTier, Limit>> = HashMap::new();

        table.insert(
            RateAction::ApiCalls,
            HashMap::from([
                (RateTier::Free, Limit { count: 100, window_secs: 3600 }),
                (RateTier::Paid, Limit { count: 1000, window_secs: 3600 }),
                (RateTier::Enterprise, Limit { count: 10_000, window_secs: 3600 }),
            ]),
        );
        table.insert(
            RateAction::Uploads,
            HashMap::from([
                (RateTier::Free, Limit { count: 3, window_secs: 86_400 }),
                (RateTier::Paid, Limit { count: 50, window_secs: 86_400 }),
                (RateTier::Enterprise, Limit { count: 1000, window_secs: 86_400 }),
            ]),
        );
        table.insert(
            RateAction::Transcriptions,
            HashMap::from([
                (RateTier::Free, Limit { count: 5, window_secs: 3600 }),
                (RateTier::Paid, Limit { count: 50, window_secs: 3600 }),
                (RateTier::Enterprise, Limit { count: 500, window_secs: 3600 }),
            ]),
        );
        table.insert(
            RateAction::Registration,
            HashMap::from([(RateTier::Free, Limit { count: 3, window_secs: 3600 })]),
        );

        Self { table }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_table_has_expected_limits() {
        let policy = RateLimitPolicy::default();
        assert_eq!(
            policy.limit_for(RateAction::ApiCalls, RateTier::Free),
            Limit { count: 100, window_secs: 3600 }
        );
        assert_eq!(
            policy.limit_for(RateAction::Uploads, RateTier::Paid),
            Limit { count: 50, window_secs: 86_400 }
        );
        assert_eq!(
            policy.limit_for(RateAction::Transcriptions, RateTier::Enterprise),
            Limit { count: 500, window_secs: 3600 }
        );
    }

    #[test]
    fn registration_has_its_own_action_key_and_falls_back_to_free() {
        let policy = RateLimitPolicy::default();
        let expected = Limit { count: 3, window_secs: 3600 };
        assert_eq!(policy.limit_for(RateAction::Registration, RateTier::Free), expected);
        assert_eq!(policy.limit_for(RateAction::Registration, RateTier::Paid), expected);
        assert_eq!(policy.limit_for(RateAction::Registration, RateTier::Enterprise), expected);
    }
}
