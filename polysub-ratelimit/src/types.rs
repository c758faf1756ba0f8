use serde::{Deserialize, Serialize};
use std::fmt;

use polysub_core::Plan;

/// Actions covered by the rate limiter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RateAction {
    ApiCalls,
    Uploads,
    Transcriptions,
    Registration,
}

impl fmt::Display for RateAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RateAction::ApiCalls => "api_calls",
            RateAction::Uploads => "uploads",
            RateAction::Transcriptions => "transcriptions",
            RateAction::Registration => "registration",
        };
        write!(f, "{s}")
    }
}

/// Limit tier a plan maps onto. The default limits table is keyed by tier,
/// not by `Plan` directly, since starter/pro/premium all share the "paid"
/// tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RateTier {
    Free,
    Paid,
    Enterprise,
}

impl From<Plan> for RateTier {
    fn from(plan: Plan) -> Self {
        match plan {
            Plan::Free => RateTier::Free,
            Plan::Starter | Plan::Pro | Plan::Premium => RateTier::Paid,
            Plan::Enterprise => RateTier::Enterprise,
        }
    }
}

/// Outcome of a `check_and_consume` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckOutcome {
    Allowed { remaining: u64 },
    Denied { reset_in_secs: u64 },
}

impl CheckOutcome {
    pub fn is_allowed(&self) -> bool {
        matches!(self, CheckOutcome::Allowed { .. })
    }
}
