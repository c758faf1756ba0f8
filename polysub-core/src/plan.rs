use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Tenant subscription plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Plan {
    Free,
    Starter,
    Pro,
    Premium,
    Enterprise,
}

impl Plan {
    /// The priority-queue class a job submitted under this plan is routed to.
    pub fn class(self) -> JobClass {
        match self {
            Plan::Enterprise | Plan::Premium => JobClass::Priority,
            Plan::Pro | Plan::Starter => JobClass::Paid,
            Plan::Free => JobClass::Free,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Plan::Free => "free",
            Plan::Starter => "starter",
            Plan::Pro => "pro",
            Plan::Premium => "premium",
            Plan::Enterprise => "enterprise",
        }
    }
}

impl std::fmt::Display for Plan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for Plan {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "free" => Ok(Plan::Free),
            "starter" => Ok(Plan::Starter),
            "pro" => Ok(Plan::Pro),
            "premium" => Ok(Plan::Premium),
            "enterprise" => Ok(Plan::Enterprise),
            other => Err(format!("unknown plan: {other}")),
        }
    }
}

/// Priority-queue class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
pub enum JobClass {
    /// Lowest-priority lane: free-tier jobs. Declared first so the derived
    /// `Ord` matches dequeue precedence only when reversed by callers.
    Free,
    Paid,
    Priority,
}

impl JobClass {
    pub fn all() -> &'static [JobClass] {
        &[JobClass::Priority, JobClass::Paid, JobClass::Free]
    }

    pub fn name(self) -> &'static str {
        match self {
            JobClass::Priority => "priority",
            JobClass::Paid => "paid",
            JobClass::Free => "free",
        }
    }
}

impl std::fmt::Display for JobClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plan_routes_to_expected_class() {
        assert_eq!(Plan::Enterprise.class(), JobClass::Priority);
        assert_eq!(Plan::Premium.class(), JobClass::Priority);
        assert_eq!(Plan::Pro.class(), JobClass::Paid);
        assert_eq!(Plan::Starter.class(), JobClass::Paid);
        assert_eq!(Plan::Free.class(), JobClass::Free);
    }

    #[test]
    fn plan_from_str_roundtrips() {
        for p in [Plan::Free, Plan::Starter, Plan::Pro, Plan::Premium, Plan::Enterprise] {
            assert_eq!(p.name().parse::<Plan>().unwrap(), p);
        }
    }
}
