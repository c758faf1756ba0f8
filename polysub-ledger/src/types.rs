use chrono::{Datelike, DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use polysub_core::{ReservationId, TenantId};

/// A `YYYY-MM` month key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MonthKey {
    pub year: i32,
    pub month: u32,
}

impl MonthKey {
    pub fn current() -> Self {
        Self::from_datetime(Utc::now())
    }

    pub fn from_datetime(dt: DateTime<Utc>) -> Self {
        Self {
            year: dt.year(),
            month: dt.month(),
        }
    }
}

impl fmt::Display for MonthKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

/// Unique (tenant, month) row key.
pub type LedgerKey = (TenantId, MonthKey);

/// A tenant's usage ledger row for one month.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsageLedgerRow {
    pub tenant_id: TenantId,
    pub month: MonthKey,
    pub limit_minutes: u64,
    pub used_minutes: u64,
    pub translation_minutes: u64,
    pub last_used_at: Option<DateTime<Utc>>,
}

impl UsageLedgerRow {
    pub fn new(tenant_id: TenantId, month: MonthKey, limit_minutes: u64) -> Self {
        Self {
            tenant_id,
            month,
            limit_minutes,
            used_minutes: 0,
            translation_minutes: 0,
            last_used_at: None,
        }
    }

    pub fn remaining(&self) -> u64 {
        self.limit_minutes.saturating_sub(self.used_minutes)
    }
}

/// Reservation lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReservationState {
    Held,
    Committed,
    Released,
}

/// A credit hold against a tenant's monthly ledger.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reservation {
    pub id: ReservationId,
    pub tenant_id: TenantId,
    pub month: MonthKey,
    pub amount_minutes: u64,
    pub state: ReservationState,
    pub translate: bool,
    pub created_at: DateTime<Utc>,
}
