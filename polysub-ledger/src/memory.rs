use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use polysub_core::{ReservationId, TenantId};
use tracing::{info, warn};

use crate::backend::QuotaLedgerBackend;
use crate::error::{LedgerError, LedgerResult};
use crate::types::{LedgerKey, MonthKey, Reservation, ReservationState, UsageLedgerRow};

/// In-memory quota ledger backend. Single `RwLock` over both tables gives
/// the linearizable-per-(tenant, month) guarantee reservations require.
pub struct MemoryLedger {
    rows: RwLock<HashMap<LedgerKey, UsageLedgerRow>>,
    reservations: RwLock<HashMap<ReservationId, Reservation>>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self {
            rows: RwLock::new(HashMap::new()),
            reservations: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for MemoryLedger {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl QuotaLedgerBackend for MemoryLedger {
    async fn reserve(
        &self,
        tenant_id: TenantId,
        month: MonthKey,
        minutes: u64,
        default_limit_minutes: u64,
        translate: bool,
    ) -> LedgerResult<ReservationId> {
        let key: LedgerKey = (tenant_id.clone(), month);
        let mut rows = self.rows.write();
        let row = rows
            .entry(key)
            .or_insert_with(|| UsageLedgerRow::new(tenant_id.clone(), month, default_limit_minutes));

        let remaining = row.remaining();
        if minutes > remaining {
            warn!(tenant = %tenant_id, %month, minutes, remaining, "quota reservation denied");
            return Err(LedgerError::InsufficientCredits {
                requested: minutes,
                remaining,
            });
        }

        row.used_minutes += minutes;
        row.last_used_at = Some(Utc::now());

        let reservation = Reservation {
            id: ReservationId::new(),
            tenant_id,
            month,
            amount_minutes: minutes,
            state: ReservationState::Held,
            translate,
            created_at: Utc::now(),
        };
        let id = reservation.id.clone();
        self.reservations.write().insert(id.clone(), reservation);
        info!(reservation = %id, minutes, "quota reserved");
        Ok(id)
    }

    async fn commit(&self, reservation_id: &ReservationId) -> LedgerResult<()> {
        let mut reservations = self.reservations.write();
        let reservation = reservations
            .get_mut(reservation_id)
            .ok_or_else(|| LedgerError::ReservationNotFound(reservation_id.to_string()))?;

        if reservation.state != ReservationState::Held {
            return Err(LedgerError::AlreadyResolved(reservation_id.to_string()));
        }

        reservation.state = ReservationState::Committed;

        if reservation.translate {
            let key: LedgerKey = (reservation.tenant_id.clone(), reservation.month);
            if let Some(row) = self.rows.write().get_mut(&key) {
                row.translation_minutes += reservation.amount_minutes;
            }
        }

        info!(reservation = %reservation_id, "quota reservation committed");
        Ok(())
    }

    async fn release(&self, reservation_id: &ReservationId) -> LedgerResult<()> {
        let mut reservations = self.reservations.write();
        let reservation = reservations
            .get_mut(reservation_id)
            .ok_or_else(|| LedgerError::ReservationNotFound(reservation_id.to_string()))?;

        if reservation.state != ReservationState::Held {
            return Err(LedgerError::AlreadyResolved(reservation_id.to_string()));
        }

        reservation.state = ReservationState::Released;

        let key: LedgerKey = (reservation.tenant_id.clone(), reservation.month);
        if let Some(row) = self.rows.write().get_mut(&key) {
            row.used_minutes = row.used_minutes.saturating_sub(reservation.amount_minutes);
        }

        info!(reservation = %reservation_id, "quota reservation released");
        Ok(())
    }

    async fn grant(
        &self,
        tenant_id: TenantId,
        month: MonthKey,
        extra_minutes: u64,
        default_limit_minutes: u64,
    ) -> LedgerResult<()> {
        let key: LedgerKey = (tenant_id.clone(), month);
        let mut rows = self.rows.write();
        let row = rows
            .entry(key)
            .or_insert_with(|| UsageLedgerRow::new(tenant_id, month, default_limit_minutes));
        row.limit_minutes += extra_minutes;
        Ok(())
    }

    async fn get_row(&self, tenant_id: &TenantId, month: MonthKey) -> Option<UsageLedgerRow> {
        self.rows.read().get(&(tenant_id.clone(), month)).cloned()
    }

    async fn get_reservation(&self, reservation_id: &ReservationId) -> Option<Reservation> {
        self.reservations.read().get(reservation_id).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tenant() -> TenantId {
        TenantId::new("tenant-1")
    }

    #[tokio::test]
    async fn reserve_commit_round_trip() {
        let ledger = MemoryLedger::new();
        let month = MonthKey::current();

        let res = ledger
            .reserve(tenant(), month, 5, 20, false)
            .await
            .unwrap();
        let row = ledger.get_row(&tenant(), month).await.unwrap();
        assert_eq!(row.used_minutes, 5);

        ledger.commit(&res).await.unwrap();
        let reservation = ledger.get_reservation(&res).await.unwrap();
        assert_eq!(reservation.state, ReservationState::Committed);
        // used stays at 5 post-commit
        let row = ledger.get_row(&tenant(), month).await.unwrap();
        assert_eq!(row.used_minutes, 5);
    }

    #[tokio::test]
    async fn reserve_release_returns_to_prior_state() {
        let ledger = MemoryLedger::new();
        let month = MonthKey::current();

        let before = ledger.get_row(&tenant(), month).await;
        assert!(before.is_none());

        let res = ledger
            .reserve(tenant(), month, 5, 20, false)
            .await
            .unwrap();
        ledger.release(&res).await.unwrap();

        let row = ledger.get_row(&tenant(), month).await.unwrap();
        assert_eq!(row.used_minutes, 0);
    }

    #[tokio::test]
    async fn reserve_denied_when_over_limit() {
        let ledger = MemoryLedger::new();
        let month = MonthKey::current();

        ledger.reserve(tenant(), month, 18, 20, false).await.unwrap();
        let err = ledger.reserve(tenant(), month, 5, 20, false).await.unwrap_err();
        match err {
            LedgerError::InsufficientCredits { requested, remaining } => {
                assert_eq!(requested, 5);
                assert_eq!(remaining, 2);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn double_commit_is_rejected() {
        let ledger = MemoryLedger::new();
        let month = MonthKey::current();
        let res = ledger.reserve(tenant(), month, 3, 20, false).await.unwrap();
        ledger.commit(&res).await.unwrap();
        assert!(ledger.commit(&res).await.is_err());
    }

    #[tokio::test]
    async fn grant_increases_limit() {
        let ledger = MemoryLedger::new();
        let month = MonthKey::current();
        ledger.grant(tenant(), month, 50, 20).await.unwrap();
        let row = ledger.get_row(&tenant(), month).await.unwrap();
        assert_eq!(row.limit_minutes, 70);
    }

    #[tokio::test]
    async fn used_never_exceeds_limit_invariant() {
        let ledger = MemoryLedger::new();
        let month = MonthKey::current();
        for _ in 0..10 {
            let _ = ledger.reserve(tenant(), month, 3, 20, false).await;
        }
        let row = ledger.get_row(&tenant(), month).await.unwrap();
        assert!(row.used_minutes <= row.limit_minutes);
    }
}
