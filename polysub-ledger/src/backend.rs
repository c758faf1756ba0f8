use async_trait::async_trait;
use polysub_core::{ReservationId, TenantId};

use crate::error::LedgerResult;
use crate::types::{MonthKey, Reservation, UsageLedgerRow};

/// Quota ledger storage primitives. Implementations must give a
/// linearizable `reserve`/`commit`/`release` per (tenant, month); the
/// in-memory backend achieves this with a single lock over the whole table.
#[async_trait]
pub trait QuotaLedgerBackend: Send + Sync {
    /// Reserve `minutes` against the tenant's `month` row, lazily creating
    /// the row on rollover with `default_limit_minutes` if absent.
    /// Atomically checks `used + minutes <= limit` and increments `used`.
    async fn reserve(
        &self,
        tenant_id: TenantId,
        month: MonthKey,
        minutes: u64,
        default_limit_minutes: u64,
        translate: bool,
    ) -> LedgerResult<ReservationId>;

    /// Mark a held reservation committed; optionally rolls the held amount
    /// into `translation_used` if the reservation was flagged for translation.
    async fn commit(&self, reservation_id: &ReservationId) -> LedgerResult<()>;

    /// Release a held reservation, decrementing `used` by the held amount.
    async fn release(&self, reservation_id: &ReservationId) -> LedgerResult<()>;

    /// Increase a tenant's monthly limit (payment/referral paths).
    async fn grant(
        &self,
        tenant_id: TenantId,
        month: MonthKey,
        extra_minutes: u64,
        default_limit_minutes: u64,
    ) -> LedgerResult<()>;

    /// Read the current ledger row for a tenant/month, if any.
    async fn get_row(&self, tenant_id: &TenantId, month: MonthKey) -> Option<UsageLedgerRow>;

    /// Read a reservation by id.
    async fn get_reservation(&self, reservation_id: &ReservationId) -> Option<Reservation>;
}
