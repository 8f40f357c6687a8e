//! Idempotency ledger service.

use std::sync::Arc;

use async_trait::async_trait;
use checkout::fingerprint::Fingerprint;
use jiff::Timestamp;
use mockall::automock;
use rustc_hash::FxHashMap;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::domain::{
    ledger::{
        errors::LedgerError,
        models::{Begin, IdempotencyKey, IdempotencyRecord, LedgerState, Outcome},
    },
    reservations::models::ReservationUuid,
    tenants::records::TenantUuid,
};

type TenantRecords = Arc<Mutex<FxHashMap<IdempotencyKey, IdempotencyRecord>>>;

/// In-memory ledger.
///
/// Each tenant has its own lock; the outer map lock is only held long enough
/// to find or create a tenant's record table.
#[derive(Debug, Clone, Default)]
pub struct InMemoryIdempotencyLedger {
    tenants: Arc<Mutex<FxHashMap<TenantUuid, TenantRecords>>>,
}

impl InMemoryIdempotencyLedger {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    async fn records(&self, tenant: TenantUuid) -> TenantRecords {
        Arc::clone(self.tenants.lock().await.entry(tenant).or_default())
    }

    async fn all_records(&self) -> Vec<TenantRecords> {
        self.tenants.lock().await.values().cloned().collect()
    }
}

#[async_trait]
impl IdempotencyLedger for InMemoryIdempotencyLedger {
    async fn begin_or_rejoin(
        &self,
        tenant: TenantUuid,
        key: &IdempotencyKey,
        fingerprint: &Fingerprint,
    ) -> Result<Begin, LedgerError> {
        let records = self.records(tenant).await;
        let mut records = records.lock().await;
        let now = Timestamp::now();

        let Some(record) = records.get_mut(key) else {
            records.insert(
                key.clone(),
                IdempotencyRecord {
                    tenant,
                    key: key.clone(),
                    fingerprint: fingerprint.clone(),
                    state: LedgerState::Pending,
                    reservation: None,
                    created_at: now,
                    updated_at: now,
                },
            );

            debug!(%tenant, idempotency_key = %key, "ledger record opened");

            return Ok(Begin::Fresh);
        };

        if record.fingerprint != *fingerprint {
            return Err(LedgerError::FingerprintConflict);
        }

        match &record.state {
            LedgerState::Pending => Ok(Begin::InProgress),
            LedgerState::Completed { outcome } if outcome.is_retryable() => {
                record.state = LedgerState::Pending;
                record.reservation = None;
                record.updated_at = now;

                debug!(
                    %tenant,
                    idempotency_key = %key,
                    "ledger record re-opened after transient failure"
                );

                Ok(Begin::Fresh)
            }
            LedgerState::Completed { outcome } => Ok(Begin::Completed(outcome.clone())),
        }
    }

    async fn complete(
        &self,
        tenant: TenantUuid,
        key: &IdempotencyKey,
        outcome: Outcome,
    ) -> Result<(), LedgerError> {
        let records = self.records(tenant).await;
        let mut records = records.lock().await;

        let record = records.get_mut(key).ok_or(LedgerError::NotFound)?;

        match &record.state {
            LedgerState::Pending => {}
            LedgerState::Completed { outcome: existing } if *existing == outcome => return Ok(()),
            // A commit that outlived its timeout may still land its order.
            LedgerState::Completed { outcome: existing }
                if existing.is_retryable() && matches!(outcome, Outcome::Committed { .. }) =>
            {
                warn!(%tenant, idempotency_key = %key, "late commit replaced a transient failure");
            }
            LedgerState::Completed { .. } => return Err(LedgerError::OutcomeMismatch),
        }

        record.state = LedgerState::Completed { outcome };
        record.updated_at = Timestamp::now();

        Ok(())
    }

    async fn attach_reservation(
        &self,
        tenant: TenantUuid,
        key: &IdempotencyKey,
        reservation: ReservationUuid,
    ) -> Result<(), LedgerError> {
        let records = self.records(tenant).await;
        let mut records = records.lock().await;

        let record = records.get_mut(key).ok_or(LedgerError::NotFound)?;

        if !record.is_pending() {
            return Err(LedgerError::OutcomeMismatch);
        }

        record.reservation = Some(reservation);
        record.updated_at = Timestamp::now();

        Ok(())
    }

    async fn find(
        &self,
        tenant: TenantUuid,
        key: &IdempotencyKey,
    ) -> Result<Option<IdempotencyRecord>, LedgerError> {
        let records = self.records(tenant).await;
        let records = records.lock().await;

        Ok(records.get(key).cloned())
    }

    async fn stale_pending(
        &self,
        older_than: Timestamp,
    ) -> Result<Vec<IdempotencyRecord>, LedgerError> {
        let mut stale = Vec::new();

        for records in self.all_records().await {
            stale.extend(
                records
                    .lock()
                    .await
                    .values()
                    .filter(|record| record.is_pending() && record.updated_at < older_than)
                    .cloned(),
            );
        }

        stale.sort_by_key(|record| record.updated_at);

        Ok(stale)
    }

    async fn purge_expired(&self, older_than: Timestamp) -> Result<usize, LedgerError> {
        let mut purged = 0;

        for records in self.all_records().await {
            let mut records = records.lock().await;
            let before = records.len();

            records.retain(|_, record| record.is_pending() || record.updated_at >= older_than);

            purged += before - records.len();
        }

        Ok(purged)
    }
}

#[automock]
#[async_trait]
pub trait IdempotencyLedger: Send + Sync {
    /// Claim `key` for a commit with `fingerprint`, or report what already
    /// happened under it.
    ///
    /// Atomic per tenant and key: of any number of concurrent callers with the
    /// same key, exactly one sees [`Begin::Fresh`].
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::FingerprintConflict`] when the key was first used
    /// with a different request.
    async fn begin_or_rejoin(
        &self,
        tenant: TenantUuid,
        key: &IdempotencyKey,
        fingerprint: &Fingerprint,
    ) -> Result<Begin, LedgerError>;

    /// Record the terminal outcome of a pending commit.
    ///
    /// Repeating the same outcome is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::NotFound`] for an unknown key and
    /// [`LedgerError::OutcomeMismatch`] if a different outcome is already stored.
    async fn complete(
        &self,
        tenant: TenantUuid,
        key: &IdempotencyKey,
        outcome: Outcome,
    ) -> Result<(), LedgerError>;

    /// Remember the reservation taken by the pending attempt under `key`, so
    /// it can be released if the attempt is abandoned.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::NotFound`] for an unknown key and
    /// [`LedgerError::OutcomeMismatch`] if the record is no longer pending.
    async fn attach_reservation(
        &self,
        tenant: TenantUuid,
        key: &IdempotencyKey,
        reservation: ReservationUuid,
    ) -> Result<(), LedgerError>;

    /// Look up the record for a key.
    async fn find(
        &self,
        tenant: TenantUuid,
        key: &IdempotencyKey,
    ) -> Result<Option<IdempotencyRecord>, LedgerError>;

    /// Pending records, across all tenants, last touched before `older_than`.
    async fn stale_pending(
        &self,
        older_than: Timestamp,
    ) -> Result<Vec<IdempotencyRecord>, LedgerError>;

    /// Delete completed records last touched before `older_than`. Pending
    /// records are never removed. Returns how many were deleted.
    async fn purge_expired(&self, older_than: Timestamp) -> Result<usize, LedgerError>;
}
