//! Reconciliation
//!
//! Repairs ledger records left `Pending` by a crash or timeout between saving an
//! order and recording the outcome, flags orders the ledger knows nothing about,
//! and purges completed records past the retention window.

use std::{sync::Arc, time::Duration};

use jiff::{SignedDuration, Timestamp};
use thiserror::Error;
use tokio::{
    task::JoinHandle,
    time::{MissedTickBehavior, interval},
};
use tracing::{debug, error, info, warn};

use crate::domain::{
    checkout::models::CheckoutSettings,
    ledger::{FailureKind, IdempotencyKey, IdempotencyLedger, LedgerError, Outcome},
    orders::{OrdersRepository, OrdersServiceError, records::OrderUuid},
    reservations::{ReservationService, ReservationServiceError, models::ReservationUuid},
    tenants::records::TenantUuid,
};

/// Errors from a reconciliation pass.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ReconcileError {
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error(transparent)]
    Orders(#[from] OrdersServiceError),

    #[error(transparent)]
    Reservation(#[from] ReservationServiceError),

    /// An order exists with no ledger record for its key.
    #[error("order {order} for tenant {tenant} has no ledger record for key {key}")]
    OrphanOrder {
        tenant: TenantUuid,
        order: OrderUuid,
        key: IdempotencyKey,
    },
}

/// What a reconciliation pass did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    /// Pending records completed from an existing order.
    pub repaired: usize,

    /// Pending records with no order, marked as timed out.
    pub timed_out: usize,

    /// Reservations released from timed-out attempts.
    pub released: usize,

    /// Completed records deleted past retention.
    pub purged: usize,

    /// Orders with no ledger record.
    pub orphans: Vec<ReconcileError>,
}

impl ReconcileReport {
    /// Whether the pass changed or found nothing.
    #[must_use]
    pub fn is_quiet(&self) -> bool {
        self.repaired == 0
            && self.timed_out == 0
            && self.released == 0
            && self.purged == 0
            && self.orphans.is_empty()
    }
}

/// Periodic ledger repair.
#[derive(Clone)]
pub struct Reconciler {
    ledger: Arc<dyn IdempotencyLedger>,
    orders: Arc<dyn OrdersRepository>,
    reservations: Arc<dyn ReservationService>,
    settings: CheckoutSettings,
}

impl Reconciler {
    #[must_use]
    pub fn new(
        ledger: Arc<dyn IdempotencyLedger>,
        orders: Arc<dyn OrdersRepository>,
        reservations: Arc<dyn ReservationService>,
        settings: CheckoutSettings,
    ) -> Self {
        Self {
            ledger,
            orders,
            reservations,
            settings,
        }
    }

    /// Run one pass as of `now`.
    ///
    /// Never deletes a pending record. A pending record is resolved only once
    /// it is older than the pending timeout.
    ///
    /// # Errors
    ///
    /// Returns a [`ReconcileError`] when the ledger or order storage fails.
    /// Orphaned orders do not abort the pass; they are listed in the report.
    pub async fn reconcile(&self, now: Timestamp) -> Result<ReconcileReport, ReconcileError> {
        let mut report = ReconcileReport::default();

        let stale = self
            .ledger
            .stale_pending(cutoff(now, self.settings.pending_timeout))
            .await?;

        for record in stale {
            let order = self
                .orders
                .find_by_idempotency_key(record.tenant, &record.key)
                .await?;

            let outcome = match &order {
                Some(order) => Outcome::Committed {
                    order: order.uuid,
                    preview: order.preview.clone(),
                },
                None => Outcome::failed(FailureKind::Timeout {
                    stage: "commit".to_string(),
                }),
            };

            match self.ledger.complete(record.tenant, &record.key, outcome).await {
                Ok(()) if order.is_some() => {
                    info!(
                        tenant = %record.tenant,
                        idempotency_key = %record.key,
                        "repaired pending commit from its order"
                    );

                    report.repaired += 1;
                }
                Ok(()) => {
                    info!(
                        tenant = %record.tenant,
                        idempotency_key = %record.key,
                        "pending commit timed out"
                    );

                    report.timed_out += 1;

                    if let Some(reservation) = record.reservation {
                        if self.release(record.tenant, reservation).await? {
                            report.released += 1;
                        }
                    }
                }
                // Completed by the commit itself since the scan.
                Err(LedgerError::OutcomeMismatch) => {
                    debug!(
                        tenant = %record.tenant,
                        idempotency_key = %record.key,
                        "pending record already resolved"
                    );
                }
                Err(error) => return Err(error.into()),
            }
        }

        let retention_cutoff = cutoff(now, self.settings.retention);

        for order in self.orders.created_since(retention_cutoff).await? {
            if self
                .ledger
                .find(order.tenant, &order.idempotency_key)
                .await?
                .is_none()
            {
                let orphan = ReconcileError::OrphanOrder {
                    tenant: order.tenant,
                    order: order.uuid,
                    key: order.idempotency_key,
                };

                error!(error = %orphan, "orphaned order");

                report.orphans.push(orphan);
            }
        }

        report.purged = self.ledger.purge_expired(retention_cutoff).await?;

        Ok(report)
    }

    /// Release an abandoned attempt's reservation. Returns `false` when it was
    /// already gone.
    async fn release(
        &self,
        tenant: TenantUuid,
        reservation: ReservationUuid,
    ) -> Result<bool, ReconcileError> {
        match self.reservations.release(tenant, reservation).await {
            Ok(()) => {
                info!(%tenant, %reservation, "released reservation of abandoned commit");

                Ok(true)
            }
            Err(ReservationServiceError::NotFound(_)) => {
                warn!(%tenant, %reservation, "abandoned reservation already released");

                Ok(false)
            }
            Err(error) => Err(error.into()),
        }
    }
}

fn cutoff(now: Timestamp, age: Duration) -> Timestamp {
    SignedDuration::try_from(age)
        .ok()
        .and_then(|age| now.checked_sub(age).ok())
        .unwrap_or(Timestamp::MIN)
}

/// Run [`Reconciler::reconcile`] every `reconcile_interval` until the task is
/// aborted.
pub fn spawn_reconciler(reconciler: Reconciler) -> JoinHandle<()> {
    let period = reconciler
        .settings
        .reconcile_interval
        .max(Duration::from_millis(10));

    tokio::spawn(async move {
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;

            match reconciler.reconcile(Timestamp::now()).await {
                Ok(report) if report.is_quiet() => debug!("reconciliation pass found nothing"),
                Ok(report) => info!(
                    repaired = report.repaired,
                    timed_out = report.timed_out,
                    purged = report.purged,
                    orphans = report.orphans.len(),
                    "reconciliation pass complete"
                ),
                Err(error) => error!(%error, "reconciliation pass failed"),
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use testresult::TestResult;

    use crate::{
        domain::{
            checkout::{CheckoutError, CheckoutOrchestrator, CheckoutPorts, CheckoutService},
            ledger::{Begin, LedgerState},
            orders::{InMemoryOrdersRepository, records::OrderRecord},
        },
        test::{
            TestContext,
            helpers::{key, request},
        },
    };

    use super::*;

    fn reconciler(ctx: &TestContext) -> Reconciler {
        Reconciler::new(
            Arc::new(ctx.ledger.clone()),
            Arc::new(ctx.orders.clone()),
            Arc::new(ctx.reservations.clone()),
            CheckoutSettings::default(),
        )
    }

    /// Order storage slower than the orchestrator is willing to wait.
    struct SlowSave(InMemoryOrdersRepository);

    #[async_trait]
    impl OrdersRepository for SlowSave {
        async fn save(&self, order: OrderRecord) -> Result<OrderRecord, OrdersServiceError> {
            tokio::time::sleep(Duration::from_millis(200)).await;

            self.0.save(order).await
        }

        async fn load(
            &self,
            tenant: TenantUuid,
            order: OrderUuid,
        ) -> Result<OrderRecord, OrdersServiceError> {
            self.0.load(tenant, order).await
        }

        async fn find_by_idempotency_key(
            &self,
            tenant: TenantUuid,
            key: &IdempotencyKey,
        ) -> Result<Option<OrderRecord>, OrdersServiceError> {
            self.0.find_by_idempotency_key(tenant, key).await
        }

        async fn created_since(
            &self,
            since: Timestamp,
        ) -> Result<Vec<OrderRecord>, OrdersServiceError> {
            self.0.created_since(since).await
        }
    }

    fn later(by: SignedDuration) -> TestResult<Timestamp> {
        Ok(Timestamp::now().checked_add(by)?)
    }

    /// Claim `key` in the ledger as a commit that never finished.
    async fn abandon(ctx: &TestContext, idempotency_key: &str) -> TestResult {
        let fingerprint = request(&[("V1", 1)], &[], "pay_1").fingerprint()?;

        let begin = ctx
            .ledger
            .begin_or_rejoin(ctx.tenant_uuid, &key(idempotency_key), &fingerprint)
            .await?;

        assert_eq!(begin, Begin::Fresh);

        Ok(())
    }

    async fn save_order(ctx: &TestContext, idempotency_key: &str) -> TestResult<OrderRecord> {
        let preview = ctx
            .checkout
            .preview(ctx.tenant_uuid, request(&[("V1", 1)], &[], "pay_1"))
            .await?;

        Ok(ctx
            .orders
            .save(OrderRecord {
                uuid: OrderUuid::new(),
                tenant: ctx.tenant_uuid,
                idempotency_key: key(idempotency_key),
                line_items: preview.line_items.clone(),
                preview,
                payment_ref: "pay_1".to_string(),
                reservation: ReservationUuid::new(),
                created_at: Timestamp::now(),
            })
            .await?)
    }

    #[tokio::test]
    async fn pending_record_with_order_is_repaired() -> TestResult {
        let ctx = TestContext::new().await;

        abandon(&ctx, "k1").await?;
        let order = save_order(&ctx, "k1").await?;

        let report = reconciler(&ctx)
            .reconcile(later(SignedDuration::from_mins(1))?)
            .await?;

        assert_eq!(report.repaired, 1);
        assert_eq!(report.timed_out, 0);

        let record = ctx
            .ledger
            .find(ctx.tenant_uuid, &key("k1"))
            .await?
            .ok_or("no ledger record")?;

        assert_eq!(
            record.state,
            LedgerState::Completed {
                outcome: Outcome::Committed {
                    order: order.uuid,
                    preview: order.preview,
                }
            }
        );

        let replay = ctx
            .checkout
            .commit(ctx.tenant_uuid, key("k1"), request(&[("V1", 1)], &[], "pay_1"))
            .await?;

        assert!(replay.replayed);
        assert_eq!(replay.order_uuid, order.uuid);

        Ok(())
    }

    #[tokio::test]
    async fn pending_record_without_order_times_out() -> TestResult {
        let ctx = TestContext::new().await;

        abandon(&ctx, "k1").await?;

        let report = reconciler(&ctx)
            .reconcile(later(SignedDuration::from_mins(1))?)
            .await?;

        assert_eq!(report.timed_out, 1);

        let retried = ctx
            .checkout
            .commit(ctx.tenant_uuid, key("k1"), request(&[("V1", 1)], &[], "pay_1"))
            .await?;

        assert!(!retried.replayed);

        Ok(())
    }

    #[tokio::test]
    async fn timed_out_save_releases_its_reservation() -> TestResult {
        let ctx = TestContext::new().await;
        let tenant = ctx.tenant_uuid;
        let cart = request(&[("V1", 1)], &[], "pay_1");

        let slow = CheckoutOrchestrator::new(
            CheckoutPorts {
                orders: Arc::new(SlowSave(ctx.orders.clone())),
                ..ctx.ports()
            },
            CheckoutSettings {
                persistence_timeout: Duration::from_millis(20),
                ..CheckoutSettings::default()
            },
        );

        assert_eq!(
            slow.commit(tenant, key("k1"), cart.clone()).await,
            Err(CheckoutError::Timeout("order persistence".to_string()))
        );
        assert_eq!(ctx.reservations.open_reservations(tenant).await, 1);

        let report = reconciler(&ctx)
            .reconcile(later(SignedDuration::from_mins(1))?)
            .await?;

        assert_eq!(report.timed_out, 1);
        assert_eq!(report.released, 1);
        assert_eq!(ctx.reservations.open_reservations(tenant).await, 0);
        assert_eq!(ctx.inventory.level(tenant, &"V1".into()).await.available(), 10);

        let retried = ctx.checkout.commit(tenant, key("k1"), cart).await?;

        assert!(!retried.replayed);
        assert_eq!(ctx.reservations.open_reservations(tenant).await, 1);
        assert_eq!(ctx.inventory.level(tenant, &"V1".into()).await.available(), 9);

        Ok(())
    }

    #[tokio::test]
    async fn fresh_pending_record_is_left_alone() -> TestResult {
        let ctx = TestContext::new().await;

        abandon(&ctx, "k1").await?;

        let report = reconciler(&ctx).reconcile(Timestamp::now()).await?;

        assert!(report.is_quiet());
        assert_eq!(
            ctx.checkout
                .commit(ctx.tenant_uuid, key("k1"), request(&[("V1", 1)], &[], "pay_1"))
                .await,
            Err(CheckoutError::InProgress)
        );

        Ok(())
    }

    #[tokio::test]
    async fn order_without_ledger_record_is_reported() -> TestResult {
        let ctx = TestContext::new().await;
        let order = save_order(&ctx, "k1").await?;

        let report = reconciler(&ctx).reconcile(Timestamp::now()).await?;

        assert_eq!(
            report.orphans,
            vec![ReconcileError::OrphanOrder {
                tenant: ctx.tenant_uuid,
                order: order.uuid,
                key: key("k1"),
            }]
        );

        Ok(())
    }

    #[tokio::test]
    async fn completed_records_are_purged_after_retention() -> TestResult {
        let ctx = TestContext::new().await;

        ctx.checkout
            .commit(ctx.tenant_uuid, key("k1"), request(&[("V1", 1)], &[], "pay_1"))
            .await?;

        let report = reconciler(&ctx)
            .reconcile(later(SignedDuration::from_hours(25))?)
            .await?;

        assert_eq!(report.purged, 1);
        assert!(report.orphans.is_empty());
        assert!(ctx.ledger.find(ctx.tenant_uuid, &key("k1")).await?.is_none());

        Ok(())
    }
}
