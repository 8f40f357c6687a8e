//! Checkout service.

use std::{future::Future, sync::Arc, time::Duration};

use async_trait::async_trait;
use checkout::{
    items::VariantId,
    preview::CheckoutPreview,
    pricing::{PricedLine, PricingInput, merge_lines, price},
};
use jiff::Timestamp;
use mockall::automock;
use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use tokio::time::timeout;
use tracing::{debug, error, info, warn};

use crate::domain::{
    catalog::{CatalogService, models::PricedVariant},
    checkout::{
        errors::CheckoutError,
        models::{CheckoutRequest, CheckoutSettings, CommitReceipt},
    },
    discounts::DiscountsService,
    ledger::{Begin, IdempotencyKey, IdempotencyLedger, Outcome},
    orders::{
        OrdersRepository,
        records::{OrderRecord, OrderUuid},
    },
    reservations::{ReservationService, models::ReservationUuid},
    rules::PricingRulesService,
    tenants::records::TenantUuid,
};

/// Collaborators the orchestrator drives.
#[derive(Clone)]
pub struct CheckoutPorts {
    pub catalog: Arc<dyn CatalogService>,
    pub discounts: Arc<dyn DiscountsService>,
    pub rules: Arc<dyn PricingRulesService>,
    pub reservations: Arc<dyn ReservationService>,
    pub ledger: Arc<dyn IdempotencyLedger>,
    pub orders: Arc<dyn OrdersRepository>,
}

/// A priced cart plus the merged lines used to reserve stock.
struct PricedCart {
    preview: CheckoutPreview,
    lines: SmallVec<[(VariantId, u32); 8]>,
}

/// How a fresh commit stopped short of an order.
enum Abort {
    /// Record the failure in the ledger.
    Fail(CheckoutError),

    /// Whether an order was written is unknown; leave the record pending.
    Unresolved(CheckoutError),
}

/// Prices carts and commits them through the idempotency ledger.
pub struct CheckoutOrchestrator {
    ports: CheckoutPorts,
    settings: CheckoutSettings,
}

impl CheckoutOrchestrator {
    #[must_use]
    pub fn new(ports: CheckoutPorts, settings: CheckoutSettings) -> Self {
        Self { ports, settings }
    }

    async fn price_request(
        &self,
        tenant: TenantUuid,
        request: &CheckoutRequest,
    ) -> Result<PricedCart, CheckoutError> {
        request.validate()?;

        let merged = merge_lines(
            request
                .lines
                .iter()
                .map(|line| (&line.variant, line.quantity)),
        )?;

        let lookup = self.settings.lookup_timeout;

        let rules = bounded(lookup, "pricing rules lookup", self.ports.rules.rules_for(tenant)).await?;

        let mut variants: FxHashMap<&VariantId, PricedVariant> = FxHashMap::default();

        for (variant, quantity) in &merged {
            let priced = bounded(
                lookup,
                "catalog lookup",
                self.ports.catalog.resolve_variant(tenant, variant),
            )
            .await?;

            if priced.available < *quantity {
                return Err(CheckoutError::InsufficientStock {
                    variant: variant.clone(),
                    requested: *quantity,
                    available: priced.available,
                });
            }

            variants.insert(variant, priced);
        }

        let lines = request
            .lines
            .iter()
            .map(|line| {
                variants
                    .get(&line.variant)
                    .map(|priced| PricedLine {
                        variant: line.variant.clone(),
                        quantity: line.quantity,
                        unit_price: priced.unit_price,
                        weight_grams: priced.weight_grams,
                    })
                    .ok_or_else(|| CheckoutError::UnknownVariant(line.variant.clone()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let mut discounts = Vec::with_capacity(request.discount_codes.len());

        for code in request.discount_codes.iter().filter(|code| !code.is_empty()) {
            discounts.push(
                bounded(
                    lookup,
                    "discount lookup",
                    self.ports.discounts.resolve_code(tenant, code),
                )
                .await?,
            );
        }

        let preview = price(&PricingInput {
            currency: rules.currency,
            lines: &lines,
            discounts: &discounts,
            tax: rules.tax.as_ref(),
            shipping: rules.shipping.as_ref(),
            destination: &request.destination,
        })?;

        Ok(PricedCart {
            preview,
            lines: merged,
        })
    }

    /// Drive a freshly claimed key to an order or a recorded failure.
    async fn execute(
        &self,
        tenant: TenantUuid,
        key: &IdempotencyKey,
        request: &CheckoutRequest,
    ) -> Result<CommitReceipt, CheckoutError> {
        match self.place_order(tenant, key, request).await {
            Ok(order) => {
                self.record(
                    tenant,
                    key,
                    Outcome::Committed {
                        order: order.uuid,
                        preview: order.preview.clone(),
                    },
                )
                .await;

                info!(
                    %tenant,
                    idempotency_key = %key,
                    order = %order.uuid,
                    total = %order.preview.total,
                    "order committed"
                );

                Ok(CommitReceipt {
                    order_uuid: order.uuid,
                    preview: order.preview,
                    replayed: false,
                })
            }
            Err(Abort::Fail(error)) => {
                info!(%tenant, idempotency_key = %key, %error, "commit failed");

                self.record(tenant, key, Outcome::failed(error.failure_kind())).await;

                Err(error)
            }
            Err(Abort::Unresolved(error)) => {
                warn!(
                    %tenant,
                    idempotency_key = %key,
                    %error,
                    "commit left pending for reconciliation"
                );

                Err(error)
            }
        }
    }

    async fn place_order(
        &self,
        tenant: TenantUuid,
        key: &IdempotencyKey,
        request: &CheckoutRequest,
    ) -> Result<OrderRecord, Abort> {
        let persistence = self.settings.persistence_timeout;

        // A retry after a transient failure may find the first attempt's order.
        let existing = bounded(
            persistence,
            "order lookup",
            self.ports.orders.find_by_idempotency_key(tenant, key),
        )
        .await
        .map_err(Abort::Fail)?;

        if let Some(order) = existing {
            debug!(
                %tenant,
                idempotency_key = %key,
                order = %order.uuid,
                "found order from an earlier attempt"
            );

            return Ok(order);
        }

        let priced = self
            .price_request(tenant, request)
            .await
            .map_err(Abort::Fail)?;

        let reservation = bounded(
            self.settings.reservation_timeout,
            "reservation",
            self.ports.reservations.reserve(
                tenant,
                &priced.lines,
                request.payment_ref.trim(),
                priced.preview.total,
            ),
        )
        .await
        .map_err(Abort::Fail)?;

        // The reconciler releases it if this attempt never completes.
        if let Err(error) = bounded(
            persistence,
            "ledger",
            self.ports
                .ledger
                .attach_reservation(tenant, key, reservation.uuid),
        )
        .await
        {
            self.release(tenant, reservation.uuid).await;

            return Err(Abort::Fail(error));
        }

        let order = OrderRecord {
            uuid: OrderUuid::new(),
            tenant,
            idempotency_key: key.clone(),
            line_items: priced.preview.line_items.clone(),
            preview: priced.preview,
            payment_ref: request.payment_ref.trim().to_string(),
            reservation: reservation.uuid,
            created_at: Timestamp::now(),
        };

        match bounded(persistence, "order persistence", self.ports.orders.save(order)).await {
            Ok(order) => Ok(order),
            Err(error @ CheckoutError::Timeout(_)) => Err(Abort::Unresolved(error)),
            Err(error) => {
                self.release(tenant, reservation.uuid).await;

                Err(Abort::Fail(error))
            }
        }
    }

    async fn record(&self, tenant: TenantUuid, key: &IdempotencyKey, outcome: Outcome) {
        let completed = bounded(
            self.settings.persistence_timeout,
            "ledger completion",
            self.ports.ledger.complete(tenant, key, outcome),
        )
        .await;

        if let Err(error) = completed {
            error!(%tenant, idempotency_key = %key, %error, "failed to record commit outcome");
        }
    }

    async fn release(&self, tenant: TenantUuid, reservation: ReservationUuid) {
        let released = bounded(
            self.settings.reservation_timeout,
            "reservation release",
            self.ports.reservations.release(tenant, reservation),
        )
        .await;

        if let Err(error) = released {
            error!(%tenant, %reservation, %error, "failed to release reservation");
        }
    }
}

#[async_trait]
impl CheckoutService for CheckoutOrchestrator {
    async fn preview(
        &self,
        tenant: TenantUuid,
        request: CheckoutRequest,
    ) -> Result<CheckoutPreview, CheckoutError> {
        let priced = self.price_request(tenant, &request).await?;

        Ok(priced.preview)
    }

    async fn commit(
        &self,
        tenant: TenantUuid,
        key: IdempotencyKey,
        request: CheckoutRequest,
    ) -> Result<CommitReceipt, CheckoutError> {
        request.validate_for_commit()?;

        let fingerprint = request.fingerprint()?;

        let begin = bounded(
            self.settings.persistence_timeout,
            "ledger",
            self.ports.ledger.begin_or_rejoin(tenant, &key, &fingerprint),
        )
        .await?;

        match begin {
            Begin::Fresh => self.execute(tenant, &key, &request).await,
            Begin::InProgress => Err(CheckoutError::InProgress),
            Begin::Completed(Outcome::Committed { order, preview }) => {
                debug!(%tenant, idempotency_key = %key, %order, "replaying committed order");

                Ok(CommitReceipt {
                    order_uuid: order,
                    preview,
                    replayed: true,
                })
            }
            Begin::Completed(Outcome::Failed { failure }) => {
                debug!(%tenant, idempotency_key = %key, "replaying failed commit");

                Err(CheckoutError::Replayed(Box::new(failure.into())))
            }
        }
    }

    async fn get_order(
        &self,
        tenant: TenantUuid,
        order: OrderUuid,
    ) -> Result<OrderRecord, CheckoutError> {
        bounded(
            self.settings.persistence_timeout,
            "order lookup",
            self.ports.orders.load(tenant, order),
        )
        .await
    }
}

/// Await `future`, giving up after `limit`.
async fn bounded<T, E>(
    limit: Duration,
    stage: &'static str,
    future: impl Future<Output = Result<T, E>>,
) -> Result<T, CheckoutError>
where
    CheckoutError: From<E>,
{
    match timeout(limit, future).await {
        Ok(result) => result.map_err(CheckoutError::from),
        Err(_elapsed) => {
            warn!(stage, ?limit, "checkout collaborator timed out");

            Err(CheckoutError::Timeout(stage.to_string()))
        }
    }
}

#[automock]
#[async_trait]
pub trait CheckoutService: Send + Sync {
    /// Price a cart without committing anything.
    async fn preview(
        &self,
        tenant: TenantUuid,
        request: CheckoutRequest,
    ) -> Result<CheckoutPreview, CheckoutError>;

    /// Commit a cart into an order at most once per idempotency key.
    async fn commit(
        &self,
        tenant: TenantUuid,
        key: IdempotencyKey,
        request: CheckoutRequest,
    ) -> Result<CommitReceipt, CheckoutError>;

    /// Load a committed order.
    async fn get_order(
        &self,
        tenant: TenantUuid,
        order: OrderUuid,
    ) -> Result<OrderRecord, CheckoutError>;
}
