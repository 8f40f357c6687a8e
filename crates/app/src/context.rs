//! App Context

use std::sync::Arc;

use thiserror::Error;
use tracing::info;

use crate::{
    domain::{
        catalog::{CatalogService, InMemoryCatalogService},
        checkout::{
            CheckoutOrchestrator, CheckoutPorts, CheckoutService, CheckoutSettings, Reconciler,
        },
        discounts::{DiscountsService, InMemoryDiscountsService},
        ledger::{IdempotencyLedger, InMemoryIdempotencyLedger},
        orders::{InMemoryOrdersRepository, OrdersRepository},
        reservations::{InMemoryReservationService, Inventory, ReservationService},
        rules::{InMemoryPricingRulesService, PricingRulesService},
        tenants::records::TenantRecord,
    },
    fixtures::{FixtureError, Fixtures},
};

#[derive(Debug, Error)]
pub enum AppInitError {
    #[error("failed to load fixtures")]
    Fixtures(#[from] FixtureError),
}

#[derive(Clone)]
pub struct AppContext {
    pub checkout: Arc<dyn CheckoutService>,
    pub ledger: Arc<dyn IdempotencyLedger>,
    pub orders: Arc<dyn OrdersRepository>,
    pub reservations: Arc<dyn ReservationService>,
    pub tenants: Vec<TenantRecord>,
    pub settings: CheckoutSettings,
}

impl AppContext {
    /// Build an in-memory application context seeded from fixtures.
    ///
    /// # Errors
    ///
    /// Returns an error when a fixture tenant cannot be converted into catalog
    /// entries, discounts or pricing rules.
    pub async fn from_fixtures(
        fixtures: &Fixtures,
        settings: CheckoutSettings,
    ) -> Result<Self, AppInitError> {
        let inventory = Inventory::new();
        let catalog = InMemoryCatalogService::new(inventory.clone());
        let discounts = InMemoryDiscountsService::new();
        let rules = InMemoryPricingRulesService::new();
        let reservations = InMemoryReservationService::new(inventory.clone());

        for tenant in &fixtures.tenants {
            rules.insert(tenant.uuid, tenant.rules()?).await;

            for (variant, on_hand) in tenant.variants()? {
                inventory
                    .set_on_hand(tenant.uuid, variant.variant.clone(), on_hand)
                    .await;

                catalog.insert_variant(tenant.uuid, variant).await;
            }

            for discount in tenant.discounts()? {
                discounts.insert(tenant.uuid, discount).await;
            }

            for payment_ref in &tenant.declined_payment_refs {
                reservations
                    .decline_payment_ref(tenant.uuid, payment_ref.clone())
                    .await;
            }

            info!(
                tenant = %tenant.uuid,
                name = %tenant.name,
                variants = tenant.variants.len(),
                "seeded tenant"
            );
        }

        let ledger: Arc<dyn IdempotencyLedger> = Arc::new(InMemoryIdempotencyLedger::new());
        let orders: Arc<dyn OrdersRepository> = Arc::new(InMemoryOrdersRepository::new());
        let reservations: Arc<dyn ReservationService> = Arc::new(reservations);

        let ports = CheckoutPorts {
            catalog: Arc::new(catalog) as Arc<dyn CatalogService>,
            discounts: Arc::new(discounts) as Arc<dyn DiscountsService>,
            rules: Arc::new(rules) as Arc<dyn PricingRulesService>,
            reservations: Arc::clone(&reservations),
            ledger: Arc::clone(&ledger),
            orders: Arc::clone(&orders),
        };

        Ok(Self {
            checkout: Arc::new(CheckoutOrchestrator::new(ports, settings)),
            ledger,
            orders,
            reservations,
            tenants: fixtures.tenant_records(),
            settings,
        })
    }

    /// A reconciler over this context's ledger, orders and reservations.
    #[must_use]
    pub fn reconciler(&self) -> Reconciler {
        Reconciler::new(
            Arc::clone(&self.ledger),
            Arc::clone(&self.orders),
            Arc::clone(&self.reservations),
            self.settings,
        )
    }
}
