//! Catalog service.

use std::sync::Arc;

use async_trait::async_trait;
use checkout::items::VariantId;
use mockall::automock;
use rustc_hash::FxHashMap;
use tokio::sync::RwLock;

use crate::domain::{
    catalog::{
        errors::CatalogServiceError,
        models::{NewVariant, PricedVariant},
    },
    reservations::Inventory,
    tenants::records::TenantUuid,
};

/// In-memory catalog reading availability from a shared [`Inventory`].
#[derive(Debug, Clone, Default)]
pub struct InMemoryCatalogService {
    variants: Arc<RwLock<FxHashMap<(TenantUuid, VariantId), NewVariant>>>,
    inventory: Inventory,
}

impl InMemoryCatalogService {
    #[must_use]
    pub fn new(inventory: Inventory) -> Self {
        Self {
            variants: Arc::default(),
            inventory,
        }
    }

    /// Add or replace a variant.
    pub async fn insert_variant(&self, tenant: TenantUuid, variant: NewVariant) {
        self.variants
            .write()
            .await
            .insert((tenant, variant.variant.clone()), variant);
    }
}

#[async_trait]
impl CatalogService for InMemoryCatalogService {
    async fn resolve_variant(
        &self,
        tenant: TenantUuid,
        variant: &VariantId,
    ) -> Result<PricedVariant, CatalogServiceError> {
        let found = self
            .variants
            .read()
            .await
            .get(&(tenant, variant.clone()))
            .cloned()
            .ok_or_else(|| CatalogServiceError::UnknownVariant(variant.clone()))?;

        let stock = self.inventory.level(tenant, variant).await;

        Ok(PricedVariant {
            variant: found.variant,
            unit_price: found.unit_price,
            weight_grams: found.weight_grams,
            available: stock.available(),
        })
    }
}

#[automock]
#[async_trait]
pub trait CatalogService: Send + Sync {
    /// Look up a variant's current price, weight and available stock.
    async fn resolve_variant(
        &self,
        tenant: TenantUuid,
        variant: &VariantId,
    ) -> Result<PricedVariant, CatalogServiceError>;
}

#[cfg(test)]
mod tests {
    use checkout::money::Money;
    use rusty_money::iso::USD;
    use testresult::TestResult;

    use super::*;

    #[tokio::test]
    async fn resolves_price_and_availability() -> TestResult {
        let tenant = TenantUuid::new();
        let inventory = Inventory::new();
        let catalog = InMemoryCatalogService::new(inventory.clone());

        catalog
            .insert_variant(
                tenant,
                NewVariant {
                    variant: "V1".into(),
                    unit_price: Money::from_minor(10_00, USD),
                    weight_grams: 250,
                },
            )
            .await;

        inventory.set_on_hand(tenant, "V1".into(), 7).await;

        let priced = catalog.resolve_variant(tenant, &"V1".into()).await?;

        assert_eq!(priced.unit_price, Money::from_minor(10_00, USD));
        assert_eq!(priced.available, 7);

        Ok(())
    }

    #[tokio::test]
    async fn variants_are_tenant_scoped() {
        let tenant = TenantUuid::new();
        let catalog = InMemoryCatalogService::default();

        catalog
            .insert_variant(
                tenant,
                NewVariant {
                    variant: "V1".into(),
                    unit_price: Money::from_minor(10_00, USD),
                    weight_grams: 0,
                },
            )
            .await;

        let result = catalog.resolve_variant(TenantUuid::new(), &"V1".into()).await;

        assert_eq!(result, Err(CatalogServiceError::UnknownVariant("V1".into())));
    }
}
