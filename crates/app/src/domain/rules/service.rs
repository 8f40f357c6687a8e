//! Pricing rules service.

use std::sync::Arc;

use async_trait::async_trait;
use mockall::automock;
use rustc_hash::FxHashMap;
use tokio::sync::RwLock;

use crate::domain::{
    rules::{errors::PricingRulesServiceError, models::TenantRules},
    tenants::records::TenantUuid,
};

/// In-memory per-tenant rules.
#[derive(Debug, Clone, Default)]
pub struct InMemoryPricingRulesService {
    rules: Arc<RwLock<FxHashMap<TenantUuid, TenantRules>>>,
}

impl InMemoryPricingRulesService {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the rules for a tenant.
    pub async fn insert(&self, tenant: TenantUuid, rules: TenantRules) {
        self.rules.write().await.insert(tenant, rules);
    }
}

#[async_trait]
impl PricingRulesService for InMemoryPricingRulesService {
    async fn rules_for(&self, tenant: TenantUuid) -> Result<TenantRules, PricingRulesServiceError> {
        self.rules
            .read()
            .await
            .get(&tenant)
            .cloned()
            .ok_or(PricingRulesServiceError::UnknownTenant(tenant))
    }
}

#[automock]
#[async_trait]
pub trait PricingRulesService: Send + Sync {
    /// Currency, tax and shipping strategies for `tenant`.
    async fn rules_for(&self, tenant: TenantUuid) -> Result<TenantRules, PricingRulesServiceError>;
}
