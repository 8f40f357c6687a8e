//! Discounts service.

use std::sync::Arc;

use async_trait::async_trait;
use checkout::discounts::{Discount, DiscountCode};
use mockall::automock;
use rustc_hash::FxHashMap;
use tokio::sync::RwLock;

use crate::domain::{discounts::errors::DiscountsServiceError, tenants::records::TenantUuid};

/// In-memory discount codes, keyed by normalised code.
#[derive(Debug, Clone, Default)]
pub struct InMemoryDiscountsService {
    codes: Arc<RwLock<FxHashMap<(TenantUuid, DiscountCode), Discount>>>,
}

impl InMemoryDiscountsService {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a discount code.
    pub async fn insert(&self, tenant: TenantUuid, discount: Discount) {
        self.codes
            .write()
            .await
            .insert((tenant, discount.code.clone()), discount);
    }
}

#[async_trait]
impl DiscountsService for InMemoryDiscountsService {
    async fn resolve_code(
        &self,
        tenant: TenantUuid,
        code: &DiscountCode,
    ) -> Result<Discount, DiscountsServiceError> {
        self.codes
            .read()
            .await
            .get(&(tenant, code.clone()))
            .cloned()
            .ok_or_else(|| DiscountsServiceError::InvalidCode(code.clone()))
    }
}

#[automock]
#[async_trait]
pub trait DiscountsService: Send + Sync {
    /// Resolve a customer-supplied code to its discount.
    async fn resolve_code(
        &self,
        tenant: TenantUuid,
        code: &DiscountCode,
    ) -> Result<Discount, DiscountsServiceError>;
}

#[cfg(test)]
mod tests {
    use checkout::money::Money;
    use rusty_money::iso::USD;
    use testresult::TestResult;

    use super::*;

    #[tokio::test]
    async fn codes_resolve_case_insensitively() -> TestResult {
        let tenant = TenantUuid::new();
        let service = InMemoryDiscountsService::new();
        let discount = Discount::new("SAVE5", Money::from_minor(5_00, USD));

        service.insert(tenant, discount.clone()).await;

        assert_eq!(service.resolve_code(tenant, &"save5".into()).await?, discount);

        Ok(())
    }

    #[tokio::test]
    async fn unknown_code_is_invalid() {
        let tenant = TenantUuid::new();
        let service = InMemoryDiscountsService::new();

        service
            .insert(tenant, Discount::new("SAVE5", Money::from_minor(5_00, USD)))
            .await;

        assert_eq!(
            service.resolve_code(TenantUuid::new(), &"SAVE5".into()).await,
            Err(DiscountsServiceError::InvalidCode("SAVE5".into()))
        );
    }
}
