//! Pricing rules service errors.

use thiserror::Error;

use crate::domain::tenants::records::TenantUuid;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PricingRulesServiceError {
    #[error("no pricing rules configured for tenant {0}")]
    UnknownTenant(TenantUuid),
}
