//! Pricing Rule Models

use std::sync::Arc;

use checkout::rules::{ShippingRule, TaxRule};
use rusty_money::iso::Currency;

/// Currency and tax/shipping strategies configured for a tenant.
#[derive(Debug, Clone)]
pub struct TenantRules {
    pub currency: &'static Currency,
    pub tax: Arc<dyn TaxRule>,
    pub shipping: Arc<dyn ShippingRule>,
}
