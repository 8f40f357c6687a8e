//! Tenant Pricing Rules

pub mod errors;
pub mod models;
pub mod service;

pub use errors::PricingRulesServiceError;
pub use service::*;
