//! Tenants

pub mod records;

pub use records::{TenantRecord, TenantUuid};
