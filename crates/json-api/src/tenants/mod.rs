//! Tenants
//!
//! The upstream gateway resolves the tenant and forwards it in a header.

pub(crate) mod middleware;

pub(crate) const TENANT_HEADER: &str = "x-tenant-uuid";
