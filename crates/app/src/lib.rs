//! Tenant-scoped checkout services: pricing previews, idempotent commits and
//! ledger reconciliation.

pub mod context;
pub mod domain;
pub mod fixtures;
pub mod uuids;

#[cfg(test)]
mod test;
