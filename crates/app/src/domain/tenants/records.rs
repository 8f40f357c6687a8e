//! Tenant Records

use serde::{Deserialize, Serialize};

use crate::uuids::TypedUuid;

/// Tenant UUID
pub type TenantUuid = TypedUuid<TenantRecord>;

/// Tenant Record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenantRecord {
    /// Unique tenant identifier.
    pub uuid: TenantUuid,

    /// Human-readable tenant name.
    pub name: String,
}
