//! Reservation Models

use checkout::{items::VariantId, money::Money};
use serde::{Deserialize, Serialize};

use crate::{domain::tenants::records::TenantUuid, uuids::TypedUuid};

/// Reservation UUID
pub type ReservationUuid = TypedUuid<Reservation>;

/// Stock held and payment authorised for a single commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reservation {
    pub uuid: ReservationUuid,
    pub tenant: TenantUuid,
    pub lines: Vec<(VariantId, u32)>,
    pub payment_ref: String,
    pub amount: Money,
}
