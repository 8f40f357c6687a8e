//! Order Records

use checkout::{items::LineItem, preview::CheckoutPreview};
use jiff::Timestamp;
use serde::{Deserialize, Serialize};

use crate::{
    domain::{
        ledger::IdempotencyKey, reservations::models::ReservationUuid,
        tenants::records::TenantUuid,
    },
    uuids::TypedUuid,
};

/// Order UUID
pub type OrderUuid = TypedUuid<OrderRecord>;

/// A committed order. Immutable once saved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderRecord {
    /// Unique order identifier.
    pub uuid: OrderUuid,

    /// Owning tenant.
    pub tenant: TenantUuid,

    /// Key of the commit that created the order.
    pub idempotency_key: IdempotencyKey,

    /// Lines as priced at commit time.
    pub line_items: Vec<LineItem>,

    /// Pricing frozen at commit time.
    pub preview: CheckoutPreview,

    /// Payment reference the amount was authorised against.
    pub payment_ref: String,

    /// Stock and payment hold backing the order.
    pub reservation: ReservationUuid,

    /// Commit timestamp.
    pub created_at: Timestamp,
}
