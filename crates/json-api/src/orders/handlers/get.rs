//! Get Order Handler

use std::sync::Arc;

use checkout_app::domain::orders::records::{OrderRecord, OrderUuid};
use salvo::{
    oapi::{ToSchema, extract::PathParam},
    prelude::*,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    checkouts::{into_status_error, models::PreviewResponse},
    extensions::*,
    state::State,
};

/// Order Response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct OrderResponse {
    /// The unique identifier of the order
    pub uuid: Uuid,

    /// The idempotency key the order was committed under
    pub idempotency_key: String,

    /// Payment authorisation reference
    pub payment_ref: String,

    /// The priced order as committed
    pub preview: PreviewResponse,

    /// The date and time the order was created
    pub created_at: String,
}

impl From<OrderRecord> for OrderResponse {
    fn from(order: OrderRecord) -> Self {
        Self {
            uuid: order.uuid.into_uuid(),
            idempotency_key: order.idempotency_key.to_string(),
            payment_ref: order.payment_ref,
            preview: PreviewResponse::from(&order.preview),
            created_at: order.created_at.to_string(),
        }
    }
}

/// Get Order Handler
///
/// Returns a committed order.
#[endpoint(
    tags("orders"),
    summary = "Get Order",
    responses(
        (status_code = StatusCode::OK, description = "Order"),
        (status_code = StatusCode::NOT_FOUND, description = "No such order for this tenant"),
    ),
)]
pub(crate) async fn handler(
    order: PathParam<Uuid>,
    depot: &mut Depot,
) -> Result<Json<OrderResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let tenant = depot.tenant_uuid_or_401()?;

    let order = state
        .checkout
        .get_order(tenant, OrderUuid::from_uuid(order.into_inner()))
        .await
        .map_err(into_status_error)?;

    Ok(Json(order.into()))
}
