//! Preview Checkout Handler

use std::sync::Arc;

use salvo::{oapi::extract::JsonBody, prelude::*};

use crate::{
    checkouts::{
        into_status_error,
        models::{CheckoutRequestBody, PreviewResponse},
    },
    extensions::*,
    state::State,
};

/// Preview Checkout Handler
///
/// Prices a cart from current catalog prices, discount codes and the tenant's
/// tax and shipping rules. Nothing is reserved or stored.
#[endpoint(
    tags("checkout"),
    summary = "Preview Checkout",
    responses(
        (status_code = StatusCode::OK, description = "Priced cart"),
        (status_code = StatusCode::BAD_REQUEST, description = "Invalid cart or discount code"),
        (status_code = StatusCode::NOT_FOUND, description = "Unknown variant"),
        (status_code = StatusCode::CONFLICT, description = "Insufficient stock"),
        (status_code = StatusCode::GATEWAY_TIMEOUT, description = "A collaborator timed out"),
    ),
)]
pub(crate) async fn handler(
    json: JsonBody<CheckoutRequestBody>,
    depot: &mut Depot,
) -> Result<Json<PreviewResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let tenant = depot.tenant_uuid_or_401()?;

    let preview = state
        .checkout
        .preview(tenant, json.into_inner().into())
        .await
        .map_err(into_status_error)?;

    Ok(Json(PreviewResponse::from(&preview)))
}
