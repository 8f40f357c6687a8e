//! Commit Checkout Handler

use std::sync::Arc;

use checkout_app::domain::{checkout::CheckoutError, ledger::IdempotencyKey};
use salvo::{
    http::header::{LOCATION, RETRY_AFTER},
    oapi::{ToSchema, extract::JsonBody},
    prelude::*,
};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::{
    checkouts::{
        into_status_error,
        models::{CheckoutRequestBody, PreviewResponse},
    },
    extensions::*,
    state::State,
};

pub(crate) const IDEMPOTENCY_KEY_HEADER: &str = "idempotency-key";
pub(crate) const REPLAYED_HEADER: &str = "idempotent-replayed";

/// Seconds a client should wait before retrying a retryable failure.
const RETRY_AFTER_SECONDS: &str = "1";

/// Commit Response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct CommitResponse {
    /// The created order
    pub order_uuid: Uuid,

    /// The priced order as committed
    pub preview: PreviewResponse,
}

/// Commit Checkout Handler
///
/// Commits a cart into an order at most once per `Idempotency-Key`. Retrying
/// with the same key and body returns the original order.
#[endpoint(
    tags("checkout"),
    summary = "Commit Checkout",
    responses(
        (status_code = StatusCode::CREATED, description = "Order committed or replayed"),
        (status_code = StatusCode::BAD_REQUEST, description = "Invalid cart, code or idempotency key"),
        (status_code = StatusCode::PAYMENT_REQUIRED, description = "Payment declined"),
        (status_code = StatusCode::CONFLICT, description = "Commit in progress or insufficient stock"),
        (status_code = StatusCode::UNPROCESSABLE_ENTITY, description = "Idempotency key reused with a different request"),
        (status_code = StatusCode::GATEWAY_TIMEOUT, description = "A collaborator timed out"),
    ),
)]
pub(crate) async fn handler(
    req: &mut Request,
    json: JsonBody<CheckoutRequestBody>,
    depot: &mut Depot,
    res: &mut Response,
) -> Result<Json<CommitResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let tenant = depot.tenant_uuid_or_401()?;

    let key = req
        .header::<String>(IDEMPOTENCY_KEY_HEADER)
        .ok_or_else(|| StatusError::bad_request().brief("Missing Idempotency-Key header"))?;

    let key = IdempotencyKey::parse(&key).or_400("Invalid Idempotency-Key header")?;

    let receipt = match state.checkout.commit(tenant, key, json.into_inner().into()).await {
        Ok(receipt) => receipt,
        Err(error) => {
            if error.is_retryable() {
                res.add_header(RETRY_AFTER, RETRY_AFTER_SECONDS, true)
                    .or_500("failed to set retry-after header")?;
            }

            if error.is_replayed() {
                res.add_header(REPLAYED_HEADER, "true", true)
                    .or_500("failed to set replay header")?;
            }

            if error == CheckoutError::InProgress {
                debug!(%tenant, "commit already in progress");
            }

            return Err(into_status_error(error));
        }
    };

    let order_uuid = receipt.order_uuid.into_uuid();

    if receipt.replayed {
        res.add_header(REPLAYED_HEADER, "true", true)
            .or_500("failed to set replay header")?;
    }

    res.add_header(LOCATION, format!("/orders/{order_uuid}"), true)
        .or_500("failed to set location header")?
        .status_code(StatusCode::CREATED);

    Ok(Json(CommitResponse {
        order_uuid,
        preview: PreviewResponse::from(&receipt.preview),
    }))
}
