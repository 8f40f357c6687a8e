//! Errors

use checkout_app::domain::checkout::CheckoutError;
use salvo::http::StatusError;
use tracing::error;

pub(crate) fn into_status_error(error: CheckoutError) -> StatusError {
    match error {
        CheckoutError::InvalidRequest(_)
        | CheckoutError::InvalidIdempotencyKey(_)
        | CheckoutError::InvalidDiscountCode(_) => StatusError::bad_request().brief(error.to_string()),
        CheckoutError::UnknownVariant(_) | CheckoutError::OrderNotFound(_) => {
            StatusError::not_found().brief(error.to_string())
        }
        CheckoutError::InsufficientStock { .. } | CheckoutError::InProgress => {
            StatusError::conflict().brief(error.to_string())
        }
        CheckoutError::PaymentDeclined => StatusError::payment_required().brief(error.to_string()),
        CheckoutError::FingerprintConflict => {
            StatusError::unprocessable_entity().brief(error.to_string())
        }
        CheckoutError::UnknownTenant(_) => StatusError::unauthorized().brief("Unknown tenant"),
        CheckoutError::Timeout(_) => StatusError::gateway_timeout().brief(error.to_string()),
        CheckoutError::Storage(_) => {
            error!("checkout storage failure: {error}");

            StatusError::service_unavailable()
        }
        CheckoutError::Pricing(_) | CheckoutError::Ledger(_) => {
            error!("checkout failed: {error}");

            StatusError::internal_server_error()
        }
        CheckoutError::Replayed(original) => into_status_error(*original),
    }
}

#[cfg(test)]
mod tests {
    use checkout_app::domain::ledger::LedgerError;
    use salvo::http::StatusCode;

    use super::*;

    #[test]
    fn maps_errors_to_statuses() {
        let cases = [
            (CheckoutError::InvalidRequest("empty".to_string()), StatusCode::BAD_REQUEST),
            (CheckoutError::InvalidDiscountCode("X".into()), StatusCode::BAD_REQUEST),
            (CheckoutError::UnknownVariant("V9".into()), StatusCode::NOT_FOUND),
            (CheckoutError::InProgress, StatusCode::CONFLICT),
            (CheckoutError::PaymentDeclined, StatusCode::PAYMENT_REQUIRED),
            (
                CheckoutError::Replayed(Box::new(CheckoutError::PaymentDeclined)),
                StatusCode::PAYMENT_REQUIRED,
            ),
            (CheckoutError::FingerprintConflict, StatusCode::UNPROCESSABLE_ENTITY),
            (CheckoutError::Timeout("reservation".to_string()), StatusCode::GATEWAY_TIMEOUT),
            (CheckoutError::Storage("down".to_string()), StatusCode::SERVICE_UNAVAILABLE),
            (CheckoutError::Ledger(LedgerError::OutcomeMismatch), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (error, status) in cases {
            assert_eq!(into_status_error(error).code, status);
        }
    }
}
