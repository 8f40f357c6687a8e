//! Reservation service errors.

use checkout::items::VariantId;
use thiserror::Error;

use crate::domain::reservations::models::ReservationUuid;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ReservationServiceError {
    #[error("insufficient stock for {variant}: requested {requested}, available {available}")]
    InsufficientStock {
        variant: VariantId,
        requested: u32,
        available: u32,
    },

    #[error("payment {0} was declined")]
    PaymentDeclined(String),

    #[error("reservation {0} not found")]
    NotFound(ReservationUuid),
}
