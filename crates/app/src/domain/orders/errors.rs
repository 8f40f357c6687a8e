//! Orders repository errors.

use thiserror::Error;

use crate::domain::{ledger::IdempotencyKey, orders::records::OrderUuid};

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum OrdersServiceError {
    #[error("order {0} not found")]
    NotFound(OrderUuid),

    #[error("order {0} already exists")]
    AlreadyExists(OrderUuid),

    #[error("an order already exists for idempotency key {0}")]
    DuplicateIdempotencyKey(IdempotencyKey),

    #[error("storage error: {0}")]
    Storage(String),
}
