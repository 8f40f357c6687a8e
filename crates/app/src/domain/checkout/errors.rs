//! Checkout errors.

use checkout::{discounts::DiscountCode, items::VariantId, pricing::PricingError};
use thiserror::Error;

use crate::domain::{
    catalog::CatalogServiceError,
    discounts::DiscountsServiceError,
    ledger::{FailureKind, IdempotencyKeyError, LedgerError},
    orders::{OrdersServiceError, records::OrderUuid},
    reservations::ReservationServiceError,
    rules::PricingRulesServiceError,
    tenants::records::TenantUuid,
};

/// Everything that can stop a preview or a commit.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CheckoutError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("invalid idempotency key: {0}")]
    InvalidIdempotencyKey(#[from] IdempotencyKeyError),

    #[error("unknown variant {0}")]
    UnknownVariant(VariantId),

    #[error("invalid discount code {0}")]
    InvalidDiscountCode(DiscountCode),

    #[error("insufficient stock for {variant}: requested {requested}, available {available}")]
    InsufficientStock {
        variant: VariantId,
        requested: u32,
        available: u32,
    },

    #[error("payment declined")]
    PaymentDeclined,

    #[error("a commit with this idempotency key is still in progress")]
    InProgress,

    #[error("idempotency key reused with a different request")]
    FingerprintConflict,

    #[error("{0} timed out")]
    Timeout(String),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("no pricing rules for tenant {0}")]
    UnknownTenant(TenantUuid),

    #[error("order {0} not found")]
    OrderNotFound(OrderUuid),

    #[error("pricing failed: {0}")]
    Pricing(String),

    #[error(transparent)]
    Ledger(LedgerError),

    /// A failure stored by an earlier commit with the same key, replayed.
    #[error(transparent)]
    Replayed(Box<CheckoutError>),
}

impl CheckoutError {
    /// Whether the same request may succeed if retried later.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::InProgress | Self::Timeout(_) | Self::Storage(_) => true,
            Self::Replayed(error) => error.is_retryable(),
            _ => false,
        }
    }

    /// Whether this failure was replayed from the ledger.
    #[must_use]
    pub fn is_replayed(&self) -> bool {
        matches!(self, Self::Replayed(_))
    }

    /// The underlying failure, replayed or not.
    #[must_use]
    pub fn into_original(self) -> Self {
        match self {
            Self::Replayed(error) => error.into_original(),
            error => error,
        }
    }

    /// The failure to remember in the ledger when a commit stops with this error.
    #[must_use]
    pub fn failure_kind(&self) -> FailureKind {
        match self {
            Self::UnknownVariant(variant) => FailureKind::UnknownVariant {
                variant: variant.clone(),
            },
            Self::InvalidDiscountCode(code) => FailureKind::InvalidDiscountCode { code: code.clone() },
            Self::InsufficientStock {
                variant,
                requested,
                available,
            } => FailureKind::InsufficientStock {
                variant: variant.clone(),
                requested: *requested,
                available: *available,
            },
            Self::PaymentDeclined => FailureKind::PaymentDeclined,
            Self::InvalidRequest(reason) => FailureKind::InvalidRequest {
                reason: reason.clone(),
            },
            Self::InvalidIdempotencyKey(error) => FailureKind::InvalidRequest {
                reason: error.to_string(),
            },
            Self::Pricing(reason) => FailureKind::Pricing {
                reason: reason.clone(),
            },
            Self::UnknownTenant(_) => FailureKind::Pricing {
                reason: self.to_string(),
            },
            Self::Timeout(stage) => FailureKind::Timeout {
                stage: stage.clone(),
            },
            Self::Storage(reason) => FailureKind::Storage {
                reason: reason.clone(),
            },
            Self::Replayed(error) => error.failure_kind(),
            Self::Ledger(_) | Self::InProgress | Self::FingerprintConflict | Self::OrderNotFound(_) => {
                FailureKind::Storage {
                    reason: self.to_string(),
                }
            }
        }
    }
}

impl From<FailureKind> for CheckoutError {
    fn from(failure: FailureKind) -> Self {
        match failure {
            FailureKind::UnknownVariant { variant } => Self::UnknownVariant(variant),
            FailureKind::InvalidDiscountCode { code } => Self::InvalidDiscountCode(code),
            FailureKind::InsufficientStock {
                variant,
                requested,
                available,
            } => Self::InsufficientStock {
                variant,
                requested,
                available,
            },
            FailureKind::PaymentDeclined => Self::PaymentDeclined,
            FailureKind::InvalidRequest { reason } => Self::InvalidRequest(reason),
            FailureKind::Pricing { reason } => Self::Pricing(reason),
            FailureKind::Timeout { stage } => Self::Timeout(stage),
            FailureKind::Storage { reason } => Self::Storage(reason),
        }
    }
}

impl From<PricingError> for CheckoutError {
    fn from(error: PricingError) -> Self {
        match error {
            PricingError::EmptyCart | PricingError::InvalidQuantity(_) => {
                Self::InvalidRequest(error.to_string())
            }
            PricingError::Discount(_) | PricingError::Money(_) => Self::Pricing(error.to_string()),
        }
    }
}

impl From<CatalogServiceError> for CheckoutError {
    fn from(error: CatalogServiceError) -> Self {
        match error {
            CatalogServiceError::UnknownVariant(variant) => Self::UnknownVariant(variant),
        }
    }
}

impl From<DiscountsServiceError> for CheckoutError {
    fn from(error: DiscountsServiceError) -> Self {
        match error {
            DiscountsServiceError::InvalidCode(code) => Self::InvalidDiscountCode(code),
        }
    }
}

impl From<PricingRulesServiceError> for CheckoutError {
    fn from(error: PricingRulesServiceError) -> Self {
        match error {
            PricingRulesServiceError::UnknownTenant(tenant) => Self::UnknownTenant(tenant),
        }
    }
}

impl From<ReservationServiceError> for CheckoutError {
    fn from(error: ReservationServiceError) -> Self {
        match error {
            ReservationServiceError::InsufficientStock {
                variant,
                requested,
                available,
            } => Self::InsufficientStock {
                variant,
                requested,
                available,
            },
            ReservationServiceError::PaymentDeclined(_) => Self::PaymentDeclined,
            ReservationServiceError::NotFound(_) => Self::Storage(error.to_string()),
        }
    }
}

impl From<OrdersServiceError> for CheckoutError {
    fn from(error: OrdersServiceError) -> Self {
        match error {
            OrdersServiceError::NotFound(order) => Self::OrderNotFound(order),
            OrdersServiceError::AlreadyExists(_)
            | OrdersServiceError::DuplicateIdempotencyKey(_)
            | OrdersServiceError::Storage(_) => Self::Storage(error.to_string()),
        }
    }
}

impl From<LedgerError> for CheckoutError {
    fn from(error: LedgerError) -> Self {
        match error {
            LedgerError::FingerprintConflict => Self::FingerprintConflict,
            LedgerError::NotFound | LedgerError::OutcomeMismatch => Self::Ledger(error),
        }
    }
}
