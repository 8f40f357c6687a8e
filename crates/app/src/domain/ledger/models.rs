//! Ledger Models

use std::fmt;

use checkout::{
    discounts::DiscountCode, fingerprint::Fingerprint, items::VariantId, preview::CheckoutPreview,
};
use jiff::Timestamp;
use serde::{Deserialize, Serialize};

use crate::domain::{
    ledger::errors::IdempotencyKeyError, orders::records::OrderUuid,
    reservations::models::ReservationUuid, tenants::records::TenantUuid,
};

/// Client-chosen key identifying one logical commit attempt within a tenant.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct IdempotencyKey(String);

impl IdempotencyKey {
    /// Longest accepted key.
    pub const MAX_LEN: usize = 255;

    /// Validate a key: 1 to 255 visible ASCII characters.
    ///
    /// # Errors
    ///
    /// Returns an [`IdempotencyKeyError`] describing the first violation.
    pub fn parse(key: &str) -> Result<Self, IdempotencyKeyError> {
        if key.is_empty() {
            return Err(IdempotencyKeyError::Empty);
        }

        if key.len() > Self::MAX_LEN {
            return Err(IdempotencyKeyError::TooLong { max: Self::MAX_LEN });
        }

        if !key.bytes().all(|byte| byte.is_ascii_graphic()) {
            return Err(IdempotencyKeyError::InvalidCharacter);
        }

        Ok(Self(key.to_string()))
    }

    /// The key as sent by the client.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for IdempotencyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for IdempotencyKey {
    type Error = IdempotencyKeyError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<IdempotencyKey> for String {
    fn from(key: IdempotencyKey) -> Self {
        key.0
    }
}

/// Why a commit failed, as remembered by the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FailureKind {
    /// The cart named a variant the catalog does not know.
    UnknownVariant {
        /// Variant that failed to resolve.
        variant: VariantId,
    },

    /// A discount code did not resolve.
    InvalidDiscountCode {
        /// Normalised code as submitted.
        code: DiscountCode,
    },

    /// Not enough stock to reserve a line.
    InsufficientStock {
        /// Variant that ran short.
        variant: VariantId,

        /// Quantity the cart asked for.
        requested: u32,

        /// Quantity that was available.
        available: u32,
    },

    /// The payment reference was declined.
    PaymentDeclined,

    /// The request could never be committed as sent.
    InvalidRequest {
        /// What was wrong with it.
        reason: String,
    },

    /// The pricing engine rejected the cart.
    Pricing {
        /// Engine error message.
        reason: String,
    },

    /// A collaborator did not answer in time. Transient.
    Timeout {
        /// Step that timed out.
        stage: String,
    },

    /// Order or ledger storage failed. Transient.
    Storage {
        /// Storage error message.
        reason: String,
    },
}

impl FailureKind {
    /// Transient failures may succeed if retried with the same request.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Timeout { .. } | Self::Storage { .. })
    }
}

/// Terminal result of a commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    /// An order was created.
    Committed {
        /// The created order.
        order: OrderUuid,

        /// Priced cart as committed, replayed verbatim.
        preview: CheckoutPreview,
    },

    /// The commit stopped without an order.
    Failed {
        /// Why it stopped.
        failure: FailureKind,
    },
}

impl Outcome {
    /// Outcome of a failed commit.
    #[must_use]
    pub fn failed(failure: FailureKind) -> Self {
        Self::Failed { failure }
    }

    /// Whether a retry with the same request should run the commit again.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Failed { failure } if failure.is_transient())
    }
}

/// Where a ledger record is in its lifecycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum LedgerState {
    /// A commit owns the key and has not finished.
    Pending,

    /// The commit finished.
    Completed {
        /// Terminal outcome.
        outcome: Outcome,
    },
}

/// One ledger entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdempotencyRecord {
    /// Tenant the key belongs to.
    pub tenant: TenantUuid,

    /// Client-chosen idempotency key.
    pub key: IdempotencyKey,

    /// Fingerprint of the first request accepted under the key.
    pub fingerprint: Fingerprint,

    /// Pending or completed with an outcome.
    pub state: LedgerState,

    /// Reservation held by the current attempt, once it has one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reservation: Option<ReservationUuid>,

    /// When the key was first claimed.
    pub created_at: Timestamp,

    /// Last state change.
    pub updated_at: Timestamp,
}

impl IdempotencyRecord {
    /// Whether the commit under this key has not finished.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        matches!(self.state, LedgerState::Pending)
    }
}

/// Result of [`begin_or_rejoin`](crate::domain::ledger::IdempotencyLedger::begin_or_rejoin).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Begin {
    /// The caller owns the commit and must drive it to an outcome.
    Fresh,

    /// Another request with the same key is still running.
    InProgress,

    /// The commit already finished; replay this outcome.
    Completed(Outcome),
}
