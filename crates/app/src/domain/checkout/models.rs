//! Checkout Models

use std::time::Duration;

use checkout::{
    destination::Destination,
    discounts::DiscountCode,
    fingerprint::{Fingerprint, FingerprintInput, fingerprint},
    items::VariantId,
    preview::CheckoutPreview,
};
use serde::{Deserialize, Serialize};

use crate::domain::{checkout::errors::CheckoutError, orders::records::OrderUuid};

/// A requested cart line. Prices are never taken from the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    /// Variant to buy.
    pub variant: VariantId,

    /// Units wanted; must be positive.
    pub quantity: u32,
}

impl CartLine {
    /// A line for `quantity` units of `variant`.
    pub fn new(variant: impl Into<VariantId>, quantity: u32) -> Self {
        Self {
            variant: variant.into(),
            quantity,
        }
    }
}

/// A cart to preview or commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutRequest {
    /// Lines as submitted; a variant may appear more than once.
    pub lines: Vec<CartLine>,

    /// Codes applied in the order given.
    #[serde(default)]
    pub discount_codes: Vec<DiscountCode>,

    /// Where the order ships.
    pub destination: Destination,

    /// Opaque payment reference; required to commit.
    #[serde(default)]
    pub payment_ref: String,
}

impl CheckoutRequest {
    /// Reject requests that can never be priced.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::InvalidRequest`] for an empty cart, a zero
    /// quantity or a missing destination country.
    pub fn validate(&self) -> Result<(), CheckoutError> {
        if self.lines.is_empty() {
            return Err(CheckoutError::InvalidRequest("cart is empty".to_string()));
        }

        if let Some(line) = self.lines.iter().find(|line| line.quantity == 0) {
            return Err(CheckoutError::InvalidRequest(format!(
                "quantity for variant {} must be positive",
                line.variant
            )));
        }

        if self.destination.country.trim().is_empty() {
            return Err(CheckoutError::InvalidRequest(
                "destination country is required".to_string(),
            ));
        }

        Ok(())
    }

    /// Validate a request for commit, which also needs a payment reference.
    ///
    /// # Errors
    ///
    /// See [`CheckoutRequest::validate`]; additionally rejects a blank payment
    /// reference.
    pub fn validate_for_commit(&self) -> Result<(), CheckoutError> {
        self.validate()?;

        if self.payment_ref.trim().is_empty() {
            return Err(CheckoutError::InvalidRequest(
                "payment reference is required".to_string(),
            ));
        }

        Ok(())
    }

    /// Fingerprint of the request content.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::InvalidRequest`] for a zero quantity.
    pub fn fingerprint(&self) -> Result<Fingerprint, CheckoutError> {
        let lines: Vec<_> = self
            .lines
            .iter()
            .map(|line| (line.variant.clone(), line.quantity))
            .collect();

        Ok(fingerprint(&FingerprintInput {
            lines: &lines,
            discount_codes: &self.discount_codes,
            destination: &self.destination,
            payment_ref: &self.payment_ref,
        })?)
    }
}

/// Result of a successful commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitReceipt {
    pub order_uuid: OrderUuid,
    pub preview: CheckoutPreview,

    /// Set when the receipt was replayed from the ledger rather than produced
    /// by this call.
    pub replayed: bool,
}

/// Timeouts and housekeeping intervals for checkout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckoutSettings {
    /// Bound on each catalog, discount and rules lookup.
    pub lookup_timeout: Duration,

    /// Bound on taking or releasing a reservation.
    pub reservation_timeout: Duration,

    /// Bound on each ledger or order storage call.
    pub persistence_timeout: Duration,

    /// Age after which a pending ledger record is reconciled.
    pub pending_timeout: Duration,

    /// How long completed ledger records are kept.
    pub retention: Duration,

    /// Time between reconciliation passes.
    pub reconcile_interval: Duration,
}

impl Default for CheckoutSettings {
    fn default() -> Self {
        Self {
            lookup_timeout: Duration::from_secs(2),
            reservation_timeout: Duration::from_secs(5),
            persistence_timeout: Duration::from_secs(5),
            pending_timeout: Duration::from_secs(30),
            retention: Duration::from_secs(24 * 60 * 60),
            reconcile_interval: Duration::from_secs(10),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(lines: Vec<CartLine>, payment_ref: &str) -> CheckoutRequest {
        CheckoutRequest {
            lines,
            discount_codes: Vec::new(),
            destination: Destination::country("US"),
            payment_ref: payment_ref.to_string(),
        }
    }

    #[test]
    fn empty_cart_is_invalid() {
        assert_eq!(
            request(Vec::new(), "pay_1").validate(),
            Err(CheckoutError::InvalidRequest("cart is empty".to_string()))
        );
    }

    #[test]
    fn zero_quantity_is_invalid() {
        assert!(matches!(
            request(vec![CartLine::new("V1", 0)], "pay_1").validate(),
            Err(CheckoutError::InvalidRequest(_))
        ));
    }

    #[test]
    fn commit_needs_payment_reference() {
        let request = request(vec![CartLine::new("V1", 1)], "  ");

        assert_eq!(request.validate(), Ok(()));
        assert!(matches!(
            request.validate_for_commit(),
            Err(CheckoutError::InvalidRequest(_))
        ));
    }

    #[test]
    fn request_deserializes_with_defaults() -> testresult::TestResult {
        let request: CheckoutRequest = serde_json::from_value(serde_json::json!({
            "lines": [{"variant": "V1", "quantity": 2}],
            "destination": {"country": "US"},
        }))?;

        assert!(request.discount_codes.is_empty());
        assert!(request.payment_ref.is_empty());
        assert_eq!(request.lines, vec![CartLine::new("V1", 2)]);

        Ok(())
    }
}
