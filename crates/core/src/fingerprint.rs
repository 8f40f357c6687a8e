//! Request Fingerprints
//!
//! A fingerprint identifies the *content* of a commit request so a retried
//! idempotency key can be told apart from a key reused for a different cart.
//! Line order and line splitting do not matter; discount order does, because it
//! changes how clamping plays out.

use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::{
    destination::Destination,
    discounts::DiscountCode,
    items::VariantId,
    pricing::{PricingError, merge_lines},
};

/// Hex-encoded SHA-256 digest of a normalised commit request.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// The digest as lowercase hex.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Request fields that make up a fingerprint.
#[derive(Debug, Clone, Copy)]
pub struct FingerprintInput<'a> {
    /// Requested lines as `(variant, quantity)` in any order.
    pub lines: &'a [(VariantId, u32)],

    /// Discount codes in client order.
    pub discount_codes: &'a [DiscountCode],

    /// Shipping destination.
    pub destination: &'a Destination,

    /// Opaque payment reference.
    pub payment_ref: &'a str,
}

/// Compute the fingerprint of a commit request.
///
/// # Errors
///
/// Returns [`PricingError::InvalidQuantity`] when a line has a zero quantity.
pub fn fingerprint(input: &FingerprintInput<'_>) -> Result<Fingerprint, PricingError> {
    let lines = merge_lines(input.lines.iter().map(|(variant, quantity)| (variant, *quantity)))?;
    let destination = input.destination.normalised();

    let mut hasher = Sha256::new();

    hasher.update(b"lines");
    hasher.update((lines.len() as u64).to_be_bytes());

    for (variant, quantity) in &lines {
        update_field(&mut hasher, variant.as_str());
        hasher.update(quantity.to_be_bytes());
    }

    let codes: Vec<_> = input
        .discount_codes
        .iter()
        .filter(|code| !code.is_empty())
        .collect();

    hasher.update(b"discounts");
    hasher.update((codes.len() as u64).to_be_bytes());

    for code in codes {
        update_field(&mut hasher, code.as_str());
    }

    hasher.update(b"destination");
    update_field(&mut hasher, &destination.country);
    update_field(&mut hasher, destination.region.as_deref().unwrap_or_default());
    update_field(&mut hasher, destination.postal_code.as_deref().unwrap_or_default());

    hasher.update(b"payment");
    update_field(&mut hasher, input.payment_ref.trim());

    Ok(Fingerprint(format!("{:x}", hasher.finalize())))
}

// Length-prefix every field so adjacent values cannot run together.
fn update_field(hasher: &mut Sha256, value: &str) {
    hasher.update((value.len() as u64).to_be_bytes());
    hasher.update(value.as_bytes());
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    fn print(lines: &[(&str, u32)], codes: &[&str], destination: &Destination) -> TestResult<Fingerprint> {
        let lines: Vec<(VariantId, u32)> = lines
            .iter()
            .map(|(variant, quantity)| (VariantId::from(*variant), *quantity))
            .collect();

        let codes: Vec<DiscountCode> = codes.iter().copied().map(DiscountCode::from).collect();

        Ok(fingerprint(&FingerprintInput {
            lines: &lines,
            discount_codes: &codes,
            destination,
            payment_ref: "pay_1",
        })?)
    }

    #[test]
    fn line_order_and_splitting_do_not_matter() -> TestResult {
        let destination = Destination::country("US");

        assert_eq!(
            print(&[("V1", 2), ("V2", 1)], &[], &destination)?,
            print(&[("V2", 1), ("V1", 1), ("V1", 1)], &[], &destination)?
        );

        Ok(())
    }

    #[test]
    fn discount_order_matters() -> TestResult {
        let destination = Destination::country("US");

        assert_ne!(
            print(&[("V1", 1)], &["A", "B"], &destination)?,
            print(&[("V1", 1)], &["B", "A"], &destination)?
        );

        Ok(())
    }

    #[test]
    fn discount_whitespace_is_ignored() -> TestResult {
        let destination = Destination::country("US");

        assert_eq!(
            print(&[("V1", 1)], &[" SAVE5 "], &destination)?,
            print(&[("V1", 1)], &["SAVE5"], &destination)?
        );

        Ok(())
    }

    #[test]
    fn discount_case_is_ignored() -> TestResult {
        let destination = Destination::country("US");

        assert_eq!(
            print(&[("V1", 1)], &["save5"], &destination)?,
            print(&[("V1", 1)], &["SAVE5"], &destination)?
        );

        Ok(())
    }

    #[test]
    fn destination_case_is_normalised() -> TestResult {
        let raw = Destination {
            country: "us".to_string(),
            region: Some("ny".to_string()),
            postal_code: None,
        };

        assert_eq!(
            print(&[("V1", 1)], &[], &Destination::new("US", Some("NY"), None))?,
            print(&[("V1", 1)], &[], &raw)?
        );

        Ok(())
    }

    #[test]
    fn quantity_changes_the_fingerprint() -> TestResult {
        let destination = Destination::country("US");

        assert_ne!(
            print(&[("V1", 1)], &[], &destination)?,
            print(&[("V1", 2)], &[], &destination)?
        );

        Ok(())
    }

    #[test]
    fn fingerprint_is_hex_sha256() -> TestResult {
        let digest = print(&[("V1", 1)], &[], &Destination::country("US"))?;

        assert_eq!(digest.as_str().len(), 64);
        assert!(digest.as_str().chars().all(|c| c.is_ascii_hexdigit()));

        Ok(())
    }

    #[test]
    fn zero_quantity_is_rejected() {
        let lines = [(VariantId::from("V1"), 0)];

        let result = fingerprint(&FingerprintInput {
            lines: &lines,
            discount_codes: &[],
            destination: &Destination::country("US"),
            payment_ref: "pay_1",
        });

        assert_eq!(result, Err(PricingError::InvalidQuantity("V1".into())));
    }
}
