//! Discounts
//!
//! Fixed-amount discount codes applied to a subtotal in the order the customer
//! supplied them. Each discount is clamped to whatever balance remains, so the
//! discounted subtotal never drops below zero.

use std::fmt;

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use thiserror::Error;

use crate::money::{Money, MoneyError};

/// Errors specific to discount calculations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DiscountError {
    /// A discount code resolved to a negative amount.
    #[error("discount {0} has a negative amount")]
    NegativeAmount(DiscountCode),

    /// Wrapped money arithmetic or currency mismatch error.
    #[error(transparent)]
    Money(#[from] MoneyError),
}

/// A customer-facing discount code.
///
/// Codes are case-insensitive: `save5` and ` SAVE5 ` are the same code.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct DiscountCode(String);

impl DiscountCode {
    /// Normalise a code: surrounding whitespace trimmed, upper-cased.
    pub fn new(code: impl AsRef<str>) -> Self {
        Self(code.as_ref().trim().to_uppercase())
    }

    /// The code as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the code is blank.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for DiscountCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DiscountCode {
    fn from(code: &str) -> Self {
        Self::new(code)
    }
}

impl From<String> for DiscountCode {
    fn from(code: String) -> Self {
        Self::new(code)
    }
}

impl From<DiscountCode> for String {
    fn from(code: DiscountCode) -> Self {
        code.0
    }
}

/// A fixed-amount discount.
///
/// When resolved from a code, `amount` is the face value. Inside a
/// [`CheckoutPreview`](crate::preview::CheckoutPreview) it is the amount that was
/// actually applied after clamping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Discount {
    /// The code that produced the discount.
    pub code: DiscountCode,

    /// Amount subtracted from the subtotal.
    pub amount: Money,
}

impl Discount {
    /// Create a discount.
    pub fn new(code: impl Into<DiscountCode>, amount: Money) -> Self {
        Self {
            code: code.into(),
            amount,
        }
    }
}

/// Result of applying a sequence of discounts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscountApplication {
    /// Discounts with their clamped amounts, in application order.
    pub applied: SmallVec<[Discount; 4]>,

    /// Sum of the applied amounts.
    pub total: Money,

    /// Subtotal remaining after every discount.
    pub remaining: Money,
}

/// Apply `discounts` to `subtotal` in order, clamping each one to the balance
/// left by the discounts before it.
///
/// # Errors
///
/// Returns [`DiscountError::NegativeAmount`] for a negative discount, or a
/// money error on currency mismatch.
pub fn apply_discounts(
    subtotal: Money,
    discounts: &[Discount],
) -> Result<DiscountApplication, DiscountError> {
    let mut applied = SmallVec::with_capacity(discounts.len());
    let mut remaining = subtotal;
    let mut total = Money::zero(subtotal.currency());

    for discount in discounts {
        if discount.amount.is_negative() {
            return Err(DiscountError::NegativeAmount(discount.code.clone()));
        }

        let amount = discount.amount.min(remaining)?;

        remaining = remaining.subtract(amount)?;
        total = total.add(amount)?;

        applied.push(Discount::new(discount.code.clone(), amount));
    }

    Ok(DiscountApplication {
        applied,
        total,
        remaining,
    })
}

#[cfg(test)]
mod tests {
    use rusty_money::iso::{GBP, USD};
    use testresult::TestResult;

    use super::*;

    #[test]
    fn discounts_apply_in_order() -> TestResult {
        let result = apply_discounts(
            Money::from_minor(20_00, USD),
            &[
                Discount::new("SAVE5", Money::from_minor(5_00, USD)),
                Discount::new("SAVE2", Money::from_minor(2_00, USD)),
            ],
        )?;

        assert_eq!(result.remaining, Money::from_minor(13_00, USD));
        assert_eq!(result.total, Money::from_minor(7_00, USD));
        assert_eq!(result.applied.len(), 2);

        Ok(())
    }

    #[test]
    fn oversized_discount_is_clamped_to_zero() -> TestResult {
        let result = apply_discounts(
            Money::from_minor(20_00, USD),
            &[Discount::new("BIG", Money::from_minor(50_00, USD))],
        )?;

        assert!(result.remaining.is_zero());
        assert_eq!(result.total, Money::from_minor(20_00, USD));

        Ok(())
    }

    #[test]
    fn clamping_depends_on_order() -> TestResult {
        let subtotal = Money::from_minor(10_00, USD);
        let big = Discount::new("BIG", Money::from_minor(8_00, USD));
        let small = Discount::new("SMALL", Money::from_minor(5_00, USD));

        let big_first = apply_discounts(subtotal, &[big.clone(), small.clone()])?;
        let small_first = apply_discounts(subtotal, &[small, big])?;

        assert_eq!(
            big_first.applied.iter().map(|d| d.amount.minor_units()).collect::<Vec<_>>(),
            vec![8_00, 2_00]
        );
        assert_eq!(
            small_first.applied.iter().map(|d| d.amount.minor_units()).collect::<Vec<_>>(),
            vec![5_00, 5_00]
        );
        assert!(big_first.remaining.is_zero());
        assert!(small_first.remaining.is_zero());

        Ok(())
    }

    #[test]
    fn discount_in_other_currency_fails() {
        let result = apply_discounts(
            Money::from_minor(10_00, USD),
            &[Discount::new("POUND", Money::from_minor(1_00, GBP))],
        );

        assert!(matches!(
            result,
            Err(DiscountError::Money(MoneyError::CurrencyMismatch { .. }))
        ));
    }

    #[test]
    fn codes_are_normalised() -> TestResult {
        assert_eq!(DiscountCode::new(" save5 "), DiscountCode::from("SAVE5"));

        let code: DiscountCode = serde_json::from_str("\"welcome \"")?;

        assert_eq!(code.as_str(), "WELCOME");

        Ok(())
    }

    #[test]
    fn negative_discount_is_rejected() {
        let result = apply_discounts(
            Money::from_minor(10_00, USD),
            &[Discount::new("ODD", Money::from_minor(-1_00, USD))],
        );

        assert_eq!(result, Err(DiscountError::NegativeAmount("ODD".into())));
    }

    #[test]
    fn codes_are_trimmed() {
        assert_eq!(DiscountCode::new("  SAVE5 ").as_str(), "SAVE5");
        assert!(DiscountCode::new("   ").is_empty());
    }
}
