//! Line Items

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::money::{Money, MoneyError};

/// Opaque identifier of a purchasable product variant.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VariantId(String);

impl VariantId {
    /// Wrap a variant identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VariantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for VariantId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Errors building a line item.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LineItemError {
    /// Quantity must be a positive integer.
    #[error("quantity for variant {0} must be positive")]
    ZeroQuantity(VariantId),

    /// Line total arithmetic failed.
    #[error(transparent)]
    Money(#[from] MoneyError),
}

/// A priced cart line.
///
/// The line total is always recomputed from the unit price and quantity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    variant: VariantId,
    quantity: u32,
    unit_price: Money,
    line_total: Money,
}

impl LineItem {
    /// Create a line item, computing its total.
    ///
    /// # Errors
    ///
    /// Returns [`LineItemError::ZeroQuantity`] when `quantity` is zero, or a
    /// money error if the total overflows.
    pub fn new(variant: VariantId, quantity: u32, unit_price: Money) -> Result<Self, LineItemError> {
        if quantity == 0 {
            return Err(LineItemError::ZeroQuantity(variant));
        }

        let line_total = unit_price.multiply_by_quantity(quantity)?;

        Ok(Self {
            variant,
            quantity,
            unit_price,
            line_total,
        })
    }

    /// Variant purchased on this line.
    #[must_use]
    pub fn variant(&self) -> &VariantId {
        &self.variant
    }

    /// Quantity purchased.
    #[must_use]
    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    /// Price of a single unit.
    #[must_use]
    pub fn unit_price(&self) -> Money {
        self.unit_price
    }

    /// `unit_price * quantity`.
    #[must_use]
    pub fn line_total(&self) -> Money {
        self.line_total
    }

    /// Whether the stored total still equals `unit_price * quantity`.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        self.unit_price
            .multiply_by_quantity(self.quantity)
            .is_ok_and(|total| total == self.line_total)
    }
}

#[cfg(test)]
mod tests {
    use rusty_money::iso::USD;
    use testresult::TestResult;

    use super::*;

    #[test]
    fn line_total_is_unit_price_times_quantity() -> TestResult {
        let line = LineItem::new("V1".into(), 2, Money::from_minor(10_00, USD))?;

        assert_eq!(line.line_total(), Money::from_minor(20_00, USD));
        assert!(line.is_consistent());

        Ok(())
    }

    #[test]
    fn zero_quantity_is_rejected() {
        let result = LineItem::new("V1".into(), 0, Money::from_minor(10_00, USD));

        assert_eq!(result, Err(LineItemError::ZeroQuantity("V1".into())));
    }

    #[test]
    fn tampered_total_is_detected() -> TestResult {
        let line = LineItem::new("V1".into(), 2, Money::from_minor(10_00, USD))?;

        let mut json = serde_json::to_value(&line)?;
        json["line_total"]["amount"] = "25.00".into();

        let tampered: LineItem = serde_json::from_value(json)?;

        assert!(!tampered.is_consistent());

        Ok(())
    }
}
