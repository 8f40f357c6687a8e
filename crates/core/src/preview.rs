//! Checkout Previews

use serde::{Deserialize, Serialize};

use crate::{
    discounts::Discount,
    items::LineItem,
    money::{Money, MoneyError},
};

/// A fully priced cart.
///
/// `total == subtotal - sum(discounts) + tax + shipping` holds exactly for every
/// preview produced by [`price`](crate::pricing::price).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutPreview {
    /// Sum of every line total.
    pub subtotal: Money,

    /// Discounts actually applied, in application order.
    pub discounts: Vec<Discount>,

    /// Tax charged on the discounted subtotal.
    pub tax: Money,

    /// Shipping charge.
    pub shipping: Money,

    /// Amount due.
    pub total: Money,

    /// ISO-4217 code shared by every amount above.
    pub currency: String,

    /// Priced lines in the order they were submitted.
    pub line_items: Vec<LineItem>,
}

impl CheckoutPreview {
    /// Total of the applied discounts.
    ///
    /// # Errors
    ///
    /// Returns a [`MoneyError`] on mismatched currencies or overflow.
    pub fn discount_total(&self) -> Result<Money, MoneyError> {
        Money::sum(
            self.subtotal.currency(),
            self.discounts.iter().map(|discount| discount.amount),
        )
    }

    /// Whether the total identity holds and every line total is consistent.
    ///
    /// Previews are plain data once serialized; this recheck catches tampering
    /// or corruption when one is read back.
    #[must_use]
    pub fn is_balanced(&self) -> bool {
        let expected = self.discount_total().and_then(|discounts| {
            self.subtotal
                .subtract(discounts)?
                .add(self.tax)?
                .add(self.shipping)
        });

        let lines = Money::sum(
            self.subtotal.currency(),
            self.line_items.iter().map(LineItem::line_total),
        );

        expected.is_ok_and(|expected| expected == self.total)
            && lines.is_ok_and(|lines| lines == self.subtotal)
            && self.line_items.iter().all(LineItem::is_consistent)
            && self.currency == self.subtotal.currency_code()
    }
}
