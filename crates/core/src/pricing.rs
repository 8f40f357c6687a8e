//! Pricing Engine
//!
//! Turns resolved cart lines, discounts and tenant rules into a
//! [`CheckoutPreview`]. The engine is a pure function of its input: no clocks,
//! no I/O and no randomness, so pricing the same input twice yields identical
//! previews.

use rusty_money::iso::Currency;
use smallvec::SmallVec;
use thiserror::Error;

use crate::{
    destination::Destination,
    discounts::{Discount, DiscountError, apply_discounts},
    items::{LineItem, LineItemError, VariantId},
    money::{Money, MoneyError},
    preview::CheckoutPreview,
    rules::{ShippingContext, ShippingRule, TaxRule},
};

/// Errors that can occur while pricing a cart.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PricingError {
    /// The cart has no lines.
    #[error("cart is empty")]
    EmptyCart,

    /// A line has a zero quantity.
    #[error("quantity for variant {0} must be positive")]
    InvalidQuantity(VariantId),

    /// A discount could not be applied.
    #[error(transparent)]
    Discount(DiscountError),

    /// Money arithmetic failed, usually on mismatched currencies.
    #[error(transparent)]
    Money(#[from] MoneyError),
}

impl From<LineItemError> for PricingError {
    fn from(error: LineItemError) -> Self {
        match error {
            LineItemError::ZeroQuantity(variant) => Self::InvalidQuantity(variant),
            LineItemError::Money(error) => Self::Money(error),
        }
    }
}

impl From<DiscountError> for PricingError {
    fn from(error: DiscountError) -> Self {
        match error {
            DiscountError::Money(error) => Self::Money(error),
            error @ DiscountError::NegativeAmount(_) => Self::Discount(error),
        }
    }
}

/// A cart line whose price and weight have been looked up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PricedLine {
    /// Variant being purchased.
    pub variant: VariantId,

    /// Units requested.
    pub quantity: u32,

    /// Current catalog price of one unit.
    pub unit_price: Money,

    /// Weight of one unit.
    pub weight_grams: u32,
}

/// Everything the engine needs to price a cart.
#[derive(Debug, Clone, Copy)]
pub struct PricingInput<'a> {
    /// Tenant currency; every amount must be in it.
    pub currency: &'static Currency,

    /// Lines in client order.
    pub lines: &'a [PricedLine],

    /// Resolved discounts in client order.
    pub discounts: &'a [Discount],

    /// Tenant tax strategy.
    pub tax: &'a dyn TaxRule,

    /// Tenant shipping strategy.
    pub shipping: &'a dyn ShippingRule,

    /// Shipping destination.
    pub destination: &'a Destination,
}

/// Price a cart.
///
/// # Errors
///
/// Returns [`PricingError::EmptyCart`] for a cart with no lines,
/// [`PricingError::InvalidQuantity`] for a zero-quantity line and
/// [`PricingError::Money`] when any amount is in a currency other than
/// `input.currency` or arithmetic overflows.
pub fn price(input: &PricingInput<'_>) -> Result<CheckoutPreview, PricingError> {
    if input.lines.is_empty() {
        return Err(PricingError::EmptyCart);
    }

    let line_items = input
        .lines
        .iter()
        .map(|line| LineItem::new(line.variant.clone(), line.quantity, line.unit_price))
        .collect::<Result<Vec<_>, _>>()?;

    let subtotal = Money::sum(input.currency, line_items.iter().map(LineItem::line_total))?;

    let applied = apply_discounts(subtotal, input.discounts)?;

    let weight_grams = input
        .lines
        .iter()
        .map(|line| u64::from(line.weight_grams) * u64::from(line.quantity))
        .fold(0_u64, u64::saturating_add);

    let tax = input.tax.tax(applied.remaining, input.destination)?;

    let shipping = input.shipping.shipping(&ShippingContext {
        destination: input.destination,
        goods_value: applied.remaining,
        weight_grams,
    })?;

    let total = applied.remaining.add(tax)?.add(shipping)?;

    Ok(CheckoutPreview {
        subtotal,
        discounts: applied.applied.into_vec(),
        tax,
        shipping,
        total,
        currency: input.currency.iso_alpha_code.to_string(),
        line_items,
    })
}

/// Merge lines for the same variant, summing quantities, and sort by variant.
///
/// Used to compare carts independent of how the client ordered or split their
/// lines.
///
/// # Errors
///
/// Returns [`PricingError::InvalidQuantity`] for a zero-quantity line or one
/// whose merged quantity overflows.
pub fn merge_lines<'a, I>(lines: I) -> Result<SmallVec<[(VariantId, u32); 8]>, PricingError>
where
    I: IntoIterator<Item = (&'a VariantId, u32)>,
{
    let mut merged: SmallVec<[(VariantId, u32); 8]> = SmallVec::new();

    for (variant, quantity) in lines {
        if quantity == 0 {
            return Err(PricingError::InvalidQuantity(variant.clone()));
        }

        match merged.iter_mut().find(|(existing, _)| existing == variant) {
            Some((_, total)) => {
                *total = total
                    .checked_add(quantity)
                    .ok_or_else(|| PricingError::InvalidQuantity(variant.clone()))?;
            }
            None => merged.push((variant.clone(), quantity)),
        }
    }

    merged.sort_by(|(a, _), (b, _)| a.cmp(b));

    Ok(merged)
}
