//! Tenant Pricing Rules
//!
//! Tax and shipping are computed by strategy objects chosen per tenant. The
//! pricing engine only sees the [`TaxRule`] and [`ShippingRule`] traits.

use std::fmt;

use crate::{
    destination::Destination,
    money::{Money, MoneyError},
};

pub mod shipping;
pub mod tax;

pub use shipping::{FlatRateShipping, FreeShippingOver, WeightBand, WeightBandShipping};
pub use tax::{DestinationTax, FlatRateTax, NoTax};

/// Computes tax owed on a taxable amount.
pub trait TaxRule: fmt::Debug + Send + Sync {
    /// Tax due on `taxable` (the post-discount subtotal) for `destination`.
    ///
    /// # Errors
    ///
    /// Returns a [`MoneyError`] if the amount cannot be computed.
    fn tax(&self, taxable: Money, destination: &Destination) -> Result<Money, MoneyError>;
}

/// What a shipping rule gets to look at.
#[derive(Debug, Clone, Copy)]
pub struct ShippingContext<'a> {
    /// Where the order ships to.
    pub destination: &'a Destination,

    /// Value of the goods after discounts.
    pub goods_value: Money,

    /// Combined weight of every unit in the cart.
    pub weight_grams: u64,
}

/// Computes the shipping charge for a cart.
pub trait ShippingRule: fmt::Debug + Send + Sync {
    /// Shipping charge for the cart described by `context`.
    ///
    /// # Errors
    ///
    /// Returns a [`MoneyError`] if the charge cannot be computed, including when
    /// the rule's currency differs from the cart's.
    fn shipping(&self, context: &ShippingContext<'_>) -> Result<Money, MoneyError>;
}
