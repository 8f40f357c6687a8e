//! Checkout prelude.
//!
//! Convenience exports for common library consumers.

pub use crate::{
    destination::Destination,
    discounts::{Discount, DiscountCode, DiscountError, apply_discounts},
    fingerprint::{Fingerprint, FingerprintInput, fingerprint},
    items::{LineItem, LineItemError, VariantId},
    money::{Money, MoneyError, find_currency},
    preview::CheckoutPreview,
    pricing::{PricedLine, PricingError, PricingInput, merge_lines, price},
    rules::{
        DestinationTax, FlatRateShipping, FlatRateTax, FreeShippingOver, NoTax, ShippingContext,
        ShippingRule, TaxRule, WeightBand, WeightBandShipping,
    },
};
