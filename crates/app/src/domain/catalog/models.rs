//! Catalog Models

use checkout::{items::VariantId, money::Money};

/// A variant's current price, weight and stock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PricedVariant {
    pub variant: VariantId,
    pub unit_price: Money,
    pub weight_grams: u32,
    pub available: u32,
}

/// Catalog data for a new variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewVariant {
    pub variant: VariantId,
    pub unit_price: Money,
    pub weight_grams: u32,
}
