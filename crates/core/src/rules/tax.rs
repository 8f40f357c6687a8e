//! Tax Strategies

use decimal_percentage::Percentage;
use rustc_hash::FxHashMap;

use crate::{
    destination::Destination,
    money::{Money, MoneyError},
    rules::TaxRule,
};

/// No tax is charged.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoTax;

impl TaxRule for NoTax {
    fn tax(&self, taxable: Money, _destination: &Destination) -> Result<Money, MoneyError> {
        Ok(Money::zero(taxable.currency()))
    }
}

/// A single rate applied everywhere.
#[derive(Debug, Clone, Copy)]
pub struct FlatRateTax {
    rate: Percentage,
}

impl FlatRateTax {
    /// Charge `rate` on every taxable amount.
    pub fn new(rate: Percentage) -> Self {
        Self { rate }
    }
}

impl TaxRule for FlatRateTax {
    fn tax(&self, taxable: Money, _destination: &Destination) -> Result<Money, MoneyError> {
        taxable.percentage(self.rate)
    }
}

/// Rates keyed by destination.
///
/// Keys are either a country (`"US"`) or a country and region (`"US-NY"`). The
/// most specific matching key wins; unmatched destinations pay `default_rate`.
#[derive(Debug, Clone)]
pub struct DestinationTax {
    default_rate: Percentage,
    by_region: FxHashMap<String, Percentage>,
}

impl DestinationTax {
    /// Create a destination-based rule with a fallback rate.
    pub fn new(default_rate: Percentage) -> Self {
        Self {
            default_rate,
            by_region: FxHashMap::default(),
        }
    }

    /// Add (or replace) the rate for a country or `country-region` key.
    #[must_use]
    pub fn with_rate(mut self, region: impl AsRef<str>, rate: Percentage) -> Self {
        self.by_region
            .insert(region.as_ref().trim().to_ascii_uppercase(), rate);

        self
    }

    fn rate_for(&self, destination: &Destination) -> &Percentage {
        destination
            .region_keys()
            .iter()
            .find_map(|key| self.by_region.get(key))
            .unwrap_or(&self.default_rate)
    }
}

impl TaxRule for DestinationTax {
    fn tax(&self, taxable: Money, destination: &Destination) -> Result<Money, MoneyError> {
        taxable.percentage(*self.rate_for(destination))
    }
}
