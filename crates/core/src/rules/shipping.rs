//! Shipping Strategies

use crate::{
    money::{Money, MoneyError},
    rules::{ShippingContext, ShippingRule},
};

/// The same charge for every cart.
#[derive(Debug, Clone, Copy)]
pub struct FlatRateShipping {
    amount: Money,
}

impl FlatRateShipping {
    /// Charge `amount` for every cart.
    pub fn new(amount: Money) -> Self {
        Self { amount }
    }
}

impl ShippingRule for FlatRateShipping {
    fn shipping(&self, context: &ShippingContext<'_>) -> Result<Money, MoneyError> {
        context.goods_value.compare(&self.amount)?;

        Ok(self.amount)
    }
}

/// Free shipping once the discounted goods value reaches a threshold.
#[derive(Debug, Clone, Copy)]
pub struct FreeShippingOver {
    threshold: Money,
    otherwise: Money,
}

impl FreeShippingOver {
    /// Charge `otherwise` below `threshold`, nothing at or above it.
    pub fn new(threshold: Money, otherwise: Money) -> Self {
        Self {
            threshold,
            otherwise,
        }
    }
}

impl ShippingRule for FreeShippingOver {
    fn shipping(&self, context: &ShippingContext<'_>) -> Result<Money, MoneyError> {
        context.goods_value.compare(&self.otherwise)?;

        if context.goods_value.compare(&self.threshold)?.is_ge() {
            Ok(Money::zero(self.otherwise.currency()))
        } else {
            Ok(self.otherwise)
        }
    }
}

/// One weight band: carts weighing up to `up_to_grams` pay `price`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeightBand {
    /// Inclusive upper weight bound.
    pub up_to_grams: u64,

    /// Charge for carts in this band.
    pub price: Money,
}

/// Charges by total cart weight.
#[derive(Debug, Clone)]
pub struct WeightBandShipping {
    bands: Vec<WeightBand>,
    fallback: Money,
}

impl WeightBandShipping {
    /// Create a weight-banded rule. Carts heavier than every band pay `fallback`.
    pub fn new(bands: impl IntoIterator<Item = WeightBand>, fallback: Money) -> Self {
        let mut bands: Vec<_> = bands.into_iter().collect();

        bands.sort_by_key(|band| band.up_to_grams);

        Self { bands, fallback }
    }
}

impl ShippingRule for WeightBandShipping {
    fn shipping(&self, context: &ShippingContext<'_>) -> Result<Money, MoneyError> {
        let price = self
            .bands
            .iter()
            .find(|band| context.weight_grams <= band.up_to_grams)
            .map_or(self.fallback, |band| band.price);

        context.goods_value.compare(&price)?;

        Ok(price)
    }
}

#[cfg(test)]
mod tests {
    use rusty_money::iso::{GBP, USD};
    use testresult::TestResult;

    use crate::destination::Destination;

    use super::*;

    fn context(destination: &Destination, goods_minor: i64, weight_grams: u64) -> ShippingContext<'_> {
        ShippingContext {
            destination,
            goods_value: Money::from_minor(goods_minor, USD),
            weight_grams,
        }
    }

    #[test]
    fn flat_rate_is_constant() -> TestResult {
        let destination = Destination::country("US");
        let rule = FlatRateShipping::new(Money::from_minor(3_00, USD));

        assert_eq!(rule.shipping(&context(&destination, 1, 0))?, Money::from_minor(3_00, USD));
        assert_eq!(
            rule.shipping(&context(&destination, 1_000_00, 50_000))?,
            Money::from_minor(3_00, USD)
        );

        Ok(())
    }

    #[test]
    fn free_shipping_from_threshold() -> TestResult {
        let destination = Destination::country("US");
        let rule = FreeShippingOver::new(Money::from_minor(50_00, USD), Money::from_minor(4_99, USD));

        assert_eq!(
            rule.shipping(&context(&destination, 49_99, 0))?,
            Money::from_minor(4_99, USD)
        );
        assert!(rule.shipping(&context(&destination, 50_00, 0))?.is_zero());

        Ok(())
    }

    #[test]
    fn weight_bands_pick_the_first_fitting_band() -> TestResult {
        let destination = Destination::country("US");
        let rule = WeightBandShipping::new(
            [
                WeightBand {
                    up_to_grams: 5_000,
                    price: Money::from_minor(9_00, USD),
                },
                WeightBand {
                    up_to_grams: 1_000,
                    price: Money::from_minor(4_00, USD),
                },
            ],
            Money::from_minor(20_00, USD),
        );

        assert_eq!(rule.shipping(&context(&destination, 10_00, 1_000))?, Money::from_minor(4_00, USD));
        assert_eq!(rule.shipping(&context(&destination, 10_00, 1_001))?, Money::from_minor(9_00, USD));
        assert_eq!(rule.shipping(&context(&destination, 10_00, 9_999))?, Money::from_minor(20_00, USD));

        Ok(())
    }

    #[test]
    fn rule_in_other_currency_is_rejected() {
        let destination = Destination::country("US");
        let rule = FlatRateShipping::new(Money::from_minor(3_00, GBP));

        assert!(matches!(
            rule.shipping(&context(&destination, 10_00, 0)),
            Err(MoneyError::CurrencyMismatch { .. })
        ));
    }
}
