//! Fixtures
//!
//! Seed tenants, catalog, stock, discount codes and pricing rules from YAML.
//!
//! ```yaml
//! tenants:
//!   - uuid: 01964a4e-8b1c-7d2a-9f3e-2b7c4d5e6f70
//!     name: Demo Store
//!     currency: USD
//!     tax: { type: flat_rate, rate: "0.08" }
//!     shipping: { type: flat_rate, amount: "3.00" }
//!     variants:
//!       - { id: V1, price: "10.00", weight_grams: 250, stock: 100 }
//!     discounts:
//!       - { code: SAVE5, amount: "5.00" }
//! ```

use std::{collections::BTreeMap, fs, path::Path, str::FromStr, sync::Arc};

use checkout::{
    discounts::{Discount, DiscountCode},
    items::VariantId,
    money::{Money, MoneyError, find_currency},
    rules::{
        DestinationTax, FlatRateShipping, FlatRateTax, FreeShippingOver, NoTax, ShippingRule,
        TaxRule, WeightBand, WeightBandShipping,
    },
};
use decimal_percentage::Percentage;
use rust_decimal::Decimal;
use rusty_money::iso::Currency;
use serde::Deserialize;
use thiserror::Error;

use crate::domain::{
    catalog::models::NewVariant,
    rules::models::TenantRules,
    tenants::records::{TenantRecord, TenantUuid},
};

/// Fixture Parsing Errors
#[derive(Debug, Error)]
pub enum FixtureError {
    /// IO error reading a fixture file
    #[error("failed to read fixture file: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing error
    #[error("failed to parse YAML: {0}")]
    Yaml(#[from] serde_norway::Error),

    /// Invalid amount or currency for a tenant
    #[error("tenant {tenant}: {source}")]
    Money {
        /// Tenant being loaded
        tenant: TenantUuid,

        /// Underlying money error
        source: MoneyError,
    },

    /// Invalid tax rate
    #[error("tenant {tenant}: invalid rate {rate:?}")]
    InvalidRate {
        /// Tenant being loaded
        tenant: TenantUuid,

        /// Rate as written
        rate: String,
    },

    /// The same tenant appears twice
    #[error("tenant {0} is defined more than once")]
    DuplicateTenant(TenantUuid),
}

/// A set of tenants to seed.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Fixtures {
    /// Tenants in file order.
    #[serde(default)]
    pub tenants: Vec<TenantFixture>,
}

/// One tenant's catalog and rules.
#[derive(Debug, Clone, Deserialize)]
pub struct TenantFixture {
    pub uuid: TenantUuid,
    pub name: String,
    pub currency: String,

    #[serde(default)]
    pub tax: TaxFixture,

    #[serde(default)]
    pub shipping: ShippingFixture,

    #[serde(default)]
    pub variants: Vec<VariantFixture>,

    #[serde(default)]
    pub discounts: Vec<DiscountFixture>,

    /// Payment references the reservation service declines.
    #[serde(default)]
    pub declined_payment_refs: Vec<String>,
}

/// Tax strategy as written in a fixture. Rates are fractions: `"0.08"` is 8%.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TaxFixture {
    #[default]
    None,
    FlatRate {
        rate: String,
    },
    Destination {
        default_rate: String,
        #[serde(default)]
        by_region: BTreeMap<String, String>,
    },
}

/// Shipping strategy as written in a fixture.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ShippingFixture {
    FlatRate {
        amount: String,
    },
    FreeOver {
        threshold: String,
        otherwise: String,
    },
    WeightBands {
        bands: Vec<WeightBandFixture>,
        fallback: String,
    },
}

impl Default for ShippingFixture {
    fn default() -> Self {
        Self::FlatRate {
            amount: "0".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct WeightBandFixture {
    pub up_to_grams: u64,
    pub price: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VariantFixture {
    pub id: VariantId,
    pub price: String,

    #[serde(default)]
    pub weight_grams: u32,

    #[serde(default)]
    pub stock: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DiscountFixture {
    pub code: DiscountCode,
    pub amount: String,
}

impl Fixtures {
    /// Parse fixtures from YAML.
    ///
    /// # Errors
    ///
    /// Returns an error if the YAML is malformed, a tenant is defined twice, or
    /// any amount, currency or rate is invalid.
    pub fn from_yaml(yaml: &str) -> Result<Self, FixtureError> {
        let fixtures: Self = serde_norway::from_str(yaml)?;

        fixtures.validate()?;

        Ok(fixtures)
    }

    /// Read and parse a fixture file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, FixtureError> {
        let contents = fs::read_to_string(path)?;

        Self::from_yaml(&contents)
    }

    /// Tenant records for every fixture tenant.
    #[must_use]
    pub fn tenant_records(&self) -> Vec<TenantRecord> {
        self.tenants
            .iter()
            .map(|tenant| TenantRecord {
                uuid: tenant.uuid,
                name: tenant.name.clone(),
            })
            .collect()
    }

    fn validate(&self) -> Result<(), FixtureError> {
        let mut seen = Vec::with_capacity(self.tenants.len());

        for tenant in &self.tenants {
            if seen.contains(&tenant.uuid) {
                return Err(FixtureError::DuplicateTenant(tenant.uuid));
            }

            seen.push(tenant.uuid);

            tenant.rules()?;
            tenant.variants()?;
            tenant.discounts()?;
        }

        Ok(())
    }
}

impl TenantFixture {
    fn currency(&self) -> Result<&'static Currency, FixtureError> {
        find_currency(&self.currency).map_err(|source| self.money_error(source))
    }

    fn money(&self, amount: &str) -> Result<Money, FixtureError> {
        Money::parse(amount, &self.currency).map_err(|source| self.money_error(source))
    }

    fn money_error(&self, source: MoneyError) -> FixtureError {
        FixtureError::Money {
            tenant: self.uuid,
            source,
        }
    }

    fn rate(&self, rate: &str) -> Result<Percentage, FixtureError> {
        Decimal::from_str(rate.trim())
            .ok()
            .filter(|rate| !rate.is_sign_negative())
            .map(Percentage::from)
            .ok_or_else(|| FixtureError::InvalidRate {
                tenant: self.uuid,
                rate: rate.to_string(),
            })
    }

    /// Build the tenant's pricing rules.
    ///
    /// # Errors
    ///
    /// Returns an error for an unknown currency, a malformed amount or rate.
    pub fn rules(&self) -> Result<TenantRules, FixtureError> {
        let tax: Arc<dyn TaxRule> = match &self.tax {
            TaxFixture::None => Arc::new(NoTax),
            TaxFixture::FlatRate { rate } => Arc::new(FlatRateTax::new(self.rate(rate)?)),
            TaxFixture::Destination {
                default_rate,
                by_region,
            } => {
                let mut rule = DestinationTax::new(self.rate(default_rate)?);

                for (region, rate) in by_region {
                    rule = rule.with_rate(region, self.rate(rate)?);
                }

                Arc::new(rule)
            }
        };

        let shipping: Arc<dyn ShippingRule> = match &self.shipping {
            ShippingFixture::FlatRate { amount } => {
                Arc::new(FlatRateShipping::new(self.money(amount)?))
            }
            ShippingFixture::FreeOver {
                threshold,
                otherwise,
            } => Arc::new(FreeShippingOver::new(
                self.money(threshold)?,
                self.money(otherwise)?,
            )),
            ShippingFixture::WeightBands { bands, fallback } => {
                let bands = bands
                    .iter()
                    .map(|band| {
                        Ok(WeightBand {
                            up_to_grams: band.up_to_grams,
                            price: self.money(&band.price)?,
                        })
                    })
                    .collect::<Result<Vec<_>, FixtureError>>()?;

                Arc::new(WeightBandShipping::new(bands, self.money(fallback)?))
            }
        };

        Ok(TenantRules {
            currency: self.currency()?,
            tax,
            shipping,
        })
    }

    /// Catalog entries paired with their on-hand stock.
    ///
    /// # Errors
    ///
    /// Returns an error for a malformed price.
    pub fn variants(&self) -> Result<Vec<(NewVariant, u32)>, FixtureError> {
        self.variants
            .iter()
            .map(|variant| {
                Ok((
                    NewVariant {
                        variant: variant.id.clone(),
                        unit_price: self.money(&variant.price)?,
                        weight_grams: variant.weight_grams,
                    },
                    variant.stock,
                ))
            })
            .collect()
    }

    /// Discount codes.
    ///
    /// # Errors
    ///
    /// Returns an error for a malformed amount.
    pub fn discounts(&self) -> Result<Vec<Discount>, FixtureError> {
        self.discounts
            .iter()
            .map(|discount| Ok(Discount::new(discount.code.clone(), self.money(&discount.amount)?)))
            .collect()
    }
}
