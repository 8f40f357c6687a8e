//! Money
//!
//! Exact currency amounts held as integer minor units of an ISO-4217 currency.
//! Sums and differences never round. The only rounding step is [`Money::percentage`]
//! (and [`Money::from_decimal`] when parsing), which rounds half-to-even at the
//! currency's minor-unit precision.

use std::{cmp::Ordering, fmt, str::FromStr};

use decimal_percentage::Percentage;
use rust_decimal::{
    Decimal, RoundingStrategy,
    prelude::{FromPrimitive, ToPrimitive},
};
use rusty_money::{Findable, Money as RustyMoney, iso::Currency};
use serde::{Deserialize, Deserializer, Serialize, Serializer, de};
use thiserror::Error;

/// Errors raised by money arithmetic.
///
/// Every variant indicates a caller bug or corrupt data, never a user-facing
/// condition.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum MoneyError {
    /// Two amounts in different currencies were combined.
    #[error("currency mismatch: expected {expected}, got {actual}")]
    CurrencyMismatch {
        /// Currency of the left-hand operand.
        expected: &'static str,

        /// Currency of the right-hand operand.
        actual: &'static str,
    },

    /// The currency code is not a known ISO-4217 code.
    #[error("unknown currency code {0:?}")]
    UnknownCurrency(String),

    /// The amount could not be parsed as a decimal.
    #[error("invalid amount {0:?}")]
    InvalidAmount(String),

    /// The result does not fit in the minor-unit range.
    #[error("money amount overflowed")]
    Overflow,
}

/// An exact amount of a single currency.
#[derive(Debug, Clone, Copy)]
pub struct Money {
    minor: i64,
    currency: &'static Currency,
}

impl Money {
    /// Create an amount from minor units (cents, pence, ...).
    #[must_use]
    pub const fn from_minor(minor: i64, currency: &'static Currency) -> Self {
        Self { minor, currency }
    }

    /// Zero in the given currency.
    #[must_use]
    pub const fn zero(currency: &'static Currency) -> Self {
        Self::from_minor(0, currency)
    }

    /// Create an amount from a decimal in major units, rounding half-to-even at
    /// the currency exponent.
    ///
    /// # Errors
    ///
    /// Returns [`MoneyError::Overflow`] if the amount does not fit in minor units.
    pub fn from_decimal(amount: Decimal, currency: &'static Currency) -> Result<Self, MoneyError> {
        let scale = 10_i64
            .checked_pow(currency.exponent)
            .and_then(Decimal::from_i64)
            .ok_or(MoneyError::Overflow)?;

        let minor = amount
            .checked_mul(scale)
            .ok_or(MoneyError::Overflow)?
            .round_dp_with_strategy(0, RoundingStrategy::MidpointNearestEven)
            .to_i64()
            .ok_or(MoneyError::Overflow)?;

        Ok(Self::from_minor(minor, currency))
    }

    /// Parse a major-unit amount string such as `"10.00"` in the currency
    /// identified by `code`.
    ///
    /// # Errors
    ///
    /// Returns an error if the code is unknown, the amount is not a decimal or
    /// it overflows.
    pub fn parse(amount: &str, code: &str) -> Result<Self, MoneyError> {
        let currency = find_currency(code)?;

        let amount = Decimal::from_str(amount.trim())
            .map_err(|_invalid| MoneyError::InvalidAmount(amount.to_string()))?;

        Self::from_decimal(amount, currency)
    }

    /// Amount in minor units.
    #[must_use]
    pub const fn minor_units(&self) -> i64 {
        self.minor
    }

    /// Currency of the amount.
    #[must_use]
    pub const fn currency(&self) -> &'static Currency {
        self.currency
    }

    /// ISO-4217 alphabetic code of the currency.
    #[must_use]
    pub fn currency_code(&self) -> &'static str {
        self.currency.iso_alpha_code
    }

    /// Amount in major units at exactly the currency's minor-unit scale.
    #[must_use]
    pub fn to_decimal(&self) -> Decimal {
        Decimal::new(self.minor, self.currency.exponent)
    }

    /// Whether the amount is exactly zero.
    #[must_use]
    pub const fn is_zero(&self) -> bool {
        self.minor == 0
    }

    /// Whether the amount is below zero.
    #[must_use]
    pub const fn is_negative(&self) -> bool {
        self.minor < 0
    }

    /// Add two amounts of the same currency.
    ///
    /// # Errors
    ///
    /// Returns [`MoneyError::CurrencyMismatch`] or [`MoneyError::Overflow`].
    pub fn add(self, other: Self) -> Result<Self, MoneyError> {
        self.ensure_same_currency(other)?;

        let minor = self.minor.checked_add(other.minor).ok_or(MoneyError::Overflow)?;

        Ok(Self::from_minor(minor, self.currency))
    }

    /// Subtract `other` from this amount.
    ///
    /// # Errors
    ///
    /// Returns [`MoneyError::CurrencyMismatch`] or [`MoneyError::Overflow`].
    pub fn subtract(self, other: Self) -> Result<Self, MoneyError> {
        self.ensure_same_currency(other)?;

        let minor = self.minor.checked_sub(other.minor).ok_or(MoneyError::Overflow)?;

        Ok(Self::from_minor(minor, self.currency))
    }

    /// Multiply by a whole quantity.
    ///
    /// # Errors
    ///
    /// Returns [`MoneyError::Overflow`] if the product does not fit.
    pub fn multiply_by_quantity(self, quantity: u32) -> Result<Self, MoneyError> {
        let minor = self
            .minor
            .checked_mul(i64::from(quantity))
            .ok_or(MoneyError::Overflow)?;

        Ok(Self::from_minor(minor, self.currency))
    }

    /// Compare two amounts of the same currency.
    ///
    /// # Errors
    ///
    /// Returns [`MoneyError::CurrencyMismatch`] when the currencies differ.
    pub fn compare(&self, other: &Self) -> Result<Ordering, MoneyError> {
        self.ensure_same_currency(*other)?;

        Ok(self.minor.cmp(&other.minor))
    }

    /// The smaller of two amounts of the same currency.
    ///
    /// # Errors
    ///
    /// Returns [`MoneyError::CurrencyMismatch`] when the currencies differ.
    pub fn min(self, other: Self) -> Result<Self, MoneyError> {
        Ok(match self.compare(&other)? {
            Ordering::Greater => other,
            Ordering::Less | Ordering::Equal => self,
        })
    }

    /// Apply a percentage to this amount, rounding half-to-even to whole minor
    /// units.
    ///
    /// # Errors
    ///
    /// Returns [`MoneyError::Overflow`] if the calculation cannot be represented.
    pub fn percentage(self, rate: Percentage) -> Result<Self, MoneyError> {
        let minor = Decimal::from_i64(self.minor).ok_or(MoneyError::Overflow)?;

        // `Percentage` only multiplies out into a `Decimal`; scaling ONE recovers the rate.
        let minor = (rate * Decimal::ONE)
            .checked_mul(minor)
            .ok_or(MoneyError::Overflow)?
            .round_dp_with_strategy(0, RoundingStrategy::MidpointNearestEven)
            .to_i64()
            .ok_or(MoneyError::Overflow)?;

        Ok(Self::from_minor(minor, self.currency))
    }

    /// Sum a sequence of amounts, starting from zero in `currency`.
    ///
    /// # Errors
    ///
    /// Returns the first currency mismatch or overflow encountered.
    pub fn sum<I>(currency: &'static Currency, amounts: I) -> Result<Self, MoneyError>
    where
        I: IntoIterator<Item = Self>,
    {
        amounts
            .into_iter()
            .try_fold(Self::zero(currency), Self::add)
    }

    fn same_currency(self, other: Self) -> bool {
        self.currency.iso_alpha_code == other.currency.iso_alpha_code
    }

    fn ensure_same_currency(self, other: Self) -> Result<(), MoneyError> {
        if self.same_currency(other) {
            Ok(())
        } else {
            Err(MoneyError::CurrencyMismatch {
                expected: self.currency.iso_alpha_code,
                actual: other.currency.iso_alpha_code,
            })
        }
    }
}

impl PartialEq for Money {
    fn eq(&self, other: &Self) -> bool {
        self.same_currency(*other) && self.minor == other.minor
    }
}

impl Eq for Money {}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&RustyMoney::from_minor(self.minor, self.currency), f)
    }
}

impl From<Money> for RustyMoney<'static, Currency> {
    fn from(money: Money) -> Self {
        RustyMoney::from_minor(money.minor, money.currency)
    }
}

/// Look up an ISO-4217 currency by its alphabetic code.
///
/// # Errors
///
/// Returns [`MoneyError::UnknownCurrency`] for unknown codes.
pub fn find_currency(code: &str) -> Result<&'static Currency, MoneyError> {
    Currency::find(code.trim()).ok_or_else(|| MoneyError::UnknownCurrency(code.to_string()))
}

#[derive(Serialize, Deserialize)]
struct MoneyRepr {
    amount: String,
    currency: String,
}

impl Serialize for Money {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        MoneyRepr {
            amount: self.to_decimal().to_string(),
            currency: self.currency_code().to_string(),
        }
        .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let repr = MoneyRepr::deserialize(deserializer)?;

        Self::parse(&repr.amount, &repr.currency).map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use rusty_money::iso::{GBP, JPY, USD};
    use testresult::TestResult;

    use super::*;

    #[test]
    fn add_and_subtract_are_exact() -> TestResult {
        let a = Money::from_minor(10_01, USD);
        let b = Money::from_minor(2_99, USD);

        assert_eq!(a.add(b)?, Money::from_minor(13_00, USD));
        assert_eq!(a.subtract(b)?, Money::from_minor(7_02, USD));

        Ok(())
    }

    #[test]
    fn mismatched_currencies_always_fail() {
        let usd = Money::from_minor(100, USD);
        let gbp = Money::from_minor(100, GBP);

        let mismatch = MoneyError::CurrencyMismatch {
            expected: "USD",
            actual: "GBP",
        };

        assert_eq!(usd.add(gbp), Err(mismatch.clone()));
        assert_eq!(usd.subtract(gbp), Err(mismatch.clone()));
        assert_eq!(usd.compare(&gbp), Err(mismatch.clone()));
        assert_eq!(usd.min(gbp), Err(mismatch));
    }

    #[test]
    fn multiply_by_quantity_scales_minor_units() -> TestResult {
        let unit = Money::from_minor(3_33, USD);

        assert_eq!(unit.multiply_by_quantity(3)?, Money::from_minor(9_99, USD));
        assert!(unit.multiply_by_quantity(0)?.is_zero());

        Ok(())
    }

    #[test]
    fn multiply_overflow_is_reported() {
        let unit = Money::from_minor(i64::MAX, USD);

        assert_eq!(unit.multiply_by_quantity(2), Err(MoneyError::Overflow));
    }

    #[test]
    fn percentage_rounds_half_to_even() -> TestResult {
        let rate = Percentage::from(Decimal::new(5, 1));

        // 0.5 * 5 = 2.5 -> 2, 0.5 * 7 = 3.5 -> 4
        assert_eq!(Money::from_minor(5, USD).percentage(rate)?.minor_units(), 2);
        assert_eq!(Money::from_minor(7, USD).percentage(rate)?.minor_units(), 4);

        Ok(())
    }

    #[test]
    fn percentage_of_post_discount_subtotal() -> TestResult {
        let rate = Percentage::from(Decimal::new(8, 2));

        assert_eq!(
            Money::from_minor(15_00, USD).percentage(rate)?,
            Money::from_minor(1_20, USD)
        );

        Ok(())
    }

    #[test]
    fn parse_respects_currency_exponent() -> TestResult {
        assert_eq!(Money::parse("10.00", "USD")?, Money::from_minor(10_00, USD));
        assert_eq!(Money::parse("1000", "JPY")?, Money::from_minor(1000, JPY));

        // 0.125 -> 12.5 minor -> 12 (half to even)
        assert_eq!(Money::parse("0.125", "USD")?, Money::from_minor(12, USD));

        Ok(())
    }

    #[test]
    fn parse_rejects_unknown_currency_and_garbage() {
        assert!(matches!(
            Money::parse("1.00", "XYZ1"),
            Err(MoneyError::UnknownCurrency(_))
        ));
        assert!(matches!(
            Money::parse("ten", "USD"),
            Err(MoneyError::InvalidAmount(_))
        ));
    }

    #[test]
    fn to_decimal_keeps_minor_unit_scale() {
        assert_eq!(Money::from_minor(19_20, USD).to_decimal().to_string(), "19.20");
        assert_eq!(Money::from_minor(5, JPY).to_decimal().to_string(), "5");
    }

    #[test]
    fn sum_of_empty_sequence_is_zero() -> TestResult {
        let total = Money::sum(USD, Vec::new())?;

        assert!(total.is_zero());

        Ok(())
    }

    #[test]
    fn serializes_amount_as_string() -> TestResult {
        let json = serde_json::to_string(&Money::from_minor(19_20, USD))?;

        assert_eq!(json, r#"{"amount":"19.20","currency":"USD"}"#);

        let back: Money = serde_json::from_str(&json)?;

        assert_eq!(back, Money::from_minor(19_20, USD));

        Ok(())
    }
}
