//! Exact money amounts using decimal arithmetic.
//!
//! Amounts are held as [`Decimal`] in dollars and persisted as integer cents,
//! so sums computed in SQL and sums computed here always agree.

use core::fmt;
use core::iter::Sum;
use core::ops::{Add, AddAssign, Neg, Sub};
use core::str::FromStr;

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Errors that can occur when parsing a [`Money`] amount.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum MoneyError {
    /// The input is empty.
    #[error("amount cannot be empty")]
    Empty,
    /// The input is not a number.
    #[error("'{0}' is not a valid amount")]
    Invalid(String),
    /// The input has more than two decimal places.
    #[error("amount cannot have more than two decimal places")]
    TooPrecise,
    /// The amount does not fit in the storage column.
    #[error("amount is out of range")]
    OutOfRange,
}

/// A signed amount of money with cent precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Money(Decimal);

impl Money {
    /// Zero dollars.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Create an amount from a whole number of cents.
    #[must_use]
    pub fn from_cents(cents: i64) -> Self {
        Self(Decimal::new(cents, 2))
    }

    /// Create an amount from a decimal dollar value.
    ///
    /// # Errors
    ///
    /// Returns `MoneyError::TooPrecise` if the value has sub-cent digits.
    pub fn from_decimal(amount: Decimal) -> Result<Self, MoneyError> {
        if amount.normalize().scale() > 2 {
            return Err(MoneyError::TooPrecise);
        }
        Ok(Self(amount))
    }

    /// Parse an amount typed into a form.
    ///
    /// Accepts an optional leading `$` and `,` thousands separators.
    ///
    /// # Errors
    ///
    /// Returns a [`MoneyError`] if the input is empty, not numeric, or has
    /// more than two decimal places.
    pub fn parse(input: &str) -> Result<Self, MoneyError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(MoneyError::Empty);
        }
        let (negative, unsigned) = trimmed
            .strip_prefix('-')
            .map_or((false, trimmed), |rest| (true, rest.trim_start()));
        let digits: String = unsigned
            .strip_prefix('$')
            .unwrap_or(unsigned)
            .chars()
            .filter(|c| *c != ',')
            .collect();
        let value = Decimal::from_str(&digits)
            .map_err(|_| MoneyError::Invalid(trimmed.to_owned()))?;
        let money = Self::from_decimal(value)?;
        Ok(if negative { -money } else { money })
    }

    /// The amount in whole cents.
    ///
    /// # Errors
    ///
    /// Returns `MoneyError::OutOfRange` if the amount does not fit in an `i64`.
    pub fn cents(&self) -> Result<i64, MoneyError> {
        self.0
            .round_dp(2)
            .checked_mul(Decimal::ONE_HUNDRED)
            .and_then(|cents| cents.to_i64())
            .ok_or(MoneyError::OutOfRange)
    }

    /// The amount in dollars.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Returns `true` if the amount is below zero.
    #[must_use]
    pub const fn is_negative(&self) -> bool {
        self.0.is_sign_negative() && !self.0.is_zero()
    }

    /// Returns `true` if the amount is exactly zero.
    #[must_use]
    pub const fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// This amount as a percentage of `total`, rounded to one decimal place.
    ///
    /// Returns zero when `total` is zero.
    #[must_use]
    pub fn percent_of(&self, total: Self) -> Decimal {
        if total.is_zero() {
            return Decimal::ZERO;
        }
        self.0
            .checked_div(total.0)
            .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
            .map_or(Decimal::ZERO, |pct| pct.round_dp(1))
    }

    /// The plain decimal form used in form inputs, e.g. `1234.50`.
    #[must_use]
    pub fn to_input_value(&self) -> String {
        format!("{:.2}", self.0)
    }
}

impl fmt::Display for Money {
    /// Formats as `$1,234.56`, with a leading `-` for negative amounts.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let plain = format!("{:.2}", self.0.abs());
        let (whole, fraction) = plain.split_once('.').unwrap_or((plain.as_str(), "00"));

        let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
        for (i, digit) in whole.chars().enumerate() {
            if i > 0 && (whole.len() - i) % 3 == 0 {
                grouped.push(',');
            }
            grouped.push(digit);
        }

        let sign = if self.is_negative() { "-" } else { "" };
        write!(f, "{sign}${grouped}.{fraction}")
    }
}

impl FromStr for Money {
    type Err = MoneyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Add for Money {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl Sub for Money {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self(self.0 - rhs.0)
    }
}

impl Neg for Money {
    type Output = Self;

    fn neg(self) -> Self::Output {
        Self(-self.0)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

impl Serialize for Money {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_input_value())
    }
}

/// Backups written by older exports carry amounts as JSON numbers, newer
/// ones as strings.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawMoney {
    Text(String),
    Integer(i64),
    Float(f64),
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match RawMoney::deserialize(deserializer)? {
            RawMoney::Text(s) => Self::parse(&s).map_err(serde::de::Error::custom),
            RawMoney::Integer(n) => Ok(Self(Decimal::from(n))),
            RawMoney::Float(f) => Decimal::try_from(f)
                .map(|d| Self(d.round_dp(2)))
                .map_err(serde::de::Error::custom),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_and_decorated() {
        assert_eq!(Money::parse("12").unwrap(), Money::from_cents(1200));
        assert_eq!(Money::parse("12.5").unwrap(), Money::from_cents(1250));
        assert_eq!(Money::parse(" $1,234.56 ").unwrap(), Money::from_cents(123_456));
        assert_eq!(Money::parse("-3.10").unwrap(), Money::from_cents(-310));
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        assert_eq!(Money::parse(""), Err(MoneyError::Empty));
        assert!(matches!(Money::parse("ten"), Err(MoneyError::Invalid(_))));
        assert_eq!(Money::parse("1.005"), Err(MoneyError::TooPrecise));
    }

    #[test]
    fn test_parse_allows_trailing_zeros_beyond_cents() {
        assert_eq!(Money::parse("4.500").unwrap(), Money::from_cents(450));
    }

    #[test]
    fn test_cents_roundtrip_with_storage() {
        let money = Money::parse("99.99").unwrap();
        assert_eq!(money.cents().unwrap(), 9999);
        assert_eq!(Money::from_cents(9999), money);
    }

    #[test]
    fn test_cents_out_of_range_is_an_error() {
        let huge = Money::parse("1000000000000000000000000000").unwrap();
        assert_eq!(huge.cents(), Err(MoneyError::OutOfRange));
        let past_i64 = Money::parse("100000000000000000").unwrap();
        assert_eq!(past_i64.cents(), Err(MoneyError::OutOfRange));
    }

    #[test]
    fn test_display_groups_thousands() {
        assert_eq!(Money::from_cents(0).to_string(), "$0.00");
        assert_eq!(Money::from_cents(5).to_string(), "$0.05");
        assert_eq!(Money::from_cents(100_000).to_string(), "$1,000.00");
        assert_eq!(Money::from_cents(123_456_789).to_string(), "$1,234,567.89");
        assert_eq!(Money::from_cents(-250_000).to_string(), "-$2,500.00");
    }

    #[test]
    fn test_arithmetic_and_sum() {
        let total: Money = [1050, 250, 700].into_iter().map(Money::from_cents).sum();
        assert_eq!(total, Money::from_cents(2000));
        assert_eq!(total - Money::from_cents(2500), Money::from_cents(-500));
        assert!((total - Money::from_cents(2500)).is_negative());
    }

    #[test]
    fn test_percent_of() {
        let spent = Money::from_cents(8_000);
        let budget = Money::from_cents(10_000);
        assert_eq!(spent.percent_of(budget), Decimal::from(80));
        assert_eq!(spent.percent_of(Money::ZERO), Decimal::ZERO);
        assert_eq!(
            Money::from_cents(1).percent_of(Money::from_cents(3)),
            Decimal::new(333, 1)
        );
    }

    #[test]
    fn test_serde_accepts_strings_and_numbers() {
        assert_eq!(serde_json::to_string(&Money::from_cents(1999)).unwrap(), "\"19.99\"");
        let from_text: Money = serde_json::from_str("\"19.99\"").unwrap();
        let from_float: Money = serde_json::from_str("19.99").unwrap();
        let from_int: Money = serde_json::from_str("20").unwrap();
        assert_eq!(from_text, Money::from_cents(1999));
        assert_eq!(from_float, Money::from_cents(1999));
        assert_eq!(from_int, Money::from_cents(2000));
    }
}
