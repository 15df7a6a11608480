use std::{
    fmt::Display,
    iter::Sum,
    ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign},
    str::FromStr,
};

use serde::{Deserialize, Serialize};
use sqlx::Type;
use thiserror::Error;

use crate::op;

pub const SETTLEMENT_CURRENCY_CODE: &str = "EUR";
pub const SETTLEMENT_CURRENCY_CODE_LOWER: &str = "eur";

//--------------------------------------        Money        ---------------------------------------------------------
/// An amount in the settlement currency, held as a whole number of cents.
#[derive(Debug, Clone, Copy, Default, Type, Ord, PartialOrd, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct Money(i64);

op!(binary Money, Add, add);
op!(binary Money, Sub, sub);
op!(inplace Money, AddAssign, add_assign);
op!(inplace Money, SubAssign, sub_assign);
op!(unary Money, Neg, neg);

impl Mul<i64> for Money {
    type Output = Self;

    /// Saturates at the `i64` bounds instead of overflowing.
    fn mul(self, rhs: i64) -> Self::Output {
        Self::from_cents(self.0.saturating_mul(rhs))
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Value cannot be represented as a currency amount: {0}")]
pub struct MoneyConversionError(String);

impl Money {
    pub const fn from_cents(cents: i64) -> Self {
        Self(cents)
    }

    pub const fn from_units(units: i64) -> Self {
        Self(units * 100)
    }

    pub fn cents(&self) -> i64 {
        self.0
    }

    pub fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// The amount as a decimal number with two fractional digits, as expected by JSON APIs that price in major units.
    #[allow(clippy::cast_precision_loss)]
    pub fn to_decimal(&self) -> f64 {
        self.0 as f64 / 100.0
    }
}

impl Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{sign}{}.{:02} {SETTLEMENT_CURRENCY_CODE}", abs / 100, abs % 100)
    }
}

/// Parses decimal amounts such as `"5"`, `"1.5"` or `"2.40"`. At most two fractional digits are accepted.
impl FromStr for Money {
    type Err = MoneyConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let (negative, digits) = match trimmed.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, trimmed),
        };
        let (whole, frac) = match digits.split_once('.') {
            Some((_, "")) => return Err(MoneyConversionError(format!("'{s}' has no digits after the decimal point"))),
            Some(parts) => parts,
            None => (digits, ""),
        };
        let all_digits = |v: &str| v.chars().all(|c| c.is_ascii_digit());
        if whole.is_empty() || !all_digits(whole) || !all_digits(frac) {
            return Err(MoneyConversionError(format!("'{s}' is not a decimal amount")));
        }
        if frac.len() > 2 {
            return Err(MoneyConversionError(format!("'{s}' has more than two decimal places")));
        }
        let whole = whole.parse::<i64>().map_err(|e| MoneyConversionError(format!("'{s}': {e}")))?;
        let frac = match frac.len() {
            0 => 0,
            1 => frac.parse::<i64>().map_err(|e| MoneyConversionError(e.to_string()))? * 10,
            _ => frac.parse::<i64>().map_err(|e| MoneyConversionError(e.to_string()))?,
        };
        let cents = whole
            .checked_mul(100)
            .and_then(|c| c.checked_add(frac))
            .ok_or_else(|| MoneyConversionError(format!("'{s}' is too large")))?;
        Ok(Self(if negative { -cents } else { cents }))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn parse_amounts() {
        assert_eq!("1.50".parse::<Money>().unwrap(), Money::from_cents(150));
        assert_eq!("1.5".parse::<Money>().unwrap(), Money::from_cents(150));
        assert_eq!("2".parse::<Money>().unwrap(), Money::from_units(2));
        assert_eq!(" 0.07 ".parse::<Money>().unwrap(), Money::from_cents(7));
        assert_eq!("-3.10".parse::<Money>().unwrap(), Money::from_cents(-310));
        assert!("1.505".parse::<Money>().is_err());
        assert!("abc".parse::<Money>().is_err());
        assert!(".5".parse::<Money>().is_err());
        assert!("1.".parse::<Money>().is_err());
        assert!("-1.".parse::<Money>().is_err());
        assert!("1..5".parse::<Money>().is_err());
        assert!("".parse::<Money>().is_err());
    }

    #[test]
    fn display() {
        assert_eq!(Money::from_cents(540).to_string(), "5.40 EUR");
        assert_eq!(Money::from_cents(7).to_string(), "0.07 EUR");
        assert_eq!(Money::from_cents(-250).to_string(), "-2.50 EUR");
    }

    #[test]
    fn arithmetic() {
        let total: Money = [Money::from_cents(150) * 2, Money::from_cents(240)].into_iter().sum();
        assert_eq!(total, Money::from_cents(540));
        let mut balance = Money::default();
        balance += Money::from_units(5);
        balance -= Money::from_cents(50);
        assert_eq!(balance, Money::from_cents(450));
        assert!((total.to_decimal() - 5.4).abs() < f64::EPSILON);
    }

    #[test]
    fn multiplication_saturates() {
        assert_eq!(Money::from_cents(i64::MAX / 2) * 3, Money::from_cents(i64::MAX));
        assert_eq!(Money::from_cents(-5) * i64::MAX, Money::from_cents(i64::MIN));
        assert_eq!(Money::from_cents(150) * 0, Money::default());
    }

    #[test]
    fn serializes_as_cents() {
        let json = serde_json::to_string(&Money::from_cents(540)).unwrap();
        assert_eq!(json, "540");
    }
}
