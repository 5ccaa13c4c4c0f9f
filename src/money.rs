//! Exact monetary amounts with a fixed 4 decimal place scale.
//!
//! Wraps `rust_decimal` so that allocation arithmetic never touches binary
//! floating point. Construction refuses anything that would need rounding or
//! that exceeds [`Money::LIMIT`] in magnitude, so every sum and difference the
//! engine forms stays exact and well inside `Decimal`'s range.

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Sub};
use std::str::FromStr;
use thiserror::Error;

/// Why a value could not become `Money`.
#[derive(Error, Debug, Clone)]
pub enum MoneyError {
    #[error("invalid decimal: {0}")]
    Invalid(#[from] rust_decimal::Error),

    /// More fractional digits than `Money::SCALE`; rounding would invent or lose money.
    #[error("{0} has more than 4 decimal places")]
    TooPrecise(Decimal),

    #[error("{0} exceeds the supported magnitude of 10^15")]
    OutOfRange(Decimal),
}

/// A monetary amount held at exactly 4 decimal places.
///
/// Magnitude is capped at 10^15. A run would need more than 10^13 records
/// before any total could leave `Decimal`'s range.
///
/// # Examples
///
/// ```
/// use std::str::FromStr;
/// use repayment_waterfall::Money;
///
/// let due = Money::from_str("100").unwrap();
/// let paid = Money::from_str("40.5").unwrap();
/// assert_eq!((due - paid).to_string(), "59.5000");
///
/// assert!(Money::from_str("0.00004").is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Money(Decimal);

impl Money {
    /// Decimal places kept on every value.
    pub const SCALE: u32 = 4;

    /// Largest accepted magnitude, in whole units.
    pub const LIMIT: i64 = 1_000_000_000_000_000;

    pub const ZERO: Self = Money(Decimal::ZERO);

    /// Validates a `Decimal` and pads it to 4 places.
    pub fn new(value: Decimal) -> Result<Self, MoneyError> {
        if value.normalize().scale() > Self::SCALE {
            return Err(MoneyError::TooPrecise(value));
        }
        if value.abs() > Decimal::from(Self::LIMIT) {
            return Err(MoneyError::OutOfRange(value));
        }
        Ok(Money::scaled(value))
    }

    /// Pads to 4 places. Only for values already known to fit.
    fn scaled(value: Decimal) -> Self {
        let mut scaled = value;
        scaled.rescale(Self::SCALE);
        Money(scaled)
    }

    pub fn abs(self) -> Self {
        Money(self.0.abs())
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Strictly greater than zero.
    pub fn is_positive(&self) -> bool {
        self.0 > Decimal::ZERO
    }

    /// Strictly less than zero.
    pub fn is_negative(&self) -> bool {
        self.0 < Decimal::ZERO
    }
}

impl From<i32> for Money {
    fn from(value: i32) -> Self {
        Money::scaled(Decimal::from(value))
    }
}

impl FromStr for Money {
    type Err = MoneyError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let decimal = Decimal::from_str(s.trim())?;
        Money::new(decimal)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.4}", self.0)
    }
}

impl Add for Money {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Money::scaled(self.0 + rhs.0)
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl Sub for Money {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Money::scaled(self.0 - rhs.0)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Money::ZERO, |acc, m| acc + m)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

impl Serialize for Money {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Money::from_str(&s).map_err(serde::de::Error::custom)
    }
}
