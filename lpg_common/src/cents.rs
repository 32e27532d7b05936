use std::{
    fmt::Display,
    iter::Sum,
    ops::{Add, AddAssign, Neg, Sub, SubAssign},
    str::FromStr,
};

use serde::{Deserialize, Serialize};
use sqlx::Type;
use thiserror::Error;

use crate::op;

/// Number of minor units in one major currency unit.
pub const CURRENCY_MINOR_UNITS: i64 = 100;

//--------------------------------------       Cents         ---------------------------------------------------------
/// An amount of money in minor currency units. Loyalty points are never represented as floating point values.
#[derive(Debug, Clone, Copy, Default, Type, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct Cents(i64);

op!(binary Cents, Add, add);
op!(binary Cents, Sub, sub);
op!(inplace Cents, AddAssign, add_assign);
op!(inplace Cents, SubAssign, sub_assign);
op!(unary Cents, Neg, neg);

impl Sum for Cents {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}

impl From<i64> for Cents {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl Display for Cents {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        let minor = CURRENCY_MINOR_UNITS.unsigned_abs();
        write!(f, "{sign}{}.{:02}", abs / minor, abs % minor)
    }
}

impl FromStr for Cents {
    type Err = BalanceParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_balance(s)
    }
}

impl Cents {
    pub fn value(&self) -> i64 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    pub fn is_negative(&self) -> bool {
        self.0 < 0
    }

    pub fn checked_add(self, rhs: Self) -> Option<Self> {
        self.0.checked_add(rhs.0).map(Self)
    }

    pub fn checked_sub(self, rhs: Self) -> Option<Self> {
        self.0.checked_sub(rhs.0).map(Self)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BalanceParseError {
    #[error("An empty string is not a monetary amount")]
    Empty,
    #[error("'{0}' has more than one decimal point")]
    TooManyParts(String),
    #[error("'{0}' contains characters other than decimal digits")]
    InvalidDigits(String),
    #[error("The fractional part of '{0}' must have one or two digits")]
    InvalidFraction(String),
    #[error("'{0}' cannot be represented in minor units")]
    Overflow(String),
}

/// Parses a non-negative decimal amount with up to two fractional digits into minor units.
///
/// The integer part is multiplied by 100 and a one-digit fraction is right-padded, so `"42.7"` is 4270 and
/// `"42.05"` is 4205. More than one decimal point, signs, whitespace or a fraction of three or more digits
/// (`"56.100"`) are rejected.
pub fn parse_balance(s: &str) -> Result<Cents, BalanceParseError> {
    if s.is_empty() {
        return Err(BalanceParseError::Empty);
    }
    let mut parts = s.split('.');
    let whole = parts.next().unwrap_or_default();
    let fraction = parts.next();
    if parts.next().is_some() {
        return Err(BalanceParseError::TooManyParts(s.to_string()));
    }
    let units = parse_digits(whole, s)?;
    let minor = match fraction {
        None => 0,
        Some(f) if f.is_empty() || f.len() > 2 => return Err(BalanceParseError::InvalidFraction(s.to_string())),
        Some(f) if f.len() == 1 => parse_digits(f, s)? * 10,
        Some(f) => parse_digits(f, s)?,
    };
    units
        .checked_mul(CURRENCY_MINOR_UNITS)
        .and_then(|v| v.checked_add(minor))
        .map(Cents)
        .ok_or_else(|| BalanceParseError::Overflow(s.to_string()))
}

fn parse_digits(part: &str, original: &str) -> Result<i64, BalanceParseError> {
    if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
        return Err(BalanceParseError::InvalidDigits(original.to_string()));
    }
    part.parse::<i64>().map_err(|_| BalanceParseError::Overflow(original.to_string()))
}
