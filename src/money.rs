//! Decimal money amounts that are stored as integer cents.
//!
//! Floating point numbers are never used to add up money. Amounts are kept as
//! [Decimal] rounded to two decimal places and written to the database as an
//! `INTEGER` number of cents so that `SUM` in SQL is exact.

use std::{
    fmt::Display,
    iter::Sum,
    ops::{Add, AddAssign, Neg, Sub, SubAssign},
};

use rusqlite::types::{FromSql, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use rust_decimal::{Decimal, RoundingStrategy, prelude::ToPrimitive};
use serde::{Deserialize, Deserializer, Serialize};

use crate::Error;

/// An amount of money with a precision of one cent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct Money(Decimal);

impl Money {
    /// No money.
    pub const ZERO: Money = Money(Decimal::ZERO);

    /// The largest amount that can be stored, `i64::MAX` cents.
    pub const MAX: Money = Money(Decimal::from_parts(u32::MAX, i32::MAX as u32, 0, false, 2));

    /// Create an amount, rounding half away from zero to the nearest cent.
    pub fn new(amount: Decimal) -> Self {
        Self(amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero))
    }

    /// Create an amount from a whole number of cents.
    pub fn from_cents(cents: i64) -> Self {
        Self(Decimal::new(cents, 2))
    }

    /// The amount as a whole number of cents.
    ///
    /// # Errors
    ///
    /// Returns [Error::AmountOutOfRange] if the amount does not fit in an `i64`.
    pub fn cents(self) -> Result<i64, Error> {
        self.0
            .checked_mul(Decimal::ONE_HUNDRED)
            .and_then(|cents| cents.to_i64())
            .ok_or(Error::AmountOutOfRange(self.0))
    }

    /// Check that an amount entered by the user is greater than zero and can be stored.
    ///
    /// # Errors
    /// - [Error::NonPositiveAmount] if the amount is zero or negative,
    /// - [Error::AmountOutOfRange] if the amount is greater than [Money::MAX].
    pub fn validate_positive(self) -> Result<Self, Error> {
        if !self.is_positive() {
            return Err(Error::NonPositiveAmount(self));
        }

        if self > Money::MAX {
            return Err(Error::AmountOutOfRange(self.0));
        }

        Ok(self)
    }

    /// Multiply the amount by `factor`, rounding to the nearest cent.
    ///
    /// # Errors
    /// Returns [Error::AmountOutOfRange] if the result is too large for a [Decimal].
    pub fn checked_mul(self, factor: Decimal) -> Result<Self, Error> {
        self.0
            .checked_mul(factor)
            .map(Money::new)
            .ok_or(Error::AmountOutOfRange(self.0))
    }

    /// The underlying decimal value.
    pub fn as_decimal(self) -> Decimal {
        self.0
    }

    pub fn is_zero(self) -> bool {
        self.0.is_zero()
    }

    pub fn is_negative(self) -> bool {
        self.0.is_sign_negative() && !self.0.is_zero()
    }

    pub fn is_positive(self) -> bool {
        self.0.is_sign_positive() && !self.0.is_zero()
    }
}

impl From<Decimal> for Money {
    fn from(value: Decimal) -> Self {
        Self::new(value)
    }
}

impl Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

// Amounts typed into forms may have more than two decimal places, so they go
// through `Money::new` to be rounded.
impl<'de> Deserialize<'de> for Money {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        <Decimal as Deserialize>::deserialize(deserializer).map(Money::new)
    }
}

impl Add for Money {
    type Output = Money;

    fn add(self, rhs: Self) -> Self::Output {
        Money(self.0 + rhs.0)
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl Sub for Money {
    type Output = Money;

    fn sub(self, rhs: Self) -> Self::Output {
        Money(self.0 - rhs.0)
    }
}

impl SubAssign for Money {
    fn sub_assign(&mut self, rhs: Self) {
        self.0 -= rhs.0;
    }
}

impl Neg for Money {
    type Output = Money;

    fn neg(self) -> Self::Output {
        Money(-self.0)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Money::ZERO, Add::add)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

impl ToSql for Money {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        let cents = self
            .cents()
            .map_err(|error| rusqlite::Error::ToSqlConversionFailure(Box::new(error)))?;

        Ok(ToSqlOutput::from(cents))
    }
}

impl FromSql for Money {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        i64::column_result(value).map(Money::from_cents)
    }
}
