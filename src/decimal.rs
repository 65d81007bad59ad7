//! Fixed-point decimal type with 2 decimal places precision.
//!
//! Uses `rust_decimal` internally with scale enforcement to match the
//! store's DECIMAL(10, 2) money columns without floating-point errors.

use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// A decimal type that maintains exactly 2 decimal places of precision.
///
/// This type wraps `rust_decimal::Decimal` and ensures consistent scale,
/// suitable for monetary values such as incomes. It round-trips through
/// SQLite as TEXT in its canonical two-place rendering.
///
/// # Examples
///
/// ```
/// use std::str::FromStr;
/// use user_ingest::Decimal2;
///
/// let income = Decimal2::from_str("2500.5").unwrap();
/// assert_eq!(income.to_string(), "2500.50");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct Decimal2(Decimal);

impl Decimal2 {
    /// The number of decimal places to maintain.
    pub const SCALE: u32 = 2;

    /// Zero value.
    pub const ZERO: Self = Decimal2(Decimal::ZERO);

    /// Creates a new `Decimal2` from a `Decimal`, normalizing to 2 decimal places.
    pub fn new(value: Decimal) -> Self {
        let mut normalized = value;
        normalized.rescale(Self::SCALE);
        Decimal2(normalized)
    }

    /// Returns `true` if this value is zero.
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Returns `true` if this value is below zero.
    pub fn is_negative(&self) -> bool {
        self.0.is_sign_negative() && !self.0.is_zero()
    }
}

impl FromStr for Decimal2 {
    type Err = rust_decimal::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let trimmed = s.trim();
        let decimal = Decimal::from_str(trimmed)?;
        Ok(Decimal2::new(decimal))
    }
}

impl fmt::Display for Decimal2 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

impl Serialize for Decimal2 {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&format!("{:.2}", self.0))
    }
}

impl<'de> Deserialize<'de> for Decimal2 {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Decimal2::from_str(&s).map_err(serde::de::Error::custom)
    }
}

impl ToSql for Decimal2 {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.to_string()))
    }
}

impl FromSql for Decimal2 {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let text = value.as_str()?;
        Decimal2::from_str(text).map_err(|e| FromSqlError::Other(Box::new(e)))
    }
}
