//! Monetary amounts.
//!
//! Amounts are exact decimals. They are stored as TEXT in SQLite so that no
//! precision is lost to floating point, and sent over JSON as numbers.

use std::{fmt::Display, str::FromStr};

use rusqlite::{
    Row,
    types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, Type, ValueRef},
};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use crate::Error;

/// The maximum number of digits after the decimal point, i.e. the minor unit
/// precision of the supported currencies.
pub const MAX_FRACTION_DIGITS: u32 = 2;

/// The largest amount accepted from clients, one quadrillion (10^15).
///
/// Keeps every sum of amounts well inside the range of [Decimal].
pub const MAX_AMOUNT: Decimal = Decimal::from_parts(0xA4C6_8000, 0x0003_8D7E, 0, false, 0);

/// The amount of money moved by a transaction.
///
/// Always greater than zero with at most [MAX_FRACTION_DIGITS] fractional
/// digits. Whether the money came in or went out is recorded separately by
/// the transaction kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Amount(Decimal);

impl Amount {
    /// Create an amount, checking that it is positive, at most [MAX_AMOUNT]
    /// and has no more than [MAX_FRACTION_DIGITS] fractional digits.
    ///
    /// # Errors
    ///
    /// Returns an [Error::Validation] for the `amount` field otherwise.
    pub fn new(value: Decimal) -> Result<Self, Error> {
        if value <= Decimal::ZERO {
            return Err(invalid_amount("amount must be greater than zero"));
        }

        if value > MAX_AMOUNT {
            return Err(invalid_amount(&format!("amount must be at most {MAX_AMOUNT}")));
        }

        if value.normalize().scale() > MAX_FRACTION_DIGITS {
            return Err(invalid_amount(&format!(
                "amount must have at most {MAX_FRACTION_DIGITS} decimal places"
            )));
        }

        Ok(Self(value))
    }

    /// Create an amount without any validation.
    ///
    /// The caller should ensure that `value` is greater than zero.
    pub fn new_unchecked(value: Decimal) -> Self {
        Self(value)
    }

    /// The underlying decimal value.
    pub fn as_decimal(&self) -> Decimal {
        self.0
    }

    /// Parse an amount from a JSON value as sent by a client.
    ///
    /// Only JSON numbers are accepted.
    pub fn from_json(value: &Value) -> Result<Self, Error> {
        match value {
            Value::Number(number) => Self::new(decimal_from_json_number(number)?),
            Value::Null => Err(invalid_amount("amount is required")),
            _ => Err(invalid_amount("amount must be a number")),
        }
    }
}

impl Display for Amount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Convert a JSON number into a decimal without going through `f64`
/// arithmetic.
///
/// # Errors
///
/// Returns an [Error::Validation] for the `amount` field if the number cannot be
/// represented as a decimal, e.g. it is too large.
pub fn decimal_from_json_number(number: &serde_json::Number) -> Result<Decimal, Error> {
    let text = number.to_string();

    Decimal::from_str(&text)
        .or_else(|_| Decimal::from_scientific(&text))
        .map_err(|_| invalid_amount("amount is not a representable number"))
}

fn invalid_amount(reason: &str) -> Error {
    Error::Validation {
        field: "amount",
        reason: reason.to_owned(),
    }
}

impl Serialize for Amount {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        rust_decimal::serde::float::serialize(&self.0, serializer)
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = rust_decimal::serde::float::deserialize(deserializer)?;

        Amount::new(value).map_err(serde::de::Error::custom)
    }
}

impl ToSql for Amount {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.0.to_string()))
    }
}

impl FromSql for Amount {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let text = value.as_str()?;

        Decimal::from_str(text)
            .map(Amount)
            .map_err(|error| FromSqlError::Other(Box::new(error)))
    }
}

/// Read a decimal stored as TEXT from column `index` of `row`.
///
/// # Errors
///
/// Returns a [rusqlite::Error::FromSqlConversionFailure] if the column does
/// not hold a decimal number.
pub fn get_decimal(row: &Row, index: usize) -> Result<Decimal, rusqlite::Error> {
    let text: String = row.get(index)?;

    Decimal::from_str(&text)
        .map_err(|error| rusqlite::Error::FromSqlConversionFailure(index, Type::Text, Box::new(error)))
}
