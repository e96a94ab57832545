// Wire models shared by the backend and the paying client.
//
// Amounts travel as decimal strings ("49.99") in every payload.

use chrono::{DateTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Largest accepted amount in minor units (999 999.99).
pub const MAX_AMOUNT_MINOR: i64 = 99_999_999;

/// Why a textual amount was refused.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AmountError {
    #[error("amount is empty")]
    Empty,
    #[error("amount '{0}' is not a decimal number")]
    Malformed(String),
    #[error("amount '{0}' has more than two fractional digits")]
    TooManyFractionDigits(String),
    #[error("amount must be greater than zero")]
    NotPositive,
    #[error("amount exceeds the maximum of 999999.99")]
    TooLarge,
}

/// A positive currency value with at most two fractional digits.
///
/// Stored as minor units so arithmetic and comparisons stay exact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "AmountRepr", into = "String")]
#[cfg_attr(
    feature = "openapi",
    derive(utoipa::ToSchema),
    schema(value_type = String, example = "49.99")
)]
pub struct Amount(i64);

impl Amount {
    /// Builds an amount from minor units (cents, grosze, ...).
    pub fn from_minor_units(minor: i64) -> Result<Self, AmountError> {
        if minor <= 0 {
            return Err(AmountError::NotPositive);
        }
        if minor > MAX_AMOUNT_MINOR {
            return Err(AmountError::TooLarge);
        }
        Ok(Self(minor))
    }

    pub fn minor_units(&self) -> i64 {
        self.0
    }

    pub fn as_decimal(&self) -> Decimal {
        Decimal::new(self.0, 2)
    }
}

impl FromStr for Amount {
    type Err = AmountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(AmountError::Empty);
        }
        if trimmed.starts_with('-') {
            return Err(AmountError::NotPositive);
        }

        let (integral, fraction) = match trimmed.split_once('.') {
            Some((i, f)) => (i, Some(f)),
            None => (trimmed, None),
        };
        let all_digits = |part: &str| !part.is_empty() && part.bytes().all(|b| b.is_ascii_digit());
        if !all_digits(integral) {
            return Err(AmountError::Malformed(trimmed.to_string()));
        }
        if let Some(fraction) = fraction {
            if !all_digits(fraction) {
                return Err(AmountError::Malformed(trimmed.to_string()));
            }
            if fraction.len() > 2 {
                return Err(AmountError::TooManyFractionDigits(trimmed.to_string()));
            }
        }

        // Syntax is already checked, so a parse failure can only be an overflow.
        let value = Decimal::from_str(trimmed).map_err(|_| AmountError::TooLarge)?;
        let minor = value
            .checked_mul(Decimal::ONE_HUNDRED)
            .and_then(|cents| cents.to_i64())
            .ok_or(AmountError::TooLarge)?;
        Self::from_minor_units(minor)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_decimal())
    }
}

impl From<Amount> for String {
    fn from(amount: Amount) -> Self {
        amount.to_string()
    }
}

/// Accepts `"49.99"` as well as a bare JSON number `49.99`.
#[derive(Deserialize)]
#[serde(untagged)]
enum AmountRepr {
    Text(String),
    Number(serde_json::Number),
}

impl TryFrom<AmountRepr> for Amount {
    type Error = AmountError;

    fn try_from(repr: AmountRepr) -> Result<Self, Self::Error> {
        match repr {
            AmountRepr::Text(text) => text.parse(),
            AmountRepr::Number(number) => number.to_string().parse(),
        }
    }
}

/// Request from the client to the create-payment endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct PaymentRequest {
    #[cfg_attr(feature = "openapi", schema(example = 42))]
    pub event_id: i64,
    pub amount: Amount,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[cfg_attr(feature = "openapi", schema(example = "Pizza for the team"))]
    pub description: Option<String>,
}

/// Answer of the create-payment endpoint.
///
/// Well-formed answers carry exactly one of the two fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ClientSecretResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[cfg_attr(feature = "openapi", schema(example = "pi_3Nabc_secret_xyz"))]
    pub client_secret: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ClientSecretResponse {
    pub fn secret(client_secret: impl Into<String>) -> Self {
        Self {
            client_secret: Some(client_secret.into()),
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            client_secret: None,
            error: Some(message.into()),
        }
    }
}

/// An expense to attribute to an event after its payment went through.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ExpenseRecord {
    #[cfg_attr(feature = "openapi", schema(example = "Pizza for the team"))]
    pub description: String,
    pub amount: Amount,
    #[cfg_attr(feature = "openapi", schema(example = 42))]
    pub event_id: i64,
}

/// A stored expense as returned by the add-expense endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ExpenseDto {
    pub id: i64,
    pub description: String,
    pub amount: Amount,
    pub event_id: i64,
    pub created_at: DateTime<Utc>,
}
