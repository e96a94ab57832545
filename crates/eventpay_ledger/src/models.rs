use chrono::{DateTime, Utc};
use eventpay_common::Amount;
use serde::{Deserialize, Serialize};

/// An event whose participants share expenses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct LedgerEvent {
    pub id: i64,
    pub name: String,
    /// Closed events accept neither new payments nor new expenses.
    pub closed: bool,
}

/// Processor-side state of a payment intent, as last reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub enum PaymentStatus {
    Pending,
    Succeeded,
    Failed,
    Canceled,
}

/// A payment intent issued for an event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct PaymentRecord {
    pub payment_intent_id: String,
    pub event_id: i64,
    pub amount: Amount,
    pub status: PaymentStatus,
    pub updated_at: DateTime<Utc>,
}

impl PaymentRecord {
    pub fn pending(payment_intent_id: impl Into<String>, event_id: i64, amount: Amount) -> Self {
        Self {
            payment_intent_id: payment_intent_id.into(),
            event_id,
            amount,
            status: PaymentStatus::Pending,
            updated_at: Utc::now(),
        }
    }
}
