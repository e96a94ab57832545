use eventpay_common::{conflict, internal_error, not_found, validation_error, EventPayError, HttpStatusCode};
use thiserror::Error;

/// Ledger-specific error types.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("Event {0} does not exist")]
    EventNotFound(i64),

    #[error("Event {0} is closed")]
    EventClosed(i64),

    #[error("Invalid expense: {0}")]
    InvalidExpense(String),

    #[error("Payment {0} is unknown")]
    PaymentNotFound(String),

    /// Backend failure of a persistent [`LedgerRepository`](crate::LedgerRepository)
    /// implementation. `InMemoryLedger` never returns it.
    #[error("Ledger storage failure: {0}")]
    Storage(String),
}

impl From<LedgerError> for EventPayError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::EventNotFound(_) | LedgerError::PaymentNotFound(_) => {
                not_found(err.to_string())
            }
            LedgerError::EventClosed(_) => conflict(err.to_string()),
            LedgerError::InvalidExpense(msg) => validation_error(msg),
            LedgerError::Storage(msg) => internal_error(format!("ledger: {}", msg)),
        }
    }
}

impl HttpStatusCode for LedgerError {
    fn status_code(&self) -> u16 {
        match self {
            LedgerError::EventNotFound(_) => 404,
            LedgerError::EventClosed(_) => 409,
            LedgerError::InvalidExpense(_) => 400,
            LedgerError::PaymentNotFound(_) => 404,
            LedgerError::Storage(_) => 500,
        }
    }
}
