use eventpay_common::AmountError;
use thiserror::Error;

/// Everything that can end or refuse a payment attempt on the paying side.
///
/// `Busy` and `AlreadyCompleted` refuse a submit without starting an attempt.
/// All other variants end the current attempt and allow a retry.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PaymentFlowError {
    /// Input was refused before anything was sent
    #[error("Invalid payment input: {0}")]
    LocalValidation(String),

    /// The backend could not be reached or did not answer in time
    #[error("Payment backend unreachable: {0}")]
    Connectivity(String),

    /// The backend answered with a non-success status
    #[error("Payment backend rejected the request (status {status}): {message}")]
    ServerRejection { status: u16, message: String },

    /// The backend answered successfully but reported an error instead of a secret
    #[error("Payment could not be started: {0}")]
    IssuanceDeclined(String),

    /// The backend answer could not be interpreted
    #[error("Unexpected answer from the payment backend: {0}")]
    MalformedResponse(String),

    /// The processor did not confirm the payment
    #[error("Payment was not confirmed: {0}")]
    ConfirmationFailure(String),

    /// The confirmation was sent but its result never came back, or the
    /// processor is still working on it. The payer may have been charged.
    #[error("Outcome of payment {payment_intent_id} is unknown: {message}")]
    ConfirmationUnknown {
        payment_intent_id: String,
        message: String,
    },

    /// Money was taken but the expense is missing from the ledger
    #[error("Payment {payment_intent_id} succeeded but the expense was not recorded: {message}")]
    RecordingFailure {
        payment_intent_id: String,
        status: Option<u16>,
        message: String,
    },

    #[error("Payment attempt was cancelled")]
    Cancelled,

    #[error("A payment attempt is already in progress")]
    Busy,

    #[error("This payment has already been completed")]
    AlreadyCompleted,
}

impl PaymentFlowError {
    /// Short text suitable for a status line.
    pub fn user_message(&self) -> String {
        match self {
            PaymentFlowError::LocalValidation(msg) => format!("Please check your input: {}", msg),
            PaymentFlowError::Connectivity(_) => {
                "Connection problem. Check your network and try again.".to_string()
            }
            PaymentFlowError::ServerRejection { message, .. } => {
                format!("The server refused the payment: {}", message)
            }
            PaymentFlowError::IssuanceDeclined(msg) => {
                format!("The payment could not be started: {}", msg)
            }
            PaymentFlowError::MalformedResponse(_) => {
                "The server sent an unexpected answer. Please try again later.".to_string()
            }
            PaymentFlowError::ConfirmationFailure(_) => {
                "Your card payment was not confirmed. You have not been charged.".to_string()
            }
            PaymentFlowError::ConfirmationUnknown {
                payment_intent_id, ..
            } => format!(
                "We could not find out whether your card was charged. \
                 Please do not pay again before the organiser has checked reference {}.",
                payment_intent_id
            ),
            PaymentFlowError::RecordingFailure {
                payment_intent_id, ..
            } => format!(
                "Your payment went through but the expense could not be saved. \
                 Please contact the organiser with reference {}.",
                payment_intent_id
            ),
            PaymentFlowError::Cancelled => "Payment cancelled.".to_string(),
            PaymentFlowError::Busy => "A payment is already being processed.".to_string(),
            PaymentFlowError::AlreadyCompleted => "This payment is already complete.".to_string(),
        }
    }

    /// True when a charge may exist without a matching ledger entry.
    pub fn requires_reconciliation(&self) -> bool {
        matches!(
            self,
            PaymentFlowError::RecordingFailure { .. } | PaymentFlowError::ConfirmationUnknown { .. }
        )
    }

    /// Intent reference to quote when reconciling by hand.
    pub fn payment_intent_id(&self) -> Option<&str> {
        match self {
            PaymentFlowError::RecordingFailure {
                payment_intent_id, ..
            }
            | PaymentFlowError::ConfirmationUnknown {
                payment_intent_id, ..
            } => Some(payment_intent_id),
            _ => None,
        }
    }

    /// True for refusals that did not start an attempt.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            PaymentFlowError::Busy | PaymentFlowError::AlreadyCompleted
        )
    }
}

impl From<AmountError> for PaymentFlowError {
    fn from(err: AmountError) -> Self {
        PaymentFlowError::LocalValidation(err.to_string())
    }
}
