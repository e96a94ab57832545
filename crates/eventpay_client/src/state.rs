use eventpay_common::ExpenseDto;

use crate::error::PaymentFlowError;

/// Progress of a payment flow, as shown to the payer.
#[derive(Debug, Clone, PartialEq)]
pub enum PaymentState {
    Idle,
    AwaitingSecret,
    ConfirmingPayment,
    RecordingExpense,
    Done(ExpenseDto),
    Failed(PaymentFlowError),
}

impl PaymentState {
    /// Whether the pay button should be enabled.
    pub fn submit_enabled(&self) -> bool {
        matches!(self, PaymentState::Idle | PaymentState::Failed(_))
    }

    /// An attempt is running; show a progress indicator.
    pub fn is_in_flight(&self) -> bool {
        matches!(
            self,
            PaymentState::AwaitingSecret
                | PaymentState::ConfirmingPayment
                | PaymentState::RecordingExpense
        )
    }

    pub fn label(&self) -> &'static str {
        match self {
            PaymentState::Idle => "idle",
            PaymentState::AwaitingSecret => "awaiting_secret",
            PaymentState::ConfirmingPayment => "confirming_payment",
            PaymentState::RecordingExpense => "recording_expense",
            PaymentState::Done(_) => "done",
            PaymentState::Failed(_) => "failed",
        }
    }

    /// Checks whether a new attempt may start from this state.
    pub fn check_submit(&self) -> Result<(), PaymentFlowError> {
        match self {
            PaymentState::Idle | PaymentState::Failed(_) => Ok(()),
            PaymentState::Done(_) => Err(PaymentFlowError::AlreadyCompleted),
            _ => Err(PaymentFlowError::Busy),
        }
    }

    /// Whether `next` is a legal successor of this state.
    pub fn can_transition_to(&self, next: &PaymentState) -> bool {
        use PaymentState::*;
        matches!(
            (self, next),
            (Idle | Failed(_), AwaitingSecret)
                | (AwaitingSecret, ConfirmingPayment)
                | (ConfirmingPayment, RecordingExpense)
                | (RecordingExpense, Done(_))
                | (AwaitingSecret | ConfirmingPayment | RecordingExpense, Failed(_))
        )
    }
}
