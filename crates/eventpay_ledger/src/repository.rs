//! Repository trait for the event ledger.
//!
//! The backend only talks to `dyn LedgerRepository`; the in-memory store in
//! `memory.rs` is the implementation shipped with the service.

use eventpay_common::services::BoxFuture;
use eventpay_common::{ExpenseDto, ExpenseRecord};

use crate::error::LedgerError;
use crate::models::{LedgerEvent, PaymentRecord, PaymentStatus};

pub trait LedgerRepository: Send + Sync {
    /// Look up an event by id.
    fn find_event(&self, event_id: i64) -> BoxFuture<'_, Option<LedgerEvent>, LedgerError>;

    /// Resolve an event that exists and still accepts payments.
    fn open_event(&self, event_id: i64) -> BoxFuture<'_, LedgerEvent, LedgerError> {
        Box::pin(async move {
            match self.find_event(event_id).await? {
                None => Err(LedgerError::EventNotFound(event_id)),
                Some(event) if event.closed => Err(LedgerError::EventClosed(event_id)),
                Some(event) => Ok(event),
            }
        })
    }

    /// Store an expense for an open event. Each call creates exactly one row.
    fn record_expense(&self, record: ExpenseRecord) -> BoxFuture<'_, ExpenseDto, LedgerError>;

    /// All expenses of an event, oldest first.
    fn list_expenses(&self, event_id: i64) -> BoxFuture<'_, Vec<ExpenseDto>, LedgerError>;

    /// Remember an issued payment intent.
    fn record_payment(&self, payment: PaymentRecord) -> BoxFuture<'_, (), LedgerError>;

    /// Apply a processor-reported status to a known payment intent.
    fn update_payment_status(
        &self,
        payment_intent_id: &str,
        status: PaymentStatus,
    ) -> BoxFuture<'_, PaymentRecord, LedgerError>;

    /// All payment intents issued for an event.
    fn list_payments(&self, event_id: i64) -> BoxFuture<'_, Vec<PaymentRecord>, LedgerError>;
}
