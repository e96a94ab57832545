use crate::handlers::{add_expense_handler, list_expenses_handler, list_payments_handler, LedgerState};
use crate::repository::LedgerRepository;
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

/// Creates a router containing all routes for the ledger feature.
pub fn routes(ledger: Arc<dyn LedgerRepository>) -> Router {
    let state = Arc::new(LedgerState { ledger });

    Router::new()
        .route("/expenses", post(add_expense_handler))
        .route("/events/{event_id}/expenses", get(list_expenses_handler))
        .route("/events/{event_id}/payments", get(list_payments_handler))
        .with_state(state)
}
