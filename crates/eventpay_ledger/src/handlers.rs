use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::Response,
    Json,
};
use eventpay_common::{map_json_error, validation_error, EventPayError, ExpenseDto, ExpenseRecord};
use std::sync::Arc;
use tracing::{info, warn};

use crate::models::PaymentRecord;
use crate::repository::LedgerRepository;

// --- State for Ledger Handlers ---
#[derive(Clone)]
pub struct LedgerState {
    pub ledger: Arc<dyn LedgerRepository>,
}

/// Records an expense after its payment was confirmed by the processor.
#[axum::debug_handler]
#[cfg_attr(feature = "openapi", utoipa::path(
    post,
    path = "/expenses",
    request_body = ExpenseRecord,
    responses(
        (status = 201, description = "Expense recorded", body = ExpenseDto),
        (status = 400, description = "Invalid description or amount"),
        (status = 404, description = "Unknown event"),
        (status = 409, description = "Event is closed")
    ),
    tag = "Ledger"
))]
pub async fn add_expense_handler(
    State(state): State<Arc<LedgerState>>,
    payload: Result<Json<ExpenseRecord>, JsonRejection>,
) -> Result<(StatusCode, Json<ExpenseDto>), EventPayError> {
    // Malformed amounts surface here, as serde rejections
    let Json(payload) = payload.map_err(|rejection| {
        warn!("unreadable expense body: {}", rejection.body_text());
        validation_error(rejection.body_text())
    })?;
    info!(
        event_id = payload.event_id,
        amount = %payload.amount,
        "add expense requested"
    );
    match state.ledger.record_expense(payload).await {
        Ok(expense) => Ok((StatusCode::CREATED, Json(expense))),
        Err(e) => {
            warn!("expense rejected: {}", e);
            Err(e.into())
        }
    }
}

#[axum::debug_handler]
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/events/{event_id}/expenses",
    params(("event_id" = i64, Path, description = "Event identifier")),
    responses(
        (status = 200, description = "Expenses of the event", body = [ExpenseDto]),
        (status = 404, description = "Unknown event")
    ),
    tag = "Ledger"
))]
pub async fn list_expenses_handler(
    State(state): State<Arc<LedgerState>>,
    Path(event_id): Path<i64>,
) -> Result<Json<Vec<ExpenseDto>>, Response> {
    map_json_error(state.ledger.list_expenses(event_id).await, EventPayError::from)
}

#[axum::debug_handler]
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/events/{event_id}/payments",
    params(("event_id" = i64, Path, description = "Event identifier")),
    responses(
        (status = 200, description = "Payment intents issued for the event", body = [PaymentRecord]),
        (status = 404, description = "Unknown event")
    ),
    tag = "Ledger"
))]
pub async fn list_payments_handler(
    State(state): State<Arc<LedgerState>>,
    Path(event_id): Path<i64>,
) -> Result<Json<Vec<PaymentRecord>>, Response> {
    map_json_error(state.ledger.list_payments(event_id).await, EventPayError::from)
}
