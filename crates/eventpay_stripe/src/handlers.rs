// --- File: crates/eventpay_stripe/src/handlers.rs ---
use axum::{
    extract::{rejection::JsonRejection, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
};
use eventpay_common::services::PaymentService;
use eventpay_common::{ClientSecretResponse, EventPayError, HttpStatusCode, PaymentRequest};
use eventpay_config::AppConfig;
use eventpay_ledger::LedgerRepository;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::error::StripeError;
use crate::logic::{
    issue_client_secret, process_stripe_webhook, verify_stripe_signature, StripeEvent,
};

// --- State for Stripe Handlers ---
#[derive(Clone)]
pub struct StripeState {
    pub config: Arc<AppConfig>,
    pub payment_service: Arc<dyn PaymentService<Error = StripeError>>,
    pub ledger: Arc<dyn LedgerRepository>,
}

fn client_secret_error(err: StripeError) -> (StatusCode, Json<ClientSecretResponse>) {
    let status = StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::BAD_GATEWAY);
    if status.is_server_error() {
        error!("create-payment failed: {}", err);
    } else {
        warn!("create-payment rejected: {}", err);
    }
    (status, Json(ClientSecretResponse::error(err.to_string())))
}

/// Axum handler that issues a client secret for a payment towards an event.
///
/// Every answer, failures included, has the `ClientSecretResponse` shape.
#[axum::debug_handler]
#[cfg_attr(feature = "openapi", utoipa::path(
    post,
    path = "/stripe/create-payment", // Path relative to /api
    request_body = PaymentRequest,
    responses(
        (status = 200, description = "PaymentIntent created", body = ClientSecretResponse),
        (status = 400, description = "Invalid amount or malformed body", body = ClientSecretResponse),
        (status = 404, description = "Unknown event", body = ClientSecretResponse),
        (status = 409, description = "Event is closed", body = ClientSecretResponse),
        (status = 502, description = "Stripe API error", body = ClientSecretResponse),
        (status = 503, description = "Stripe disabled", body = ClientSecretResponse)
    ),
    tag = "Stripe"
))]
pub async fn create_payment_handler(
    State(state): State<Arc<StripeState>>,
    payload: Result<Json<PaymentRequest>, JsonRejection>,
) -> (StatusCode, Json<ClientSecretResponse>) {
    let Some(stripe_config) = state.config.stripe_enabled() else {
        return client_secret_error(StripeError::Disabled);
    };

    let Json(request) = match payload {
        Ok(json) => json,
        Err(rejection) => {
            return client_secret_error(StripeError::InvalidRequest(rejection.body_text()));
        }
    };
    info!(
        event_id = request.event_id,
        amount = %request.amount,
        "create-payment requested"
    );

    match issue_client_secret(
        state.payment_service.as_ref(),
        state.ledger.as_ref(),
        &stripe_config.currency,
        &request,
    )
    .await
    {
        Ok(client_secret) => (
            StatusCode::OK,
            Json(ClientSecretResponse::secret(client_secret)),
        ),
        Err(e) => client_secret_error(e),
    }
}

/// Receives Stripe's server-to-server notifications.
#[axum::debug_handler]
#[cfg_attr(feature = "openapi", utoipa::path(
    post,
    path = "/stripe/webhook", // Path relative to /api
    request_body = StripeEvent,
    responses(
        (status = 200, description = "Webhook received and acknowledged"),
        (status = 400, description = "Invalid signature or payload"),
        (status = 500, description = "Webhook secret missing or processing failed"),
        (status = 503, description = "Stripe disabled")
    ),
    tag = "Stripe Webhooks"
))]
pub async fn stripe_webhook_handler(
    State(state): State<Arc<StripeState>>,
    headers: HeaderMap,
    body: String, // Raw body for signature verification
) -> Response {
    let Some(stripe_config) = state.config.stripe_enabled() else {
        return EventPayError::from(StripeError::Disabled).into_response();
    };

    let Some(webhook_secret) = stripe_config
        .webhook_secret
        .as_deref()
        .filter(|s| !s.is_empty())
    else {
        error!("stripe.webhook_secret is not configured");
        return EventPayError::from(StripeError::ConfigError(
            "stripe.webhook_secret is not set".to_string(),
        ))
        .into_response();
    };

    let sig_header = headers
        .get("Stripe-Signature")
        .and_then(|h| h.to_str().ok());
    if let Err(e) = verify_stripe_signature(
        body.as_bytes(),
        sig_header,
        webhook_secret,
        stripe_config.webhook_tolerance_secs,
    ) {
        warn!("Stripe webhook rejected: {}", e);
        return EventPayError::from(e).into_response();
    }

    // Deserialize only after the signature is verified
    let event: StripeEvent = match serde_json::from_str(&body) {
        Ok(ev) => ev,
        Err(e) => {
            warn!("Failed to deserialize Stripe webhook event: {}", e);
            return EventPayError::ParseError(format!("invalid Stripe event: {}", e))
                .into_response();
        }
    };

    match process_stripe_webhook(event, state.ledger.as_ref()).await {
        Ok(()) => StatusCode::OK.into_response(),
        Err(e) => {
            error!("Error processing Stripe webhook: {}", e);
            EventPayError::from(e).into_response()
        }
    }
}
