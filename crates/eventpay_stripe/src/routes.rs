// --- File: crates/eventpay_stripe/src/routes.rs ---

use crate::error::StripeError;
use crate::handlers::{create_payment_handler, stripe_webhook_handler, StripeState};
use crate::service::StripePaymentService;
use axum::{routing::post, Router};
use eventpay_common::services::PaymentService;
use eventpay_config::AppConfig;
use eventpay_ledger::LedgerRepository;
use std::sync::Arc;

/// Creates a router containing all routes for the Stripe feature.
pub fn routes(config: Arc<AppConfig>, ledger: Arc<dyn LedgerRepository>) -> Router {
    let payment_service = Arc::new(StripePaymentService::new(config.clone()));
    routes_with_service(config, payment_service, ledger)
}

/// Same as [`routes`] with a caller-supplied payment service.
pub fn routes_with_service(
    config: Arc<AppConfig>,
    payment_service: Arc<dyn PaymentService<Error = StripeError>>,
    ledger: Arc<dyn LedgerRepository>,
) -> Router {
    let stripe_state = Arc::new(StripeState {
        config,
        payment_service,
        ledger,
    });

    Router::new()
        .route("/stripe/create-payment", post(create_payment_handler))
        .route("/stripe/webhook", post(stripe_webhook_handler))
        .with_state(stripe_state)
}
