// --- File: crates/eventpay_stripe/src/error.rs ---
use eventpay_common::{config_error, external_service_error, EventPayError, HttpStatusCode};
use eventpay_ledger::LedgerError;
use thiserror::Error;

/// Stripe-specific error types.
#[derive(Error, Debug)]
pub enum StripeError {
    /// Error occurred during a Stripe API request
    #[error("Stripe API request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    /// Error returned by the Stripe API
    #[error("Stripe API returned an error: {message} (Status: {status_code})")]
    ApiError { status_code: u16, message: String },

    /// Error parsing Stripe API response
    #[error("Failed to parse Stripe API response: {0}")]
    ParseError(#[from] serde_json::Error),

    /// Missing or incomplete Stripe configuration
    #[error("Stripe configuration missing or incomplete: {0}")]
    ConfigError(String),

    /// `use_stripe` is off or the `[stripe]` section is absent
    #[error("Stripe service is disabled")]
    Disabled,

    /// The create-payment request body could not be accepted
    #[error("Invalid payment request: {0}")]
    InvalidRequest(String),

    /// Stripe created the intent but did not hand out a client secret
    #[error("Stripe response for payment intent {0} carries no client secret")]
    MissingClientSecret(String),

    /// The event ledger refused the operation
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// Webhook signature verification failed
    #[error("Stripe webhook signature verification failed: {0}")]
    WebhookSignatureError(String),

    /// Webhook event processing error
    #[error("Stripe webhook event processing error: {0}")]
    WebhookProcessingError(String),
}

/// Convert StripeError to EventPayError
impl From<StripeError> for EventPayError {
    fn from(err: StripeError) -> Self {
        match err {
            StripeError::RequestError(e) => {
                EventPayError::HttpError(format!("Stripe request error: {}", e))
            }
            StripeError::ApiError {
                status_code,
                message,
            } => external_service_error(
                "Stripe API",
                format!("Status: {}, Message: {}", status_code, message),
            ),
            StripeError::ParseError(e) => {
                external_service_error("Stripe API", format!("unreadable response: {}", e))
            }
            StripeError::ConfigError(msg) => config_error(msg),
            StripeError::Disabled => {
                EventPayError::ServiceUnavailable("Stripe service is disabled".to_string())
            }
            StripeError::InvalidRequest(msg) => EventPayError::ValidationError(msg),
            StripeError::MissingClientSecret(id) => external_service_error(
                "Stripe API",
                format!("payment intent {} has no client secret", id),
            ),
            StripeError::Ledger(e) => e.into(),
            StripeError::WebhookSignatureError(msg) => EventPayError::ValidationError(format!(
                "Stripe webhook signature error: {}",
                msg
            )),
            StripeError::WebhookProcessingError(msg) => {
                EventPayError::InternalError(format!("Stripe webhook: {}", msg))
            }
        }
    }
}

/// Status codes returned to the caller of the Stripe endpoints.
impl HttpStatusCode for StripeError {
    fn status_code(&self) -> u16 {
        match self {
            StripeError::RequestError(_) => 502,
            StripeError::ApiError { status_code, .. } => match *status_code {
                400..=599 => *status_code,
                _ => 502,
            },
            StripeError::ParseError(_) => 502,
            StripeError::ConfigError(_) => 500,
            StripeError::Disabled => 503,
            StripeError::InvalidRequest(_) => 400,
            StripeError::MissingClientSecret(_) => 502,
            StripeError::Ledger(e) => e.status_code(),
            StripeError::WebhookSignatureError(_) => 400,
            StripeError::WebhookProcessingError(_) => 500,
        }
    }
}
