//! Backend endpoints used by the paying client.
//!
//! [`BackendApi`] is the seam the payment flow talks to; [`HttpBackendClient`]
//! implements it over reqwest against the EventPay backend.

use eventpay_common::services::BoxFuture;
use eventpay_common::{create_client, ClientSecretResponse, ExpenseDto, ExpenseRecord, PaymentRequest};
use eventpay_config::ClientConfig;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt;
use tracing::{debug, info, warn};

use crate::error::PaymentFlowError;

/// Opaque token that lets the processor confirm one payment intent.
#[derive(Clone, PartialEq, Eq)]
pub struct ClientSecret(String);

impl ClientSecret {
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Stripe secrets have the form `{intent id}_secret_{nonce}`; other
    /// shapes name no intent.
    pub fn payment_intent_id(&self) -> Option<&str> {
        self.0
            .split_once("_secret_")
            .map(|(id, _)| id)
            .filter(|id| !id.is_empty())
    }
}

// Never prints the nonce, nor any part of a secret without a known shape.
impl fmt::Debug for ClientSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.payment_intent_id() {
            Some(id) => write!(f, "ClientSecret({}_secret_***)", id),
            None => f.write_str("ClientSecret(***)"),
        }
    }
}

/// Turns a successful create-payment answer into a usable secret.
///
/// An `error` wins over any secret sent alongside it. An answer with
/// neither field is malformed.
pub fn resolve_client_secret(
    response: ClientSecretResponse,
) -> Result<ClientSecret, PaymentFlowError> {
    let error = response.error.filter(|e| !e.trim().is_empty());
    let secret = response.client_secret.filter(|s| !s.trim().is_empty());

    match (secret, error) {
        (_, Some(error)) => Err(PaymentFlowError::IssuanceDeclined(error)),
        (Some(secret), None) => Ok(ClientSecret::new(secret)),
        (None, None) => Err(PaymentFlowError::MalformedResponse(
            "answer carries neither a client secret nor an error".to_string(),
        )),
    }
}

/// The two backend calls of a payment attempt.
pub trait BackendApi: Send + Sync {
    /// Ask the backend for a client secret.
    fn create_payment(
        &self,
        request: PaymentRequest,
    ) -> BoxFuture<'_, ClientSecretResponse, PaymentFlowError>;

    /// Record the expense of a confirmed payment.
    fn add_expense(&self, record: ExpenseRecord) -> BoxFuture<'_, ExpenseDto, PaymentFlowError>;
}

/// [`BackendApi`] over HTTP.
#[derive(Debug, Clone)]
pub struct HttpBackendClient {
    client: Client,
    base_url: String,
}

impl HttpBackendClient {
    /// `base_url` includes the `/api` prefix, e.g. `http://127.0.0.1:8080/api`.
    pub fn new(base_url: impl Into<String>, timeout_secs: u64) -> Result<Self, PaymentFlowError> {
        let client = create_client(timeout_secs).map_err(|e| {
            PaymentFlowError::Connectivity(format!("failed to build HTTP client: {}", e))
        })?;
        Ok(Self::with_client(client, base_url))
    }

    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    pub fn from_config(config: &ClientConfig) -> Result<Self, PaymentFlowError> {
        Self::new(config.backend_base_url.clone(), config.request_timeout_secs)
    }

    async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T, PaymentFlowError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url, path);
        debug!(%url, "calling payment backend");

        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(connectivity_error)?;

        let status = response.status();
        let body_text = response.text().await.map_err(connectivity_error)?;

        if !status.is_success() {
            let message = error_message(&body_text, status);
            warn!(%url, status = status.as_u16(), %message, "payment backend rejected request");
            return Err(PaymentFlowError::ServerRejection {
                status: status.as_u16(),
                message,
            });
        }

        if body_text.trim().is_empty() {
            return Err(PaymentFlowError::MalformedResponse(format!(
                "empty body with status {}",
                status.as_u16()
            )));
        }
        serde_json::from_str(&body_text).map_err(|e| {
            PaymentFlowError::MalformedResponse(format!("unreadable body: {}", e))
        })
    }
}

fn connectivity_error(err: reqwest::Error) -> PaymentFlowError {
    if err.is_timeout() {
        PaymentFlowError::Connectivity("request timed out".to_string())
    } else {
        PaymentFlowError::Connectivity(err.to_string())
    }
}

/// Human-readable reason from an error body.
///
/// Understands `{"error": "..."}` as well as `{"error": {"message": "..."}}`.
fn error_message(body_text: &str, status: StatusCode) -> String {
    if let Ok(json) = serde_json::from_str::<serde_json::Value>(body_text) {
        let error = json.get("error");
        let message = error
            .and_then(|e| e.as_str())
            .or_else(|| error.and_then(|e| e.get("message")).and_then(|m| m.as_str()));
        if let Some(message) = message {
            return message.to_string();
        }
    }
    let trimmed = body_text.trim();
    if trimmed.is_empty() {
        status
            .canonical_reason()
            .unwrap_or("unknown error")
            .to_string()
    } else {
        trimmed.to_string()
    }
}

impl BackendApi for HttpBackendClient {
    fn create_payment(
        &self,
        request: PaymentRequest,
    ) -> BoxFuture<'_, ClientSecretResponse, PaymentFlowError> {
        Box::pin(async move {
            info!(
                event_id = request.event_id,
                amount = %request.amount,
                "requesting client secret"
            );
            self.post_json("/stripe/create-payment", &request).await
        })
    }

    fn add_expense(&self, record: ExpenseRecord) -> BoxFuture<'_, ExpenseDto, PaymentFlowError> {
        Box::pin(async move { self.post_json("/expenses", &record).await })
    }
}
