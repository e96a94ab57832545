use eventpay_common::services::BoxFuture;
use eventpay_common::HTTP_CLIENT;
use eventpay_config::ProcessorConfig;
use reqwest::Client;
use serde::Deserialize;
use tracing::{error, info, warn};

use crate::api::ClientSecret;
use crate::error::PaymentFlowError;

/// Processor token for the card the payer entered, e.g. `pm_1Nxyz`.
///
/// Produced by the processor's own card widget; raw card numbers are refused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentMethodDescriptor(String);

impl PaymentMethodDescriptor {
    pub fn new(id: impl Into<String>) -> Result<Self, PaymentFlowError> {
        let id = id.into();
        let trimmed = id.trim();
        if trimmed.is_empty() {
            return Err(PaymentFlowError::LocalValidation(
                "payment method is missing".to_string(),
            ));
        }
        if trimmed.chars().any(char::is_whitespace)
            || trimmed.chars().all(|c| c.is_ascii_digit() || c == '-')
        {
            return Err(PaymentFlowError::LocalValidation(
                "payment method must be a processor token".to_string(),
            ));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// What the processor reported after a confirmation attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmationOutcome {
    pub payment_intent_id: String,
    pub status: String,
}

impl ConfirmationOutcome {
    /// `requires_capture` means the funds are held, which counts as paid here.
    pub fn is_success(&self) -> bool {
        matches!(self.status.as_str(), "succeeded" | "requires_capture")
    }

    /// The processor has not decided yet; the payer may still be charged.
    pub fn is_pending(&self) -> bool {
        self.status == "processing"
    }
}

/// Hands a client secret and a payment method to the processor.
pub trait PaymentConfirmer: Send + Sync {
    fn confirm(
        &self,
        client_secret: &ClientSecret,
        payment_method: &PaymentMethodDescriptor,
    ) -> BoxFuture<'_, ConfirmationOutcome, PaymentFlowError>;
}

#[derive(Deserialize, Debug)]
struct ConfirmApiResponse {
    id: String,
    status: String,
}

/// Confirms payment intents through Stripe's public API with the publishable key.
pub struct StripeConfirmer {
    config: ProcessorConfig,
    client: Client,
}

impl StripeConfirmer {
    pub fn new(config: ProcessorConfig) -> Self {
        Self::with_client(config, HTTP_CLIENT.clone())
    }

    pub fn with_client(config: ProcessorConfig, client: Client) -> Self {
        Self { config, client }
    }
}

/// Once the request may have reached the processor, a missing answer leaves
/// the charge undecided.
fn answer_lost(payment_intent_id: &str, message: String) -> PaymentFlowError {
    error!(
        payment_intent_id,
        %message,
        "confirmation sent but its outcome is unknown"
    );
    PaymentFlowError::ConfirmationUnknown {
        payment_intent_id: payment_intent_id.to_string(),
        message,
    }
}

impl PaymentConfirmer for StripeConfirmer {
    fn confirm(
        &self,
        client_secret: &ClientSecret,
        payment_method: &PaymentMethodDescriptor,
    ) -> BoxFuture<'_, ConfirmationOutcome, PaymentFlowError> {
        let client_secret = client_secret.clone();
        let payment_method = payment_method.clone();

        Box::pin(async move {
            let payment_intent_id = client_secret.payment_intent_id().ok_or_else(|| {
                PaymentFlowError::ConfirmationFailure(
                    "client secret does not name a payment intent".to_string(),
                )
            })?;
            let url = format!(
                "{}/v1/payment_intents/{}/confirm",
                self.config.api_base.trim_end_matches('/'),
                payment_intent_id
            );
            let form = [
                ("client_secret", client_secret.expose()),
                ("payment_method", payment_method.as_str()),
            ];

            let response = self
                .client
                .post(&url)
                .basic_auth(&self.config.publishable_key, None::<&str>)
                .form(&form)
                .send()
                .await
                .map_err(|e| {
                    if e.is_connect() || e.is_builder() {
                        PaymentFlowError::ConfirmationFailure(format!(
                            "processor unreachable: {}",
                            e
                        ))
                    } else {
                        answer_lost(payment_intent_id, format!("processor answer lost: {}", e))
                    }
                })?;

            let status = response.status();
            let body_text = response.text().await.map_err(|e| {
                answer_lost(payment_intent_id, format!("processor answer lost: {}", e))
            })?;

            if status.is_server_error() {
                return Err(answer_lost(
                    payment_intent_id,
                    format!("processor failed with status {}", status.as_u16()),
                ));
            }
            if !status.is_success() {
                let message = serde_json::from_str::<serde_json::Value>(&body_text)
                    .ok()
                    .and_then(|json| {
                        json.get("error")
                            .and_then(|e| e.get("message"))
                            .and_then(|m| m.as_str())
                            .map(str::to_string)
                    })
                    .unwrap_or_else(|| format!("processor returned status {}", status.as_u16()));
                warn!(
                    payment_intent_id,
                    status = status.as_u16(),
                    %message,
                    "confirmation refused"
                );
                return Err(PaymentFlowError::ConfirmationFailure(message));
            }

            let confirmed: ConfirmApiResponse = serde_json::from_str(&body_text).map_err(|e| {
                answer_lost(payment_intent_id, format!("unreadable processor answer: {}", e))
            })?;
            info!(
                payment_intent_id = %confirmed.id,
                status = %confirmed.status,
                "confirmation answered"
            );
            Ok(ConfirmationOutcome {
                payment_intent_id: confirmed.id,
                status: confirmed.status,
            })
        })
    }
}
