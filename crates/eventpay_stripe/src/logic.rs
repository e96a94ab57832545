// --- File: crates/eventpay_stripe/src/logic.rs ---
use chrono::Utc;
use eventpay_common::services::{PaymentIntentResult, PaymentService};
use eventpay_common::{PaymentRequest, HTTP_CLIENT};
use eventpay_config::StripeConfig;
use eventpay_ledger::{LedgerError, LedgerRepository, PaymentRecord, PaymentStatus};
use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;
use std::collections::HashMap;
use tracing::{debug, info, warn};

use crate::error::StripeError;

#[cfg(feature = "openapi")]
use utoipa::ToSchema;

// --- Data Structures ---

/// Subset of the Stripe PaymentIntent object returned on creation.
#[derive(Deserialize, Debug)]
struct StripePaymentIntentApiResponse {
    id: String,
    status: String,
    amount: i64,
    currency: String,
    client_secret: Option<String>,
}

/// Represents the `data` field within a Stripe Event.
#[derive(Deserialize, Debug, Clone)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct StripeEventData {
    /// The object the event is about. Its shape depends on the event type.
    pub object: serde_json::Value,
}

/// Represents the outer Stripe Event object.
#[derive(Deserialize, Debug, Clone)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct StripeEvent {
    pub id: String,
    pub created: i64,
    pub livemode: bool,
    #[serde(rename = "type")]
    pub event_type: String, // e.g., "payment_intent.succeeded"
    pub data: StripeEventData,
}

/// `data.object` for the `payment_intent.*` events.
#[derive(Deserialize, Debug, Clone)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct StripePaymentIntentObject {
    pub id: String,
    pub status: Option<String>,
    pub amount: Option<i64>,
    pub metadata: Option<HashMap<String, String>>,
}

// --- Payment Intent Creation ---

/// Creates a PaymentIntent through the Stripe REST API.
///
/// `amount` is in minor units of `currency`. The returned client secret is
/// what the paying client needs to confirm the intent.
pub async fn create_payment_intent(
    stripe_config: &StripeConfig,
    amount: i64,
    currency: &str,
    description: Option<&str>,
    metadata: &HashMap<String, String>,
) -> Result<PaymentIntentResult, StripeError> {
    let secret_key = stripe_config
        .secret_key
        .as_deref()
        .filter(|key| !key.is_empty())
        .ok_or_else(|| StripeError::ConfigError("stripe.secret_key is not set".to_string()))?;

    let mut form_body: Vec<(String, String)> = vec![
        ("amount".to_string(), amount.to_string()),
        ("currency".to_string(), currency.to_lowercase()),
        ("payment_method_types[]".to_string(), "card".to_string()),
    ];
    if let Some(description) = description {
        form_body.push(("description".to_string(), description.to_string()));
    }
    for (key, value) in metadata {
        form_body.push((format!("metadata[{}]", key), value.clone()));
    }

    let api_url = format!(
        "{}/v1/payment_intents",
        stripe_config.api_base.trim_end_matches('/')
    );
    info!(amount, currency, "[Stripe Logic] Creating PaymentIntent");

    let response = HTTP_CLIENT
        .post(&api_url)
        .basic_auth(secret_key, None::<&str>)
        .form(&form_body)
        .send()
        .await?;

    let status = response.status();
    let body_text = response.text().await?;
    info!("[Stripe Logic] Stripe API response status: {}", status);

    if !status.is_success() {
        let message = extract_error_message(&body_text);
        warn!(
            "[Stripe Logic] Stripe API request failed with HTTP status: {}. Message: {}",
            status, message
        );
        return Err(StripeError::ApiError {
            status_code: status.as_u16(),
            message,
        });
    }

    let intent: StripePaymentIntentApiResponse = serde_json::from_str(&body_text)?;
    info!(
        payment_intent_id = %intent.id,
        status = %intent.status,
        "[Stripe Logic] PaymentIntent created"
    );
    Ok(PaymentIntentResult {
        id: intent.id,
        status: intent.status,
        amount: intent.amount,
        currency: intent.currency,
        client_secret: intent.client_secret,
    })
}

/// Pulls `error.message` out of a Stripe error body, falling back to the raw text.
pub fn extract_error_message(body_text: &str) -> String {
    match serde_json::from_str::<serde_json::Value>(body_text) {
        Ok(json_body) => json_body
            .get("error")
            .and_then(|e| e.get("message"))
            .and_then(|m| m.as_str())
            .unwrap_or(body_text)
            .to_string(),
        Err(_) => body_text.to_string(),
    }
}

// --- Client Secret Issuance ---

/// Issues a client secret for a payment towards an event.
///
/// The event must exist and be open before the processor is contacted. On
/// success a pending [`PaymentRecord`] is kept so the intent can be
/// reconciled later.
pub async fn issue_client_secret(
    payment_service: &dyn PaymentService<Error = StripeError>,
    ledger: &dyn LedgerRepository,
    currency: &str,
    request: &PaymentRequest,
) -> Result<String, StripeError> {
    let event = ledger.open_event(request.event_id).await?;
    debug!(event_id = event.id, event_name = %event.name, "event accepts payments");

    let mut metadata = HashMap::new();
    metadata.insert("event_id".to_string(), request.event_id.to_string());

    let intent = payment_service
        .create_payment_intent(
            request.amount.minor_units(),
            currency,
            request.description.as_deref(),
            metadata,
        )
        .await?;

    let client_secret = intent
        .client_secret
        .filter(|secret| !secret.is_empty())
        .ok_or_else(|| StripeError::MissingClientSecret(intent.id.clone()))?;

    ledger
        .record_payment(PaymentRecord::pending(
            intent.id.clone(),
            request.event_id,
            request.amount,
        ))
        .await?;
    info!(
        payment_intent_id = %intent.id,
        event_id = request.event_id,
        amount = %request.amount,
        "client secret issued"
    );
    Ok(client_secret)
}

// --- Webhook Processing Logic ---

/// Verifies the signature of an incoming Stripe webhook request.
///
/// # Arguments
/// * `payload_bytes` - The raw request body bytes.
/// * `sig_header` - The value of the 'Stripe-Signature' header.
/// * `secret` - The webhook signing secret (whsec_...).
/// * `tolerance_secs` - Maximum accepted age of the signed timestamp.
pub fn verify_stripe_signature(
    payload_bytes: &[u8],
    sig_header: Option<&str>,
    secret: &str,
    tolerance_secs: i64,
) -> Result<(), StripeError> {
    verify_signature_at(
        payload_bytes,
        sig_header,
        secret,
        tolerance_secs,
        Utc::now().timestamp(),
    )
}

fn verify_signature_at(
    payload_bytes: &[u8],
    sig_header: Option<&str>,
    secret: &str,
    tolerance_secs: i64,
    now: i64,
) -> Result<(), StripeError> {
    let sig_header_value = sig_header.ok_or_else(|| {
        StripeError::WebhookSignatureError("Missing Stripe-Signature header".to_string())
    })?;

    let mut timestamp_str: Option<&str> = None;
    let mut v1_signatures_hex: Vec<&str> = Vec::new();
    for item in sig_header_value.split(',') {
        if let Some((key, value)) = item.trim().split_once('=') {
            match key {
                "t" => timestamp_str = Some(value),
                "v1" => v1_signatures_hex.push(value),
                _ => {} // v0 and unknown schemes are ignored
            }
        }
    }

    let timestamp_str = timestamp_str.ok_or_else(|| {
        StripeError::WebhookSignatureError("Missing timestamp 't' in Stripe-Signature".to_string())
    })?;
    let parsed_timestamp = timestamp_str.parse::<i64>().map_err(|_| {
        StripeError::WebhookSignatureError(
            "Invalid timestamp format in Stripe-Signature".to_string(),
        )
    })?;

    if v1_signatures_hex.is_empty() {
        return Err(StripeError::WebhookSignatureError(
            "Missing v1 signature in Stripe-Signature".to_string(),
        ));
    }

    let age = (now - parsed_timestamp).abs();
    if age > tolerance_secs {
        warn!(
            now,
            signed_at = parsed_timestamp,
            "Stripe webhook timestamp outside tolerance"
        );
        return Err(StripeError::WebhookSignatureError(
            "Timestamp outside tolerance".to_string(),
        ));
    }

    let calculated_signature_hex = compute_signature(timestamp_str, payload_bytes, secret)?;
    let matched = v1_signatures_hex.iter().any(|provided| {
        constant_time_eq(calculated_signature_hex.as_bytes(), provided.as_bytes())
    });
    if matched {
        Ok(())
    } else {
        warn!("Stripe signature mismatch");
        Err(StripeError::WebhookSignatureError(
            "Signature mismatch".to_string(),
        ))
    }
}

/// Hex HMAC-SHA256 of `"{timestamp}.{payload}"`, as Stripe computes it.
pub fn compute_signature(
    timestamp: &str,
    payload_bytes: &[u8],
    secret: &str,
) -> Result<String, StripeError> {
    type HmacSha256 = Hmac<Sha256>;
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).map_err(|_| {
        StripeError::WebhookSignatureError("Invalid webhook secret format for HMAC".to_string())
    })?;
    mac.update(timestamp.as_bytes());
    mac.update(b".");
    mac.update(payload_bytes);
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Helper for constant-time string comparison.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut result = 0;
    for (x, y) in a.iter().zip(b.iter()) {
        result |= x ^ y;
    }
    result == 0
}

fn status_for_event(event_type: &str) -> Option<PaymentStatus> {
    match event_type {
        "payment_intent.succeeded" => Some(PaymentStatus::Succeeded),
        "payment_intent.payment_failed" => Some(PaymentStatus::Failed),
        "payment_intent.canceled" => Some(PaymentStatus::Canceled),
        _ => None,
    }
}

/// Processes a verified Stripe webhook event.
///
/// PaymentIntent outcomes are written to the ledger's payment records.
/// Other event types are acknowledged and ignored.
pub async fn process_stripe_webhook(
    event: StripeEvent,
    ledger: &dyn LedgerRepository,
) -> Result<(), StripeError> {
    info!(event_id = %event.id, event_type = %event.event_type, "Processing Stripe event");

    let Some(status) = status_for_event(&event.event_type) else {
        debug!("Unhandled Stripe event type: {}", event.event_type);
        return Ok(());
    };

    let intent: StripePaymentIntentObject =
        serde_json::from_value(event.data.object).map_err(|e| {
            StripeError::WebhookProcessingError(format!(
                "Failed to parse payment intent object: {}",
                e
            ))
        })?;

    match ledger.update_payment_status(&intent.id, status).await {
        Ok(record) => {
            info!(
                payment_intent_id = %record.payment_intent_id,
                event_id = record.event_id,
                status = ?record.status,
                "payment record updated"
            );
            Ok(())
        }
        // Intents created outside this service are not ours to track.
        Err(LedgerError::PaymentNotFound(id)) => {
            warn!(payment_intent_id = %id, "webhook for unknown payment intent ignored");
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}
