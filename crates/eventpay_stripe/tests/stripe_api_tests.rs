use eventpay_common::services::PaymentService;
use eventpay_config::{AppConfig, StripeConfig};
use eventpay_stripe::{StripeError, StripePaymentService};
use httpmock::prelude::*;
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;

fn config_for(api_base: String) -> Arc<AppConfig> {
    Arc::new(AppConfig {
        use_stripe: true,
        stripe: Some(StripeConfig {
            secret_key: Some("sk_test_123".to_string()),
            webhook_secret: None,
            currency: "pln".to_string(),
            api_base,
            webhook_tolerance_secs: 300,
        }),
        ..AppConfig::default()
    })
}

fn event_metadata() -> HashMap<String, String> {
    HashMap::from([("event_id".to_string(), "42".to_string())])
}

#[tokio::test]
async fn creates_payment_intent_with_minor_units_and_metadata() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/v1/payment_intents")
                .header("authorization", "Basic c2tfdGVzdF8xMjM6")
                .body_includes("amount=4999")
                .body_includes("currency=pln")
                .body_includes("metadata%5Bevent_id%5D=42")
                .body_includes("description=Pizza");
            then.status(200)
                .header("content-type", "application/json")
                .json_body(json!({
                    "id": "pi_123",
                    "object": "payment_intent",
                    "status": "requires_payment_method",
                    "amount": 4999,
                    "currency": "pln",
                    "client_secret": "pi_123_secret_abc"
                }));
        })
        .await;

    let service = StripePaymentService::new(config_for(server.base_url()));
    let intent = service
        .create_payment_intent(4999, "PLN", Some("Pizza"), event_metadata())
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(intent.id, "pi_123");
    assert_eq!(intent.amount, 4999);
    assert_eq!(intent.client_secret.as_deref(), Some("pi_123_secret_abc"));
}

#[tokio::test]
async fn surfaces_stripe_error_message_and_status() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/v1/payment_intents");
            then.status(401)
                .header("content-type", "application/json")
                .json_body(json!({
                    "error": {
                        "message": "Invalid API Key provided: sk_test_***123",
                        "type": "invalid_request_error"
                    }
                }));
        })
        .await;

    let service = StripePaymentService::new(config_for(server.base_url()));
    let err = service
        .create_payment_intent(100, "pln", None, event_metadata())
        .await
        .unwrap_err();

    match err {
        StripeError::ApiError {
            status_code,
            message,
        } => {
            assert_eq!(status_code, 401);
            assert!(message.starts_with("Invalid API Key provided"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn unreadable_success_body_is_a_parse_error() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/v1/payment_intents");
            then.status(200).body("<html>maintenance</html>");
        })
        .await;

    let service = StripePaymentService::new(config_for(server.base_url()));
    let err = service
        .create_payment_intent(100, "pln", None, event_metadata())
        .await
        .unwrap_err();

    assert!(matches!(err, StripeError::ParseError(_)));
}

#[tokio::test]
async fn missing_secret_key_fails_before_any_request() {
    let mut config = (*config_for("http://127.0.0.1:9".to_string())).clone();
    if let Some(stripe) = config.stripe.as_mut() {
        stripe.secret_key = None;
    }

    let service = StripePaymentService::new(Arc::new(config));
    let err = service
        .create_payment_intent(100, "pln", None, event_metadata())
        .await
        .unwrap_err();

    assert!(matches!(err, StripeError::ConfigError(_)));
}

#[tokio::test]
async fn disabled_stripe_is_reported() {
    let mut config = (*config_for("http://127.0.0.1:9".to_string())).clone();
    config.use_stripe = false;

    let service = StripePaymentService::new(Arc::new(config));
    let err = service
        .create_payment_intent(100, "pln", None, event_metadata())
        .await
        .unwrap_err();

    assert!(matches!(err, StripeError::Disabled));
}
