use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use eventpay_common::services::{BoxFuture, PaymentIntentResult, PaymentService};
use eventpay_config::{AppConfig, StripeConfig};
use eventpay_ledger::{InMemoryLedger, LedgerEvent, LedgerRepository, PaymentStatus};
use eventpay_stripe::{compute_signature, routes_with_service, StripeError};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tower::util::ServiceExt;

const WEBHOOK_SECRET: &str = "whsec_test";

/// Records every intent it is asked to create and answers with a fixed secret.
#[derive(Default)]
struct FakePaymentService {
    calls: AtomicUsize,
    last_request: Mutex<Option<(i64, String, Option<String>, HashMap<String, String>)>>,
    client_secret: Option<String>,
}

impl FakePaymentService {
    fn answering(client_secret: Option<&str>) -> Arc<Self> {
        Arc::new(Self {
            client_secret: client_secret.map(str::to_string),
            ..Self::default()
        })
    }
}

impl PaymentService for FakePaymentService {
    type Error = StripeError;

    fn create_payment_intent(
        &self,
        amount: i64,
        currency: &str,
        description: Option<&str>,
        metadata: HashMap<String, String>,
    ) -> BoxFuture<'_, PaymentIntentResult, Self::Error> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_request.lock().unwrap() = Some((
            amount,
            currency.to_string(),
            description.map(str::to_string),
            metadata,
        ));
        let result = PaymentIntentResult {
            id: "pi_fake".to_string(),
            status: "requires_payment_method".to_string(),
            amount,
            currency: currency.to_string(),
            client_secret: self.client_secret.clone(),
        };
        Box::pin(async move { Ok(result) })
    }
}

fn config(use_stripe: bool) -> Arc<AppConfig> {
    Arc::new(AppConfig {
        use_stripe,
        stripe: Some(StripeConfig {
            secret_key: Some("sk_test_123".to_string()),
            webhook_secret: Some(WEBHOOK_SECRET.to_string()),
            currency: "pln".to_string(),
            api_base: "http://127.0.0.1:9".to_string(),
            webhook_tolerance_secs: 300,
        }),
        ..AppConfig::default()
    })
}

fn ledger() -> Arc<InMemoryLedger> {
    Arc::new(InMemoryLedger::with_events([
        LedgerEvent {
            id: 42,
            name: "Ski trip".to_string(),
            closed: false,
        },
        LedgerEvent {
            id: 7,
            name: "Archived".to_string(),
            closed: true,
        },
    ]))
}

fn app(service: Arc<FakePaymentService>, ledger: Arc<InMemoryLedger>, use_stripe: bool) -> Router {
    routes_with_service(config(use_stripe), service, ledger)
}

fn create_payment(body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/stripe/create-payment")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

#[tokio::test]
async fn issues_client_secret_and_records_pending_payment() {
    let service = FakePaymentService::answering(Some("pi_fake_secret_abc"));
    let ledger = ledger();

    let (status, body) = send(
        app(service.clone(), ledger.clone(), true),
        create_payment(json!({ "eventId": 42, "amount": "49.99", "description": "Pizza" })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "clientSecret": "pi_fake_secret_abc" }));

    let (amount, currency, description, metadata) =
        service.last_request.lock().unwrap().clone().unwrap();
    assert_eq!(amount, 4999);
    assert_eq!(currency, "pln");
    assert_eq!(description.as_deref(), Some("Pizza"));
    assert_eq!(metadata.get("event_id").map(String::as_str), Some("42"));

    let payments = ledger.list_payments(42).await.unwrap();
    assert_eq!(payments.len(), 1);
    assert_eq!(payments[0].payment_intent_id, "pi_fake");
    assert_eq!(payments[0].status, PaymentStatus::Pending);
}

#[tokio::test]
async fn unknown_event_is_not_found_and_processor_is_not_called() {
    let service = FakePaymentService::answering(Some("pi_fake_secret_abc"));

    let (status, body) = send(
        app(service.clone(), ledger(), true),
        create_payment(json!({ "eventId": 1000, "amount": "10.00" })),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].is_string());
    assert!(body.get("clientSecret").is_none());
    assert_eq!(service.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn closed_event_conflicts() {
    let service = FakePaymentService::answering(Some("pi_fake_secret_abc"));

    let (status, _) = send(
        app(service.clone(), ledger(), true),
        create_payment(json!({ "eventId": 7, "amount": "10.00" })),
    )
    .await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(service.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn invalid_amount_is_a_bad_request() {
    let service = FakePaymentService::answering(Some("pi_fake_secret_abc"));

    let (status, body) = send(
        app(service.clone(), ledger(), true),
        create_payment(json!({ "eventId": 42, "amount": "49.999" })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("fractional"));
    assert_eq!(service.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn oversized_amount_is_a_bad_request() {
    let service = FakePaymentService::answering(Some("pi_fake_secret_abc"));

    let (status, body) = send(
        app(service.clone(), ledger(), true),
        create_payment(json!({ "eventId": 42, "amount": "79228162514264337593543950335" })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("maximum"));
    assert_eq!(service.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn disabled_stripe_is_unavailable() {
    let service = FakePaymentService::answering(Some("pi_fake_secret_abc"));

    let (status, body) = send(
        app(service.clone(), ledger(), false),
        create_payment(json!({ "eventId": 42, "amount": "10.00" })),
    )
    .await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert!(body["error"].is_string());
    assert_eq!(service.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn intent_without_secret_is_a_bad_gateway() {
    let service = FakePaymentService::answering(None);
    let ledger = ledger();

    let (status, body) = send(
        app(service, ledger.clone(), true),
        create_payment(json!({ "eventId": 42, "amount": "10.00" })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(body["error"].is_string());
    assert!(ledger.list_payments(42).await.unwrap().is_empty());
}

fn webhook(payload: &str, signature_header: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/stripe/webhook")
        .header("content-type", "application/json")
        .header("Stripe-Signature", signature_header)
        .body(Body::from(payload.to_string()))
        .unwrap()
}

fn signed_header(payload: &str) -> String {
    let timestamp = chrono::Utc::now().timestamp().to_string();
    let signature = compute_signature(&timestamp, payload.as_bytes(), WEBHOOK_SECRET).unwrap();
    format!("t={},v1={}", timestamp, signature)
}

fn succeeded_event() -> String {
    json!({
        "id": "evt_1",
        "object": "event",
        "created": 1_700_000_000,
        "livemode": false,
        "type": "payment_intent.succeeded",
        "data": { "object": { "id": "pi_fake", "object": "payment_intent", "status": "succeeded" } }
    })
    .to_string()
}

#[tokio::test]
async fn signed_webhook_updates_payment_status() {
    let service = FakePaymentService::answering(Some("pi_fake_secret_abc"));
    let ledger = ledger();
    let app = app(service, ledger.clone(), true);

    let (status, _) = send(
        app.clone(),
        create_payment(json!({ "eventId": 42, "amount": "10.00" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let payload = succeeded_event();
    let (status, _) = send(app, webhook(&payload, &signed_header(&payload))).await;
    assert_eq!(status, StatusCode::OK);

    let payments = ledger.list_payments(42).await.unwrap();
    assert_eq!(payments[0].status, PaymentStatus::Succeeded);
}

#[tokio::test]
async fn tampered_webhook_is_rejected() {
    let service = FakePaymentService::answering(Some("pi_fake_secret_abc"));
    let payload = succeeded_event();
    let header = signed_header(&payload);
    let tampered = payload.replace("succeeded", "canceled");

    let (status, _) = send(app(service, ledger(), true), webhook(&tampered, &header)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn webhook_for_unknown_intent_is_acknowledged() {
    let service = FakePaymentService::answering(Some("pi_fake_secret_abc"));
    let payload = succeeded_event();

    let (status, _) = send(
        app(service, ledger(), true),
        webhook(&payload, &signed_header(&payload)),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
}
