// --- File: crates/eventpay_stripe/src/doc.rs ---
#![cfg(feature = "openapi")]
use utoipa::OpenApi;

use crate::handlers::{__path_create_payment_handler, __path_stripe_webhook_handler};
use crate::logic::{StripeEvent, StripeEventData, StripePaymentIntentObject};
use eventpay_common::{Amount, ClientSecretResponse, PaymentRequest};

#[derive(OpenApi)]
#[openapi(
    paths(create_payment_handler, stripe_webhook_handler),
    components(schemas(
        Amount,
        PaymentRequest,
        ClientSecretResponse,
        StripeEvent,
        StripeEventData,
        StripePaymentIntentObject
    )),
    tags(
        (name = "Stripe", description = "Client secret issuance for event payments"),
        (name = "Stripe Webhooks", description = "Endpoint for receiving Stripe events")
    )
)]
pub struct StripeApiDoc;
