//! Service abstractions for external services.
//!
//! Handlers depend on these traits rather than on a concrete processor, so
//! tests can swap in fakes without a network.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;

/// Boxed `Send` future resolving to a `Result`, used by the object-safe service traits.
pub type BoxFuture<'a, T, E> = Pin<Box<dyn Future<Output = Result<T, E>> + Send + 'a>>;

/// Server-side access to the payment processor.
pub trait PaymentService: Send + Sync {
    /// Error type returned by payment service operations.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Create a payment intent awaiting confirmation by the paying client.
    ///
    /// `amount` is in minor units of `currency`.
    fn create_payment_intent(
        &self,
        amount: i64,
        currency: &str,
        description: Option<&str>,
        metadata: HashMap<String, String>,
    ) -> BoxFuture<'_, PaymentIntentResult, Self::Error>;
}

/// A payment intent as created by the processor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentIntentResult {
    /// Processor id, `pi_...` for Stripe.
    pub id: String,
    pub status: String,
    /// Minor units.
    pub amount: i64,
    pub currency: String,
    /// Handed to the paying client; absent for intents it cannot confirm.
    pub client_secret: Option<String>,
}
