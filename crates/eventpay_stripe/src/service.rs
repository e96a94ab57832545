use eventpay_common::services::{BoxFuture, PaymentIntentResult, PaymentService};
use eventpay_config::AppConfig;
use std::collections::HashMap;
use std::sync::Arc;

use crate::error::StripeError;
use crate::logic::create_payment_intent;

/// Stripe payment service implementation
pub struct StripePaymentService {
    config: Arc<AppConfig>,
}

impl StripePaymentService {
    /// Create a new Stripe payment service
    pub fn new(config: Arc<AppConfig>) -> Self {
        Self { config }
    }
}

impl PaymentService for StripePaymentService {
    type Error = StripeError;

    fn create_payment_intent(
        &self,
        amount: i64,
        currency: &str,
        description: Option<&str>,
        metadata: HashMap<String, String>,
    ) -> BoxFuture<'_, PaymentIntentResult, Self::Error> {
        // Owned copies so the future only borrows `self`
        let currency = currency.to_string();
        let description = description.map(str::to_string);

        Box::pin(async move {
            let stripe_config = self.config.stripe_enabled().ok_or(StripeError::Disabled)?;
            create_payment_intent(
                stripe_config,
                amount,
                &currency,
                description.as_deref(),
                &metadata,
            )
            .await
        })
    }
}
