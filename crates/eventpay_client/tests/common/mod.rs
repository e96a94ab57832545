#![allow(dead_code)]

use chrono::Utc;
use eventpay_client::{
    BackendApi, ClientSecret, ConfirmationOutcome, PaymentConfirmer, PaymentFlow, PaymentFlowError,
    PaymentForm, PaymentMethodDescriptor,
};
use eventpay_common::services::BoxFuture;
use eventpay_common::{ClientSecretResponse, ExpenseDto, ExpenseRecord, PaymentRequest};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;

/// Backend double that counts calls and remembers what it was sent.
pub struct FakeBackend {
    pub issuance: Result<ClientSecretResponse, PaymentFlowError>,
    pub expense_error: Option<PaymentFlowError>,
    /// When set, issuance waits for a permit before answering.
    pub issuance_gate: Option<Arc<Notify>>,
    pub issuance_delay: Option<Duration>,
    pub payment_requests: Mutex<Vec<PaymentRequest>>,
    pub expenses: Mutex<Vec<ExpenseRecord>>,
    pub create_calls: AtomicUsize,
    pub expense_calls: AtomicUsize,
}

impl FakeBackend {
    pub fn answering(response: ClientSecretResponse) -> Self {
        Self {
            issuance: Ok(response),
            expense_error: None,
            issuance_gate: None,
            issuance_delay: None,
            payment_requests: Mutex::new(Vec::new()),
            expenses: Mutex::new(Vec::new()),
            create_calls: AtomicUsize::new(0),
            expense_calls: AtomicUsize::new(0),
        }
    }

    pub fn issuing(secret: &str) -> Self {
        Self::answering(ClientSecretResponse::secret(secret))
    }

    pub fn failing(error: PaymentFlowError) -> Self {
        Self {
            issuance: Err(error),
            ..Self::issuing("unused")
        }
    }

    pub fn network_calls(&self) -> usize {
        self.create_calls.load(Ordering::SeqCst) + self.expense_calls.load(Ordering::SeqCst)
    }
}

impl BackendApi for FakeBackend {
    fn create_payment(
        &self,
        request: PaymentRequest,
    ) -> BoxFuture<'_, ClientSecretResponse, PaymentFlowError> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        self.payment_requests.lock().unwrap().push(request);
        Box::pin(async move {
            if let Some(gate) = &self.issuance_gate {
                gate.notified().await;
            }
            if let Some(delay) = self.issuance_delay {
                tokio::time::sleep(delay).await;
            }
            self.issuance.clone()
        })
    }

    fn add_expense(&self, record: ExpenseRecord) -> BoxFuture<'_, ExpenseDto, PaymentFlowError> {
        let calls = self.expense_calls.fetch_add(1, Ordering::SeqCst);
        Box::pin(async move {
            if let Some(err) = &self.expense_error {
                return Err(err.clone());
            }
            self.expenses.lock().unwrap().push(record.clone());
            Ok(ExpenseDto {
                id: calls as i64 + 1,
                description: record.description,
                amount: record.amount,
                event_id: record.event_id,
                created_at: Utc::now(),
            })
        })
    }
}

/// Confirmer double answering with a fixed processor status.
pub struct FakeConfirmer {
    pub status: String,
    pub error: Option<PaymentFlowError>,
    /// When set, confirmation waits for a permit before answering.
    pub gate: Option<Arc<Notify>>,
    pub calls: AtomicUsize,
    pub secrets: Mutex<Vec<String>>,
}

impl FakeConfirmer {
    pub fn with_status(status: &str) -> Self {
        Self {
            status: status.to_string(),
            error: None,
            gate: None,
            calls: AtomicUsize::new(0),
            secrets: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(error: PaymentFlowError) -> Self {
        Self {
            error: Some(error),
            ..Self::with_status("unused")
        }
    }
}

impl PaymentConfirmer for FakeConfirmer {
    fn confirm(
        &self,
        client_secret: &ClientSecret,
        _payment_method: &PaymentMethodDescriptor,
    ) -> BoxFuture<'_, ConfirmationOutcome, PaymentFlowError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.secrets
            .lock()
            .unwrap()
            .push(client_secret.expose().to_string());
        let outcome = ConfirmationOutcome {
            payment_intent_id: client_secret
                .payment_intent_id()
                .unwrap_or("pi_fake")
                .to_string(),
            status: self.status.clone(),
        };
        let gate = self.gate.clone();
        let error = self.error.clone();
        Box::pin(async move {
            if let Some(gate) = gate {
                gate.notified().await;
            }
            match error {
                Some(err) => Err(err),
                None => Ok(outcome),
            }
        })
    }
}

pub fn flow(backend: &Arc<FakeBackend>, confirmer: &Arc<FakeConfirmer>) -> PaymentFlow {
    PaymentFlow::new(backend.clone(), confirmer.clone(), Duration::from_secs(5))
}

pub fn form(amount: &str) -> PaymentForm {
    PaymentForm {
        event_id: 42,
        description: "Pizza".to_string(),
        amount: amount.to_string(),
        payment_method: Some(PaymentMethodDescriptor::new("pm_card_visa").unwrap()),
    }
}
