//! Single-flight payment pipeline: issue a secret, confirm, then record.
//!
//! The expense is written only after the processor reported success, so a
//! failed or abandoned confirmation never leaves a ledger entry behind.

use eventpay_common::{Amount, ExpenseDto, ExpenseRecord, PaymentRequest};
use eventpay_config::ClientConfig;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::api::{resolve_client_secret, BackendApi, ClientSecret, HttpBackendClient};
use crate::confirm::{PaymentConfirmer, PaymentMethodDescriptor, StripeConfirmer};
use crate::error::PaymentFlowError;
use crate::state::PaymentState;

/// Default bound on obtaining a client secret.
pub const DEFAULT_ISSUANCE_TIMEOUT: Duration = Duration::from_secs(20);

/// Raw input collected from the payer.
#[derive(Debug, Clone)]
pub struct PaymentForm {
    pub event_id: i64,
    pub description: String,
    /// Decimal text as typed, e.g. `"49.99"`.
    pub amount: String,
    pub payment_method: Option<PaymentMethodDescriptor>,
}

#[derive(Debug, Clone)]
struct ValidatedPayment {
    event_id: i64,
    description: String,
    amount: Amount,
    payment_method: PaymentMethodDescriptor,
}

impl PaymentForm {
    fn validate(&self) -> Result<ValidatedPayment, PaymentFlowError> {
        let amount: Amount = self.amount.parse()?;
        let description = self.description.trim();
        if description.is_empty() {
            return Err(PaymentFlowError::LocalValidation(
                "description is missing".to_string(),
            ));
        }
        let payment_method = self.payment_method.clone().ok_or_else(|| {
            PaymentFlowError::LocalValidation("payment method is missing".to_string())
        })?;
        Ok(ValidatedPayment {
            event_id: self.event_id,
            description: description.to_string(),
            amount,
            payment_method,
        })
    }
}

struct FlowInner {
    api: Arc<dyn BackendApi>,
    confirmer: Arc<dyn PaymentConfirmer>,
    issuance_timeout: Duration,
    state: Mutex<PaymentState>,
    state_tx: watch::Sender<PaymentState>,
}

impl FlowInner {
    fn lock_state(&self) -> std::sync::MutexGuard<'_, PaymentState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn transition(&self, next: PaymentState) {
        let mut state = self.lock_state();
        set_locked(&mut state, &self.state_tx, next);
    }
}

fn set_locked(state: &mut PaymentState, state_tx: &watch::Sender<PaymentState>, next: PaymentState) {
    if !state.can_transition_to(&next) {
        warn!(from = state.label(), to = next.label(), "unexpected state transition");
    }
    debug!(from = state.label(), to = next.label(), "payment state changed");
    *state = next.clone();
    state_tx.send_replace(next);
}

/// Owns the in-flight state of one attempt.
///
/// Dropped without [`finish`](Self::finish), e.g. because the submit future
/// was dropped or its task aborted, it ends the attempt as `Failed` so the
/// flow accepts submits again.
struct AttemptGuard {
    inner: Arc<FlowInner>,
    confirming: Option<String>,
    charged: bool,
    finished: bool,
}

impl AttemptGuard {
    fn finish(mut self, terminal: PaymentState) {
        self.finished = true;
        self.inner.transition(terminal);
    }
}

impl Drop for AttemptGuard {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        let reason = match (self.confirming.take(), self.charged) {
            (None, _) => {
                info!("payment attempt abandoned before confirmation");
                PaymentFlowError::Cancelled
            }
            (Some(payment_intent_id), false) => {
                error!(%payment_intent_id, "payment attempt abandoned while confirming");
                PaymentFlowError::ConfirmationUnknown {
                    payment_intent_id,
                    message: "attempt abandoned while the processor was confirming".to_string(),
                }
            }
            (Some(payment_intent_id), true) => {
                error!(%payment_intent_id, "payment attempt abandoned while recording the expense");
                PaymentFlowError::RecordingFailure {
                    payment_intent_id,
                    status: None,
                    message: "attempt abandoned before the expense was stored".to_string(),
                }
            }
        };
        self.inner.transition(PaymentState::Failed(reason));
    }
}

/// One payment towards one event. Cheap to clone; clones share state.
#[derive(Clone)]
pub struct PaymentFlow {
    inner: Arc<FlowInner>,
}

impl PaymentFlow {
    pub fn new(
        api: Arc<dyn BackendApi>,
        confirmer: Arc<dyn PaymentConfirmer>,
        issuance_timeout: Duration,
    ) -> Self {
        let (state_tx, _) = watch::channel(PaymentState::Idle);
        Self {
            inner: Arc::new(FlowInner {
                api,
                confirmer,
                issuance_timeout,
                state: Mutex::new(PaymentState::Idle),
                state_tx,
            }),
        }
    }

    /// Wires the HTTP backend client and the Stripe confirmer from `[client]`.
    pub fn from_config(config: &ClientConfig) -> Result<Self, PaymentFlowError> {
        let api = HttpBackendClient::from_config(config)?;
        let confirmer = StripeConfirmer::new(config.processor.clone());
        Ok(Self::new(
            Arc::new(api),
            Arc::new(confirmer),
            Duration::from_secs(config.issuance_timeout_secs),
        ))
    }

    pub fn state(&self) -> PaymentState {
        self.lock_state().clone()
    }

    /// Receiver that sees every state change.
    pub fn subscribe(&self) -> watch::Receiver<PaymentState> {
        self.inner.state_tx.subscribe()
    }

    pub fn submit_enabled(&self) -> bool {
        self.lock_state().submit_enabled()
    }

    /// Runs one attempt to completion.
    pub async fn submit(&self, form: PaymentForm) -> Result<ExpenseDto, PaymentFlowError> {
        self.submit_with_cancel(form, CancellationToken::new()).await
    }

    /// Like [`submit`](Self::submit); `cancel` can abort the attempt until
    /// confirmation has been dispatched.
    pub async fn submit_with_cancel(
        &self,
        form: PaymentForm,
        cancel: CancellationToken,
    ) -> Result<ExpenseDto, PaymentFlowError> {
        let (payment, guard) = self.begin(&form)?;
        self.run(payment, guard, cancel).await
    }

    /// Starts an attempt in the background.
    ///
    /// Busy or completed flows and invalid input are refused here, before
    /// anything is spawned.
    pub fn spawn_submit(
        &self,
        form: PaymentForm,
        cancel: CancellationToken,
    ) -> Result<JoinHandle<Result<ExpenseDto, PaymentFlowError>>, PaymentFlowError> {
        let (payment, guard) = self.begin(&form)?;
        let flow = self.clone();
        Ok(tokio::spawn(async move { flow.run(payment, guard, cancel).await }))
    }

    fn lock_state(&self) -> std::sync::MutexGuard<'_, PaymentState> {
        self.inner.lock_state()
    }

    /// Single-flight gate: checks, validates and enters AwaitingSecret in one
    /// critical section.
    fn begin(&self, form: &PaymentForm) -> Result<(ValidatedPayment, AttemptGuard), PaymentFlowError> {
        let mut state = self.lock_state();
        if let Err(rejection) = state.check_submit() {
            debug!(state = state.label(), "submit refused: {}", rejection);
            return Err(rejection);
        }
        let payment = form.validate().inspect_err(|e| {
            info!("payment input refused: {}", e);
        })?;
        set_locked(&mut state, &self.inner.state_tx, PaymentState::AwaitingSecret);
        let guard = AttemptGuard {
            inner: self.inner.clone(),
            confirming: None,
            charged: false,
            finished: false,
        };
        Ok((payment, guard))
    }

    fn transition(&self, next: PaymentState) {
        self.inner.transition(next);
    }

    async fn run(
        &self,
        payment: ValidatedPayment,
        mut guard: AttemptGuard,
        cancel: CancellationToken,
    ) -> Result<ExpenseDto, PaymentFlowError> {
        let result = self.pipeline(&payment, &mut guard, &cancel).await;
        match &result {
            Ok(expense) => guard.finish(PaymentState::Done(expense.clone())),
            Err(e) => guard.finish(PaymentState::Failed(e.clone())),
        }
        result
    }

    async fn pipeline(
        &self,
        payment: &ValidatedPayment,
        guard: &mut AttemptGuard,
        cancel: &CancellationToken,
    ) -> Result<ExpenseDto, PaymentFlowError> {
        let client_secret = self.obtain_secret(payment, cancel).await?;
        if cancel.is_cancelled() {
            return Err(PaymentFlowError::Cancelled);
        }

        self.transition(PaymentState::ConfirmingPayment);
        let reference = client_secret.payment_intent_id().unwrap_or("unknown");
        guard.confirming = Some(reference.to_string());
        let outcome = self
            .inner
            .confirmer
            .confirm(&client_secret, &payment.payment_method)
            .await
            .inspect_err(|e| {
                if e.requires_reconciliation() {
                    error!(
                        payment_intent_id = reference,
                        event_id = payment.event_id,
                        amount = %payment.amount,
                        "confirmation outcome unknown, expense will not be recorded: {}",
                        e
                    );
                }
            })?;
        if outcome.is_pending() {
            error!(
                payment_intent_id = %outcome.payment_intent_id,
                event_id = payment.event_id,
                "payment still processing, expense will not be recorded"
            );
            return Err(PaymentFlowError::ConfirmationUnknown {
                payment_intent_id: outcome.payment_intent_id,
                message: "the processor is still processing the payment".to_string(),
            });
        }
        if !outcome.is_success() {
            warn!(
                payment_intent_id = %outcome.payment_intent_id,
                status = %outcome.status,
                "payment not confirmed, expense will not be recorded"
            );
            return Err(PaymentFlowError::ConfirmationFailure(format!(
                "payment ended in status '{}'",
                outcome.status
            )));
        }

        guard.confirming = Some(outcome.payment_intent_id.clone());
        guard.charged = true;
        self.transition(PaymentState::RecordingExpense);
        let record = ExpenseRecord {
            description: payment.description.clone(),
            amount: payment.amount,
            event_id: payment.event_id,
        };
        match self.inner.api.add_expense(record).await {
            Ok(expense) => {
                info!(
                    expense_id = expense.id,
                    event_id = expense.event_id,
                    payment_intent_id = %outcome.payment_intent_id,
                    "payment completed"
                );
                Ok(expense)
            }
            Err(e) => {
                let status = match &e {
                    PaymentFlowError::ServerRejection { status, .. } => Some(*status),
                    _ => None,
                };
                error!(
                    payment_intent_id = %outcome.payment_intent_id,
                    event_id = payment.event_id,
                    amount = %payment.amount,
                    "payment succeeded but expense recording failed: {}",
                    e
                );
                Err(PaymentFlowError::RecordingFailure {
                    payment_intent_id: outcome.payment_intent_id,
                    status,
                    message: e.to_string(),
                })
            }
        }
    }

    async fn obtain_secret(
        &self,
        payment: &ValidatedPayment,
        cancel: &CancellationToken,
    ) -> Result<ClientSecret, PaymentFlowError> {
        let request = PaymentRequest {
            event_id: payment.event_id,
            amount: payment.amount,
            description: Some(payment.description.clone()),
        };
        let issuance = tokio::time::timeout(
            self.inner.issuance_timeout,
            self.inner.api.create_payment(request),
        );

        let response = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                info!(event_id = payment.event_id, "payment attempt cancelled");
                return Err(PaymentFlowError::Cancelled);
            }
            answer = issuance => match answer {
                Ok(answer) => answer?,
                Err(_) => {
                    return Err(PaymentFlowError::Connectivity(format!(
                        "no client secret within {}s",
                        self.inner.issuance_timeout.as_secs()
                    )));
                }
            },
        };
        let client_secret = resolve_client_secret(response)?;
        debug!(secret = ?client_secret, "client secret received");
        Ok(client_secret)
    }
}
