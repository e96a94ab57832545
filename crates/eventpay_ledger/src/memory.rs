use chrono::Utc;
use eventpay_common::services::BoxFuture;
use eventpay_common::{ExpenseDto, ExpenseRecord};
use eventpay_config::LedgerConfig;
use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::error::LedgerError;
use crate::models::{LedgerEvent, PaymentRecord, PaymentStatus};
use crate::repository::LedgerRepository;

const MAX_DESCRIPTION_LEN: usize = 255;

/// Process-local ledger. Contents are lost on restart.
#[derive(Default)]
pub struct InMemoryLedger {
    events: RwLock<HashMap<i64, LedgerEvent>>,
    expenses: RwLock<Vec<ExpenseDto>>,
    payments: RwLock<HashMap<String, PaymentRecord>>,
    next_expense_id: AtomicI64,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a ledger pre-populated with the events listed in `[ledger]`.
    pub fn from_config(config: &LedgerConfig) -> Self {
        let events = config.events.iter().map(|seed| LedgerEvent {
            id: seed.id,
            name: seed.name.clone(),
            closed: seed.closed,
        });
        let ledger = Self::with_events(events);
        info!(events = config.events.len(), "in-memory ledger seeded");
        ledger
    }

    pub fn with_events(events: impl IntoIterator<Item = LedgerEvent>) -> Self {
        let events = events.into_iter().map(|e| (e.id, e)).collect();
        Self {
            events: RwLock::new(events),
            ..Self::default()
        }
    }

    /// Adds or replaces an event.
    pub async fn upsert_event(&self, event: LedgerEvent) {
        self.events.write().await.insert(event.id, event);
    }
}

fn validate_description(description: &str) -> Result<String, LedgerError> {
    let trimmed = description.trim();
    if trimmed.is_empty() {
        return Err(LedgerError::InvalidExpense(
            "description must not be empty".to_string(),
        ));
    }
    if trimmed.chars().count() > MAX_DESCRIPTION_LEN {
        return Err(LedgerError::InvalidExpense(format!(
            "description is longer than {} characters",
            MAX_DESCRIPTION_LEN
        )));
    }
    Ok(trimmed.to_string())
}

impl LedgerRepository for InMemoryLedger {
    fn find_event(&self, event_id: i64) -> BoxFuture<'_, Option<LedgerEvent>, LedgerError> {
        Box::pin(async move { Ok(self.events.read().await.get(&event_id).cloned()) })
    }

    fn record_expense(&self, record: ExpenseRecord) -> BoxFuture<'_, ExpenseDto, LedgerError> {
        Box::pin(async move {
            let description = validate_description(&record.description)?;
            self.open_event(record.event_id).await?;

            let expense = ExpenseDto {
                id: self.next_expense_id.fetch_add(1, Ordering::SeqCst) + 1,
                description,
                amount: record.amount,
                event_id: record.event_id,
                created_at: Utc::now(),
            };
            self.expenses.write().await.push(expense.clone());
            info!(
                expense_id = expense.id,
                event_id = expense.event_id,
                amount = %expense.amount,
                "expense recorded"
            );
            Ok(expense)
        })
    }

    fn list_expenses(&self, event_id: i64) -> BoxFuture<'_, Vec<ExpenseDto>, LedgerError> {
        Box::pin(async move {
            if self.find_event(event_id).await?.is_none() {
                return Err(LedgerError::EventNotFound(event_id));
            }
            Ok(self
                .expenses
                .read()
                .await
                .iter()
                .filter(|e| e.event_id == event_id)
                .cloned()
                .collect())
        })
    }

    fn record_payment(&self, payment: PaymentRecord) -> BoxFuture<'_, (), LedgerError> {
        Box::pin(async move {
            let mut payments = self.payments.write().await;
            if payments.contains_key(&payment.payment_intent_id) {
                warn!(
                    payment_intent_id = %payment.payment_intent_id,
                    "payment intent recorded twice, keeping the latest"
                );
            }
            payments.insert(payment.payment_intent_id.clone(), payment);
            Ok(())
        })
    }

    fn update_payment_status(
        &self,
        payment_intent_id: &str,
        status: PaymentStatus,
    ) -> BoxFuture<'_, PaymentRecord, LedgerError> {
        let payment_intent_id = payment_intent_id.to_string();
        Box::pin(async move {
            let mut payments = self.payments.write().await;
            let record = payments
                .get_mut(&payment_intent_id)
                .ok_or_else(|| LedgerError::PaymentNotFound(payment_intent_id.clone()))?;
            record.status = status;
            record.updated_at = Utc::now();
            Ok(record.clone())
        })
    }

    fn list_payments(&self, event_id: i64) -> BoxFuture<'_, Vec<PaymentRecord>, LedgerError> {
        Box::pin(async move {
            if self.find_event(event_id).await?.is_none() {
                return Err(LedgerError::EventNotFound(event_id));
            }
            let mut payments: Vec<PaymentRecord> = self
                .payments
                .read()
                .await
                .values()
                .filter(|p| p.event_id == event_id)
                .cloned()
                .collect();
            payments.sort_by(|a, b| a.updated_at.cmp(&b.updated_at));
            Ok(payments)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use eventpay_common::Amount;

    fn ledger() -> InMemoryLedger {
        InMemoryLedger::with_events([
            LedgerEvent {
                id: 42,
                name: "Ski trip".to_string(),
                closed: false,
            },
            LedgerEvent {
                id: 7,
                name: "Last year's party".to_string(),
                closed: true,
            },
        ])
    }

    fn amount(text: &str) -> Amount {
        text.parse().unwrap()
    }

    #[tokio::test]
    async fn records_expense_for_open_event() {
        let ledger = ledger();
        let stored = ledger
            .record_expense(ExpenseRecord {
                description: "  Pizza ".to_string(),
                amount: amount("49.99"),
                event_id: 42,
            })
            .await
            .unwrap();

        assert_eq!(stored.id, 1);
        assert_eq!(stored.description, "Pizza");
        assert_eq!(stored.amount, amount("49.99"));

        let listed = ledger.list_expenses(42).await.unwrap();
        assert_eq!(listed, vec![stored]);
    }

    #[tokio::test]
    async fn rejects_expense_for_unknown_or_closed_event() {
        let ledger = ledger();
        let record = |event_id| ExpenseRecord {
            description: "Taxi".to_string(),
            amount: amount("12.00"),
            event_id,
        };

        assert_eq!(
            ledger.record_expense(record(99)).await,
            Err(LedgerError::EventNotFound(99))
        );
        assert_eq!(
            ledger.record_expense(record(7)).await,
            Err(LedgerError::EventClosed(7))
        );
        assert!(ledger.expenses.read().await.is_empty());
    }

    #[tokio::test]
    async fn rejects_blank_description() {
        let ledger = ledger();
        let result = ledger
            .record_expense(ExpenseRecord {
                description: "   ".to_string(),
                amount: amount("1.00"),
                event_id: 42,
            })
            .await;
        assert!(matches!(result, Err(LedgerError::InvalidExpense(_))));
    }

    #[tokio::test]
    async fn payment_status_updates_apply_to_known_intents_only() {
        let ledger = ledger();
        ledger
            .record_payment(PaymentRecord::pending("pi_1", 42, amount("49.99")))
            .await
            .unwrap();

        let updated = ledger
            .update_payment_status("pi_1", PaymentStatus::Succeeded)
            .await
            .unwrap();
        assert_eq!(updated.status, PaymentStatus::Succeeded);
        assert_eq!(ledger.list_payments(42).await.unwrap(), vec![updated]);

        assert_eq!(
            ledger
                .update_payment_status("pi_unknown", PaymentStatus::Failed)
                .await,
            Err(LedgerError::PaymentNotFound("pi_unknown".to_string()))
        );
    }

    #[tokio::test]
    async fn open_event_distinguishes_missing_and_closed() {
        let ledger = ledger();
        assert_eq!(ledger.open_event(42).await.unwrap().name, "Ski trip");
        assert_eq!(ledger.open_event(7).await, Err(LedgerError::EventClosed(7)));
        assert_eq!(ledger.open_event(1).await, Err(LedgerError::EventNotFound(1)));
    }

    #[tokio::test]
    async fn closing_an_event_stops_new_expenses() {
        let ledger = ledger();
        ledger
            .upsert_event(LedgerEvent {
                id: 42,
                name: "Ski trip".to_string(),
                closed: true,
            })
            .await;

        let result = ledger
            .record_expense(ExpenseRecord {
                description: "Lift pass".to_string(),
                amount: amount("80.00"),
                event_id: 42,
            })
            .await;
        assert_eq!(result, Err(LedgerError::EventClosed(42)));
    }
}
