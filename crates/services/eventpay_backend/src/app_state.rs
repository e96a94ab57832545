// --- File: crates/services/eventpay_backend/src/app_state.rs ---
use eventpay_config::AppConfig;
use eventpay_ledger::{InMemoryLedger, LedgerRepository};
use std::sync::Arc;
use tracing::{info, warn};

/// Everything the routers are built from.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub ledger: Arc<dyn LedgerRepository>,
}

impl AppState {
    /// Creates the state with an in-memory ledger seeded from `[ledger]`.
    pub fn new(config: Arc<AppConfig>) -> Self {
        let ledger = Arc::new(InMemoryLedger::from_config(&config.ledger));
        Self::with_ledger(config, ledger)
    }

    pub fn with_ledger(config: Arc<AppConfig>, ledger: Arc<dyn LedgerRepository>) -> Self {
        if config.stripe_enabled().is_some() {
            info!("Stripe payments enabled");
        } else {
            warn!("Stripe payments disabled; create-payment will answer 503");
        }
        Self { config, ledger }
    }
}
