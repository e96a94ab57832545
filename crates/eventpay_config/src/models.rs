// --- File: crates/eventpay_config/src/models.rs ---

use serde::{Deserialize, Serialize};

// --- General Server Config ---
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
        }
    }
}

// --- Logging Config ---
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct LoggingConfig {
    /// Minimum level for the workspace crates (e.g. "info", "debug").
    pub level: Option<String>,
    /// When set, logs are additionally written to a daily rolling file in this directory.
    pub log_dir: Option<String>,
}

// --- Stripe Config ---
// Holds the server-side Stripe settings. Secrets use the "secret_from_env" marker:
// EVENTPAY_SECRET_STRIPE_SECRET_KEY (or legacy STRIPE_SECRET_KEY),
// EVENTPAY_SECRET_STRIPE_WEBHOOK_SECRET (or legacy STRIPE_WEBHOOK_SECRET).
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct StripeConfig {
    pub secret_key: Option<String>,
    pub webhook_secret: Option<String>,
    /// ISO currency code used for every payment intent, lower case ("chf", "pln", ...).
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default = "default_stripe_api_base")]
    pub api_base: String,
    /// Maximum age of a webhook signature timestamp.
    #[serde(default = "default_webhook_tolerance_secs")]
    pub webhook_tolerance_secs: i64,
}

fn default_currency() -> String {
    "pln".to_string()
}

pub fn default_stripe_api_base() -> String {
    "https://api.stripe.com".to_string()
}

fn default_webhook_tolerance_secs() -> i64 {
    300
}

// --- Ledger Config ---
/// An event that is known to the ledger when the server starts.
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LedgerEventSeed {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub closed: bool,
}

#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct LedgerConfig {
    #[serde(default)]
    pub events: Vec<LedgerEventSeed>,
}

// --- Client Config ---
/// Publishable processor settings used on the paying side.
/// Built once per session and handed to the confirmer explicitly.
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ProcessorConfig {
    pub publishable_key: String,
    #[serde(default = "default_stripe_api_base")]
    pub api_base: String,
}

#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ClientConfig {
    /// Base URL of the backend, e.g. "http://127.0.0.1:8080/api".
    pub backend_base_url: String,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Upper bound for obtaining a client secret before the attempt is abandoned.
    #[serde(default = "default_issuance_timeout_secs")]
    pub issuance_timeout_secs: u64,
    pub processor: ProcessorConfig,
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_issuance_timeout_secs() -> u64 {
    20
}

// --- Unified App Configuration ---
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,

    // --- Runtime Flags (optional in config file, default to false) ---
    #[serde(default)]
    pub use_stripe: bool,

    // --- Optional Feature Configurations ---
    #[serde(default)]
    pub stripe: Option<StripeConfig>,
    #[serde(default)]
    pub ledger: LedgerConfig,
    #[serde(default)]
    pub client: Option<ClientConfig>,
}

impl AppConfig {
    /// Stripe settings, only when the runtime flag is on and the section is present.
    pub fn stripe_enabled(&self) -> Option<&StripeConfig> {
        if self.use_stripe {
            self.stripe.as_ref()
        } else {
            None
        }
    }
}
