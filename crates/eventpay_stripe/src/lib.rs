// --- File: crates/eventpay_stripe/src/lib.rs ---

pub mod doc;
pub mod error;
pub mod handlers;
pub mod logic;
pub mod routes;
pub mod service;

// Re-export for main backend
pub use error::StripeError;
pub use handlers::StripeState;
pub use logic::{compute_signature, StripeEvent};
pub use routes::{routes, routes_with_service};
pub use service::StripePaymentService;
