// --- File: crates/eventpay_client/src/lib.rs ---

pub mod api;
pub mod confirm;
pub mod error;
pub mod flow;
pub mod state;

pub use api::{resolve_client_secret, BackendApi, ClientSecret, HttpBackendClient};
pub use confirm::{
    ConfirmationOutcome, PaymentConfirmer, PaymentMethodDescriptor, StripeConfirmer,
};
pub use error::PaymentFlowError;
pub use flow::{PaymentFlow, PaymentForm, DEFAULT_ISSUANCE_TIMEOUT};
pub use state::PaymentState;
