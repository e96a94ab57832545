// --- File: crates/eventpay_common/src/lib.rs ---

pub mod error; // Error handling
pub mod http; // HTTP utilities
pub mod logging; // Logging utilities
pub mod models; // Wire models shared by backend and client
#[cfg(test)]
mod models_proptest;
pub mod services; // Service abstractions

pub use error::{
    config_error, conflict, external_service_error, internal_error, not_found, validation_error,
    Context, EventPayError, HttpStatusCode,
};

pub use http::{
    client::{create_client, HTTP_CLIENT},
    map_json_error, IntoHttpResponse,
};

pub use models::{
    Amount, AmountError, ClientSecretResponse, ExpenseDto, ExpenseRecord, PaymentRequest,
};
