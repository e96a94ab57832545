// --- File: crates/eventpay_ledger/src/lib.rs ---

pub mod doc;
pub mod error;
pub mod handlers;
pub mod memory;
pub mod models;
pub mod repository;
pub mod routes;

pub use error::LedgerError;
pub use memory::InMemoryLedger;
pub use models::{LedgerEvent, PaymentRecord, PaymentStatus};
pub use repository::LedgerRepository;
pub use routes::routes;
