// File: services/eventpay_backend/src/main.rs
use eventpay_backend::{build_app, AppState};
use eventpay_common::logging::{self, log_result};
use eventpay_common::{Context, EventPayError};
use eventpay_config::load_config;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), EventPayError> {
    let config = Arc::new(load_config().context("Failed to load config")?);
    // Keeps the file writer alive until shutdown
    let _log_guard = logging::init_with_config(&config.logging);

    let state = AppState::new(config.clone());
    let app = build_app(&state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = log_result(
        TcpListener::bind(&addr).await,
        "Listener bound",
        "Failed to bind listener",
    )
    .with_context(|| format!("Failed to bind {}", addr))?;
    info!("Starting server at http://{}", addr);
    info!("API endpoints available at http://{}/api", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("Shutdown signal received");
    }
}
