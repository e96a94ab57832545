// --- File: crates/services/eventpay_backend/src/lib.rs ---
use axum::{routing::get, Router};
use tower_http::trace::TraceLayer;

pub mod app_state;

pub use app_state::AppState;

/// Builds the complete application router, with every API route under `/api`.
pub fn build_app(state: &AppState) -> Router {
    let api_router = Router::new()
        .route("/", get(|| async { "Welcome to EventPay API!" }))
        .merge(eventpay_ledger::routes(state.ledger.clone()));

    #[cfg(feature = "stripe")]
    let api_router = api_router.merge(eventpay_stripe::routes(
        state.config.clone(),
        state.ledger.clone(),
    ));

    #[allow(unused_mut)] // mutated only with the openapi feature
    let mut app = Router::new().nest("/api", api_router);

    // Swagger UI and JSON endpoint
    #[cfg(feature = "openapi")]
    {
        use eventpay_ledger::doc::LedgerApiDoc;
        #[cfg(feature = "stripe")]
        use eventpay_stripe::doc::StripeApiDoc;
        use utoipa::OpenApi;
        use utoipa_swagger_ui::SwaggerUi;

        #[derive(OpenApi)]
        #[openapi(
            info(
                title = "EventPay API",
                version = "0.1.0",
                description = "Card payments for shared event expenses",
                license(name = "MIT", url = "https://opensource.org/licenses/MIT")
            ),
            servers((url = "/api", description = "Main API Prefix")),
        )]
        struct ApiDoc;

        let mut openapi_doc = ApiDoc::openapi();
        openapi_doc.merge(LedgerApiDoc::openapi());
        #[cfg(feature = "stripe")]
        openapi_doc.merge(StripeApiDoc::openapi());
        tracing::info!("Adding Swagger UI at /api/docs");

        app = app.merge(SwaggerUi::new("/api/docs").url("/api/docs/openapi.json", openapi_doc));
    }

    app.layer(TraceLayer::new_for_http())
}
