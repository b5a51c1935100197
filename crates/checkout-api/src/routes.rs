//! # Routes
//!
//! Axum router configuration for the checkout API.

use crate::handlers;
use crate::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};

/// Create the main application router
///
/// Routes:
/// - Sessions flow:
///   - GET  /api/config - Drop-in client configuration
///   - POST /api/sessions - Create payment session
///   - POST /api/sessions/result - Session result
///   - POST /api/payments/details - Redirect details
///   - POST /api/payments/3DSDetails - 3DS details
///
/// - Advanced flow:
///   - POST /advanced/api/paymentMethods - Available payment methods
///   - POST /advanced/api/payments - Make payment
///   - POST /advanced/api/payments/details - Redirect or 3DS details
///
/// - Webhooks:
///   - POST /api/payments/webhook - Processor notifications
///
/// - Pages:
///   - GET / - Flow selection
///   - GET /sessions, /advanced - Checkout pages (wasm driver from /pkg)
///   - GET /success, /result, /advanced/result - Redirect continuation
///   - GET /pending, /failed, /advanced/success, /advanced/failed - Destination pages
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let wasm_dir = state.config.wasm_dir.clone();

    // Checkout pages
    let checkout_routes = Router::new()
        .route("/", get(handlers::home_page))
        .route("/sessions", get(handlers::sessions_checkout_page))
        .route("/advanced", get(handlers::advanced_checkout_page))
        .nest_service("/pkg", ServeDir::new(wasm_dir));

    // Result pages the processor and the router navigate to
    let page_routes = Router::new()
        .route("/success", get(handlers::redirect_result))
        .route("/result", get(handlers::redirect_result))
        .route("/advanced/result", get(handlers::redirect_result))
        .route("/pending", get(handlers::pending_page))
        .route("/failed", get(handlers::failed_page))
        .route("/advanced/success", get(handlers::success_page))
        .route("/advanced/failed", get(handlers::failed_page));

    // Sessions flow
    let api_routes = Router::new()
        .route("/config", get(handlers::client_config))
        .route("/sessions", post(handlers::create_session))
        .route("/sessions/result", post(handlers::session_result))
        .route("/payments/details", post(handlers::payment_details))
        .route("/payments/3DSDetails", post(handlers::three_ds_details))
        .route("/payments/webhook", post(handlers::notification_webhook));

    // Advanced flow
    let advanced_routes = Router::new()
        .route("/paymentMethods", post(handlers::payment_methods))
        .route("/payments", post(handlers::make_payment))
        .route("/payments/details", post(handlers::payment_details));

    Router::new()
        .route("/health", get(handlers::health))
        .merge(checkout_routes)
        .merge(page_routes)
        .nest("/api", api_routes)
        .nest("/advanced/api", advanced_routes)
        // Middleware
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        // State
        .with_state(state)
}
