//! # Routes
//!
//! Axum router configuration for the POS relay.

use crate::handlers;
use crate::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

/// Create the main application router
///
/// Routes:
/// - GET  / - POS landing page
/// - GET  /health - Health check
/// - POST /connection_token - Reader connection token
/// - POST /create-payment - Create intent and dispatch to reader
/// - POST /cancel-payment - Cancel reader action
/// - POST /webhook - Processor webhook (raw body)
pub fn create_router(state: AppState) -> Router {
    // The POS page may be served from another origin
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let pos_routes = Router::new()
        .route("/connection_token", post(handlers::connection_token))
        .route("/create-payment", post(handlers::create_payment))
        .route("/cancel-payment", post(handlers::cancel_payment))
        .layer(cors);

    Router::new()
        .route("/", get(handlers::index))
        .route("/health", get(handlers::health))
        .merge(pos_routes)
        // Webhooks (no CORS, must accept raw body)
        .route("/webhook", post(handlers::webhook))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
