//! # pos-api
//!
//! HTTP API layer for pos-relay.
//!
//! This crate provides:
//! - Axum-based HTTP server
//! - Endpoints for the in-store POS client
//! - Webhook receiver for processor events
//!
//! ## Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | GET | `/` | POS landing page |
//! | GET | `/health` | Health check |
//! | POST | `/connection_token` | Reader connection token |
//! | POST | `/create-payment` | Create intent and dispatch to reader |
//! | POST | `/cancel-payment` | Cancel reader action |
//! | POST | `/webhook` | Processor webhook |

pub mod handlers;
pub mod routes;
pub mod state;
pub mod telemetry;

pub use routes::create_router;
pub use state::{AppConfig, AppState};
