//! # pos-relay
//!
//! Card-present payment relay between an in-store POS and Stripe Terminal.
//!
//! ## Usage
//!
//! ```bash
//! # Set environment variables
//! export STRIPE_SECRET_KEY=sk_test_...
//! export READER_ID=tmr_...
//! export STRIPE_WEBHOOK_SECRET=whsec_...   # optional
//!
//! # Run the server
//! pos-relay
//! ```

use pos_api::{routes, state::AppState, telemetry};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    telemetry::init();

    print_banner();

    // Initialize application state
    let state = AppState::new()?;

    let addr = state.config.socket_addr()?;
    let is_prod = state.config.is_production();

    info!("Environment: {}", state.config.environment);
    info!("Reader: {}", state.config.reader_id);
    info!(
        "Policy: currency={}, tipping={}, receipts={}, automatic_payment_methods={}",
        state.policy.currency,
        state.policy.tipping.enabled,
        state.policy.receipt.enabled,
        state.policy.automatic_payment_methods
    );
    info!("Payment provider: {}", state.processor.provider_name());

    // Create router
    let app = routes::create_router(state);

    // Start server
    info!("🚀 Server running on http://{}", addr);

    if !is_prod {
        info!("💳 Payment: POST http://{}/create-payment", addr);
        info!("🔔 Webhook: POST http://{}/webhook", addr);
    }

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn print_banner() {
    println!(
        r#"
  💳 POS Relay 💳
  ━━━━━━━━━━━━━━━━━━━━━━━
  Card-present payments over Stripe Terminal
  Version: {}

"#,
        env!("CARGO_PKG_VERSION")
    );
}
