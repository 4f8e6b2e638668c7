//! # terminal-setup
//!
//! One-off store setup: creates a Terminal location with tipping and
//! receipt flags and moves the configured reader onto it.
//!
//! ```bash
//! export STRIPE_SECRET_KEY=sk_live_...
//! export READER_ID=tmr_...
//! export LOCATION_NAME="Main Location"
//! export LOCATION_LINE1="123 Main St" LOCATION_CITY=Houston \
//!        LOCATION_STATE=TX LOCATION_POSTAL_CODE=77002 LOCATION_COUNTRY=US
//! terminal-setup
//! ```
//!
//! Set `WEBHOOK_URL` to also print webhook endpoint instructions.
//! Restart the reader afterwards so it picks up the location settings.

use pos_api::telemetry;
use pos_stripe::webhook::print_webhook_setup_instructions;
use pos_stripe::{LocationAddress, LocationParams, StripeTerminalClient};
use tracing::info;

fn required(name: &str) -> anyhow::Result<String> {
    std::env::var(name).map_err(|_| anyhow::anyhow!("{} not set", name))
}

fn flag(name: &str) -> bool {
    std::env::var(name)
        .map(|v| v != "false" && v != "0")
        .unwrap_or(true)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    telemetry::init();

    let client = StripeTerminalClient::from_env()
        .map_err(|e| anyhow::anyhow!("Failed to initialize Stripe: {}", e))?;
    let reader_id = required("READER_ID")?;

    let address = LocationAddress {
        line1: required("LOCATION_LINE1")?,
        line2: std::env::var("LOCATION_LINE2").ok(),
        city: required("LOCATION_CITY")?,
        state: required("LOCATION_STATE")?,
        postal_code: required("LOCATION_POSTAL_CODE")?,
        country: std::env::var("LOCATION_COUNTRY").unwrap_or_else(|_| "US".to_string()),
    };

    let params = LocationParams::new(required("LOCATION_NAME")?, address)
        .with_terminal_flags(flag("TIPPING_ENABLED"), flag("RECEIPT_ENABLED"));

    let location = client
        .create_location(&params)
        .await
        .map_err(|e| anyhow::anyhow!("❌ Failed to create location: {}", e))?;
    info!("✅ Location created: {} ({})", location.id, location.display_name);

    let reader = client
        .assign_reader_location(&reader_id, &location.id)
        .await
        .map_err(|e| anyhow::anyhow!("❌ Failed to update reader: {}", e))?;
    info!("✅ Reader updated: {}", reader);

    println!("\nDone! Restart the reader and test a charge.\n");

    if let Ok(endpoint) = std::env::var("WEBHOOK_URL") {
        print_webhook_setup_instructions(&endpoint);
    }

    Ok(())
}
