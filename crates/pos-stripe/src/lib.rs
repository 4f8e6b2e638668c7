//! # pos-stripe
//!
//! Stripe Terminal processor for pos-relay.
//!
//! This crate provides:
//!
//! 1. **StripeTerminalClient** - implements `TerminalProcessor`
//!    - Connection tokens for reader SDKs
//!    - Card-present payment intents (automatic capture)
//!    - Reader dispatch and cancellation
//!    - Location setup for tipping/receipt flags
//!
//! 2. **WebhookVerifier** - raw-body webhook parsing with optional
//!    `Stripe-Signature` verification
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use pos_stripe::StripeTerminalClient;
//! use pos_core::{collect_payment, PaymentRequest, TerminalPolicy};
//!
//! let client = StripeTerminalClient::from_env()?;
//!
//! let dispatch = collect_payment(
//!     &client,
//!     "tmr_123",
//!     &TerminalPolicy::default(),
//!     &PaymentRequest::new(1000, "Latte"),
//! ).await?;
//! ```
//!
//! ## Webhook Handling
//!
//! ```rust,ignore
//! use pos_stripe::{dispatch_webhook_event, LoggingWebhookHandler, WebhookVerifier};
//!
//! let verifier = WebhookVerifier::new(config.webhook_secret.clone());
//! let event = verifier.construct_event(&body, signature)?;
//! dispatch_webhook_event(&LoggingWebhookHandler, &event)?;
//! ```

pub mod config;
pub mod location;
pub mod terminal;
pub mod webhook;

// Re-exports
pub use config::StripeConfig;
pub use location::{LocationAddress, LocationParams, TerminalLocation};
pub use terminal::StripeTerminalClient;
pub use webhook::{
    dispatch_webhook_event, LoggingWebhookHandler, WebhookHandler, WebhookVerifier,
    REQUIRED_WEBHOOK_EVENTS,
};
