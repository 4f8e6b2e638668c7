//! # pos-core
//!
//! Core types and traits for the pos-relay card-present payment service.
//!
//! This crate provides:
//! - `TerminalProcessor` trait for the remote payment processor
//! - `collect_payment` to create an intent and dispatch it to a reader
//! - `TerminalPolicy` for tipping, receipts and currency
//! - `PaymentError` for typed error handling
//!
//! ## Example
//!
//! ```rust,ignore
//! use pos_core::{collect_payment, PaymentRequest, TerminalPolicy};
//!
//! let policy = TerminalPolicy::default();
//! let request = PaymentRequest::new(1000, "Latte");
//!
//! let dispatch = collect_payment(&processor, "tmr_123", &policy, &request).await?;
//!
//! // Hand dispatch.intent.client_secret back to the POS client
//! ```

pub mod error;
pub mod payment;
pub mod policy;
pub mod processor;

// Re-exports for convenience
pub use error::{PaymentError, PaymentResult};
pub use payment::{
    ConnectionToken, PaymentDispatch, PaymentIntent, PaymentIntentParams, PaymentRequest,
    ReaderAction, ReaderProcessConfig, WebhookEvent, WebhookEventType,
};
pub use policy::{Currency, ReceiptDelivery, ReceiptPolicy, TerminalPolicy, TippingPolicy};
pub use processor::{collect_payment, BoxedTerminalProcessor, TerminalProcessor};
