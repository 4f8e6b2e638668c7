//! # Terminal Processor Trait
//!
//! The remote payment processor as seen by the POS relay.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                 TerminalProcessor (trait)                   │
//! │  ├── create_connection_token()                              │
//! │  ├── create_payment_intent()                                │
//! │  ├── process_payment_intent()   (reader dispatch)           │
//! │  └── cancel_reader_action()                                 │
//! └─────────────────────────────────────────────────────────────┘
//!                            ▲
//!            ┌───────────────┴───────────────┐
//!            │                               │
//!  ┌─────────┴─────────┐           ┌─────────┴─────────┐
//!  │StripeTerminalClient│          │  in-memory stubs  │
//!  │   (pos-stripe)     │          │     (tests)       │
//!  └────────────────────┘          └───────────────────┘
//! ```

use crate::error::PaymentResult;
use crate::payment::{
    ConnectionToken, PaymentDispatch, PaymentIntent, PaymentIntentParams, PaymentRequest,
    ReaderAction, ReaderProcessConfig,
};
use crate::policy::TerminalPolicy;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{error, info, instrument};

/// Core trait for card-present payment processors.
///
/// Every method is a single outbound call. Implementations must not retry
/// and must not cache results across calls.
#[async_trait]
pub trait TerminalProcessor: Send + Sync {
    /// Issue a fresh connection token for reader hardware.
    async fn create_connection_token(&self) -> PaymentResult<ConnectionToken>;

    /// Create a payment intent.
    async fn create_payment_intent(
        &self,
        params: &PaymentIntentParams,
    ) -> PaymentResult<PaymentIntent>;

    /// Hand an intent to a reader so it starts collecting the card.
    ///
    /// # Arguments
    /// * `reader_id` - Reader to dispatch to
    /// * `payment_intent_id` - Intent created by `create_payment_intent`
    /// * `config` - Tipping and receipt options
    async fn process_payment_intent(
        &self,
        reader_id: &str,
        payment_intent_id: &str,
        config: &ReaderProcessConfig,
    ) -> PaymentResult<ReaderAction>;

    /// Cancel whatever action the reader is running.
    async fn cancel_reader_action(&self, reader_id: &str) -> PaymentResult<ReaderAction>;

    /// Get the provider name (for logging).
    fn provider_name(&self) -> &'static str;
}

/// Type alias for a shared processor (dynamic dispatch)
pub type BoxedTerminalProcessor = Arc<dyn TerminalProcessor>;

/// Create a payment intent and dispatch it to the reader.
///
/// The reader is only contacted once the intent exists. A dispatch failure
/// leaves the intent uncollected on the processor side; the error carries no
/// trace of it, only the log does.
#[instrument(skip(processor, policy, request), fields(amount = request.amount))]
pub async fn collect_payment(
    processor: &dyn TerminalProcessor,
    reader_id: &str,
    policy: &TerminalPolicy,
    request: &PaymentRequest,
) -> PaymentResult<PaymentDispatch> {
    let params = policy.intent_params(request);
    let intent = processor.create_payment_intent(&params).await?;

    info!(
        "Created payment intent: id={}, provider={}",
        intent.id,
        processor.provider_name()
    );

    let action = processor
        .process_payment_intent(reader_id, &intent.id, &policy.process_config())
        .await
        .map_err(|e| {
            error!(
                payment_intent = %intent.id,
                reader = %reader_id,
                "Reader dispatch failed, intent left uncollected: {}", e
            );
            e
        })?;

    Ok(PaymentDispatch { intent, action })
}
