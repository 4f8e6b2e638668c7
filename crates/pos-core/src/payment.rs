//! # Payment Types
//!
//! Request/response shapes exchanged with the payment processor.
//! Nothing here is persisted; every value lives for one request.

use crate::policy::{Currency, ReceiptDelivery};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An in-person payment request from a POS client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentRequest {
    /// Amount in smallest currency unit (cents for USD)
    pub amount: i64,
    /// Free-text description shown on the processor dashboard
    pub description: String,
    /// Caller-chosen idempotency key; one is generated when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub idempotency_key: Option<String>,
}

impl PaymentRequest {
    pub fn new(amount: i64, description: impl Into<String>) -> Self {
        Self {
            amount,
            description: description.into(),
            idempotency_key: None,
        }
    }

    /// Builder: set idempotency key
    pub fn with_idempotency_key(mut self, key: impl Into<String>) -> Self {
        self.idempotency_key = Some(key.into());
        self
    }
}

/// Parameters for creating a card-present, automatically captured intent
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentIntentParams {
    pub amount: i64,
    pub currency: Currency,
    pub description: String,
    pub automatic_payment_methods: bool,
    pub idempotency_key: Option<String>,
}

impl PaymentIntentParams {
    /// Payment method types requested for every intent
    pub const PAYMENT_METHOD_TYPES: &'static [&'static str] = &["card_present"];

    /// Capture method requested for every intent
    pub const CAPTURE_METHOD: &'static str = "automatic";
}

/// A processor-side payment intent, as much of it as the POS needs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentIntent {
    /// Processor id (pi_...)
    pub id: String,
    /// Secret the client uses to confirm the intent
    pub client_secret: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub amount: Option<i64>,
}

/// Reader-side options for processing an intent
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReaderProcessConfig {
    /// Fixed percentage tip presets; `None` disables tipping
    pub tip_percentages: Option<Vec<u32>>,
    /// Receipt delivery; `None` disables the receipt prompt
    pub receipt: Option<ReceiptDelivery>,
}

/// Result of a reader command (process or cancel)
///
/// `raw` is the processor's reader object, relayed to the caller as-is.
#[derive(Debug, Clone, PartialEq)]
pub struct ReaderAction {
    pub reader_id: String,
    /// e.g. `process_payment_intent`
    pub action_type: Option<String>,
    /// e.g. `in_progress`, `succeeded`, `failed`
    pub action_status: Option<String>,
    pub raw: serde_json::Value,
}

impl ReaderAction {
    /// Build from a processor reader object
    pub fn from_reader_object(raw: serde_json::Value) -> Self {
        let reader_id = raw
            .get("id")
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string();

        let action = raw.get("action");

        let action_type = action
            .and_then(|a| a.get("type"))
            .and_then(|v| v.as_str())
            .map(String::from);

        let action_status = action
            .and_then(|a| a.get("status"))
            .and_then(|v| v.as_str())
            .map(String::from);

        Self {
            reader_id,
            action_type,
            action_status,
            raw,
        }
    }
}

/// Short-lived credential that lets reader hardware reach the processor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionToken {
    pub secret: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

/// Outcome of a successful create-and-dispatch
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentDispatch {
    pub intent: PaymentIntent,
    pub action: ReaderAction,
}

/// Webhook event type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum WebhookEventType {
    /// `payment_intent.succeeded`
    PaymentSucceeded,
    /// `payment_intent.payment_failed`
    PaymentFailed,
    /// Anything else (passthrough)
    Other(String),
}

impl WebhookEventType {
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "payment_intent.succeeded" => WebhookEventType::PaymentSucceeded,
            "payment_intent.payment_failed" => WebhookEventType::PaymentFailed,
            other => WebhookEventType::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            WebhookEventType::PaymentSucceeded => "payment_intent.succeeded",
            WebhookEventType::PaymentFailed => "payment_intent.payment_failed",
            WebhookEventType::Other(tag) => tag,
        }
    }
}

/// A parsed webhook event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookEvent {
    /// Event ID from provider (evt_...)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_id: Option<String>,

    pub event_type: WebhookEventType,

    /// `data.object.id`, the intent id for payment_intent.* events
    #[serde(skip_serializing_if = "Option::is_none")]
    pub object_id: Option<String>,

    /// `data.object`
    pub object: serde_json::Value,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub created: Option<DateTime<Utc>>,
}

impl WebhookEvent {
    /// Last payment error message on a failed intent
    pub fn failure_message(&self) -> Option<&str> {
        self.object
            .get("last_payment_error")
            .and_then(|e| e.get("message"))
            .and_then(|v| v.as_str())
    }
}
