//! # Stripe Webhook Handling
//!
//! Turns a raw webhook delivery into a `WebhookEvent` and routes it to a
//! `WebhookHandler`. Signature checking happens on the raw bytes before
//! anything is parsed.

use chrono::{DateTime, Utc};
use pos_core::{PaymentError, PaymentResult, WebhookEvent, WebhookEventType};
use serde::Deserialize;
use tracing::{debug, info, warn};

/// Maximum age of a signed delivery, in seconds
pub const DEFAULT_TOLERANCE_SECS: u64 = 300;

/// Builds events from raw deliveries.
///
/// With a signing secret, every delivery must carry a valid
/// `Stripe-Signature` header. Without one, payloads are parsed as-is.
#[derive(Debug, Clone)]
pub struct WebhookVerifier {
    secret: Option<String>,
    tolerance_secs: u64,
}

impl WebhookVerifier {
    pub fn new(secret: Option<String>) -> Self {
        Self {
            secret,
            tolerance_secs: DEFAULT_TOLERANCE_SECS,
        }
    }

    /// Verifier that accepts unsigned payloads
    pub fn unverified() -> Self {
        Self::new(None)
    }

    pub fn is_verifying(&self) -> bool {
        self.secret.is_some()
    }

    /// Verify (when configured) and parse a raw delivery
    pub fn construct_event(
        &self,
        payload: &[u8],
        signature: Option<&str>,
    ) -> PaymentResult<WebhookEvent> {
        self.construct_event_at(payload, signature, Utc::now().timestamp())
    }

    fn construct_event_at(
        &self,
        payload: &[u8],
        signature: Option<&str>,
        now: i64,
    ) -> PaymentResult<WebhookEvent> {
        if let Some(ref secret) = self.secret {
            let signature = signature.ok_or_else(|| {
                PaymentError::WebhookVerificationFailed(
                    "Missing Stripe-Signature header".to_string(),
                )
            })?;
            verify_signature(secret, payload, signature, now, self.tolerance_secs)?;
        }

        parse_event(payload)
    }
}

/// Parse a Stripe event body
pub fn parse_event(payload: &[u8]) -> PaymentResult<WebhookEvent> {
    let event: StripeWebhookEvent = serde_json::from_slice(payload).map_err(|e| {
        PaymentError::WebhookParseError(format!("Failed to parse webhook: {}", e))
    })?;

    debug!("Parsed Stripe webhook: type={}", event.event_type);

    let object = event.data.object;
    let object_id = object
        .get("id")
        .and_then(|v| v.as_str())
        .map(String::from);

    Ok(WebhookEvent {
        event_id: event.id,
        event_type: WebhookEventType::from_tag(&event.event_type),
        object_id,
        object,
        created: event.created.and_then(|ts| DateTime::from_timestamp(ts, 0)),
    })
}

/// Webhook event handler trait
///
/// Implement this trait to react to events. The defaults only log.
pub trait WebhookHandler: Send + Sync {
    /// Called for `payment_intent.succeeded`
    fn on_payment_succeeded(&self, event: &WebhookEvent) -> PaymentResult<()> {
        info!(
            payment_intent = event.object_id.as_deref().unwrap_or("unknown"),
            "✅ Payment succeeded: {}",
            event.object_id.as_deref().unwrap_or("unknown")
        );
        Ok(())
    }

    /// Called for `payment_intent.payment_failed`
    fn on_payment_failed(&self, event: &WebhookEvent) -> PaymentResult<()> {
        warn!(
            payment_intent = event.object_id.as_deref().unwrap_or("unknown"),
            reason = event.failure_message().unwrap_or("unknown"),
            "❌ Payment failed: {}",
            event.object_id.as_deref().unwrap_or("unknown")
        );
        Ok(())
    }

    /// Called for every other event type
    fn on_other_event(&self, event: &WebhookEvent) -> PaymentResult<()> {
        info!("ℹ️ Event received: {}", event.event_type.as_str());
        Ok(())
    }
}

/// Default webhook handler (just logs events)
pub struct LoggingWebhookHandler;

impl WebhookHandler for LoggingWebhookHandler {}

/// Dispatch a webhook event to the appropriate handler method
pub fn dispatch_webhook_event(
    handler: &dyn WebhookHandler,
    event: &WebhookEvent,
) -> PaymentResult<()> {
    match &event.event_type {
        WebhookEventType::PaymentSucceeded => handler.on_payment_succeeded(event),
        WebhookEventType::PaymentFailed => handler.on_payment_failed(event),
        WebhookEventType::Other(_) => handler.on_other_event(event),
    }
}

/// Events to enable on the Stripe Dashboard endpoint
pub const REQUIRED_WEBHOOK_EVENTS: &[&str] =
    &["payment_intent.succeeded", "payment_intent.payment_failed"];

/// Print instructions for setting up webhooks
pub fn print_webhook_setup_instructions(endpoint_url: &str) {
    println!("=== Stripe Webhook Setup ===\n");
    println!("1. Go to: https://dashboard.stripe.com/webhooks\n");
    println!("2. Add endpoint: {}\n", endpoint_url);
    println!("3. Select these events:");
    for event in REQUIRED_WEBHOOK_EVENTS {
        println!("   - {}", event);
    }
    println!("\n4. Copy the signing secret (whsec_...) to STRIPE_WEBHOOK_SECRET");
    println!("\n5. For local testing, use Stripe CLI:");
    println!("   stripe listen --forward-to {}", endpoint_url);
}

#[derive(Debug, Deserialize)]
struct StripeWebhookEvent {
    #[serde(default)]
    id: Option<String>,
    #[serde(rename = "type")]
    event_type: String,
    #[serde(default)]
    created: Option<i64>,
    data: StripeEventData,
}

#[derive(Debug, Deserialize)]
struct StripeEventData {
    object: serde_json::Value,
}

// =============================================================================
// Webhook Signature Verification
// =============================================================================

struct SignatureHeader {
    timestamp: i64,
    signatures: Vec<String>,
}

fn parse_signature_header(header: &str) -> PaymentResult<SignatureHeader> {
    let mut timestamp = None;
    let mut signatures = Vec::new();

    for part in header.split(',') {
        let Some((key, value)) = part.trim().split_once('=') else {
            continue;
        };
        match key {
            "t" => timestamp = value.parse().ok(),
            "v1" => signatures.push(value.to_string()),
            _ => {}
        }
    }

    let timestamp = timestamp.ok_or_else(|| {
        PaymentError::WebhookVerificationFailed("Missing timestamp in signature".to_string())
    })?;

    if signatures.is_empty() {
        return Err(PaymentError::WebhookVerificationFailed(
            "No v1 signature found".to_string(),
        ));
    }

    Ok(SignatureHeader {
        timestamp,
        signatures,
    })
}

fn verify_signature(
    secret: &str,
    payload: &[u8],
    header: &str,
    now: i64,
    tolerance_secs: u64,
) -> PaymentResult<()> {
    let sig_parts = parse_signature_header(header)?;

    // abs_diff cannot overflow, whatever timestamp the header carries
    if now.abs_diff(sig_parts.timestamp) > tolerance_secs {
        return Err(PaymentError::WebhookVerificationFailed(
            "Timestamp outside tolerance".to_string(),
        ));
    }

    let expected_sig = compute_signature(secret, sig_parts.timestamp, payload)?;

    let valid = sig_parts
        .signatures
        .iter()
        .any(|sig| constant_time_compare(sig, &expected_sig));

    if !valid {
        return Err(PaymentError::WebhookVerificationFailed(
            "Signature mismatch".to_string(),
        ));
    }

    Ok(())
}

/// Hex HMAC-SHA256 over `"{timestamp}.{payload}"`
pub fn compute_signature(secret: &str, timestamp: i64, payload: &[u8]) -> PaymentResult<String> {
    use hmac::{Hmac, Mac};
    use sha2::Sha256;

    type HmacSha256 = Hmac<Sha256>;

    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| PaymentError::Internal(format!("HMAC key rejected: {}", e)))?;
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(payload);
    Ok(hex::encode(mac.finalize().into_bytes()))
}

fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.bytes()
        .zip(b.bytes())
        .fold(0, |acc, (x, y)| acc | (x ^ y))
        == 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Mutex;

    const SECRET: &str = "whsec_test";
    const NOW: i64 = 1_700_000_000;

    fn succeeded_payload() -> Vec<u8> {
        serde_json::to_vec(&json!({
            "id": "evt_1",
            "type": "payment_intent.succeeded",
            "created": NOW,
            "data": { "object": { "id": "pi_1", "amount": 1000 } }
        }))
        .unwrap()
    }

    fn signed_header(payload: &[u8], timestamp: i64) -> String {
        let sig = compute_signature(SECRET, timestamp, payload).unwrap();
        format!("t={},v1={}", timestamp, sig)
    }

    #[test]
    fn test_parse_signature_header() {
        let parsed = parse_signature_header("t=1234567890,v1=abc123,v0=old,v1=def456").unwrap();

        assert_eq!(parsed.timestamp, 1234567890);
        assert_eq!(parsed.signatures, vec!["abc123", "def456"]);

        assert!(parse_signature_header("v1=abc").is_err());
        assert!(parse_signature_header("t=123").is_err());
    }

    #[test]
    fn test_signature_is_hex_sha256() {
        let sig = compute_signature(SECRET, NOW, b"{}").unwrap();
        assert_eq!(sig.len(), 64);
        assert!(sig.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_constant_time_compare() {
        assert!(constant_time_compare("abc123", "abc123"));
        assert!(!constant_time_compare("abc123", "abc124"));
        assert!(!constant_time_compare("abc", "abcd"));
    }

    #[test]
    fn test_verified_event() {
        let payload = succeeded_payload();
        let verifier = WebhookVerifier::new(Some(SECRET.to_string()));

        let event = verifier
            .construct_event_at(&payload, Some(&signed_header(&payload, NOW)), NOW + 10)
            .unwrap();

        assert_eq!(event.event_type, WebhookEventType::PaymentSucceeded);
        assert_eq!(event.object_id.as_deref(), Some("pi_1"));
        assert_eq!(event.event_id.as_deref(), Some("evt_1"));
        assert_eq!(event.created.map(|c| c.timestamp()), Some(NOW));
    }

    #[test]
    fn test_rejects_tampered_payload() {
        let payload = succeeded_payload();
        let header = signed_header(&payload, NOW);
        let verifier = WebhookVerifier::new(Some(SECRET.to_string()));

        let mut tampered = payload.clone();
        tampered.extend_from_slice(b" ");

        let err = verifier
            .construct_event_at(&tampered, Some(&header), NOW)
            .unwrap_err();
        assert!(matches!(err, PaymentError::WebhookVerificationFailed(_)));
    }

    #[test]
    fn test_rejects_stale_and_unsigned_deliveries() {
        let payload = succeeded_payload();
        let verifier = WebhookVerifier::new(Some(SECRET.to_string()));

        let stale = verifier.construct_event_at(
            &payload,
            Some(&signed_header(&payload, NOW)),
            NOW + DEFAULT_TOLERANCE_SECS as i64 + 1,
        );
        assert!(matches!(stale, Err(PaymentError::WebhookVerificationFailed(_))));

        let unsigned = verifier.construct_event_at(&payload, None, NOW);
        assert!(matches!(unsigned, Err(PaymentError::WebhookVerificationFailed(_))));
    }

    #[test]
    fn test_rejects_extreme_timestamps() {
        let payload = succeeded_payload();
        let verifier = WebhookVerifier::new(Some(SECRET.to_string()));

        for header in [
            "t=-9223372036854775808,v1=00",
            "t=9223372036854775807,v1=00",
        ] {
            let result = verifier.construct_event_at(&payload, Some(header), NOW);
            assert!(matches!(result, Err(PaymentError::WebhookVerificationFailed(_))));
        }

        let result = verifier.construct_event_at(
            &payload,
            Some(&signed_header(&payload, NOW)),
            i64::MIN,
        );
        assert!(matches!(result, Err(PaymentError::WebhookVerificationFailed(_))));
    }

    #[test]
    fn test_unverified_mode_parses_minimal_event() {
        let payload = br#"{"type":"payment_intent.succeeded","data":{"object":{"id":"pi_1"}}}"#;
        let event = WebhookVerifier::unverified()
            .construct_event(payload, None)
            .unwrap();

        assert_eq!(event.object_id.as_deref(), Some("pi_1"));
        assert!(event.event_id.is_none());
        assert!(event.created.is_none());
    }

    #[test]
    fn test_malformed_payload() {
        let err = parse_event(b"not json").unwrap_err();
        assert!(matches!(err, PaymentError::WebhookParseError(_)));

        let err = parse_event(br#"{"type":"charge.refunded"}"#).unwrap_err();
        assert!(matches!(err, PaymentError::WebhookParseError(_)));
    }

    #[test]
    fn test_dispatch_webhook() {
        #[derive(Default)]
        struct RecordingHandler {
            seen: Mutex<Vec<String>>,
        }

        impl WebhookHandler for RecordingHandler {
            fn on_payment_succeeded(&self, event: &WebhookEvent) -> PaymentResult<()> {
                self.seen
                    .lock()
                    .unwrap()
                    .push(format!("succeeded:{}", event.object_id.as_deref().unwrap_or("")));
                Ok(())
            }

            fn on_payment_failed(&self, event: &WebhookEvent) -> PaymentResult<()> {
                self.seen
                    .lock()
                    .unwrap()
                    .push(format!("failed:{}", event.failure_message().unwrap_or("")));
                Ok(())
            }

            fn on_other_event(&self, event: &WebhookEvent) -> PaymentResult<()> {
                self.seen
                    .lock()
                    .unwrap()
                    .push(format!("other:{}", event.event_type.as_str()));
                Ok(())
            }
        }

        let handler = RecordingHandler::default();
        let events = [
            json!({ "type": "payment_intent.succeeded", "data": { "object": { "id": "pi_1" } } }),
            json!({
                "type": "payment_intent.payment_failed",
                "data": { "object": { "id": "pi_2", "last_payment_error": { "message": "card declined" } } }
            }),
            json!({ "type": "terminal.reader.action_succeeded", "data": { "object": { "id": "tmr_1" } } }),
        ];

        for raw in events {
            let event = parse_event(&serde_json::to_vec(&raw).unwrap()).unwrap();
            dispatch_webhook_event(&handler, &event).unwrap();
        }

        assert_eq!(
            *handler.seen.lock().unwrap(),
            vec![
                "succeeded:pi_1",
                "failed:card declined",
                "other:terminal.reader.action_succeeded"
            ]
        );
    }

    #[test]
    fn test_logging_handler_reports_each_event_kind() {
        use std::io;
        use std::sync::Arc;

        #[derive(Clone, Default)]
        struct CaptureWriter(Arc<Mutex<Vec<u8>>>);

        impl io::Write for CaptureWriter {
            fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
                self.0.lock().unwrap().extend_from_slice(buf);
                Ok(buf.len())
            }

            fn flush(&mut self) -> io::Result<()> {
                Ok(())
            }
        }

        let capture = CaptureWriter::default();
        let writer = capture.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .finish();

        let events = [
            json!({ "type": "payment_intent.succeeded", "data": { "object": { "id": "pi_1" } } }),
            json!({
                "type": "payment_intent.payment_failed",
                "data": { "object": { "id": "pi_2", "last_payment_error": { "message": "card declined" } } }
            }),
            json!({ "type": "terminal.reader.action_succeeded", "data": { "object": { "id": "tmr_1" } } }),
        ];

        tracing::subscriber::with_default(subscriber, || {
            for raw in events {
                let event = parse_event(&serde_json::to_vec(&raw).unwrap()).unwrap();
                dispatch_webhook_event(&LoggingWebhookHandler, &event).unwrap();
            }
        });

        let output = String::from_utf8(capture.0.lock().unwrap().clone()).unwrap();
        assert!(output.contains("Payment succeeded: pi_1"));
        assert!(output.contains("Payment failed: pi_2"));
        assert!(output.contains("card declined"));
        assert!(output.contains("Event received: terminal.reader.action_succeeded"));
    }
}
