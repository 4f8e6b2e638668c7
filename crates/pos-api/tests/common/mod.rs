#![allow(dead_code)]

use async_trait::async_trait;
use axum_test::TestServer;
use pos_api::{create_router, AppConfig, AppState};
use pos_core::{
    ConnectionToken, PaymentError, PaymentIntent, PaymentIntentParams, PaymentResult,
    ReaderAction, ReaderProcessConfig, TerminalPolicy, TerminalProcessor, WebhookEvent,
};
use pos_stripe::WebhookHandler;
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

pub const READER_ID: &str = "tmr_test";

/// One outbound call made against the stub
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    ConnectionToken,
    CreateIntent {
        amount: i64,
        description: String,
    },
    Dispatch {
        reader_id: String,
        payment_intent_id: String,
        tip_percentages: Option<Vec<u32>>,
    },
    Cancel {
        reader_id: String,
    },
}

/// In-memory processor with scripted failures
#[derive(Default)]
pub struct StubProcessor {
    pub calls: Mutex<Vec<Call>>,
    pub intent_error: Option<String>,
    pub dispatch_error: Option<String>,
    pub cancel_error: Option<String>,
    pub token_error: Option<String>,
    pub tokens_issued: AtomicUsize,
}

impl StubProcessor {
    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    fn reject(message: &Option<String>) -> PaymentResult<()> {
        match message {
            Some(message) => Err(PaymentError::provider("stub", message.clone())),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl TerminalProcessor for StubProcessor {
    async fn create_connection_token(&self) -> PaymentResult<ConnectionToken> {
        self.record(Call::ConnectionToken);
        Self::reject(&self.token_error)?;

        let n = self.tokens_issued.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(ConnectionToken {
            secret: format!("pst_test_{}", n),
            location: None,
        })
    }

    async fn create_payment_intent(
        &self,
        params: &PaymentIntentParams,
    ) -> PaymentResult<PaymentIntent> {
        self.record(Call::CreateIntent {
            amount: params.amount,
            description: params.description.clone(),
        });
        Self::reject(&self.intent_error)?;

        Ok(PaymentIntent {
            id: "pi_test_1".to_string(),
            client_secret: "pi_test_1_secret_stub".to_string(),
            status: Some("requires_payment_method".to_string()),
            amount: Some(params.amount),
        })
    }

    async fn process_payment_intent(
        &self,
        reader_id: &str,
        payment_intent_id: &str,
        config: &ReaderProcessConfig,
    ) -> PaymentResult<ReaderAction> {
        self.record(Call::Dispatch {
            reader_id: reader_id.to_string(),
            payment_intent_id: payment_intent_id.to_string(),
            tip_percentages: config.tip_percentages.clone(),
        });
        Self::reject(&self.dispatch_error)?;

        Ok(ReaderAction::from_reader_object(json!({
            "id": reader_id,
            "object": "terminal.reader",
            "action": {
                "type": "process_payment_intent",
                "status": "in_progress",
                "process_payment_intent": { "payment_intent": payment_intent_id }
            }
        })))
    }

    async fn cancel_reader_action(&self, reader_id: &str) -> PaymentResult<ReaderAction> {
        self.record(Call::Cancel {
            reader_id: reader_id.to_string(),
        });
        Self::reject(&self.cancel_error)?;

        Ok(ReaderAction::from_reader_object(json!({
            "id": reader_id,
            "object": "terminal.reader",
            "action": null
        })))
    }

    fn provider_name(&self) -> &'static str {
        "stub"
    }
}

/// Webhook handler that remembers what it was asked to log
#[derive(Default)]
pub struct RecordingHandler {
    pub seen: Mutex<Vec<String>>,
    pub fail: bool,
}

impl RecordingHandler {
    pub fn seen(&self) -> Vec<String> {
        self.seen.lock().unwrap().clone()
    }

    fn push(&self, entry: String) -> PaymentResult<()> {
        self.seen.lock().unwrap().push(entry);
        if self.fail {
            return Err(PaymentError::Internal("handler exploded".to_string()));
        }
        Ok(())
    }
}

impl WebhookHandler for RecordingHandler {
    fn on_payment_succeeded(&self, event: &WebhookEvent) -> PaymentResult<()> {
        self.push(format!(
            "succeeded:{}",
            event.object_id.as_deref().unwrap_or("")
        ))
    }

    fn on_payment_failed(&self, event: &WebhookEvent) -> PaymentResult<()> {
        self.push(format!("failed:{}", event.object_id.as_deref().unwrap_or("")))
    }

    fn on_other_event(&self, event: &WebhookEvent) -> PaymentResult<()> {
        self.push(format!("other:{}", event.event_type.as_str()))
    }
}

pub fn state_with(processor: Arc<StubProcessor>) -> AppState {
    AppState::with_processor(
        AppConfig::for_reader(READER_ID),
        TerminalPolicy::default(),
        processor,
    )
}

pub fn server_for(state: AppState) -> TestServer {
    TestServer::new(create_router(state)).unwrap()
}
