//! # Stripe Terminal Client
//!
//! Implementation of the Stripe Terminal and Payment Intents APIs used by
//! the POS relay: connection tokens, card-present intents, and reader
//! commands.

use crate::config::StripeConfig;
use async_trait::async_trait;
use pos_core::{
    ConnectionToken, PaymentError, PaymentIntent, PaymentIntentParams, PaymentResult,
    ReaderAction, ReaderProcessConfig, TerminalProcessor,
};
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, error, info, instrument};

/// Stripe Terminal client
///
/// Talks to Stripe with form-encoded requests. One HTTP call per method,
/// no retries.
pub struct StripeTerminalClient {
    pub(crate) config: StripeConfig,
    client: Client,
}

impl StripeTerminalClient {
    /// Create a new Stripe Terminal client
    pub fn new(config: StripeConfig) -> PaymentResult<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| {
                PaymentError::Configuration(format!("Failed to create HTTP client: {}", e))
            })?;

        Ok(Self { config, client })
    }

    /// Create from environment variables
    pub fn from_env() -> PaymentResult<Self> {
        let config = StripeConfig::from_env()?;
        Self::new(config)
    }

    pub fn config(&self) -> &StripeConfig {
        &self.config
    }

    /// POST form params to `path` and return the response body.
    ///
    /// Non-2xx responses become `ProviderError` carrying Stripe's message.
    pub(crate) async fn post_form(
        &self,
        path: &str,
        form_params: &[(String, String)],
        idempotency_key: Option<&str>,
    ) -> PaymentResult<String> {
        let url = format!("{}{}", self.config.api_base_url, path);

        let mut request = self
            .client
            .post(&url)
            .header("Authorization", self.config.auth_header())
            .header("Stripe-Version", &self.config.api_version)
            .form(form_params);

        if let Some(key) = idempotency_key {
            request = request.header("Idempotency-Key", key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| PaymentError::NetworkError(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| PaymentError::NetworkError(e.to_string()))?;

        if !status.is_success() {
            error!("Stripe API error: path={}, status={}, body={}", path, status, body);

            // Parse Stripe error
            if let Ok(error_response) = serde_json::from_str::<StripeErrorResponse>(&body) {
                return Err(PaymentError::ProviderError {
                    provider: "stripe".to_string(),
                    message: error_response.error.message,
                    code: error_response.error.code,
                });
            }

            return Err(PaymentError::provider(
                "stripe",
                format!("HTTP {}: {}", status, body),
            ));
        }

        Ok(body)
    }

    pub(crate) fn parse<T: for<'de> Deserialize<'de>>(body: &str) -> PaymentResult<T> {
        serde_json::from_str(body).map_err(|e| {
            PaymentError::Serialization(format!("Failed to parse Stripe response: {}", e))
        })
    }

    /// Form params for `POST /v1/payment_intents`
    fn payment_intent_form(params: &PaymentIntentParams) -> Vec<(String, String)> {
        let mut form_params: Vec<(String, String)> = vec![
            ("amount".to_string(), params.amount.to_string()),
            ("currency".to_string(), params.currency.as_str().to_string()),
            ("description".to_string(), params.description.clone()),
            (
                "capture_method".to_string(),
                PaymentIntentParams::CAPTURE_METHOD.to_string(),
            ),
        ];

        for (i, method) in PaymentIntentParams::PAYMENT_METHOD_TYPES.iter().enumerate() {
            form_params.push((format!("payment_method_types[{}]", i), method.to_string()));
        }

        if params.automatic_payment_methods {
            form_params.push((
                "automatic_payment_methods[enabled]".to_string(),
                "true".to_string(),
            ));
        }

        form_params
    }

    /// Form params for `POST /v1/terminal/readers/{id}/process_payment_intent`
    fn process_form(payment_intent_id: &str, config: &ReaderProcessConfig) -> Vec<(String, String)> {
        let mut form_params = vec![(
            "payment_intent".to_string(),
            payment_intent_id.to_string(),
        )];

        if let Some(ref percentages) = config.tip_percentages {
            form_params.push(("tipping[type]".to_string(), "fixed_percentage".to_string()));
            for (i, pct) in percentages.iter().enumerate() {
                form_params.push((format!("tipping[percentages][{}]", i), pct.to_string()));
            }
        }

        if let Some(delivery) = config.receipt {
            form_params.push(("receipt[type]".to_string(), delivery.as_str().to_string()));
        }

        form_params
    }
}

#[async_trait]
impl TerminalProcessor for StripeTerminalClient {
    #[instrument(skip(self))]
    async fn create_connection_token(&self) -> PaymentResult<ConnectionToken> {
        let mut form_params = Vec::new();
        if let Some(ref location) = self.config.location_id {
            form_params.push(("location".to_string(), location.clone()));
        }

        let body = self
            .post_form("/v1/terminal/connection_tokens", &form_params, None)
            .await?;
        let token: StripeConnectionToken = Self::parse(&body)?;

        debug!("Issued connection token: location={:?}", token.location);

        Ok(ConnectionToken {
            secret: token.secret,
            location: token.location,
        })
    }

    #[instrument(skip(self, params), fields(amount = params.amount, currency = %params.currency))]
    async fn create_payment_intent(
        &self,
        params: &PaymentIntentParams,
    ) -> PaymentResult<PaymentIntent> {
        let idempotency_key = params
            .idempotency_key
            .clone()
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

        let form_params = Self::payment_intent_form(params);
        let body = self
            .post_form("/v1/payment_intents", &form_params, Some(&idempotency_key))
            .await?;
        let intent: StripePaymentIntent = Self::parse(&body)?;

        info!(
            "Created Stripe payment intent: id={}, status={}",
            intent.id, intent.status
        );

        let client_secret = intent.client_secret.ok_or_else(|| {
            PaymentError::Serialization("Payment intent has no client_secret".to_string())
        })?;

        Ok(PaymentIntent {
            id: intent.id,
            client_secret,
            status: Some(intent.status),
            amount: Some(intent.amount),
        })
    }

    #[instrument(skip(self, config))]
    async fn process_payment_intent(
        &self,
        reader_id: &str,
        payment_intent_id: &str,
        config: &ReaderProcessConfig,
    ) -> PaymentResult<ReaderAction> {
        let form_params = Self::process_form(payment_intent_id, config);
        let path = format!("/v1/terminal/readers/{}/process_payment_intent", reader_id);

        let body = self.post_form(&path, &form_params, None).await?;
        let reader: serde_json::Value = Self::parse(&body)?;
        let action = ReaderAction::from_reader_object(reader);

        info!(
            "Dispatched intent to reader: reader={}, action_status={:?}",
            action.reader_id, action.action_status
        );

        Ok(action)
    }

    #[instrument(skip(self))]
    async fn cancel_reader_action(&self, reader_id: &str) -> PaymentResult<ReaderAction> {
        let path = format!("/v1/terminal/readers/{}/cancel_action", reader_id);

        let body = self.post_form(&path, &[], None).await?;
        let reader: serde_json::Value = Self::parse(&body)?;

        info!("Canceled reader action: reader={}", reader_id);

        Ok(ReaderAction::from_reader_object(reader))
    }

    fn provider_name(&self) -> &'static str {
        "stripe"
    }
}

// =============================================================================
// Stripe API Types
// =============================================================================

#[derive(Debug, Deserialize)]
struct StripeConnectionToken {
    secret: String,
    #[serde(default)]
    location: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StripePaymentIntent {
    id: String,
    #[serde(default)]
    client_secret: Option<String>,
    status: String,
    amount: i64,
}

#[derive(Debug, Deserialize)]
struct StripeErrorResponse {
    error: StripeError,
}

#[derive(Debug, Deserialize)]
struct StripeError {
    message: String,
    #[serde(default)]
    code: Option<String>,
}
