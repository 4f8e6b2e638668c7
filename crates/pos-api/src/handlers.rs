//! # Request Handlers
//!
//! Axum request handlers for the POS relay. Each handler makes its
//! processor calls in order and relays the result; nothing is stored.

use crate::state::AppState;
use axum::{
    body::Bytes,
    extract::{rejection::JsonRejection, State},
    http::{HeaderMap, StatusCode},
    response::{Html, IntoResponse},
    Json,
};
use pos_core::{collect_payment, PaymentError, PaymentRequest};
use pos_stripe::dispatch_webhook_event;
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument};

const POS_PAGE: &str = include_str!("../static/pos.html");

// =============================================================================
// Request/Response Types
// =============================================================================

/// Connection token response
#[derive(Debug, Serialize, Deserialize)]
pub struct ConnectionTokenResponse {
    pub secret: String,
}

/// Create payment response
#[derive(Debug, Serialize, Deserialize)]
pub struct CreatePaymentResponse {
    /// Client secret of the new payment intent
    pub client_secret: String,
    /// Reader object returned by the processor after dispatch
    pub action: serde_json::Value,
}

/// Cancel payment response
#[derive(Debug, Serialize, Deserialize)]
pub struct CancelPaymentResponse {
    pub message: String,
}

/// Webhook acknowledgment
#[derive(Debug, Serialize, Deserialize)]
pub struct WebhookAck {
    pub received: bool,
}

/// Error response
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn payment_error_to_response(status: StatusCode, err: &PaymentError) -> ApiError {
    (status, Json(ErrorResponse::new(err.client_message())))
}

// =============================================================================
// Handlers
// =============================================================================

/// POS landing page
pub async fn index() -> impl IntoResponse {
    Html(POS_PAGE)
}

/// Health check endpoint
pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "pos-relay",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Issue a fresh connection token for reader hardware
#[instrument(skip(state))]
pub async fn connection_token(
    State(state): State<AppState>,
) -> Result<Json<ConnectionTokenResponse>, ApiError> {
    let token = state
        .processor
        .create_connection_token()
        .await
        .map_err(|e| {
            error!("❌ Error creating connection token: {}", e);
            payment_error_to_response(StatusCode::INTERNAL_SERVER_ERROR, &e)
        })?;

    Ok(Json(ConnectionTokenResponse {
        secret: token.secret,
    }))
}

/// Create a payment intent and dispatch it to the designated reader
///
/// A body that is not a valid `PaymentRequest` (bad JSON, missing fields,
/// wrong content type) gets the same 400 `{ error }` shape as a processor
/// rejection, and no processor call is made.
#[instrument(skip(state, payload), fields(amount))]
pub async fn create_payment(
    State(state): State<AppState>,
    payload: Result<Json<PaymentRequest>, JsonRejection>,
) -> Result<Json<CreatePaymentResponse>, ApiError> {
    let Json(request) = payload.map_err(|rejection| {
        error!("❌ Error creating payment: {}", rejection.body_text());
        (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new(rejection.body_text())),
        )
    })?;
    tracing::Span::current().record("amount", request.amount);

    let dispatch = collect_payment(
        state.processor.as_ref(),
        state.reader_id(),
        &state.policy,
        &request,
    )
    .await
    .map_err(|e| {
        error!("❌ Error creating payment: {}", e);
        payment_error_to_response(StatusCode::BAD_REQUEST, &e)
    })?;

    info!(
        "Payment sent to reader: intent={}, reader={}",
        dispatch.intent.id, dispatch.action.reader_id
    );

    Ok(Json(CreatePaymentResponse {
        client_secret: dispatch.intent.client_secret,
        action: dispatch.action.raw,
    }))
}

/// Cancel the action running on the designated reader
#[instrument(skip(state))]
pub async fn cancel_payment(
    State(state): State<AppState>,
) -> Result<Json<CancelPaymentResponse>, ApiError> {
    state
        .processor
        .cancel_reader_action(state.reader_id())
        .await
        .map_err(|e| {
            error!("❌ Error canceling payment: {}", e);
            payment_error_to_response(StatusCode::BAD_REQUEST, &e)
        })?;

    Ok(Json(CancelPaymentResponse {
        message: "Payment canceled successfully.".to_string(),
    }))
}

/// Handle a processor webhook
///
/// The body stays raw bytes until the verifier has seen it. Once an event
/// parses, the processor always gets an acknowledgment so it stops retrying.
#[instrument(skip(state, headers, body))]
pub async fn webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<WebhookAck>, ApiError> {
    let signature = headers
        .get("stripe-signature")
        .and_then(|v| v.to_str().ok());

    let event = state
        .webhook_verifier
        .construct_event(&body, signature)
        .map_err(|e| {
            error!("❌ Webhook rejected: {}", e);
            payment_error_to_response(StatusCode::BAD_REQUEST, &e)
        })?;

    if let Err(e) = dispatch_webhook_event(state.webhook_handler.as_ref(), &event) {
        error!(
            "❌ Webhook handler error: type={}, error={}",
            event.event_type.as_str(),
            e
        );
    }

    Ok(Json(WebhookAck { received: true }))
}
