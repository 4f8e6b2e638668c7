//! # Payment Error Types
//!
//! Typed error handling for the pos-relay service.
//! All processor operations return `Result<T, PaymentError>`.

use thiserror::Error;

/// Core error type for all payment operations
#[derive(Debug, Error)]
pub enum PaymentError {
    /// Configuration errors (missing keys, invalid config)
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Payment processor rejected the call
    #[error("Provider error [{provider}]: {message}")]
    ProviderError {
        provider: String,
        message: String,
        /// Processor error code (e.g. `terminal_reader_busy`), when one was sent
        code: Option<String>,
    },

    /// Network/HTTP error communicating with provider
    #[error("Network error: {0}")]
    NetworkError(String),

    /// Webhook signature verification failed
    #[error("Webhook verification failed: {0}")]
    WebhookVerificationFailed(String),

    /// Webhook payload parsing error
    #[error("Webhook parse error: {0}")]
    WebhookParseError(String),

    /// Internal error (should not happen)
    #[error("Internal error: {0}")]
    Internal(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl PaymentError {
    /// Shorthand for a processor rejection without an error code
    pub fn provider(provider: impl Into<String>, message: impl Into<String>) -> Self {
        PaymentError::ProviderError {
            provider: provider.into(),
            message: message.into(),
            code: None,
        }
    }

    /// Message relayed to POS clients.
    ///
    /// Processor rejections pass the processor's own text through untouched;
    /// everything else uses the display form.
    pub fn client_message(&self) -> String {
        match self {
            PaymentError::ProviderError { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}

/// Result type alias for payment operations
pub type PaymentResult<T> = Result<T, PaymentError>;
