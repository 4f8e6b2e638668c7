//! # Application State
//!
//! Shared state for the Axum application.
//! Built once at startup and handed to every handler by the router.

use pos_core::{BoxedTerminalProcessor, TerminalPolicy};
use pos_stripe::{LoggingWebhookHandler, StripeConfig, StripeTerminalClient, WebhookHandler, WebhookVerifier};
use std::sync::Arc;

/// Application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Host to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// Reader that receives every payment and cancel command
    pub reader_id: String,
    /// Environment (development, staging, production)
    pub environment: String,
}

impl AppConfig {
    /// Load from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let reader_id = std::env::var("READER_ID")
            .ok()
            .filter(|id| !id.is_empty())
            .ok_or_else(|| anyhow::anyhow!("READER_ID not set"))?;

        Ok(Self {
            host: std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: std::env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(4242),
            reader_id,
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),
        })
    }

    /// Config for a reader with default host/port
    pub fn for_reader(reader_id: impl Into<String>) -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 4242,
            reader_id: reader_id.into(),
            environment: "development".to_string(),
        }
    }

    /// Get the socket address to bind to
    pub fn socket_addr(&self) -> anyhow::Result<std::net::SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| anyhow::anyhow!("Invalid socket address {}:{}: {}", self.host, self.port, e))
    }

    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Remote payment processor
    pub processor: BoxedTerminalProcessor,
    /// Tipping/receipt/currency policy
    pub policy: Arc<TerminalPolicy>,
    /// Raw-body webhook verification
    pub webhook_verifier: WebhookVerifier,
    /// Reacts to parsed webhook events
    pub webhook_handler: Arc<dyn WebhookHandler>,
    /// Application config
    pub config: AppConfig,
}

impl AppState {
    /// Create a new AppState backed by Stripe Terminal
    pub fn new() -> anyhow::Result<Self> {
        let config = AppConfig::from_env()?;
        let policy = load_terminal_policy()?;

        let stripe_config = StripeConfig::from_env()
            .map_err(|e| anyhow::anyhow!("Failed to load Stripe config: {}", e))?;

        if stripe_config.webhook_secret.is_none() {
            tracing::warn!("STRIPE_WEBHOOK_SECRET not set, webhook signatures will not be verified");
        }

        let webhook_verifier = WebhookVerifier::new(stripe_config.webhook_secret.clone());

        let client = StripeTerminalClient::new(stripe_config)
            .map_err(|e| anyhow::anyhow!("Failed to initialize Stripe: {}", e))?;

        Ok(Self::with_processor(config, policy, Arc::new(client))
            .with_webhook_verifier(webhook_verifier))
    }

    /// Assemble state around any processor (stubs in tests)
    pub fn with_processor(
        config: AppConfig,
        policy: TerminalPolicy,
        processor: BoxedTerminalProcessor,
    ) -> Self {
        Self {
            processor,
            policy: Arc::new(policy),
            webhook_verifier: WebhookVerifier::unverified(),
            webhook_handler: Arc::new(LoggingWebhookHandler),
            config,
        }
    }

    /// Builder: set webhook verifier
    pub fn with_webhook_verifier(mut self, verifier: WebhookVerifier) -> Self {
        self.webhook_verifier = verifier;
        self
    }

    /// Builder: set webhook handler
    pub fn with_webhook_handler(mut self, handler: Arc<dyn WebhookHandler>) -> Self {
        self.webhook_handler = handler;
        self
    }

    /// The designated reader
    pub fn reader_id(&self) -> &str {
        &self.config.reader_id
    }
}

/// Load the terminal policy from `TERMINAL_POLICY` or `config/terminal.toml`
fn load_terminal_policy() -> anyhow::Result<TerminalPolicy> {
    if let Ok(path) = std::env::var("TERMINAL_POLICY") {
        let content = std::fs::read_to_string(&path)
            .map_err(|e| anyhow::anyhow!("Failed to read {}: {}", path, e))?;
        let policy = TerminalPolicy::from_toml_str(&content)
            .map_err(|e| anyhow::anyhow!("Failed to parse {}: {}", path, e))?;
        tracing::info!("Loaded terminal policy from {}", path);
        return Ok(policy);
    }

    let config_paths = [
        "config/terminal.toml",
        "../config/terminal.toml",
        "../../config/terminal.toml",
    ];

    for path in config_paths {
        if let Ok(content) = std::fs::read_to_string(path) {
            let policy = TerminalPolicy::from_toml_str(&content)
                .map_err(|e| anyhow::anyhow!("Failed to parse {}: {}", path, e))?;
            tracing::info!("Loaded terminal policy from {}", path);
            return Ok(policy);
        }
    }

    tracing::warn!("No terminal policy found, using defaults");
    Ok(TerminalPolicy::default())
}
