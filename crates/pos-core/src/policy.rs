//! # Terminal Policy
//!
//! Deployment policy for card-present payments: currency, tipping presets,
//! receipt delivery and automatic payment methods.
//! Loaded from `config/terminal.toml` when present.

use crate::error::{PaymentError, PaymentResult};
use crate::payment::{PaymentIntentParams, PaymentRequest, ReaderProcessConfig};
use serde::{Deserialize, Serialize};

/// Supported currencies (ISO 4217)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Currency {
    USD,
    EUR,
    GBP,
    CAD,
    AUD,
    CHF,
    MXN,
}

impl Currency {
    /// Returns the ISO 4217 currency code
    pub fn as_str(&self) -> &'static str {
        match self {
            Currency::USD => "usd",
            Currency::EUR => "eur",
            Currency::GBP => "gbp",
            Currency::CAD => "cad",
            Currency::AUD => "aud",
            Currency::CHF => "chf",
            Currency::MXN => "mxn",
        }
    }
}

impl Default for Currency {
    fn default() -> Self {
        Currency::USD
    }
}

impl std::fmt::Display for Currency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str().to_uppercase())
    }
}

/// How the reader offers a receipt once payment completes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReceiptDelivery {
    EmailOrSms,
    Email,
    Sms,
}

impl ReceiptDelivery {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReceiptDelivery::EmailOrSms => "email_or_sms",
            ReceiptDelivery::Email => "email",
            ReceiptDelivery::Sms => "sms",
        }
    }
}

/// Tip selection shown on the reader before card collection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TippingPolicy {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Fixed percentage presets, in display order
    #[serde(default = "default_tip_percentages")]
    pub percentages: Vec<u32>,
}

impl Default for TippingPolicy {
    fn default() -> Self {
        Self {
            enabled: true,
            percentages: default_tip_percentages(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceiptPolicy {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_receipt_delivery")]
    pub delivery: ReceiptDelivery,
}

impl Default for ReceiptPolicy {
    fn default() -> Self {
        Self {
            enabled: true,
            delivery: default_receipt_delivery(),
        }
    }
}

/// Per-deployment payment policy
///
/// ```toml
/// currency = "usd"
/// automatic_payment_methods = true
///
/// [tipping]
/// enabled = true
/// percentages = [15, 18, 20]
///
/// [receipt]
/// enabled = true
/// delivery = "email_or_sms"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TerminalPolicy {
    #[serde(default)]
    pub currency: Currency,

    /// Ask the processor to enable automatic payment methods on new intents
    #[serde(default = "default_true")]
    pub automatic_payment_methods: bool,

    #[serde(default)]
    pub tipping: TippingPolicy,

    #[serde(default)]
    pub receipt: ReceiptPolicy,
}

fn default_true() -> bool {
    true
}

fn default_tip_percentages() -> Vec<u32> {
    vec![15, 18, 20]
}

fn default_receipt_delivery() -> ReceiptDelivery {
    ReceiptDelivery::EmailOrSms
}

impl Default for TerminalPolicy {
    fn default() -> Self {
        Self {
            currency: Currency::default(),
            automatic_payment_methods: true,
            tipping: TippingPolicy::default(),
            receipt: ReceiptPolicy::default(),
        }
    }
}

impl TerminalPolicy {
    /// Plain card-present policy: no tipping, no receipts, no automatic methods
    pub fn card_present_only() -> Self {
        Self {
            currency: Currency::default(),
            automatic_payment_methods: false,
            tipping: TippingPolicy {
                enabled: false,
                percentages: Vec::new(),
            },
            receipt: ReceiptPolicy {
                enabled: false,
                delivery: default_receipt_delivery(),
            },
        }
    }

    /// Parse a policy from TOML text
    pub fn from_toml_str(content: &str) -> PaymentResult<Self> {
        let policy: TerminalPolicy = toml::from_str(content)
            .map_err(|e| PaymentError::Configuration(format!("Invalid terminal policy: {}", e)))?;
        policy.validate()?;
        Ok(policy)
    }

    /// Reject policies the reader cannot display
    pub fn validate(&self) -> PaymentResult<()> {
        if self.tipping.enabled {
            if self.tipping.percentages.is_empty() || self.tipping.percentages.len() > 3 {
                return Err(PaymentError::Configuration(
                    "tipping.percentages must hold between 1 and 3 presets".to_string(),
                ));
            }
            if self.tipping.percentages.iter().any(|p| *p == 0 || *p > 100) {
                return Err(PaymentError::Configuration(
                    "tipping.percentages must be within 1..=100".to_string(),
                ));
            }
        }
        Ok(())
    }

    /// Builder: toggle tipping
    pub fn with_tipping(mut self, enabled: bool) -> Self {
        self.tipping.enabled = enabled;
        self
    }

    /// Builder: toggle automatic payment methods
    pub fn with_automatic_payment_methods(mut self, enabled: bool) -> Self {
        self.automatic_payment_methods = enabled;
        self
    }

    /// Intent parameters for a POS payment request under this policy
    pub fn intent_params(&self, request: &PaymentRequest) -> PaymentIntentParams {
        PaymentIntentParams {
            amount: request.amount,
            currency: self.currency,
            description: request.description.clone(),
            automatic_payment_methods: self.automatic_payment_methods,
            idempotency_key: request.idempotency_key.clone(),
        }
    }

    /// Reader-side options for processing an intent
    pub fn process_config(&self) -> ReaderProcessConfig {
        ReaderProcessConfig {
            tip_percentages: self
                .tipping
                .enabled
                .then(|| self.tipping.percentages.clone()),
            receipt: self.receipt.enabled.then_some(self.receipt.delivery),
        }
    }
}
