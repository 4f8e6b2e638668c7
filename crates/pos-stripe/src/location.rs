//! # Terminal Locations
//!
//! One-off setup calls for a store: create a Terminal location carrying the
//! tipping/receipt flags and move a reader onto it. Readers pick up the
//! location's settings after a restart.

use crate::terminal::StripeTerminalClient;
use pos_core::PaymentResult;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{info, instrument};

/// Postal address of a Terminal location
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationAddress {
    pub line1: String,
    #[serde(default)]
    pub line2: Option<String>,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    /// Two-letter country code
    pub country: String,
}

/// Parameters for `POST /v1/terminal/locations`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocationParams {
    pub display_name: String,
    pub address: LocationAddress,
    pub metadata: BTreeMap<String, String>,
}

impl LocationParams {
    pub fn new(display_name: impl Into<String>, address: LocationAddress) -> Self {
        Self {
            display_name: display_name.into(),
            address,
            metadata: BTreeMap::new(),
        }
    }

    /// Builder: flag tipping and receipts on the location
    pub fn with_terminal_flags(mut self, tipping: bool, receipts: bool) -> Self {
        self.metadata
            .insert("tipping_enabled".to_string(), tipping.to_string());
        self.metadata
            .insert("receipt_enabled".to_string(), receipts.to_string());
        self
    }

    fn form_params(&self) -> Vec<(String, String)> {
        let mut form_params = vec![
            ("display_name".to_string(), self.display_name.clone()),
            ("address[line1]".to_string(), self.address.line1.clone()),
            ("address[city]".to_string(), self.address.city.clone()),
            ("address[state]".to_string(), self.address.state.clone()),
            (
                "address[postal_code]".to_string(),
                self.address.postal_code.clone(),
            ),
            ("address[country]".to_string(), self.address.country.clone()),
        ];

        if let Some(ref line2) = self.address.line2 {
            form_params.push(("address[line2]".to_string(), line2.clone()));
        }

        for (key, value) in &self.metadata {
            form_params.push((format!("metadata[{}]", key), value.clone()));
        }

        form_params
    }
}

/// A created Terminal location
#[derive(Debug, Clone, Deserialize)]
pub struct TerminalLocation {
    pub id: String,
    pub display_name: String,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

impl StripeTerminalClient {
    /// Create a Terminal location
    #[instrument(skip(self, params), fields(display_name = %params.display_name))]
    pub async fn create_location(&self, params: &LocationParams) -> PaymentResult<TerminalLocation> {
        let body = self
            .post_form("/v1/terminal/locations", &params.form_params(), None)
            .await?;
        let location: TerminalLocation = Self::parse(&body)?;

        info!("Created Terminal location: id={}", location.id);

        Ok(location)
    }

    /// Move a reader to a location; returns the updated reader object
    #[instrument(skip(self))]
    pub async fn assign_reader_location(
        &self,
        reader_id: &str,
        location_id: &str,
    ) -> PaymentResult<serde_json::Value> {
        let path = format!("/v1/terminal/readers/{}", reader_id);
        let form_params = vec![("location".to_string(), location_id.to_string())];

        let body = self.post_form(&path, &form_params, None).await?;
        let reader: serde_json::Value = Self::parse(&body)?;

        info!("Reader {} assigned to location {}", reader_id, location_id);

        Ok(reader)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StripeConfig;
    use serde_json::json;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn houston() -> LocationAddress {
        LocationAddress {
            line1: "123 Main St".to_string(),
            line2: None,
            city: "Houston".to_string(),
            state: "TX".to_string(),
            postal_code: "77002".to_string(),
            country: "US".to_string(),
        }
    }

    #[test]
    fn test_location_form_params() {
        let params = LocationParams::new("Main Location", houston()).with_terminal_flags(true, false);
        let form = params.form_params();

        assert!(form.contains(&("address[city]".to_string(), "Houston".to_string())));
        assert!(form.contains(&("metadata[tipping_enabled]".to_string(), "true".to_string())));
        assert!(form.contains(&("metadata[receipt_enabled]".to_string(), "false".to_string())));
        assert!(!form.iter().any(|(k, _)| k == "address[line2]"));
    }

    #[tokio::test]
    async fn test_create_location_and_assign_reader() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/terminal/locations"))
            .and(body_string_contains("display_name=Main+Location"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "tml_123",
                "object": "terminal.location",
                "display_name": "Main Location",
                "metadata": { "tipping_enabled": "true", "receipt_enabled": "true" }
            })))
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("POST"))
            .and(path("/v1/terminal/readers/tmr_1"))
            .and(body_string_contains("location=tml_123"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "tmr_1",
                "object": "terminal.reader",
                "location": "tml_123"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let config = StripeConfig::new("sk_test_abc123").with_api_base_url(server.uri());
        let client = StripeTerminalClient::new(config).unwrap();

        let params = LocationParams::new("Main Location", houston()).with_terminal_flags(true, true);
        let location = client.create_location(&params).await.unwrap();
        assert_eq!(location.id, "tml_123");
        assert_eq!(location.metadata.get("tipping_enabled").map(String::as_str), Some("true"));

        let reader = client
            .assign_reader_location("tmr_1", &location.id)
            .await
            .unwrap();
        assert_eq!(reader["location"], "tml_123");
    }
}
