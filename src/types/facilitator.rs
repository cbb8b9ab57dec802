//! Facilitator configuration and response types

use http::{HeaderMap, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

/// Facilitator configuration
#[derive(Clone)]
pub struct FacilitatorConfig {
    /// Base URL of the facilitator service
    pub url: String,
    /// Request timeout
    pub timeout: Option<Duration>,
    /// Secret key authenticating this server with the facilitator
    pub secret_key: String,
    /// Wallet the facilitator settles through, if it needs to be named
    pub server_wallet_address: Option<String>,
}

impl std::fmt::Debug for FacilitatorConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FacilitatorConfig")
            .field("url", &self.url)
            .field("timeout", &self.timeout)
            .field("secret_key", &"<redacted>")
            .field("server_wallet_address", &self.server_wallet_address)
            .finish()
    }
}

impl FacilitatorConfig {
    /// Create a new facilitator config
    pub fn new(url: impl Into<String>, secret_key: impl Into<String>) -> Self {
        Self {
            url: url.into().trim_end_matches('/').to_string(),
            timeout: None,
            secret_key: secret_key.into(),
            server_wallet_address: None,
        }
    }

    /// Validate the facilitator configuration
    pub fn validate(&self) -> crate::Result<()> {
        if self.url.is_empty() {
            return Err(crate::GateError::config("Facilitator URL cannot be empty"));
        }

        if !self.url.starts_with("http://") && !self.url.starts_with("https://") {
            return Err(crate::GateError::config(
                "Facilitator URL must start with http:// or https://",
            ));
        }

        if self.secret_key.trim().is_empty() {
            return Err(crate::GateError::config(
                "Facilitator secret key cannot be empty",
            ));
        }

        Ok(())
    }

    /// Set the request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set the server wallet address
    pub fn with_server_wallet_address(mut self, address: impl Into<String>) -> Self {
        self.server_wallet_address = Some(address.into());
        self
    }
}

/// Raw outcome of a verify or settle call
///
/// Any HTTP status is data here; only transport failures are errors.
#[derive(Debug, Clone)]
pub struct FacilitatorResponse {
    /// Status reported by the facilitator
    pub status: StatusCode,
    /// Payment headers returned by the facilitator
    pub headers: HeaderMap,
    /// Response body (`Value::Null` when empty)
    pub body: Value,
}

impl FacilitatorResponse {
    /// Create a response with no headers
    pub fn new(status: StatusCode, body: Value) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body,
        }
    }

    /// Attach payment headers
    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    /// Whether the facilitator accepted the payment
    pub fn is_success(&self) -> bool {
        self.status == StatusCode::OK
    }

    /// Typed view of a settlement body, if it looks like one
    pub fn settlement(&self) -> Option<SettleResponse> {
        serde_json::from_value(self.body.clone()).ok()
    }

    /// Human-readable reason for a denial, as far as the body tells
    pub fn reason(&self) -> Option<String> {
        ["errorReason", "invalidReason", "error", "message"]
            .iter()
            .find_map(|key| self.body.get(*key).and_then(Value::as_str))
            .map(str::to_string)
    }

    /// Resources the facilitator says it evaluated the payment against
    pub fn accepted_resources(&self) -> Option<Vec<String>> {
        let accepts = self.body.get("accepts")?.as_array()?;
        Some(
            accepts
                .iter()
                .filter_map(|req| req.get("resource").and_then(Value::as_str))
                .map(str::to_string)
                .collect(),
        )
    }
}

/// Payment settlement record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettleResponse {
    /// Whether the settlement was successful
    pub success: bool,
    /// Error reason if settlement failed
    #[serde(rename = "errorReason", skip_serializing_if = "Option::is_none")]
    pub error_reason: Option<String>,
    /// Transaction hash or identifier
    #[serde(default)]
    pub transaction: String,
    /// Network where the transaction was executed
    #[serde(default)]
    pub network: String,
    /// Payer address if applicable
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payer: Option<String>,
}

impl SettleResponse {
    /// Encode the settle response to base64
    pub fn to_base64(&self) -> crate::Result<String> {
        use base64::{engine::general_purpose, Engine as _};
        let json = serde_json::to_string(self)?;
        Ok(general_purpose::STANDARD.encode(json))
    }
}
