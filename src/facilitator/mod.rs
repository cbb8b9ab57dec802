//! Facilitator client for payment verification and settlement
//!
//! The facilitator is an external service that checks payment proofs and
//! settles them on-chain. The gate only ever sees it through the
//! [`Facilitator`] trait: two calls, each answering with a status, some
//! headers and a body.
//!
//! # Architecture
//!
//! - [`Facilitator`] - The seam the gate depends on
//! - [`FacilitatorClient`] - HTTP implementation backed by `reqwest`
//! - [`auth`] - Authentication headers sent with every call
//!
//! # Examples
//!
//! ```no_run
//! use std::sync::Arc;
//! use x402_gate::facilitator::{Facilitator, FacilitatorClient};
//! use x402_gate::types::{
//!     FacilitatorConfig, PaymentDescriptor, PaymentProof, PaymentRequest, Price,
//! };
//!
//! # async fn example() -> x402_gate::Result<()> {
//! let config = FacilitatorConfig::new("https://x402.org/facilitator", "secret-key");
//! let client = FacilitatorClient::new(config)?;
//!
//! let descriptor = PaymentDescriptor::builder()
//!     .pay_to("0x209693Bc6afc0C5328bA36FaF03C514EF312287C")
//!     .price(Price::new("0.001"))
//!     .network("base-sepolia")
//!     .resource_path("/weather")
//!     .build()?;
//!
//! let request = PaymentRequest::new(
//!     Arc::new(descriptor),
//!     http::Method::GET,
//!     PaymentProof::new("signed-proof"),
//! );
//! let result = client.settle(&request).await?;
//! if result.is_success() {
//!     println!("settled: {:?}", result.settlement());
//! }
//! # Ok(())
//! # }
//! ```

use crate::types::{headers, FacilitatorConfig, FacilitatorResponse, PaymentRequest};
use crate::{GateError, Result};
use async_trait::async_trait;
use http::HeaderMap;
use reqwest::Client;
use serde_json::Value;

pub mod auth;

#[cfg(test)]
mod tests;

/// External service that verifies and settles payment proofs
#[async_trait]
pub trait Facilitator: Send + Sync {
    /// Check a proof without moving funds
    async fn verify(&self, request: &PaymentRequest) -> Result<FacilitatorResponse>;

    /// Check a proof and settle it
    async fn settle(&self, request: &PaymentRequest) -> Result<FacilitatorResponse>;
}

/// HTTP facilitator client
#[derive(Clone)]
pub struct FacilitatorClient {
    /// Base URL of the facilitator service
    url: String,
    /// HTTP client
    client: Client,
    /// Headers attached to every call
    auth_headers: HeaderMap,
}

impl std::fmt::Debug for FacilitatorClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FacilitatorClient")
            .field("url", &self.url)
            .field("auth_headers", &"<redacted>")
            .finish()
    }
}

impl FacilitatorClient {
    /// Create a new facilitator client
    pub fn new(config: FacilitatorConfig) -> Result<Self> {
        // Validate configuration first
        config.validate()?;

        let auth_headers = auth::create_auth_headers(&config)?;

        let mut client_builder = Client::builder();

        if let Some(timeout) = config.timeout {
            client_builder = client_builder.timeout(timeout);
        }

        let client = client_builder
            .build()
            .map_err(|e| GateError::config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            url: config.url,
            client,
            auth_headers,
        })
    }

    /// Get the base URL of this facilitator
    pub fn url(&self) -> &str {
        &self.url
    }

    async fn call(&self, endpoint: &str, request: &PaymentRequest) -> Result<FacilitatorResponse> {
        let url = format!("{}/{}", self.url, endpoint);
        tracing::debug!(
            url = %url,
            resource = %request.descriptor.resource_url,
            proof = ?request.proof,
            "Sending facilitator request"
        );

        let response = self
            .client
            .post(&url)
            .headers(self.auth_headers.clone())
            .json(&request.to_json())
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() || e.is_connect() {
                    GateError::facilitator_unavailable(format!(
                        "{} request failed: {}",
                        endpoint, e
                    ))
                } else {
                    GateError::Http(e)
                }
            })?;

        let status = response.status();
        let headers = response
            .headers()
            .iter()
            .filter(|(name, _)| headers::is_payment_header(name))
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect::<HeaderMap>();

        let bytes = response.bytes().await?;
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };

        tracing::debug!(endpoint, status = %status, "Facilitator responded");

        Ok(FacilitatorResponse {
            status,
            headers,
            body,
        })
    }
}

#[async_trait]
impl Facilitator for FacilitatorClient {
    async fn verify(&self, request: &PaymentRequest) -> Result<FacilitatorResponse> {
        self.call("verify", request).await
    }

    async fn settle(&self, request: &PaymentRequest) -> Result<FacilitatorResponse> {
        self.call("settle", request).await
    }
}
