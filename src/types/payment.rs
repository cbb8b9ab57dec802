//! Payment proof and facilitator request types

use super::descriptor::PaymentDescriptor;
use http::Method;
use serde_json::{json, Value};
use std::fmt;
use std::sync::Arc;

/// Opaque evidence of payment submitted by a client
///
/// Only the facilitator interprets it; the gate just forwards it.
#[derive(Clone, PartialEq, Eq)]
pub struct PaymentProof(String);

impl PaymentProof {
    /// Wrap a raw proof value; blank values are treated as absent
    pub fn new(raw: impl Into<String>) -> Option<Self> {
        let raw = raw.into();
        if raw.trim().is_empty() {
            None
        } else {
            Some(Self(raw))
        }
    }

    /// The proof exactly as submitted
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Short form safe for logs: first and last ten characters
    pub fn abbreviated(&self) -> String {
        let count = self.0.chars().count();
        if count <= 24 {
            return self.0.clone();
        }
        let head: String = self.0.chars().take(10).collect();
        let tail: String = self.0.chars().skip(count - 10).collect();
        format!("{head}...{tail}")
    }
}

impl fmt::Debug for PaymentProof {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("PaymentProof")
            .field(&self.abbreviated())
            .finish()
    }
}

/// Everything the facilitator needs to verify or settle one request
#[derive(Debug, Clone)]
pub struct PaymentRequest {
    /// Payment terms of the resource
    pub descriptor: Arc<PaymentDescriptor>,
    /// Method of the incoming request
    pub method: Method,
    /// Proof submitted by the client, if any
    pub proof: Option<PaymentProof>,
}

impl PaymentRequest {
    /// Create a new payment request
    pub fn new(
        descriptor: Arc<PaymentDescriptor>,
        method: Method,
        proof: Option<PaymentProof>,
    ) -> Self {
        Self {
            descriptor,
            method,
            proof,
        }
    }

    /// JSON body sent to the facilitator's verify and settle endpoints
    pub fn to_json(&self) -> Value {
        let descriptor = &self.descriptor;
        json!({
            "resourceUrl": descriptor.resource_url,
            "method": self.method.as_str(),
            "paymentData": self.proof.as_ref().map(PaymentProof::as_str),
            "payTo": descriptor.pay_to,
            "network": descriptor.network,
            "price": descriptor.price,
            "routeConfig": {
                "description": descriptor.description,
                "mimeType": descriptor.mime_type,
                "maxTimeoutSeconds": descriptor.max_timeout_seconds,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Price;

    #[test]
    fn test_blank_proof_is_absent() {
        assert!(PaymentProof::new("").is_none());
        assert!(PaymentProof::new("   ").is_none());
        assert!(PaymentProof::new("0xdeadbeef").is_some());
    }

    #[test]
    fn test_proof_abbreviation() {
        let proof = PaymentProof::new(
            "0x2d6a7588d6acca505cbf0d9a4a227e0c52c6c34008c8e8986a1283259764173608",
        )
        .unwrap();
        assert_eq!(proof.abbreviated(), "0x2d6a7588...9764173608");
        assert!(!format!("{:?}", proof).contains("d6acca505cbf"));

        let short = PaymentProof::new("0xshort").unwrap();
        assert_eq!(short.abbreviated(), "0xshort");
    }

    #[test]
    fn test_request_wire_format() {
        let descriptor = PaymentDescriptor::builder()
            .pay_to("0xABC")
            .price(Price::new("0.001"))
            .network("base-sepolia")
            .resource_path("/weather")
            .build()
            .unwrap();
        let request = PaymentRequest::new(
            Arc::new(descriptor),
            Method::POST,
            PaymentProof::new("proof-data"),
        );

        let body = request.to_json();
        assert_eq!(body["resourceUrl"], "/weather");
        assert_eq!(body["method"], "POST");
        assert_eq!(body["paymentData"], "proof-data");
        assert_eq!(body["payTo"], "0xABC");
        assert_eq!(body["network"], "base-sepolia");
        assert_eq!(body["price"], "0.001");
        assert_eq!(body["routeConfig"]["maxTimeoutSeconds"], 300);
        assert_eq!(body["routeConfig"]["mimeType"], "application/json");
    }

    #[test]
    fn test_absent_proof_serializes_as_null() {
        let descriptor = PaymentDescriptor::builder()
            .pay_to("0xABC")
            .price(Price::new("0.001"))
            .network("base-sepolia")
            .resource_path("/weather")
            .build()
            .unwrap();
        let request = PaymentRequest::new(Arc::new(descriptor), Method::GET, None);
        assert!(request.to_json()["paymentData"].is_null());
    }
}
