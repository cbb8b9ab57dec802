//! Tests for facilitator client

use super::{Facilitator, FacilitatorClient};
use crate::types::{
    headers, FacilitatorConfig, PaymentDescriptor, PaymentProof, PaymentRequest, Price,
};
use crate::GateError;
use http::{Method, StatusCode};
use mockito::{Matcher, Server};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

#[tokio::test]
async fn test_facilitator_client_creation() {
    let config = FacilitatorConfig::new("https://x402.org/facilitator", "sk_test");
    let client = FacilitatorClient::new(config).unwrap();
    assert_eq!(client.url(), "https://x402.org/facilitator");
}

#[tokio::test]
async fn test_facilitator_client_rejects_invalid_config() {
    let result = FacilitatorClient::new(FacilitatorConfig::new("not-a-url", "sk_test"));
    assert!(matches!(result, Err(GateError::Config { .. })));

    let result = FacilitatorClient::new(FacilitatorConfig::new("https://x402.org/facilitator", ""));
    assert!(matches!(result, Err(GateError::Config { .. })));
}

#[tokio::test]
async fn test_facilitator_settle_success() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/settle")
        .match_header("x-secret-key", "sk_test")
        .match_body(Matcher::PartialJson(json!({
            "resourceUrl": "http://localhost:3002/api/weather",
            "method": "GET",
            "paymentData": "signed-proof",
            "payTo": "0x209693Bc6afc0C5328bA36FaF03C514EF312287C",
            "network": "eip155:11155111|ETH",
            "price": "0.0001 ETH"
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_header("x-payment-response", "eyJzdWNjZXNzIjp0cnVlfQ==")
        .with_header("x-unrelated", "dropped")
        .with_body(
            json!({
                "success": true,
                "transaction": "0x1234567890abcdef1234567890abcdef1234567890abcdef1234567890abcdef",
                "network": "eip155:11155111",
                "payer": "0x857b06519E91e3A54538791bDbb0E22373e36b66"
            })
            .to_string(),
        )
        .create_async()
        .await;

    let client = FacilitatorClient::new(FacilitatorConfig::new(server.url(), "sk_test")).unwrap();
    let response = client
        .settle(&create_test_request(PaymentProof::new("signed-proof")))
        .await
        .unwrap();

    mock.assert_async().await;
    assert!(response.is_success());
    assert_eq!(
        response.headers.get(headers::X_PAYMENT_RESPONSE).unwrap(),
        "eyJzdWNjZXNzIjp0cnVlfQ=="
    );
    assert!(response.headers.get("x-unrelated").is_none());
    assert!(response.headers.get("content-type").is_none());

    let settlement = response.settlement().unwrap();
    assert_eq!(
        settlement.transaction,
        "0x1234567890abcdef1234567890abcdef1234567890abcdef1234567890abcdef"
    );
}

#[tokio::test]
async fn test_facilitator_denial_is_data_not_error() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("POST", "/settle")
        .with_status(402)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "x402Version": 1,
                "error": "invalid_signature",
                "accepts": [{ "resource": "http://localhost:3002/api/weather" }]
            })
            .to_string(),
        )
        .create_async()
        .await;

    let client = FacilitatorClient::new(FacilitatorConfig::new(server.url(), "sk_test")).unwrap();
    let response = client
        .settle(&create_test_request(PaymentProof::new("bad-proof")))
        .await
        .unwrap();

    assert_eq!(response.status, StatusCode::PAYMENT_REQUIRED);
    assert!(!response.is_success());
    assert_eq!(response.reason(), Some("invalid_signature".to_string()));
}

#[tokio::test]
async fn test_facilitator_verify_uses_verify_endpoint() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/verify")
        .match_body(Matcher::PartialJson(json!({ "paymentData": null })))
        .with_status(402)
        .with_body("{}")
        .create_async()
        .await;

    let client = FacilitatorClient::new(FacilitatorConfig::new(server.url(), "sk_test")).unwrap();
    let response = client.verify(&create_test_request(None)).await.unwrap();

    mock.assert_async().await;
    assert_eq!(response.status, StatusCode::PAYMENT_REQUIRED);
}

#[tokio::test]
async fn test_facilitator_server_error_is_returned_as_status() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("POST", "/settle")
        .with_status(500)
        .with_body("upstream exploded")
        .create_async()
        .await;

    let client = FacilitatorClient::new(FacilitatorConfig::new(server.url(), "sk_test")).unwrap();
    let response = client
        .settle(&create_test_request(PaymentProof::new("proof")))
        .await
        .unwrap();

    assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response.body, json!("upstream exploded"));
}

#[tokio::test]
async fn test_facilitator_with_auth_headers() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/settle")
        .match_header("x-secret-key", "sk_test")
        .match_header("x-server-wallet-address", "0xfacilitator")
        .match_header("correlation-context", Matcher::Regex(r"sdk_name=.*".to_string()))
        .with_status(200)
        .with_body(json!({ "success": true }).to_string())
        .create_async()
        .await;

    let config = FacilitatorConfig::new(server.url(), "sk_test")
        .with_server_wallet_address("0xfacilitator");
    let client = FacilitatorClient::new(config).unwrap();

    let response = client
        .settle(&create_test_request(PaymentProof::new("proof")))
        .await
        .unwrap();
    mock.assert_async().await;
    assert!(response.is_success());
}

#[tokio::test]
async fn test_facilitator_empty_body_is_null() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("POST", "/settle")
        .with_status(402)
        .create_async()
        .await;

    let client = FacilitatorClient::new(FacilitatorConfig::new(server.url(), "sk_test")).unwrap();
    let response = client.settle(&create_test_request(None)).await.unwrap();
    assert!(response.body.is_null());
}

#[tokio::test]
async fn test_facilitator_timeout() {
    // Non-routable address, so the connection attempt hangs until the timeout
    let config = FacilitatorConfig::new("http://10.255.255.1:9999", "sk_test")
        .with_timeout(Duration::from_millis(1));
    let client = FacilitatorClient::new(config).unwrap();

    let result = client
        .settle(&create_test_request(PaymentProof::new("proof")))
        .await;
    let error = result.unwrap_err();
    assert!(
        error.is_transient(),
        "Expected transient facilitator error, got: {}",
        error
    );
}

// Helper functions for creating test data
fn create_test_request(proof: Option<PaymentProof>) -> PaymentRequest {
    let descriptor = PaymentDescriptor::builder()
        .pay_to("0x209693Bc6afc0C5328bA36FaF03C514EF312287C")
        .price(Price::new("0.0001 ETH"))
        .network("eip155:11155111|ETH")
        .resource_path("/api/weather")
        .base_url("http://localhost:3002")
        .build()
        .unwrap();

    PaymentRequest::new(Arc::new(descriptor), Method::GET, proof)
}
