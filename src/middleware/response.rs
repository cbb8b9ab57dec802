//! Response shaping for gate outcomes
//!
//! Every outcome becomes a well-formed HTTP response: the handler's payload
//! plus receipt headers, a 402 challenge, a 302 to the payment UI, an empty
//! preflight answer, or a 500 when the server contradicts itself.

use super::payment::Denial;
use crate::types::{headers, FacilitatorResponse, PaymentDescriptor};
use crate::{GateError, Result};
use axum::{
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Message for a request that carried no proof
pub const PAYMENT_REQUIRED_MESSAGE: &str =
    "Payment Required. Please sign the X-Payment-Message and submit via POST.";

/// Message for a proof the facilitator did not accept
pub const PAYMENT_REJECTED_MESSAGE: &str =
    "Payment Required. The submitted payment was not accepted; sign the X-Payment-Message and retry.";

/// Canonical challenge string, computed once per descriptor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Challenge {
    message: Arc<str>,
    header: HeaderValue,
}

impl Challenge {
    /// Build the challenge for a descriptor
    pub fn new(descriptor: &PaymentDescriptor) -> Result<Self> {
        let message = descriptor.challenge_message();
        let header = HeaderValue::from_str(&message).map_err(|_| {
            GateError::config(format!(
                "Challenge '{}' contains characters not allowed in an HTTP header",
                message
            ))
        })?;
        Ok(Self {
            message: message.into(),
            header,
        })
    }

    /// The challenge string
    pub fn as_str(&self) -> &str {
        &self.message
    }
}

/// JSON body of a 402 response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequiredBody {
    /// Human-readable explanation
    pub message: String,
    /// Canonical challenge string to countersign
    pub payment_message: String,
}

/// Headers proving a settled payment
///
/// Facilitator payment headers are kept. The settlement record adds
/// `x-payment-receipt` (the transaction id) and, unless the facilitator sent
/// its own, a base64 `x-payment-response`.
pub fn receipt_headers(response: &FacilitatorResponse) -> HeaderMap {
    let mut receipt = response.headers.clone();
    let Some(settlement) = response.settlement() else {
        return receipt;
    };

    if !settlement.transaction.is_empty() {
        if let Ok(value) = HeaderValue::from_str(&settlement.transaction) {
            receipt.insert(headers::X_PAYMENT_RECEIPT, value);
        }
    }

    if !receipt.contains_key(headers::X_PAYMENT_RESPONSE) {
        match settlement
            .to_base64()
            .map(|encoded| HeaderValue::from_str(&encoded))
        {
            Ok(Ok(value)) => {
                receipt.insert(headers::X_PAYMENT_RESPONSE, value);
            }
            _ => tracing::warn!("Failed to encode settlement record as a header"),
        }
    }

    receipt
}

/// Attach receipt headers to the protected resource's response
pub fn granted(mut response: Response, receipt: HeaderMap) -> Response {
    response.headers_mut().extend(receipt);
    response
}

/// 402 with the JSON challenge body and the challenge header
pub fn payment_required(challenge: &Challenge, denial: &Denial, extra: HeaderMap) -> Response {
    let body = PaymentRequiredBody {
        message: denial.client_message().to_string(),
        payment_message: challenge.as_str().to_string(),
    };

    let mut response = (StatusCode::PAYMENT_REQUIRED, Json(body)).into_response();
    let response_headers = response.headers_mut();
    response_headers.extend(extra);
    response_headers.insert(headers::X_PAYMENT_MESSAGE, challenge.header.clone());
    response
}

/// 302 to the payment UI, no body
pub fn redirect(location: HeaderValue) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location)]).into_response()
}

/// 200 with an empty body
pub fn preflight() -> Response {
    StatusCode::OK.into_response()
}

/// 500 for a server-side misconfiguration
pub fn internal_inconsistency() -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(serde_json::json!({ "error": "Payment configuration mismatch" })),
    )
        .into_response()
}
