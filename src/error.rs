//! Error types for the payment gate
//!
//! Only configuration problems are fatal. Everything that can go wrong while
//! serving a request is caught at the gate boundary and turned into an HTTP
//! response, so these errors never reach a client as a dropped connection.

use thiserror::Error;

/// Result type alias for gate operations
pub type Result<T> = std::result::Result<T, GateError>;

/// Errors produced by the payment gate and its collaborators
#[derive(Debug, Error)]
pub enum GateError {
    /// Required configuration is missing or malformed (startup only)
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// The facilitator could not be reached or did not answer in time
    #[error("Facilitator unavailable: {reason}")]
    FacilitatorUnavailable { reason: String },

    /// What the facilitator verified is not what the server advertised
    #[error("Internal inconsistency: {message}")]
    InternalInconsistency { message: String },

    /// HTTP transport error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON (de)serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error while binding or serving
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl GateError {
    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a facilitator-unavailable error
    pub fn facilitator_unavailable(reason: impl Into<String>) -> Self {
        Self::FacilitatorUnavailable {
            reason: reason.into(),
        }
    }

    /// Create an internal-inconsistency error
    pub fn internal_inconsistency(message: impl Into<String>) -> Self {
        Self::InternalInconsistency {
            message: message.into(),
        }
    }

    /// Whether the error is a passing facilitator outage rather than a defect
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::FacilitatorUnavailable { .. } | Self::Http(_))
    }
}
