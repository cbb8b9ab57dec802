//! # x402-gate
//!
//! A pay-per-request access gate for axum services, built on the HTTP
//! `402 Payment Required` status.
//!
//! Each request to a protected resource is either granted, answered with a
//! payment challenge, or (for a plain browser navigation) redirected to a
//! payment UI. Proof verification and settlement are delegated to an external
//! facilitator; the gate never inspects the proof itself.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use x402_gate::{config::AppConfig, server};
//!
//! #[tokio::main]
//! async fn main() -> x402_gate::Result<()> {
//!     // PAY_TO_ADDRESS, PRICE, NETWORK, FACILITATOR_URL and
//!     // FACILITATOR_SECRET_KEY must be set (a .env file works too)
//!     let config = AppConfig::from_env()?;
//!     server::serve(config).await
//! }
//! ```
//!
//! ## Protocol
//!
//! 1. A client requests the resource without proof and receives a 402 whose
//!    body and `X-Payment-Message` header carry the challenge
//!    `resourceURL|network|payToAddress|price`.
//! 2. The client has the challenge signed and retries with the proof in
//!    `X-Payment`.
//! 3. The gate asks the facilitator to settle the proof. On success the
//!    handler runs and the response carries `X-Payment-Receipt`.
//!
//! ## Architecture
//!
//! - **`types`**: Payment descriptor, proof and facilitator data
//! - **`facilitator`**: The facilitator seam and its HTTP client
//! - **`middleware`**: The payment gate, response shaping and Tower layer
//! - **`config`**: Environment-driven application configuration
//! - **`server`**: Router, CORS, static files and graceful shutdown
//! - **`error`**: Error type shared by all of the above

pub mod config;
pub mod error;
pub mod facilitator;
pub mod middleware;
pub mod server;
pub mod types;

// Re-exports for convenience
pub use error::{GateError, Result};
pub use facilitator::{Facilitator, FacilitatorClient};
pub use middleware::{payment_middleware, PaymentContext, PaymentGate, PaymentGateLayer};
pub use types::{
    FacilitatorConfig, FacilitatorResponse, PaymentDescriptor, PaymentProof, PaymentRequest,
    Price, SettleResponse,
};

/// Current version of the crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
