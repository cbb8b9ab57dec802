//! Payment gate middleware for axum
//!
//! This module puts a pay-per-request gate in front of a protected route.
//! Every request is classified, the facilitator is consulted when needed,
//! and the outcome is turned into an HTTP response. The protected handler
//! only runs after a successful settlement.
//!
//! # Architecture
//!
//! - [`config`] - Settlement mode, facilitator timeout and payment UI location
//! - [`payment`] - The gate itself: [`PaymentGate`], [`GateResult`] and [`PaymentContext`]
//! - [`response`] - Shaping of every gate outcome into a response
//! - [`service`] - Tower layer wrapping the gate
//!
//! # Examples
//!
//! ```no_run
//! use std::sync::Arc;
//! use axum::{routing::get, Extension, Router};
//! use x402_gate::facilitator::FacilitatorClient;
//! use x402_gate::middleware::{payment_middleware, PaymentContext, PaymentGate, PaymentGateConfig};
//! use x402_gate::types::{FacilitatorConfig, PaymentDescriptor, Price};
//!
//! # fn example() -> x402_gate::Result<()> {
//! let descriptor = PaymentDescriptor::builder()
//!     .pay_to("0x209693Bc6afc0C5328bA36FaF03C514EF312287C")
//!     .price(Price::new("0.0001 ETH"))
//!     .network("eip155:11155111|ETH")
//!     .resource_path("/api/weather")
//!     .build()?;
//!
//! let facilitator = FacilitatorClient::new(FacilitatorConfig::new(
//!     "https://x402.org/facilitator",
//!     "secret-key",
//! ))?;
//!
//! let gate = PaymentGate::new(
//!     descriptor,
//!     Arc::new(facilitator),
//!     PaymentGateConfig::new().with_payment_ui_url("/wallet.html"),
//! )?;
//!
//! let app: Router = Router::new()
//!     .route(
//!         "/api/weather",
//!         get(|Extension(ctx): Extension<PaymentContext>| async move {
//!             format!("paid, receipt {:?}", ctx.receipt)
//!         }),
//!     )
//!     .route_layer(axum::middleware::from_fn_with_state(gate, payment_middleware));
//! # Ok(())
//! # }
//! ```
//!
//! # Request Flow
//!
//! 1. `OPTIONS` is answered with an empty 200
//! 2. A browser navigation without credentials is redirected to the payment UI
//! 3. A request without `X-Payment` gets a 402 carrying the challenge
//! 4. A presented proof is settled (or verified, then settled) by the facilitator
//! 5. On settlement the handler runs and the receipt headers are attached

pub mod config;
pub mod payment;
pub mod response;
pub mod service;


pub use config::{PaymentGateConfig, SettlementMode};
pub use payment::{payment_middleware, Denial, GateResult, PaymentContext, PaymentGate};
pub use response::{Challenge, PaymentRequiredBody};
pub use service::{PaymentGateLayer, PaymentGateService};
