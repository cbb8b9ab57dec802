//! Core types for the payment gate
//!
//! # Architecture
//!
//! - [`descriptor`] - Canonical payment terms of a resource and the builder that produces them
//! - [`payment`] - Payment proof and the request handed to the facilitator
//! - [`facilitator`] - Facilitator configuration and response types
//! - [`constants`] - Header names and defaults
//!
//! # Examples
//!
//! ```
//! use x402_gate::types::{PaymentDescriptor, Price};
//!
//! # fn example() -> x402_gate::Result<()> {
//! let descriptor = PaymentDescriptor::builder()
//!     .pay_to("0xABC")
//!     .price(Price::new("0.001"))
//!     .network("test-net|USD")
//!     .resource_path("/weather")
//!     .build()?;
//!
//! assert_eq!(descriptor.challenge_message(), "/weather|test-net|USD|0xABC|0.001");
//! # Ok(())
//! # }
//! ```

pub mod constants;
pub mod descriptor;
pub mod facilitator;
pub mod payment;

// Re-export commonly used types
pub use constants::{defaults, headers, routes};
pub use descriptor::{Asset, DescriptorBuilder, PaymentDescriptor, Price};
pub use facilitator::{FacilitatorConfig, FacilitatorResponse, SettleResponse};
pub use payment::{PaymentProof, PaymentRequest};
