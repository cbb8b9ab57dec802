//! x402 Payment Gate Server
//!
//! Serves one pay-per-request resource behind the payment gate, plus the
//! static payment UI.
//!
//! ## Environment Variables
//!
//! - `PAY_TO_ADDRESS`, `PRICE`, `NETWORK` - Payment terms (required)
//! - `FACILITATOR_URL`, `FACILITATOR_SECRET_KEY` - Facilitator access (required)
//! - `RESOURCE_PATH` - Protected route (default: `/api/weather`)
//! - `SETTLEMENT_MODE` - `settle-only` or `verify-then-settle`
//! - `BIND_ADDRESS` - Listen address (default: `0.0.0.0:3002`)
//! - `RUST_LOG` - Log level filter (default: `info`)
//!
//! A `.env` file in the working directory is read first.

use tracing_subscriber::EnvFilter;
use x402_gate::{config::AppConfig, server};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    if let Err(e) = run().await {
        tracing::error!("Payment gate failed: {e}");
        std::process::exit(1);
    }
}

async fn run() -> x402_gate::Result<()> {
    let config = AppConfig::from_env()?;
    tracing::info!(
        resource = %config.descriptor.resource_url,
        network = %config.descriptor.network,
        pay_to = %config.descriptor.pay_to,
        price = %config.descriptor.price,
        facilitator = %config.facilitator.url,
        "Loaded configuration"
    );
    server::serve(config).await
}
