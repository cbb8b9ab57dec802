//! Application configuration loaded from the environment

use crate::middleware::{PaymentGateConfig, SettlementMode};
use crate::types::{defaults, routes, FacilitatorConfig, PaymentDescriptor, Price};
use crate::{GateError, Result};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

/// Everything the server needs to start
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Payment terms of the protected resource
    pub descriptor: PaymentDescriptor,
    /// Facilitator endpoint and credentials
    pub facilitator: FacilitatorConfig,
    /// Gate behaviour
    pub gate: PaymentGateConfig,
    /// Public client id handed to the payment UI
    pub client_id: Option<String>,
    /// Address to listen on
    pub bind_address: SocketAddr,
    /// Directory served as static files
    pub static_dir: PathBuf,
}

impl AppConfig {
    /// Load from the process environment, after reading a `.env` file if present
    pub fn from_env() -> Result<Self> {
        if let Ok(path) = dotenvy::dotenv() {
            tracing::debug!(path = %path.display(), "Loaded .env file");
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from an arbitrary variable source
    ///
    /// Blank values count as unset. Every problem is collected and reported
    /// in a single error.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };
        let mut problems = Vec::new();

        let mut required = |key: &str| {
            let value = var(key);
            if value.is_none() {
                problems.push(format!("{key} is required"));
            }
            value
        };
        let pay_to = required("PAY_TO_ADDRESS");
        let price = required("PRICE");
        let network = required("NETWORK");
        let facilitator_url = required("FACILITATOR_URL");
        let secret_key = required("FACILITATOR_SECRET_KEY");

        let asset = match (var("ASSET_ADDRESS"), var("ASSET_DECIMALS")) {
            (Some(address), Some(decimals)) => match decimals.parse::<u8>() {
                Ok(decimals) => Some((address, decimals)),
                Err(_) => {
                    problems.push(format!("ASSET_DECIMALS must be 0-255, got '{decimals}'"));
                    None
                }
            },
            (None, None) => None,
            _ => {
                problems.push("ASSET_ADDRESS and ASSET_DECIMALS must be set together".to_string());
                None
            }
        };

        let settlement_mode = match var("SETTLEMENT_MODE") {
            Some(mode) => mode.parse::<SettlementMode>().unwrap_or_else(|e| {
                problems.push(e.to_string());
                SettlementMode::default()
            }),
            None => SettlementMode::default(),
        };

        let settle_timeout = match var("SETTLE_TIMEOUT_SECS") {
            Some(secs) => match secs.parse::<u64>() {
                Ok(secs) if secs > 0 => Duration::from_secs(secs),
                _ => {
                    problems.push(format!(
                        "SETTLE_TIMEOUT_SECS must be a positive number of seconds, got '{secs}'"
                    ));
                    defaults::SETTLE_TIMEOUT
                }
            },
            None => defaults::SETTLE_TIMEOUT,
        };

        let bind = var("BIND_ADDRESS").unwrap_or_else(|| defaults::BIND_ADDRESS.to_string());
        let bind_address = bind.parse::<SocketAddr>().map_err(|_| {
            problems.push(format!("BIND_ADDRESS '{bind}' is not a socket address"));
        });

        // Present but empty disables the redirect
        let payment_ui_url = match lookup("PAYMENT_UI_URL") {
            Some(url) if url.trim().is_empty() => None,
            Some(url) => Some(url.trim().to_string()),
            None => Some(defaults::PAYMENT_UI_URL.to_string()),
        };

        let resource_path =
            var("RESOURCE_PATH").unwrap_or_else(|| defaults::RESOURCE_PATH.to_string());
        if routes::RESERVED.contains(&resource_path.as_str()) {
            problems.push(format!(
                "RESOURCE_PATH '{resource_path}' is already served by the gate server"
            ));
        }

        let mut descriptor = PaymentDescriptor::builder().resource_path(resource_path);
        if let Some(pay_to) = pay_to {
            descriptor = descriptor.pay_to(pay_to);
        }
        if let Some(network) = network {
            descriptor = descriptor.network(network);
        }
        if let Some(amount) = price {
            let price = match asset {
                Some((address, decimals)) => Price::new(amount).with_asset(address, decimals),
                None => Price::new(amount),
            };
            descriptor = descriptor.price(price);
        }
        if let Some(base_url) = var("RESOURCE_BASE_URL") {
            descriptor = descriptor.base_url(base_url);
        }
        if let Some(customer_id) = var("CUSTOMER_ID") {
            descriptor = descriptor.customer_id(customer_id);
        }
        let descriptor = descriptor
            .build()
            .map_err(|e| problems.push(e.to_string()));

        let mut facilitator = FacilitatorConfig::new(
            facilitator_url.unwrap_or_default(),
            secret_key.unwrap_or_default(),
        )
        .with_timeout(settle_timeout);
        if let Some(wallet) = var("FACILITATOR_WALLET_ADDRESS") {
            facilitator = facilitator.with_server_wallet_address(wallet);
        }
        // Missing values were already reported above
        if problems.is_empty() {
            if let Err(e) = facilitator.validate() {
                problems.push(e.to_string());
            }
        }

        let mut gate = PaymentGateConfig::new()
            .with_settlement_mode(settlement_mode)
            .with_settle_timeout(settle_timeout);
        if let Some(url) = payment_ui_url {
            gate = gate.with_payment_ui_url(url);
        }
        if let Err(e) = gate.validate() {
            problems.push(e.to_string());
        }

        match (descriptor, bind_address) {
            (Ok(descriptor), Ok(bind_address)) if problems.is_empty() => Ok(Self {
                descriptor,
                facilitator,
                gate,
                client_id: var("CLIENT_ID"),
                bind_address,
                static_dir: var("STATIC_DIR")
                    .unwrap_or_else(|| defaults::STATIC_DIR.to_string())
                    .into(),
            }),
            _ => Err(GateError::config(format!(
                "Invalid configuration: {}",
                problems.join("; ")
            ))),
        }
    }
}
