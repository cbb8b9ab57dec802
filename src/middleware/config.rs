//! Middleware configuration

use crate::types::defaults;
use crate::{GateError, Result};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// How the gate talks to the facilitator once a proof is presented
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SettlementMode {
    /// A single settle call; the facilitator verifies as part of settlement
    #[default]
    SettleOnly,
    /// Verify first and only settle proofs that pass verification
    VerifyThenSettle,
}

impl SettlementMode {
    /// Configuration spelling of the mode
    pub fn as_str(&self) -> &'static str {
        match self {
            SettlementMode::SettleOnly => "settle-only",
            SettlementMode::VerifyThenSettle => "verify-then-settle",
        }
    }
}

impl fmt::Display for SettlementMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SettlementMode {
    type Err = GateError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "settle-only" | "settle" => Ok(SettlementMode::SettleOnly),
            "verify-then-settle" | "verify-settle" => Ok(SettlementMode::VerifyThenSettle),
            other => Err(GateError::config(format!(
                "Unknown settlement mode '{}', expected 'settle-only' or 'verify-then-settle'",
                other
            ))),
        }
    }
}

/// Per-request behaviour of the payment gate
#[derive(Debug, Clone)]
pub struct PaymentGateConfig {
    /// Facilitator call sequence
    pub settlement_mode: SettlementMode,
    /// Upper bound on each facilitator call
    pub settle_timeout: Duration,
    /// Where browser navigations without a proof are sent; `None` disables redirects
    pub payment_ui_url: Option<String>,
}

impl Default for PaymentGateConfig {
    fn default() -> Self {
        Self {
            settlement_mode: SettlementMode::default(),
            settle_timeout: defaults::SETTLE_TIMEOUT,
            payment_ui_url: None,
        }
    }
}

impl PaymentGateConfig {
    /// Create a config with default behaviour
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the settlement mode
    pub fn with_settlement_mode(mut self, mode: SettlementMode) -> Self {
        self.settlement_mode = mode;
        self
    }

    /// Set the facilitator call timeout
    pub fn with_settle_timeout(mut self, timeout: Duration) -> Self {
        self.settle_timeout = timeout;
        self
    }

    /// Set the payment UI location used for browser redirects
    pub fn with_payment_ui_url(mut self, url: impl Into<String>) -> Self {
        self.payment_ui_url = Some(url.into());
        self
    }

    /// Check the settings that cannot be fixed per request
    pub fn validate(&self) -> Result<()> {
        if self.settle_timeout.is_zero() {
            return Err(GateError::config("Settlement timeout must be greater than zero"));
        }
        if let Some(url) = &self.payment_ui_url {
            if http::HeaderValue::from_str(url).is_err() || url.trim().is_empty() {
                return Err(GateError::config(format!(
                    "Payment UI URL '{}' cannot be used as a Location header",
                    url
                )));
            }
        }
        Ok(())
    }
}
