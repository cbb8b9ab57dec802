//! Payment descriptor and its builder
//!
//! A [`PaymentDescriptor`] is the canonical statement of what a protected
//! resource costs and who gets paid. The same value feeds every facilitator
//! call and the client-facing challenge, so the two can never drift apart.

use super::constants::{defaults, CHALLENGE_DELIMITER, CUSTOMER_ID_PARAM};
use crate::{GateError, Result};
use http::Method;
use rust_decimal::Decimal;
use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use url::Url;

/// Token contract the price is denominated in
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Asset {
    /// Token contract address
    pub address: String,
    /// Number of decimals of the token
    pub decimals: u8,
}

/// Price of a resource
///
/// `amount` is kept verbatim: it is part of the challenge a client signs, so
/// reformatting it would invalidate proofs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Price {
    /// Amount as configured (e.g. `"0.001"`, `"$0.001"`, `"0.0001 ETH"`)
    pub amount: String,
    /// Explicit asset; when absent the facilitator picks the network default
    pub asset: Option<Asset>,
}

impl Price {
    /// Create a price in the network's default asset
    pub fn new(amount: impl Into<String>) -> Self {
        Self {
            amount: amount.into(),
            asset: None,
        }
    }

    /// Denominate the price in a specific token
    pub fn with_asset(mut self, address: impl Into<String>, decimals: u8) -> Self {
        self.asset = Some(Asset {
            address: address.into(),
            decimals,
        });
        self
    }

    /// Numeric value of the amount, ignoring a leading `$` and a trailing symbol
    pub fn decimal_amount(&self) -> Result<Decimal> {
        let trimmed = self.amount.trim();
        let numeric = trimmed
            .strip_prefix('$')
            .unwrap_or(trimmed)
            .split_whitespace()
            .next()
            .unwrap_or_default();

        let value = Decimal::from_str(numeric).map_err(|e| {
            GateError::config(format!("Invalid price amount '{}': {}", self.amount, e))
        })?;

        if value <= Decimal::ZERO {
            return Err(GateError::config(format!(
                "Price amount must be positive, got '{}'",
                self.amount
            )));
        }

        Ok(value)
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.amount)
    }
}

impl Serialize for Price {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match &self.asset {
            None => serializer.serialize_str(&self.amount),
            Some(asset) => {
                let mut state = serializer.serialize_struct("Price", 2)?;
                state.serialize_field("amount", &self.amount)?;
                state.serialize_field("asset", asset)?;
                state.end()
            }
        }
    }
}

/// Canonical description of a protected resource's payment terms
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentDescriptor {
    /// Resource identity the client signs over (may embed a customer id)
    pub resource_url: String,
    /// Route path the resource is served on
    pub resource_path: String,
    /// Primary method of the resource
    pub method: Method,
    /// Recipient wallet address
    pub pay_to: String,
    /// Chain identifier, optionally with an asset symbol (e.g. `eip155:11155111|ETH`)
    pub network: String,
    /// Price of one access
    pub price: Price,
    /// Human-readable description forwarded to the facilitator
    pub description: String,
    /// MIME type of the protected payload
    pub mime_type: String,
    /// Maximum settlement wait advertised to the facilitator
    pub max_timeout_seconds: u32,
}

impl PaymentDescriptor {
    /// Start building a descriptor
    pub fn builder() -> DescriptorBuilder {
        DescriptorBuilder::default()
    }

    /// The unsigned message a client countersigns: `resourceURL|network|payToAddress|price`
    pub fn challenge_message(&self) -> String {
        let mut message = String::with_capacity(
            self.resource_url.len() + self.network.len() + self.pay_to.len() + 16,
        );
        for (i, field) in [
            self.resource_url.as_str(),
            self.network.as_str(),
            self.pay_to.as_str(),
            self.price.amount.as_str(),
        ]
        .iter()
        .enumerate()
        {
            if i > 0 {
                message.push(CHALLENGE_DELIMITER);
            }
            message.push_str(field);
        }
        message
    }

    /// Customer id embedded in the resource URL, if any
    pub fn customer_id(&self) -> Option<String> {
        let base = Url::parse("http://localhost").ok()?;
        let url = base.join(&self.resource_url).ok()?;
        url.query_pairs()
            .find(|(key, _)| key == CUSTOMER_ID_PARAM)
            .map(|(_, value)| value.into_owned())
    }
}

/// Builder for [`PaymentDescriptor`]
#[derive(Debug, Clone)]
pub struct DescriptorBuilder {
    pay_to: Option<String>,
    price: Option<Price>,
    network: Option<String>,
    resource_path: Option<String>,
    base_url: Option<String>,
    customer_id: Option<String>,
    method: Method,
    description: String,
    mime_type: String,
    max_timeout_seconds: u32,
}

impl Default for DescriptorBuilder {
    fn default() -> Self {
        Self {
            pay_to: None,
            price: None,
            network: None,
            resource_path: None,
            base_url: None,
            customer_id: None,
            method: Method::GET,
            description: defaults::DESCRIPTION.to_string(),
            mime_type: defaults::MIME_TYPE.to_string(),
            max_timeout_seconds: defaults::MAX_TIMEOUT_SECONDS,
        }
    }
}

impl DescriptorBuilder {
    /// Set the recipient wallet address
    pub fn pay_to(mut self, pay_to: impl Into<String>) -> Self {
        self.pay_to = Some(pay_to.into());
        self
    }

    /// Set the price
    pub fn price(mut self, price: Price) -> Self {
        self.price = Some(price);
        self
    }

    /// Set the network identifier
    pub fn network(mut self, network: impl Into<String>) -> Self {
        self.network = Some(network.into());
        self
    }

    /// Set the route path of the resource
    pub fn resource_path(mut self, path: impl Into<String>) -> Self {
        self.resource_path = Some(path.into());
        self
    }

    /// Set an absolute base URL the resource identity is resolved against
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Bind the resource identity to a customer
    pub fn customer_id(mut self, customer_id: impl Into<String>) -> Self {
        self.customer_id = Some(customer_id.into());
        self
    }

    /// Set the primary method of the resource
    pub fn method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    /// Set the description forwarded to the facilitator
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Set the MIME type of the protected payload
    pub fn mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = mime_type.into();
        self
    }

    /// Set the maximum settlement wait advertised to the facilitator
    pub fn max_timeout_seconds(mut self, seconds: u32) -> Self {
        self.max_timeout_seconds = seconds;
        self
    }

    /// Validate the inputs and produce the descriptor
    ///
    /// All problems are reported together so a misconfigured deployment can be
    /// fixed in one pass.
    pub fn build(self) -> Result<PaymentDescriptor> {
        let mut problems = Vec::new();

        let pay_to = non_empty(self.pay_to, "pay_to", &mut problems);
        let network = non_empty(self.network, "network", &mut problems);
        let resource_path = non_empty(self.resource_path, "resource_path", &mut problems);

        if let Some(path) = &resource_path {
            check_route_path(path, &mut problems);
        }

        match &self.price {
            None => problems.push("price is required".to_string()),
            Some(price) => {
                if let Err(e) = price.decimal_amount() {
                    problems.push(e.to_string());
                }
                if let Some(asset) = &price.asset {
                    if asset.address.trim().is_empty() {
                        problems.push("asset address cannot be empty".to_string());
                    }
                }
            }
        }

        if self.max_timeout_seconds == 0 {
            problems.push("max_timeout_seconds must be greater than zero".to_string());
        }

        let resource_url = resource_path.as_deref().and_then(|path| {
            resource_url(
                path,
                self.base_url.as_deref(),
                self.customer_id.as_deref(),
                &mut problems,
            )
        });

        match (pay_to, network, resource_path, resource_url, self.price) {
            (Some(pay_to), Some(network), Some(resource_path), Some(resource_url), Some(price))
                if problems.is_empty() =>
            {
                Ok(PaymentDescriptor {
                    resource_url,
                    resource_path,
                    method: self.method,
                    pay_to,
                    network,
                    price,
                    description: self.description,
                    mime_type: self.mime_type,
                    max_timeout_seconds: self.max_timeout_seconds,
                })
            }
            _ => Err(GateError::config(format!(
                "Invalid payment descriptor: {}",
                problems.join("; ")
            ))),
        }
    }
}

/// The resource path is mounted as a literal route, so it must carry no
/// query and no route-capture syntax
fn check_route_path(path: &str, problems: &mut Vec<String>) {
    if !path.starts_with('/') {
        problems.push(format!("resource_path must start with '/', got '{path}'"));
    }
    if path.contains('?') {
        problems.push(format!("resource_path must not contain a query string, got '{path}'"));
    }
    if path.contains(|c: char| c == '{' || c == '}') {
        problems.push(format!("resource_path must not contain '{{' or '}}', got '{path}'"));
    }
    if path
        .split('/')
        .any(|segment| segment.starts_with(':') || segment.starts_with('*'))
    {
        problems.push(format!(
            "resource_path segments must not start with ':' or '*', got '{path}'"
        ));
    }
}

fn non_empty(value: Option<String>, name: &str, problems: &mut Vec<String>) -> Option<String> {
    match value {
        Some(v) if !v.trim().is_empty() => Some(v),
        _ => {
            problems.push(format!("{name} is required"));
            None
        }
    }
}

fn resource_url(
    path: &str,
    base_url: Option<&str>,
    customer_id: Option<&str>,
    problems: &mut Vec<String>,
) -> Option<String> {
    let customer_id = customer_id.filter(|id| !id.is_empty());

    let Some(base) = base_url else {
        return Some(match customer_id {
            None => path.to_string(),
            Some(id) => {
                let query = url::form_urlencoded::Serializer::new(String::new())
                    .append_pair(CUSTOMER_ID_PARAM, id)
                    .finish();
                format!("{path}?{query}")
            }
        });
    };

    let joined = Url::parse(base).and_then(|base| base.join(path));
    match joined {
        Ok(mut url) => {
            if let Some(id) = customer_id {
                url.query_pairs_mut().append_pair(CUSTOMER_ID_PARAM, id);
            }
            Some(url.to_string())
        }
        Err(e) => {
            problems.push(format!("invalid base_url '{base}': {e}"));
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn weather_descriptor() -> PaymentDescriptor {
        PaymentDescriptor::builder()
            .pay_to("0xABC")
            .price(Price::new("0.001"))
            .network("test-net|USD")
            .resource_path("/weather")
            .build()
            .unwrap()
    }

    #[test]
    fn test_challenge_field_order() {
        let descriptor = weather_descriptor();
        assert_eq!(
            descriptor.challenge_message(),
            "/weather|test-net|USD|0xABC|0.001"
        );
    }

    #[test]
    fn test_builder_is_deterministic() {
        assert_eq!(weather_descriptor(), weather_descriptor());
        assert_eq!(
            weather_descriptor().challenge_message(),
            weather_descriptor().challenge_message()
        );
    }

    #[test]
    fn test_customer_id_bound_into_absolute_url() {
        let descriptor = PaymentDescriptor::builder()
            .pay_to("0x209693Bc6afc0C5328bA36FaF03C514EF312287C")
            .price(Price::new("$0.001"))
            .network("base-sepolia")
            .resource_path("/weather")
            .base_url("https://my-protected-api.com")
            .customer_id("aaaaaaaaa")
            .build()
            .unwrap();

        assert_eq!(
            descriptor.resource_url,
            "https://my-protected-api.com/weather?customerId=aaaaaaaaa"
        );
        assert_eq!(descriptor.resource_path, "/weather");
        assert_eq!(descriptor.customer_id(), Some("aaaaaaaaa".to_string()));
    }

    #[test]
    fn test_customer_id_is_percent_encoded_on_relative_path() {
        let descriptor = PaymentDescriptor::builder()
            .pay_to("0xABC")
            .price(Price::new("0.001"))
            .network("base-sepolia")
            .resource_path("/weather")
            .customer_id("a b&c")
            .build()
            .unwrap();

        assert_eq!(descriptor.resource_url, "/weather?customerId=a+b%26c");
        assert_eq!(descriptor.customer_id(), Some("a b&c".to_string()));
    }

    #[test]
    fn test_no_customer_id() {
        assert_eq!(weather_descriptor().customer_id(), None);
    }

    #[test]
    fn test_missing_fields_are_all_reported() {
        let err = PaymentDescriptor::builder().build().unwrap_err();
        let message = err.to_string();
        assert!(message.contains("pay_to is required"));
        assert!(message.contains("network is required"));
        assert!(message.contains("resource_path is required"));
        assert!(message.contains("price is required"));
    }

    #[test]
    fn test_invalid_price_rejected() {
        let err = PaymentDescriptor::builder()
            .pay_to("0xABC")
            .price(Price::new("free"))
            .network("base-sepolia")
            .resource_path("/weather")
            .build()
            .unwrap_err();
        assert!(matches!(err, GateError::Config { .. }));

        let err = PaymentDescriptor::builder()
            .pay_to("0xABC")
            .price(Price::new("0"))
            .network("base-sepolia")
            .resource_path("/weather")
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("must be positive"));
    }

    #[test]
    fn test_relative_resource_path_rejected() {
        let err = PaymentDescriptor::builder()
            .pay_to("0xABC")
            .price(Price::new("0.001"))
            .network("base-sepolia")
            .resource_path("weather")
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("must start with '/'"));
    }

    #[test]
    fn test_route_syntax_in_resource_path_rejected() {
        let cases = [
            ("/api/weather?city=oslo", "must not contain a query string"),
            ("/api/{city}", "must not contain '{' or '}'"),
            ("/api/:city", "must not start with ':' or '*'"),
            ("/files/*rest", "must not start with ':' or '*'"),
        ];

        for (path, expected) in cases {
            let err = PaymentDescriptor::builder()
                .pay_to("0xABC")
                .price(Price::new("0.001"))
                .network("base-sepolia")
                .resource_path(path)
                .build()
                .unwrap_err();
            assert!(matches!(err, GateError::Config { .. }));
            assert!(err.to_string().contains(expected), "'{path}' gave: {err}");
        }
    }

    #[test]
    fn test_colon_inside_segment_allowed() {
        let descriptor = PaymentDescriptor::builder()
            .pay_to("0xABC")
            .price(Price::new("0.001"))
            .network("base-sepolia")
            .resource_path("/api/v1:weather")
            .build()
            .unwrap();
        assert_eq!(descriptor.resource_url, "/api/v1:weather");
    }

    #[test]
    fn test_price_decimal_amount_forms() {
        assert_eq!(
            Price::new("$0.001").decimal_amount().unwrap(),
            Decimal::from_str("0.001").unwrap()
        );
        assert_eq!(
            Price::new("0.0001 ETH").decimal_amount().unwrap(),
            Decimal::from_str("0.0001").unwrap()
        );
        assert_eq!(
            Price::new("10000").decimal_amount().unwrap(),
            Decimal::from(10000)
        );
    }

    #[test]
    fn test_price_wire_format() {
        let plain = serde_json::to_value(Price::new("0.0001 ETH")).unwrap();
        assert_eq!(plain, serde_json::json!("0.0001 ETH"));

        let with_asset = serde_json::to_value(
            Price::new("10000").with_asset("0x1c7D4B196Cb0C7B01d743Fbc6116a902379C7238", 6),
        )
        .unwrap();
        assert_eq!(
            with_asset,
            serde_json::json!({
                "amount": "10000",
                "asset": {
                    "address": "0x1c7D4B196Cb0C7B01d743Fbc6116a902379C7238",
                    "decimals": 6
                }
            })
        );
    }

    #[test]
    fn test_price_kept_verbatim_in_challenge() {
        let descriptor = PaymentDescriptor::builder()
            .pay_to("0xreceiver")
            .price(Price::new("0.0001 ETH"))
            .network("eip155:11155111|ETH")
            .resource_path("/api/weather")
            .base_url("http://localhost:3002")
            .build()
            .unwrap();
        assert_eq!(
            descriptor.challenge_message(),
            "http://localhost:3002/api/weather|eip155:11155111|ETH|0xreceiver|0.0001 ETH"
        );
    }
}
