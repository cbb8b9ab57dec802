//! Facilitator authentication headers

use crate::types::{headers, FacilitatorConfig};
use crate::{GateError, Result};
use http::{HeaderMap, HeaderValue};

/// SDK name reported in the correlation header
pub const SDK_NAME: &str = "x402-gate";

/// Create the headers sent with every facilitator call
///
/// The secret key is marked sensitive so it never shows up in debug output
/// of the underlying HTTP client.
pub fn create_auth_headers(config: &FacilitatorConfig) -> Result<HeaderMap> {
    let mut secret = HeaderValue::from_str(config.secret_key.trim())
        .map_err(|_| GateError::config("Facilitator secret key is not a valid header value"))?;
    secret.set_sensitive(true);

    let mut map = HeaderMap::new();
    map.insert(headers::X_SECRET_KEY, secret);

    if let Some(wallet) = &config.server_wallet_address {
        let value = HeaderValue::from_str(wallet).map_err(|_| {
            GateError::config("Facilitator wallet address is not a valid header value")
        })?;
        map.insert(headers::X_SERVER_WALLET_ADDRESS, value);
    }

    let correlation = HeaderValue::from_str(&create_correlation_header())
        .map_err(|e| GateError::config(format!("Invalid correlation header: {}", e)))?;
    map.insert(headers::CORRELATION_CONTEXT, correlation);

    Ok(map)
}

/// Create correlation header for requests
fn create_correlation_header() -> String {
    use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};

    let data = [
        ("sdk_name", SDK_NAME),
        ("sdk_language", "rust"),
        ("sdk_version", crate::VERSION),
    ];

    let pairs: Vec<String> = data
        .iter()
        .map(|(key, value)| format!("{}={}", key, utf8_percent_encode(value, NON_ALPHANUMERIC)))
        .collect();

    pairs.join(",")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_headers_contain_secret() {
        let config = FacilitatorConfig::new("https://example.com", "sk_test_123")
            .with_server_wallet_address("0x209693Bc6afc0C5328bA36FaF03C514EF312287C");
        let map = create_auth_headers(&config).unwrap();

        let secret = map.get(headers::X_SECRET_KEY).unwrap();
        assert_eq!(secret, "sk_test_123");
        assert!(secret.is_sensitive());
        assert_eq!(
            map.get(headers::X_SERVER_WALLET_ADDRESS).unwrap(),
            "0x209693Bc6afc0C5328bA36FaF03C514EF312287C"
        );
    }

    #[test]
    fn test_correlation_header_is_percent_encoded() {
        let header = create_correlation_header();
        assert!(header.starts_with("sdk_name=x402%2Dgate,"));
        assert!(header.contains("sdk_language=rust"));
        assert!(header.contains(&format!(
            "sdk_version={}",
            crate::VERSION.replace('.', "%2E")
        )));
    }

    #[test]
    fn test_invalid_secret_rejected() {
        let config = FacilitatorConfig::new("https://example.com", "bad\nsecret");
        assert!(create_auth_headers(&config).is_err());
    }
}
