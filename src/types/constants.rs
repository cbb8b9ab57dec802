//! Header names, defaults and other protocol constants

/// HTTP header names used by the gate
pub mod headers {
    use http::HeaderName;

    /// Opaque payment proof submitted by the client
    pub const X_PAYMENT: HeaderName = HeaderName::from_static("x-payment");
    /// Canonical challenge string the client must countersign
    pub const X_PAYMENT_MESSAGE: HeaderName = HeaderName::from_static("x-payment-message");
    /// Settlement receipt identifier (transaction hash)
    pub const X_PAYMENT_RECEIPT: HeaderName = HeaderName::from_static("x-payment-receipt");
    /// Base64-encoded settlement record
    pub const X_PAYMENT_RESPONSE: HeaderName = HeaderName::from_static("x-payment-response");

    /// Facilitator secret key
    pub const X_SECRET_KEY: HeaderName = HeaderName::from_static("x-secret-key");
    /// Facilitator-side server wallet
    pub const X_SERVER_WALLET_ADDRESS: HeaderName =
        HeaderName::from_static("x-server-wallet-address");
    /// SDK correlation metadata sent to the facilitator
    pub const CORRELATION_CONTEXT: HeaderName = HeaderName::from_static("correlation-context");

    /// Returns true for headers that belong to the payment exchange
    ///
    /// Only these are carried over from a facilitator response; transport
    /// headers such as `content-length` must never leak into ours.
    pub fn is_payment_header(name: &HeaderName) -> bool {
        let name = name.as_str();
        name.starts_with("x-payment") || name.starts_with("payment-")
    }
}

/// Defaults applied when configuration leaves a value unset
pub mod defaults {
    use std::time::Duration;

    /// Path of the protected resource
    pub const RESOURCE_PATH: &str = "/api/weather";
    /// Location of the browser payment UI
    pub const PAYMENT_UI_URL: &str = "/wallet.html";
    /// Upper bound on a single facilitator call
    pub const SETTLE_TIMEOUT: Duration = Duration::from_secs(300);
    /// Maximum settlement wait advertised to the facilitator, in seconds
    pub const MAX_TIMEOUT_SECONDS: u32 = 300;
    /// MIME type of the protected payload
    pub const MIME_TYPE: &str = "application/json";
    /// Description of the protected payload
    pub const DESCRIPTION: &str = "Access to premium API content";
    /// Server bind address
    pub const BIND_ADDRESS: &str = "0.0.0.0:3002";
    /// Directory for static assets, including the payment UI
    pub const STATIC_DIR: &str = "./public";
}

/// Routes the server mounts beside the protected resource
pub mod routes {
    /// Public client configuration
    pub const CONFIG: &str = "/api/config";
    /// Liveness check
    pub const HEALTH: &str = "/health";
    /// Paths the protected resource cannot take
    pub const RESERVED: &[&str] = &[CONFIG, HEALTH];
}

/// Delimiter between challenge fields
pub const CHALLENGE_DELIMITER: char = '|';

/// Query parameter that binds a customer to the resource URL
pub const CUSTOMER_ID_PARAM: &str = "customerId";
