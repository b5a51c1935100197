//! # Adyen Configuration
//!
//! Configuration management for the Adyen integration.
//! All secrets are loaded from environment variables.

use checkout_core::{CheckoutError, CheckoutResult, SdkEnvironment};
use std::env;

/// Checkout API version used for every call
pub const API_VERSION: &str = "v71";

/// Test Checkout API base URL
pub const TEST_CHECKOUT_URL: &str = "https://checkout-test.adyen.com/v71";

/// Adyen API configuration
#[derive(Debug, Clone)]
pub struct AdyenConfig {
    /// API key sent as `X-API-Key`
    pub api_key: String,

    /// Merchant account the payments are booked on
    pub merchant_account: String,

    /// Client key for the drop-in (test_... or live_...)
    pub client_key: String,

    /// Test or live
    pub environment: SdkEnvironment,

    /// Hex-encoded notification HMAC key; notifications are not verified without it
    pub hmac_key: Option<String>,

    /// Live endpoint prefix from the Customer Area (live only)
    pub live_url_prefix: Option<String>,

    /// Checkout API base URL (overridable for testing/mocking)
    pub checkout_base_url: String,
}

impl AdyenConfig {
    /// Load configuration from environment variables.
    ///
    /// Required env vars:
    /// - `ADYEN_API_KEY`
    /// - `ADYEN_MERCHANT_ACCOUNT`
    /// - `ADYEN_CLIENT_KEY`
    ///
    /// Optional: `ADYEN_ENVIRONMENT` (default `test`), `ADYEN_HMAC_KEY`,
    /// `ADYEN_LIVE_URL_PREFIX` (required when live).
    pub fn from_env() -> CheckoutResult<Self> {
        dotenvy::dotenv().ok(); // Load .env file if present

        Self::from_vars(|key| env::var(key).ok())
    }

    /// Build configuration from a variable lookup
    pub fn from_vars<F>(lookup: F) -> CheckoutResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| CheckoutError::Configuration(format!("{} not set", key)))
        };

        let api_key = required("ADYEN_API_KEY")?;
        let merchant_account = required("ADYEN_MERCHANT_ACCOUNT")?;
        let client_key = required("ADYEN_CLIENT_KEY")?;

        let environment = match lookup("ADYEN_ENVIRONMENT") {
            Some(value) => value.parse::<SdkEnvironment>()?,
            None => SdkEnvironment::Test,
        };

        let expected_prefix = format!("{}_", environment.as_str());
        if !client_key.starts_with(&expected_prefix) {
            return Err(CheckoutError::Configuration(format!(
                "ADYEN_CLIENT_KEY must start with {} in the {} environment",
                expected_prefix,
                environment.as_str()
            )));
        }

        let hmac_key = lookup("ADYEN_HMAC_KEY").filter(|v| !v.trim().is_empty());
        if let Some(key) = &hmac_key {
            hex::decode(key).map_err(|_| {
                CheckoutError::Configuration("ADYEN_HMAC_KEY must be hex-encoded".to_string())
            })?;
        }

        let live_url_prefix = lookup("ADYEN_LIVE_URL_PREFIX").filter(|v| !v.trim().is_empty());
        let checkout_base_url = match environment {
            SdkEnvironment::Test => TEST_CHECKOUT_URL.to_string(),
            SdkEnvironment::Live => {
                let prefix = live_url_prefix.as_deref().ok_or_else(|| {
                    CheckoutError::Configuration(
                        "ADYEN_LIVE_URL_PREFIX must be set in the live environment".to_string(),
                    )
                })?;
                live_checkout_url(prefix)
            }
        };

        Ok(Self {
            api_key,
            merchant_account,
            client_key,
            environment,
            hmac_key,
            live_url_prefix,
            checkout_base_url,
        })
    }

    /// Create test-environment config with explicit values (for testing)
    pub fn new(
        api_key: impl Into<String>,
        merchant_account: impl Into<String>,
        client_key: impl Into<String>,
    ) -> Self {
        Self {
            api_key: api_key.into(),
            merchant_account: merchant_account.into(),
            client_key: client_key.into(),
            environment: SdkEnvironment::Test,
            hmac_key: None,
            live_url_prefix: None,
            checkout_base_url: TEST_CHECKOUT_URL.to_string(),
        }
    }

    pub fn is_test_mode(&self) -> bool {
        self.environment == SdkEnvironment::Test
    }

    pub fn is_live_mode(&self) -> bool {
        self.environment == SdkEnvironment::Live
    }

    /// Full URL for a Checkout API path (e.g. `/sessions`)
    pub fn checkout_url(&self, path: &str) -> String {
        format!("{}{}", self.checkout_base_url.trim_end_matches('/'), path)
    }

    /// Builder: set custom Checkout API base URL (for testing)
    pub fn with_checkout_base_url(mut self, url: impl Into<String>) -> Self {
        self.checkout_base_url = url.into();
        self
    }

    /// Builder: set notification HMAC key
    pub fn with_hmac_key(mut self, key: impl Into<String>) -> Self {
        self.hmac_key = Some(key.into());
        self
    }

    /// Builder: switch to the live environment
    pub fn with_live_prefix(mut self, prefix: impl Into<String>) -> Self {
        let prefix = prefix.into();
        self.environment = SdkEnvironment::Live;
        self.checkout_base_url = live_checkout_url(&prefix);
        self.live_url_prefix = Some(prefix);
        self
    }
}

/// Live Checkout API base URL for a merchant prefix
pub fn live_checkout_url(prefix: &str) -> String {
    format!(
        "https://{}-checkout-live.adyenpayments.com/checkout/{}",
        prefix, API_VERSION
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    const BASE: &[(&str, &str)] = &[
        ("ADYEN_API_KEY", "AQE_key"),
        ("ADYEN_MERCHANT_ACCOUNT", "ShopECOM"),
        ("ADYEN_CLIENT_KEY", "test_ABC"),
    ];

    #[test]
    fn test_defaults_to_test_environment() {
        let config = AdyenConfig::from_vars(vars(BASE)).unwrap();

        assert!(config.is_test_mode());
        assert_eq!(config.checkout_url("/sessions"), "https://checkout-test.adyen.com/v71/sessions");
        assert!(config.hmac_key.is_none());
    }

    #[test]
    fn test_live_requires_prefix() {
        let mut pairs = BASE.to_vec();
        pairs.push(("ADYEN_ENVIRONMENT", "live"));
        pairs.push(("ADYEN_CLIENT_KEY", "live_ABC"));
        let err = AdyenConfig::from_vars(vars(&pairs)).unwrap_err();
        assert!(err.to_string().contains("ADYEN_LIVE_URL_PREFIX"));

        pairs.push(("ADYEN_LIVE_URL_PREFIX", "1797a841fbb37ca7-AdyenDemo"));
        let config = AdyenConfig::from_vars(vars(&pairs)).unwrap();
        assert!(config.is_live_mode());
        assert_eq!(
            config.checkout_url("/payments"),
            "https://1797a841fbb37ca7-AdyenDemo-checkout-live.adyenpayments.com/checkout/v71/payments"
        );
    }

    #[test]
    fn test_client_key_must_match_environment() {
        let mut pairs = BASE.to_vec();
        pairs.push(("ADYEN_CLIENT_KEY", "live_ABC"));
        assert!(AdyenConfig::from_vars(vars(&pairs)).is_err());
    }

    #[test]
    fn test_hmac_key_must_be_hex() {
        let mut pairs = BASE.to_vec();
        pairs.push(("ADYEN_HMAC_KEY", "not-hex"));
        assert!(AdyenConfig::from_vars(vars(&pairs)).is_err());

        pairs.push(("ADYEN_HMAC_KEY", "44782DEF547AAA06C910C43932B1EB0C"));
        let config = AdyenConfig::from_vars(vars(&pairs)).unwrap();
        assert!(config.hmac_key.is_some());
    }

    #[test]
    fn test_missing_key() {
        let err = AdyenConfig::from_vars(vars(&[("ADYEN_API_KEY", "k")])).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Configuration error: ADYEN_MERCHANT_ACCOUNT not set"
        );
    }

    #[test]
    fn test_builders() {
        let config = AdyenConfig::new("k", "m", "test_c")
            .with_checkout_base_url("http://127.0.0.1:9999/")
            .with_hmac_key("00");

        assert_eq!(config.checkout_url("/sessions"), "http://127.0.0.1:9999/sessions");
        assert_eq!(config.hmac_key.as_deref(), Some("00"));
    }
}
