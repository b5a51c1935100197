//! # Checkout Settings
//!
//! Deployment settings shared by the server and the browser flow.
//! Loaded from `config/checkout.toml`; every field has a default.
//!
//! ```toml
//! locale = "en_US"
//! environment = "test"
//! authenticated_is_success = true
//!
//! [pages]
//! success = "/success"
//!
//! [payment_methods.card]
//! has_holder_name = true
//! ```

use crate::classify::{ClassifyPolicy, Destination};
use crate::dropin::PaymentMethodOptions;
use crate::error::{CheckoutError, CheckoutResult};
use serde::{Deserialize, Serialize};

/// SDK environment
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SdkEnvironment {
    #[default]
    Test,
    Live,
}

impl SdkEnvironment {
    pub fn as_str(&self) -> &'static str {
        match self {
            SdkEnvironment::Test => "test",
            SdkEnvironment::Live => "live",
        }
    }
}

impl std::str::FromStr for SdkEnvironment {
    type Err = CheckoutError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "test" => Ok(SdkEnvironment::Test),
            "live" => Ok(SdkEnvironment::Live),
            other => Err(CheckoutError::Configuration(format!(
                "Unknown environment: {}",
                other
            ))),
        }
    }
}

/// Paths of the three destination pages
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DestinationPaths {
    pub success: String,
    pub pending: String,
    pub failed: String,
}

impl DestinationPaths {
    pub fn path_for(&self, destination: Destination) -> &str {
        match destination {
            Destination::Success => &self.success,
            Destination::Pending => &self.pending,
            Destination::Failed => &self.failed,
        }
    }
}

impl Default for DestinationPaths {
    fn default() -> Self {
        Self {
            success: Destination::Success.path().to_string(),
            pending: Destination::Pending.path().to_string(),
            failed: Destination::Failed.path().to_string(),
        }
    }
}

/// Settings for a deployment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CheckoutSettings {
    /// Drop-in locale (e.g., "en_US")
    pub locale: String,

    /// SDK environment
    pub environment: SdkEnvironment,

    /// Destination pages
    pub pages: DestinationPaths,

    /// Return path for the session flow's off-site steps
    pub return_path: String,

    /// Return path for the advanced flow's off-site steps
    pub advanced_return_path: String,

    /// Treat `AUTHENTICATED` as success on every path.
    /// Unset keeps the per-path default (redirect continuation only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authenticated_is_success: Option<bool>,

    /// Payment-method options handed to the drop-in
    pub payment_methods: PaymentMethodOptions,
}

impl Default for CheckoutSettings {
    fn default() -> Self {
        Self {
            locale: "en_US".to_string(),
            environment: SdkEnvironment::Test,
            pages: DestinationPaths::default(),
            return_path: "/success".to_string(),
            advanced_return_path: "/advanced/result".to_string(),
            authenticated_is_success: None,
            payment_methods: PaymentMethodOptions::default(),
        }
    }
}

impl CheckoutSettings {
    /// Parse settings from TOML
    pub fn from_toml_str(content: &str) -> CheckoutResult<Self> {
        toml::from_str(content)
            .map_err(|e| CheckoutError::Configuration(format!("Invalid checkout settings: {}", e)))
    }

    /// Explicit classification policy, if configured
    pub fn policy_override(&self) -> Option<ClassifyPolicy> {
        self.authenticated_is_success
            .map(|authenticated_is_success| ClassifyPolicy {
                authenticated_is_success,
            })
    }

    /// Builder: set locale
    pub fn with_locale(mut self, locale: impl Into<String>) -> Self {
        self.locale = locale.into();
        self
    }

    /// Builder: set environment
    pub fn with_environment(mut self, environment: SdkEnvironment) -> Self {
        self.environment = environment;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = CheckoutSettings::default();

        assert_eq!(settings.locale, "en_US");
        assert_eq!(settings.environment, SdkEnvironment::Test);
        assert_eq!(settings.pages.path_for(Destination::Pending), "/pending");
        assert!(settings.policy_override().is_none());
    }

    #[test]
    fn test_from_toml() {
        let settings = CheckoutSettings::from_toml_str(
            r#"
            locale = "nl_NL"
            environment = "live"
            authenticated_is_success = false

            [pages]
            failed = "/checkout/failed"

            [payment_methods.card]
            has_holder_name = false
            "#,
        )
        .unwrap();

        assert_eq!(settings.locale, "nl_NL");
        assert_eq!(settings.environment, SdkEnvironment::Live);
        assert_eq!(settings.pages.failed, "/checkout/failed");
        assert_eq!(settings.pages.success, "/success");
        assert_eq!(
            settings.policy_override(),
            Some(ClassifyPolicy {
                authenticated_is_success: false
            })
        );
        assert!(!settings.payment_methods.card.has_holder_name);
        assert!(settings.payment_methods.card.holder_name_required);
    }

    #[test]
    fn test_invalid_toml() {
        let err = CheckoutSettings::from_toml_str("environment = \"staging\"").unwrap_err();
        assert!(matches!(err, CheckoutError::Configuration(_)));
    }

    #[test]
    fn test_environment_from_str() {
        assert_eq!("LIVE".parse::<SdkEnvironment>().unwrap(), SdkEnvironment::Live);
        assert!("prod".parse::<SdkEnvironment>().is_err());
    }
}
