//! # Application State
//!
//! Shared state for the Axum application.
//! Contains the payment gateway, checkout settings and return URLs.

use checkout_adyen::{AdyenCheckoutGateway, AdyenConfig, LoggingNotificationHandler, NotificationHandler};
use checkout_core::{
    BoxedPaymentGateway, CheckoutSettings, ClassifyPolicy, ClientConfig, CompletionPath, ReturnUrls,
};
use std::net::SocketAddr;
use std::sync::Arc;

/// Application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Host to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// Base URL for return URLs and the payment origin
    pub base_url: String,
    /// Environment (development, staging, production)
    pub environment: String,
    /// wasm-pack output served under `/pkg`
    pub wasm_dir: String,
}

impl AppConfig {
    /// Load from environment variables
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Build from a variable lookup
    pub fn from_vars<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self {
            host: lookup("HOST").unwrap_or_else(|| "127.0.0.1".to_string()),
            port: lookup("PORT")
                .and_then(|p| p.parse().ok())
                .unwrap_or(8080),
            base_url: lookup("BASE_URL").unwrap_or_else(|| "http://localhost:8080".to_string()),
            environment: lookup("ENVIRONMENT").unwrap_or_else(|| "development".to_string()),
            wasm_dir: lookup("WASM_PKG_DIR").unwrap_or_else(|| "crates/checkout-wasm/pkg".to_string()),
        }
    }

    /// Get the socket address to bind to
    pub fn socket_addr(&self) -> anyhow::Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| anyhow::anyhow!("Invalid socket address {}:{}: {}", self.host, self.port, e))
    }

    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::from_vars(|_| None)
    }
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Processor client
    pub gateway: BoxedPaymentGateway,
    /// Deployment settings
    pub settings: CheckoutSettings,
    /// Served to the browser from `/api/config`
    pub client_config: ClientConfig,
    /// Default return URLs for sessions and payments
    pub return_urls: ReturnUrls,
    /// Receives verified notifications
    pub notifications: Arc<dyn NotificationHandler>,
    /// Application config
    pub config: AppConfig,
}

impl AppState {
    /// Create a new AppState backed by the Adyen gateway
    pub fn new() -> anyhow::Result<Self> {
        let config = AppConfig::from_env();
        let settings = load_checkout_settings()?;

        let adyen = AdyenConfig::from_env()
            .map_err(|e| anyhow::anyhow!("Failed to initialize Adyen: {}", e))?;
        let client_key = adyen.client_key.clone();
        let settings = settings.with_environment(adyen.environment);

        let gateway = AdyenCheckoutGateway::new(adyen)
            .map_err(|e| anyhow::anyhow!("Failed to initialize Adyen: {}", e))?
            .with_origin(&config.base_url);

        Ok(Self::with_gateway(
            Arc::new(gateway),
            client_key,
            settings,
            config,
        ))
    }

    /// Build state around an existing gateway
    pub fn with_gateway(
        gateway: BoxedPaymentGateway,
        client_key: impl Into<String>,
        settings: CheckoutSettings,
        config: AppConfig,
    ) -> Self {
        let return_urls = ReturnUrls::new(&config.base_url)
            .with_paths(&settings.return_path, &settings.advanced_return_path);
        let client_config = ClientConfig::from_settings(client_key, &settings);

        Self {
            gateway,
            settings,
            client_config,
            return_urls,
            notifications: Arc::new(LoggingNotificationHandler),
            config,
        }
    }

    /// Builder: replace the notification handler
    pub fn with_notification_handler(mut self, handler: Arc<dyn NotificationHandler>) -> Self {
        self.notifications = handler;
        self
    }

    /// Classification policy for a completion path, honouring the configured override
    pub fn policy(&self, path: CompletionPath) -> ClassifyPolicy {
        self.settings
            .policy_override()
            .unwrap_or_else(|| ClassifyPolicy::for_path(path))
    }
}

/// Load checkout settings from config file
fn load_checkout_settings() -> anyhow::Result<CheckoutSettings> {
    let config_paths = [
        "config/checkout.toml",
        "../config/checkout.toml",
        "../../config/checkout.toml",
    ];

    for path in config_paths {
        if let Ok(content) = std::fs::read_to_string(path) {
            let settings = CheckoutSettings::from_toml_str(&content)
                .map_err(|e| anyhow::anyhow!("Failed to parse {}: {}", path, e))?;
            tracing::info!("Loaded checkout settings from {}", path);
            return Ok(settings);
        }
    }

    tracing::warn!("No checkout settings found, using defaults");
    Ok(CheckoutSettings::default())
}
