//! # Drop-in Configuration
//!
//! Payment-method options from the settings file, the client-facing config
//! served by `/api/config`, and the configuration object handed to the
//! drop-in SDK when a checkout starts.

use crate::amount::Amount;
use crate::requests::SessionResponse;
use crate::settings::{CheckoutSettings, DestinationPaths, SdkEnvironment};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Card component options
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CardOptions {
    #[serde(alias = "has_holder_name")]
    pub has_holder_name: bool,
    #[serde(alias = "holder_name_required")]
    pub holder_name_required: bool,
    #[serde(alias = "enable_store_details")]
    pub enable_store_details: bool,
    pub name: String,
    #[serde(alias = "billing_address_required")]
    pub billing_address_required: bool,
}

impl Default for CardOptions {
    fn default() -> Self {
        Self {
            has_holder_name: true,
            holder_name_required: true,
            enable_store_details: true,
            name: "Credit or debit card".to_string(),
            billing_address_required: false,
        }
    }
}

/// iDEAL component options
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct IdealOptions {
    #[serde(alias = "show_image")]
    pub show_image: bool,
}

impl Default for IdealOptions {
    fn default() -> Self {
        Self { show_image: true }
    }
}

/// Payment-method options for the drop-in
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PaymentMethodOptions {
    pub card: CardOptions,
    pub ideal: IdealOptions,
    /// Include a PayPal section (environment, country, amount)
    #[serde(alias = "paypal_enabled")]
    pub paypal_enabled: bool,
}

impl Default for PaymentMethodOptions {
    fn default() -> Self {
        Self {
            card: CardOptions::default(),
            ideal: IdealOptions::default(),
            paypal_enabled: true,
        }
    }
}

impl PaymentMethodOptions {
    /// `paymentMethodsConfiguration` object in the SDK's shape
    pub fn to_sdk_value(
        &self,
        environment: SdkEnvironment,
        amount: &Amount,
        country_code: &str,
    ) -> Value {
        let mut config = json!({
            "card": {
                "hasHolderName": self.card.has_holder_name,
                "holderNameRequired": self.card.holder_name_required,
                "enableStoreDetails": self.card.enable_store_details,
                "name": self.card.name,
                "billingAddressRequired": self.card.billing_address_required,
            },
            "ideal": {
                "showImage": self.ideal.show_image,
            },
        });

        if self.paypal_enabled {
            config["paypal"] = json!({
                "environment": environment.as_str(),
                "countryCode": country_code,
                "amount": amount,
            });
        }

        config
    }
}

/// Configuration the browser fetches from `/api/config`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientConfig {
    pub client_key: String,
    pub environment: SdkEnvironment,
    pub locale: String,
    #[serde(default)]
    pub pages: DestinationPaths,
    #[serde(default)]
    pub return_path: Option<String>,
    #[serde(default)]
    pub advanced_return_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authenticated_is_success: Option<bool>,
    #[serde(default)]
    pub payment_methods: PaymentMethodOptions,
}

impl ClientConfig {
    /// Client config for a client key and deployment settings
    pub fn from_settings(client_key: impl Into<String>, settings: &CheckoutSettings) -> Self {
        Self {
            client_key: client_key.into(),
            environment: settings.environment,
            locale: settings.locale.clone(),
            pages: settings.pages.clone(),
            return_path: Some(settings.return_path.clone()),
            advanced_return_path: Some(settings.advanced_return_path.clone()),
            authenticated_is_success: settings.authenticated_is_success,
            payment_methods: settings.payment_methods.clone(),
        }
    }

    /// Settings view of this config
    pub fn settings(&self) -> CheckoutSettings {
        let defaults = CheckoutSettings::default();
        CheckoutSettings {
            locale: self.locale.clone(),
            environment: self.environment,
            pages: self.pages.clone(),
            return_path: self.return_path.clone().unwrap_or(defaults.return_path),
            advanced_return_path: self
                .advanced_return_path
                .clone()
                .unwrap_or(defaults.advanced_return_path),
            authenticated_is_success: self.authenticated_is_success,
            payment_methods: self.payment_methods.clone(),
        }
    }
}

/// Session descriptor in the SDK's shape
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionDescriptor {
    pub id: String,
    pub session_data: String,
}

/// Drop-in options for the advanced flow
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DropinConfiguration {
    pub show_pay_button: bool,
    pub amount: Amount,
}

/// Configuration object passed to the SDK's checkout factory
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutConfiguration {
    pub client_key: String,
    pub locale: String,
    pub environment: SdkEnvironment,
    pub amount: Amount,
    pub country_code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session: Option<SessionDescriptor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_methods_response: Option<Value>,
    pub payment_methods_configuration: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dropin: Option<DropinConfiguration>,
}

impl CheckoutConfiguration {
    pub fn new(client: &ClientConfig, amount: Amount, country_code: impl Into<String>) -> Self {
        let country_code = country_code.into();
        let payment_methods_configuration =
            client
                .payment_methods
                .to_sdk_value(client.environment, &amount, &country_code);

        Self {
            client_key: client.client_key.clone(),
            locale: client.locale.clone(),
            environment: client.environment,
            amount,
            country_code,
            session: None,
            payment_methods_response: None,
            payment_methods_configuration,
            dropin: None,
        }
    }

    /// Builder: session flow. A client key returned with the session wins.
    pub fn with_session(mut self, session: &SessionResponse) -> Self {
        if let Some(key) = session.client_key.as_deref().filter(|k| !k.is_empty()) {
            self.client_key = key.to_string();
        }
        self.session = Some(SessionDescriptor {
            id: session.session_id.clone(),
            session_data: session.session_data.clone(),
        });
        self
    }

    /// Builder: advanced flow with the backend's payment-methods payload
    pub fn with_payment_methods(mut self, response: Value) -> Self {
        self.payment_methods_response = Some(response);
        self.dropin = Some(DropinConfiguration {
            show_pay_button: true,
            amount: self.amount.clone(),
        });
        self
    }

    pub fn is_session(&self) -> bool {
        self.session.is_some()
    }
}
