//! # Backend Request/Response Types
//!
//! JSON bodies exchanged between the browser flow and the backend.
//! Field names are camelCase on the wire.

use crate::amount::Amount;
use crate::outcome::PaymentOutcome;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// `POST /api/sessions` body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRequest {
    /// Whole units; the backend converts to minor units
    pub amount: i64,
    pub currency: String,
    pub country_code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub return_url: Option<String>,
    #[serde(default)]
    pub enable_recurring: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shopper_reference: Option<String>,
}

impl SessionRequest {
    /// Amount in minor units
    pub fn minor_amount(&self) -> Amount {
        Amount::from_major(self.amount, &self.currency)
    }
}

/// `POST /api/sessions` response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub session_id: String,
    pub session_data: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}

/// `POST /advanced/api/paymentMethods` body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentMethodsRequest {
    pub amount: i64,
    pub currency: String,
    pub country_code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shopper_reference: Option<String>,
    #[serde(default)]
    pub enable_recurring: bool,
}

impl PaymentMethodsRequest {
    pub fn minor_amount(&self) -> Amount {
        Amount::from_major(self.amount, &self.currency)
    }
}

/// `POST /advanced/api/payments` body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequest {
    /// Already in minor units
    pub amount: Amount,
    /// Opaque payment method from the SDK's `state.data`
    pub payment_method: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shopper_reference: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country_code: Option<String>,
    #[serde(default)]
    pub enable_recurring: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub browser_info: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub return_url: Option<String>,
}

impl PaymentRequest {
    /// True when the shopper picked a stored card
    pub fn uses_stored_payment_method(&self) -> bool {
        self.payment_method.get("storedPaymentMethodId").is_some()
            || self.payment_method.get("recurringDetailReference").is_some()
    }
}

/// `POST /advanced/api/payments` response
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub psp_reference: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub merchant_reference: Option<String>,
    /// Follow-up the SDK must perform (3DS challenge, redirect, ...)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub donation_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refusal_reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_data: Option<HashMap<String, String>>,
}

impl PaymentResponse {
    /// The response as a routable outcome
    pub fn into_outcome(self) -> PaymentOutcome {
        let mut extra = serde_json::Map::new();
        if let Some(action) = self.action {
            extra.insert("action".to_string(), action);
        }
        if let Some(order) = self.order {
            extra.insert("order".to_string(), order);
        }
        if let Some(token) = self.donation_token {
            extra.insert("donationToken".to_string(), Value::String(token));
        }

        PaymentOutcome {
            result_code: self.result_code,
            psp_reference: self.psp_reference,
            merchant_reference: self.merchant_reference,
            additional_data: self.additional_data,
            refusal_reason: self.refusal_reason,
            flow_type: None,
            extra,
        }
    }
}

/// Details submitted after a redirect or a 3DS challenge
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DetailsRequest {
    #[serde(rename_all = "camelCase")]
    ThreeDs {
        #[serde(rename = "threeDSResult")]
        three_ds_result: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        payment_data: Option<String>,
    },
    #[serde(rename_all = "camelCase")]
    Redirect {
        redirect_result: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        payment_data: Option<String>,
    },
}

impl DetailsRequest {
    pub fn redirect(redirect_result: impl Into<String>) -> Self {
        DetailsRequest::Redirect {
            redirect_result: redirect_result.into(),
            payment_data: None,
        }
    }

    pub fn three_ds(three_ds_result: impl Into<String>, payment_data: Option<String>) -> Self {
        DetailsRequest::ThreeDs {
            three_ds_result: three_ds_result.into(),
            payment_data,
        }
    }

    pub fn payment_data(&self) -> Option<&str> {
        match self {
            DetailsRequest::ThreeDs { payment_data, .. }
            | DetailsRequest::Redirect { payment_data, .. } => payment_data.as_deref(),
        }
    }

    pub fn is_three_ds(&self) -> bool {
        matches!(self, DetailsRequest::ThreeDs { .. })
    }
}

/// `POST /api/sessions/result` body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResultRequest {
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub session_result: Option<String>,
}
