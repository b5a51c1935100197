//! # Payment Outcomes
//!
//! The object a completed payment attempt (or redirect continuation)
//! produces, and the typed view of its result code.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Which checkout flow produced an outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlowType {
    /// Session-based flow: the SDK manages the payment with a server session
    Sessions,
    /// Advanced flow: the page fetches payment methods and the server calls `/payments`
    Advanced,
}

impl FlowType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FlowType::Sessions => "sessions",
            FlowType::Advanced => "advanced",
        }
    }
}

impl std::fmt::Display for FlowType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of a payment attempt as returned by the SDK or the backend.
///
/// Fields the router does not interpret (`action`, `order`, ...) are kept in
/// `extra` so the stored copy is the full object.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentOutcome {
    /// Processor result code, compared case-insensitively
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result_code: Option<String>,

    /// Processor reference for the payment
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub psp_reference: Option<String>,

    /// Our reference (`ORDER-<uuid>`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub merchant_reference: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_data: Option<HashMap<String, String>>,

    /// Human-readable refusal reason
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refusal_reason: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flow_type: Option<FlowType>,

    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl PaymentOutcome {
    /// Outcome carrying only a result code
    pub fn with_code(result_code: impl Into<String>) -> Self {
        Self {
            result_code: Some(result_code.into()),
            ..Default::default()
        }
    }

    /// Copy of this outcome tagged with the producing flow
    pub fn tagged(&self, flow_type: FlowType) -> Self {
        Self {
            flow_type: Some(flow_type),
            ..self.clone()
        }
    }

    /// Builder: set PSP reference
    pub fn with_psp_reference(mut self, reference: impl Into<String>) -> Self {
        self.psp_reference = Some(reference.into());
        self
    }

    /// Builder: set refusal reason
    pub fn with_refusal_reason(mut self, reason: impl Into<String>) -> Self {
        self.refusal_reason = Some(reason.into());
        self
    }

    /// Result code upper-cased; absent code normalizes to the empty string
    pub fn normalized_code(&self) -> String {
        self.result_code
            .as_deref()
            .map(|c| c.trim().to_ascii_uppercase())
            .unwrap_or_default()
    }

    /// Typed result code
    pub fn code(&self) -> ResultCode {
        ResultCode::parse(self.result_code.as_deref())
    }

    /// Result code if present and non-blank, as sent by the processor
    pub fn raw_code(&self) -> Option<&str> {
        self.result_code
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
    }
}

/// Typed view of a processor result code
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResultCode {
    Authorised,
    Authenticated,
    Pending,
    Received,
    Refused,
    Cancelled,
    Error,
    Expired,
    RedirectShopper,
    IdentifyShopper,
    ChallengeShopper,
    PresentToShopper,
    /// A code this crate does not know, upper-cased
    Unknown(String),
    /// No code, or an empty one
    Missing,
}

impl ResultCode {
    /// Parse a code case-insensitively
    pub fn parse(code: Option<&str>) -> Self {
        let normalized = code.map(|c| c.trim().to_ascii_uppercase()).unwrap_or_default();
        match normalized.as_str() {
            "" => ResultCode::Missing,
            "AUTHORISED" => ResultCode::Authorised,
            "AUTHENTICATED" => ResultCode::Authenticated,
            "PENDING" => ResultCode::Pending,
            "RECEIVED" => ResultCode::Received,
            "REFUSED" => ResultCode::Refused,
            "CANCELLED" => ResultCode::Cancelled,
            "ERROR" => ResultCode::Error,
            "EXPIRED" => ResultCode::Expired,
            "REDIRECTSHOPPER" => ResultCode::RedirectShopper,
            "IDENTIFYSHOPPER" => ResultCode::IdentifyShopper,
            "CHALLENGESHOPPER" => ResultCode::ChallengeShopper,
            "PRESENTTOSHOPPER" => ResultCode::PresentToShopper,
            _ => ResultCode::Unknown(normalized),
        }
    }

    /// Codes that still need shopper interaction through an SDK action
    pub fn requires_action(&self) -> bool {
        matches!(
            self,
            ResultCode::RedirectShopper
                | ResultCode::IdentifyShopper
                | ResultCode::ChallengeShopper
                | ResultCode::PresentToShopper
        )
    }
}
