//! # Notification Events
//!
//! Provider-neutral view of an asynchronous payment notification.

use crate::amount::Amount;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Notification event codes we care about
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationEventCode {
    /// Payment authorised or refused
    Authorisation,
    /// Authorisation cancelled
    Cancellation,
    /// Funds captured
    Capture,
    /// Capture failed
    CaptureFailed,
    /// Refund issued
    Refund,
    /// Refund failed
    RefundFailed,
    /// Payment is pending on the shopper or the scheme
    Pending,
    /// Stored payment details created or updated
    RecurringContract,
    /// Unknown event (passthrough)
    Unknown(String),
}

impl NotificationEventCode {
    /// Parse a processor event code (e.g. `AUTHORISATION`)
    pub fn parse(code: &str) -> Self {
        match code.trim().to_ascii_uppercase().as_str() {
            "AUTHORISATION" => NotificationEventCode::Authorisation,
            "CANCELLATION" => NotificationEventCode::Cancellation,
            "CAPTURE" => NotificationEventCode::Capture,
            "CAPTURE_FAILED" => NotificationEventCode::CaptureFailed,
            "REFUND" => NotificationEventCode::Refund,
            "REFUND_FAILED" => NotificationEventCode::RefundFailed,
            "PENDING" => NotificationEventCode::Pending,
            "RECURRING_CONTRACT" => NotificationEventCode::RecurringContract,
            _ => NotificationEventCode::Unknown(code.to_string()),
        }
    }
}

/// A parsed, verified notification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationEvent {
    /// Event code
    pub event_code: NotificationEventCode,

    /// Provider name
    pub provider: String,

    /// Processor reference of the payment (or of the modification)
    pub psp_reference: String,

    /// Payment a modification refers to
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_reference: Option<String>,

    /// Our reference (`ORDER-<uuid>`)
    pub merchant_reference: String,

    pub merchant_account: String,

    /// Whether the event succeeded
    pub success: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<Amount>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_method: Option<String>,

    /// When the processor raised the event
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_date: Option<DateTime<Utc>>,

    /// Raw event data (for debugging)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_data: Option<serde_json::Value>,
}

impl NotificationEvent {
    /// Successful authorisation
    pub fn is_authorised(&self) -> bool {
        self.event_code == NotificationEventCode::Authorisation && self.success
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_code_parse() {
        assert_eq!(
            NotificationEventCode::parse("AUTHORISATION"),
            NotificationEventCode::Authorisation
        );
        assert_eq!(
            NotificationEventCode::parse("capture_failed"),
            NotificationEventCode::CaptureFailed
        );
        assert_eq!(
            NotificationEventCode::parse("OFFER_CLOSED"),
            NotificationEventCode::Unknown("OFFER_CLOSED".to_string())
        );
    }
}
