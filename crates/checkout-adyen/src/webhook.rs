//! # Adyen Notification Webhooks
//!
//! Parsing, HMAC verification and dispatch of Adyen standard notifications.
//! Each `NotificationRequestItem` carries its own signature in
//! `additionalData.hmacSignature`:
//!
//! ```text
//! base64(HMAC-SHA256(hex_decode(key),
//!   "pspReference:originalReference:merchantAccountCode:merchantReference:value:currency:eventCode:success"))
//! ```

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use chrono::{DateTime, Utc};
use checkout_core::{
    Amount, CheckoutError, CheckoutResult, NotificationEvent, NotificationEventCode,
};
use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;
use std::collections::HashMap;
use tracing::{debug, info, warn};

/// Body Adyen expects back once a notification is stored
pub const NOTIFICATION_ACCEPTED: &str = "[accepted]";

type HmacSha256 = Hmac<Sha256>;

/// Notification webhook body
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationRequest {
    #[serde(default)]
    pub live: Option<String>,
    pub notification_items: Vec<NotificationItem>,
}

#[derive(Debug, Deserialize)]
pub struct NotificationItem {
    #[serde(rename = "NotificationRequestItem")]
    pub notification_request_item: NotificationRequestItem,
}

#[derive(Debug, Deserialize)]
pub struct NotificationAmount {
    pub value: i64,
    pub currency: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationRequestItem {
    #[serde(default)]
    pub additional_data: HashMap<String, serde_json::Value>,
    pub amount: NotificationAmount,
    pub psp_reference: String,
    #[serde(default)]
    pub original_reference: Option<String>,
    pub event_code: String,
    #[serde(default)]
    pub event_date: Option<String>,
    pub merchant_account_code: String,
    pub merchant_reference: String,
    /// "true" or "false"
    pub success: String,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub payment_method: Option<String>,
}

impl NotificationRequestItem {
    /// String the HMAC signature is computed over
    pub fn signing_payload(&self) -> String {
        format!(
            "{}:{}:{}:{}:{}:{}:{}:{}",
            self.psp_reference,
            self.original_reference.as_deref().unwrap_or_default(),
            self.merchant_account_code,
            self.merchant_reference,
            self.amount.value,
            self.amount.currency,
            self.event_code,
            self.success
        )
    }

    pub fn hmac_signature(&self) -> Option<&str> {
        self.additional_data
            .get("hmacSignature")
            .and_then(|v| v.as_str())
    }

    /// Check this item's signature against a hex-encoded key
    pub fn verify(&self, hmac_key: &str) -> CheckoutResult<()> {
        let received = self.hmac_signature().ok_or_else(|| {
            CheckoutError::WebhookVerificationFailed("Missing hmacSignature".to_string())
        })?;
        let expected = compute_signature(hmac_key, &self.signing_payload())?;

        if !constant_time_compare(received, &expected) {
            return Err(CheckoutError::WebhookVerificationFailed(
                "Signature mismatch".to_string(),
            ));
        }
        Ok(())
    }

    /// Provider-neutral event
    pub fn into_event(self) -> NotificationEvent {
        let event_date = self
            .event_date
            .as_deref()
            .and_then(|d| DateTime::parse_from_rfc3339(d).ok())
            .map(|d| d.with_timezone(&Utc));

        let raw_data = serde_json::to_value(&self.additional_data).ok();

        NotificationEvent {
            event_code: NotificationEventCode::parse(&self.event_code),
            provider: "adyen".to_string(),
            success: self.success.eq_ignore_ascii_case("true"),
            amount: Some(Amount::new(self.amount.currency, self.amount.value)),
            psp_reference: self.psp_reference,
            original_reference: self.original_reference.filter(|r| !r.is_empty()),
            merchant_reference: self.merchant_reference,
            merchant_account: self.merchant_account_code,
            reason: self.reason.filter(|r| !r.is_empty()),
            payment_method: self.payment_method,
            event_date,
            raw_data,
        }
    }
}

/// Parse a notification body; verify every item when a key is configured
pub fn parse_notifications(
    payload: &[u8],
    hmac_key: Option<&str>,
) -> CheckoutResult<Vec<NotificationEvent>> {
    let request: NotificationRequest = serde_json::from_slice(payload).map_err(|e| {
        CheckoutError::WebhookParseError(format!("Failed to parse notification: {}", e))
    })?;

    let mut events = Vec::with_capacity(request.notification_items.len());
    for item in request.notification_items {
        let item = item.notification_request_item;
        match hmac_key {
            Some(key) => item.verify(key)?,
            None => warn!(
                "No HMAC key configured, accepting unverified notification {}",
                item.psp_reference
            ),
        }
        debug!(
            "Verified Adyen notification: event={}, psp={}",
            item.event_code, item.psp_reference
        );
        events.push(item.into_event());
    }

    Ok(events)
}

/// base64(HMAC-SHA256(hex-decoded key, message))
pub fn compute_signature(hmac_key: &str, message: &str) -> CheckoutResult<String> {
    let key = hex::decode(hmac_key)
        .map_err(|_| CheckoutError::Configuration("HMAC key must be hex-encoded".to_string()))?;
    let mut mac = HmacSha256::new_from_slice(&key)
        .map_err(|e| CheckoutError::Configuration(format!("Invalid HMAC key: {}", e)))?;
    mac.update(message.as_bytes());
    Ok(BASE64.encode(mac.finalize().into_bytes()))
}

fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.bytes()
        .zip(b.bytes())
        .fold(0, |acc, (x, y)| acc | (x ^ y))
        == 0
}

/// Notification handler trait
///
/// Implement this trait to act on notifications (fulfil orders, record refunds).
#[allow(unused_variables)]
pub trait NotificationHandler: Send + Sync {
    /// Called for AUTHORISATION, successful or not
    fn on_authorisation(&self, event: &NotificationEvent) -> CheckoutResult<()> {
        if event.success {
            info!(
                "Payment authorised: psp={}, reference={}",
                event.psp_reference, event.merchant_reference
            );
        } else {
            warn!(
                "Payment refused: psp={}, reason={:?}",
                event.psp_reference, event.reason
            );
        }
        Ok(())
    }

    /// Called for CANCELLATION
    fn on_cancellation(&self, event: &NotificationEvent) -> CheckoutResult<()> {
        info!("Payment cancelled: {}", event.psp_reference);
        Ok(())
    }

    /// Called for CAPTURE and CAPTURE_FAILED
    fn on_capture(&self, event: &NotificationEvent) -> CheckoutResult<()> {
        info!(
            "Capture {}: {}",
            if event.success { "succeeded" } else { "failed" },
            event.psp_reference
        );
        Ok(())
    }

    /// Called for REFUND and REFUND_FAILED
    fn on_refund(&self, event: &NotificationEvent) -> CheckoutResult<()> {
        info!(
            "Refund {}: {}",
            if event.success { "issued" } else { "failed" },
            event.psp_reference
        );
        Ok(())
    }

    /// Called for PENDING
    fn on_pending(&self, event: &NotificationEvent) -> CheckoutResult<()> {
        info!("Payment pending: {}", event.psp_reference);
        Ok(())
    }

    /// Called for RECURRING_CONTRACT
    fn on_recurring_contract(&self, event: &NotificationEvent) -> CheckoutResult<()> {
        info!("Stored payment details updated: {}", event.psp_reference);
        Ok(())
    }

    /// Called for unknown/unhandled events
    fn on_unknown_event(&self, event: &NotificationEvent) -> CheckoutResult<()> {
        debug!("Unhandled notification: {:?}", event.event_code);
        Ok(())
    }
}

/// Default handler (just logs events)
pub struct LoggingNotificationHandler;

impl NotificationHandler for LoggingNotificationHandler {}

/// Dispatch a notification to the appropriate handler method
pub fn dispatch_notification(
    handler: &dyn NotificationHandler,
    event: &NotificationEvent,
) -> CheckoutResult<()> {
    match &event.event_code {
        NotificationEventCode::Authorisation => handler.on_authorisation(event),
        NotificationEventCode::Cancellation => handler.on_cancellation(event),
        NotificationEventCode::Capture | NotificationEventCode::CaptureFailed => {
            handler.on_capture(event)
        }
        NotificationEventCode::Refund | NotificationEventCode::RefundFailed => {
            handler.on_refund(event)
        }
        NotificationEventCode::Pending => handler.on_pending(event),
        NotificationEventCode::RecurringContract => handler.on_recurring_contract(event),
        NotificationEventCode::Unknown(_) => handler.on_unknown_event(event),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const HMAC_KEY: &str = "44782DEF547AAA06C910C43932B1EB0C71FC68D9D0C057550C48EC2ACF6BA056";
    const SIGNATURE: &str = "coqCmt/IZ4E3CzPvMY8zTjQVL5hYJUiBRg8UU+iCWo0=";

    fn notification(signature: &str, success: &str) -> Vec<u8> {
        serde_json::to_vec(&json!({
            "live": "false",
            "notificationItems": [{
                "NotificationRequestItem": {
                    "additionalData": {"hmacSignature": signature},
                    "amount": {"currency": "EUR", "value": 1130},
                    "eventCode": "AUTHORISATION",
                    "eventDate": "2024-01-01T01:00:00+01:00",
                    "merchantAccountCode": "TestMerchant",
                    "merchantReference": "TestPayment-1407325143704",
                    "paymentMethod": "visa",
                    "pspReference": "7914073381342284",
                    "reason": "",
                    "success": success
                }
            }]
        }))
        .unwrap()
    }

    #[test]
    fn test_compute_signature() {
        let payload =
            "7914073381342284::TestMerchant:TestPayment-1407325143704:1130:EUR:AUTHORISATION:true";
        assert_eq!(compute_signature(HMAC_KEY, payload).unwrap(), SIGNATURE);
    }

    #[test]
    fn test_parse_and_verify() {
        let events = parse_notifications(&notification(SIGNATURE, "true"), Some(HMAC_KEY)).unwrap();

        assert_eq!(events.len(), 1);
        let event = &events[0];
        assert!(event.is_authorised());
        assert_eq!(event.merchant_account, "TestMerchant");
        assert_eq!(event.amount.as_ref().map(|a| a.value), Some(1130));
        assert_eq!(event.reason, None);
        assert_eq!(event.original_reference, None);
        assert_eq!(
            event.event_date.map(|d| d.to_rfc3339()),
            Some("2024-01-01T00:00:00+00:00".to_string())
        );
    }

    #[test]
    fn test_tampered_notification_is_rejected() {
        // signed with success=true, delivered with success=false
        let err = parse_notifications(&notification(SIGNATURE, "false"), Some(HMAC_KEY)).unwrap_err();
        assert!(matches!(err, CheckoutError::WebhookVerificationFailed(_)));

        let err = parse_notifications(&notification("", "true"), Some(HMAC_KEY)).unwrap_err();
        assert!(matches!(err, CheckoutError::WebhookVerificationFailed(_)));
    }

    #[test]
    fn test_unverified_without_key() {
        let events = parse_notifications(&notification("anything", "false"), None).unwrap();
        assert!(!events[0].is_authorised());
    }

    #[test]
    fn test_invalid_body() {
        let err = parse_notifications(b"not json", None).unwrap_err();
        assert!(matches!(err, CheckoutError::WebhookParseError(_)));
    }

    #[test]
    fn test_constant_time_compare() {
        assert!(constant_time_compare("abc123", "abc123"));
        assert!(!constant_time_compare("abc123", "abc124"));
        assert!(!constant_time_compare("abc", "abcd"));
    }

    #[test]
    fn test_dispatch_notification() {
        struct CountingHandler {
            authorisations: AtomicUsize,
        }

        impl NotificationHandler for CountingHandler {
            fn on_authorisation(&self, _event: &NotificationEvent) -> CheckoutResult<()> {
                self.authorisations.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        }

        let handler = CountingHandler {
            authorisations: AtomicUsize::new(0),
        };

        for event in parse_notifications(&notification(SIGNATURE, "true"), None).unwrap() {
            dispatch_notification(&handler, &event).unwrap();
        }

        assert_eq!(handler.authorisations.load(Ordering::SeqCst), 1);
        dispatch_notification(&LoggingNotificationHandler, &NotificationRequestItem {
            additional_data: HashMap::new(),
            amount: NotificationAmount {
                value: 0,
                currency: "EUR".to_string(),
            },
            psp_reference: "p".to_string(),
            original_reference: None,
            event_code: "REPORT_AVAILABLE".to_string(),
            event_date: None,
            merchant_account_code: "m".to_string(),
            merchant_reference: "r".to_string(),
            success: "true".to_string(),
            reason: None,
            payment_method: None,
        }
        .into_event())
        .unwrap();
    }
}
