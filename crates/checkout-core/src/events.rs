//! # SDK Events
//!
//! The drop-in's lifecycle callbacks as a closed set of events, and the
//! per-attempt dispatcher that admits at most one terminal event.

use crate::outcome::PaymentOutcome;
use crate::requests::DetailsRequest;
use serde::{Deserialize, Serialize};
use std::cell::Cell;
use tracing::debug;

/// `state.data` of `onAdditionalDetails`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdditionalDetails {
    #[serde(default)]
    pub details: serde_json::Map<String, serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_data: Option<String>,
}

impl AdditionalDetails {
    pub fn three_ds_result(&self) -> Option<&str> {
        self.details.get("threeDSResult").and_then(|v| v.as_str())
    }

    /// Details submission for a 3-D Secure result; `None` for any other payload
    pub fn three_ds_request(&self) -> Option<DetailsRequest> {
        self.three_ds_result()
            .map(|result| DetailsRequest::three_ds(result, self.payment_data.clone()))
    }
}

/// A drop-in callback
#[derive(Debug, Clone, PartialEq)]
pub enum CheckoutEvent {
    /// `onPaymentCompleted`
    Completed(PaymentOutcome),
    /// `onPaymentFailed`
    Failed(PaymentOutcome),
    /// `onAdditionalDetails`
    AdditionalDetailsRequired(AdditionalDetails),
    /// `onRedirect`
    Redirect,
    /// `onError`
    Error(String),
}

impl CheckoutEvent {
    pub fn name(&self) -> &'static str {
        match self {
            CheckoutEvent::Completed(_) => "completed",
            CheckoutEvent::Failed(_) => "failed",
            CheckoutEvent::AdditionalDetailsRequired(_) => "additional_details",
            CheckoutEvent::Redirect => "redirect",
            CheckoutEvent::Error(_) => "error",
        }
    }

    /// Completed, failed and error end an attempt
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            CheckoutEvent::Completed(_) | CheckoutEvent::Failed(_) | CheckoutEvent::Error(_)
        )
    }
}

/// Admits events for one attempt; everything after a terminal event is dropped
#[derive(Debug, Default)]
pub struct EventDispatcher {
    terminal: Cell<Option<&'static str>>,
}

impl EventDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns false when the event arrives after the attempt ended
    pub fn admit(&self, event: &CheckoutEvent) -> bool {
        if let Some(ended_by) = self.terminal.get() {
            debug!(
                "Ignoring {} event, attempt already ended by {}",
                event.name(),
                ended_by
            );
            return false;
        }
        if event.is_terminal() {
            self.terminal.set(Some(event.name()));
        }
        true
    }

    /// End the attempt without an SDK event (e.g. a routed `/payments` response)
    pub fn mark_terminal(&self, reason: &'static str) {
        if self.terminal.get().is_none() {
            self.terminal.set(Some(reason));
        }
    }

    pub fn is_terminated(&self) -> bool {
        self.terminal.get().is_some()
    }

    /// Start admitting events for a fresh attempt
    pub fn reset(&self) {
        self.terminal.set(None);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_events_after_terminal_are_ignored() {
        let dispatcher = EventDispatcher::new();

        assert!(dispatcher.admit(&CheckoutEvent::Redirect));
        assert!(dispatcher.admit(&CheckoutEvent::Completed(PaymentOutcome::with_code("Authorised"))));
        assert!(!dispatcher.admit(&CheckoutEvent::Error("late".to_string())));
        assert!(!dispatcher.admit(&CheckoutEvent::Redirect));

        dispatcher.reset();
        assert!(dispatcher.admit(&CheckoutEvent::Error("fresh".to_string())));
    }

    #[test]
    fn test_non_terminal_events_keep_attempt_open() {
        let dispatcher = EventDispatcher::new();
        let details = AdditionalDetails::default();

        assert!(dispatcher.admit(&CheckoutEvent::AdditionalDetailsRequired(details)));
        assert!(!dispatcher.is_terminated());

        dispatcher.mark_terminal("payments");
        assert!(!dispatcher.admit(&CheckoutEvent::Failed(PaymentOutcome::default())));
    }

    #[test]
    fn test_three_ds_request_from_details() {
        let details: AdditionalDetails = serde_json::from_value(json!({
            "details": {"threeDSResult": "eyJ0cmFuc1N0YXR1cyI6IlkifQ=="},
            "paymentData": "Ab02b4c0"
        }))
        .unwrap();

        assert_eq!(
            details.three_ds_request(),
            Some(DetailsRequest::three_ds(
                "eyJ0cmFuc1N0YXR1cyI6IlkifQ==",
                Some("Ab02b4c0".to_string())
            ))
        );

        let other: AdditionalDetails =
            serde_json::from_value(json!({"details": {"redirectResult": "x"}})).unwrap();
        assert!(other.three_ds_request().is_none());
    }
}
