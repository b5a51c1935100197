//! # Result Classification
//!
//! Maps a [`PaymentOutcome`] to one of three destination pages.
//! This module is pure: writing to storage and navigating live in
//! [`crate::router`].
//!
//! ```text
//!   AUTHORISED (+ AUTHENTICATED when the policy allows) ──▶ /success
//!   PENDING | RECEIVED                                 ──▶ /pending
//!   anything else, including no code                   ──▶ /failed
//! ```

use crate::outcome::{PaymentOutcome, ResultCode};
use serde::{Deserialize, Serialize};

/// Message used when neither a result code nor a refusal reason is available
pub const UNKNOWN_REASON: &str = "Unknown reason";

/// Destination page for a classified outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Destination {
    Success,
    Pending,
    Failed,
}

impl Destination {
    /// Default page path for this destination
    pub fn path(&self) -> &'static str {
        match self {
            Destination::Success => "/success",
            Destination::Pending => "/pending",
            Destination::Failed => "/failed",
        }
    }
}

impl std::fmt::Display for Destination {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.path())
    }
}

/// How the outcome reached the page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionPath {
    /// `onPaymentCompleted`, a final `/payments` response, or in-widget 3DS details
    Direct,
    /// The shopper came back from an off-site step with a `redirectResult`
    RedirectContinuation,
}

/// Classification knobs.
///
/// Whether `AUTHENTICATED` is a success is not settled by the processor's
/// integration guides for every flow, so it is a per-path setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassifyPolicy {
    pub authenticated_is_success: bool,
}

impl ClassifyPolicy {
    /// Default policy for a completion path: `AUTHENTICATED` counts as success
    /// only on redirect continuation
    pub fn for_path(path: CompletionPath) -> Self {
        Self {
            authenticated_is_success: matches!(path, CompletionPath::RedirectContinuation),
        }
    }
}

/// Result of classifying an outcome: where to go and what to store
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    pub destination: Destination,
    /// Stored under `paymentResult`
    pub stored_result: PaymentOutcome,
    /// Stored under `pendingPayment` (pending only)
    pub pending_result: Option<PaymentOutcome>,
    /// Stored under `paymentError` (failed only)
    pub stored_message: Option<String>,
}

/// Pick the destination for a result code (first match wins)
pub fn destination_for(code: &ResultCode, policy: ClassifyPolicy) -> Destination {
    match code {
        ResultCode::Authorised => Destination::Success,
        ResultCode::Authenticated if policy.authenticated_is_success => Destination::Success,
        ResultCode::Pending | ResultCode::Received => Destination::Pending,
        _ => Destination::Failed,
    }
}

/// Human-readable failure message: result code, then refusal reason, then a fixed fallback
pub fn failure_message(outcome: &PaymentOutcome) -> String {
    let reason = outcome
        .raw_code()
        .or_else(|| {
            outcome
                .refusal_reason
                .as_deref()
                .map(str::trim)
                .filter(|r| !r.is_empty())
        })
        .unwrap_or(UNKNOWN_REASON);
    format!("Payment failed: {}", reason)
}

/// Classify an outcome without side effects
pub fn classify(outcome: &PaymentOutcome, policy: ClassifyPolicy) -> Classification {
    let destination = destination_for(&outcome.code(), policy);

    Classification {
        destination,
        stored_result: outcome.clone(),
        pending_result: (destination == Destination::Pending).then(|| outcome.clone()),
        stored_message: (destination == Destination::Failed).then(|| failure_message(outcome)),
    }
}
