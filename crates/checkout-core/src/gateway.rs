//! # Payment Gateway Trait
//!
//! Server-side seam to the payment processor. The HTTP service talks to
//! a `PaymentGateway`; `checkout-adyen` provides the Adyen implementation.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                   PaymentGateway (trait)                    │
//! │  ├── create_session()        POST /sessions                 │
//! │  ├── payment_methods()       POST /paymentMethods           │
//! │  ├── make_payment()          POST /payments                 │
//! │  ├── submit_details()        POST /payments/details         │
//! │  ├── session_result()        GET  /sessions/{id}            │
//! │  └── verify_notification()   notification webhook           │
//! └─────────────────────────────────────────────────────────────┘
//! ```

use crate::error::CheckoutResult;
use crate::notification::NotificationEvent;
use crate::outcome::PaymentOutcome;
use crate::requests::{
    DetailsRequest, PaymentMethodsRequest, PaymentRequest, PaymentResponse, SessionRequest,
    SessionResponse,
};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

/// Processor operations the backend needs.
///
/// Requests arrive with their return URLs already resolved (see [`ReturnUrls`]).
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Create a checkout session for the session flow.
    async fn create_session(&self, request: &SessionRequest) -> CheckoutResult<SessionResponse>;

    /// Available payment methods for the advanced flow, as the processor returns them.
    async fn payment_methods(&self, request: &PaymentMethodsRequest) -> CheckoutResult<Value>;

    /// Make a payment for the advanced flow.
    async fn make_payment(&self, request: &PaymentRequest) -> CheckoutResult<PaymentResponse>;

    /// Submit redirect or 3DS details.
    async fn submit_details(&self, details: &DetailsRequest) -> CheckoutResult<PaymentResponse>;

    /// Outcome of a session after the shopper returns.
    async fn session_result(
        &self,
        session_id: &str,
        session_result: &str,
    ) -> CheckoutResult<PaymentOutcome>;

    /// Verify and parse a notification webhook body.
    async fn verify_notification(&self, payload: &[u8]) -> CheckoutResult<Vec<NotificationEvent>>;

    /// Provider name (for logging and error reporting).
    fn provider_name(&self) -> &'static str;
}

/// Shared gateway handle
pub type BoxedPaymentGateway = Arc<dyn PaymentGateway>;

/// Return URLs handed to the processor for off-site steps
#[derive(Debug, Clone)]
pub struct ReturnUrls {
    /// Base URL of the application (e.g., "http://localhost:8080")
    pub base_url: String,
    /// Session flow return path
    pub session_path: String,
    /// Advanced flow return path
    pub advanced_path: String,
}

impl ReturnUrls {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            session_path: "/success".to_string(),
            advanced_path: "/advanced/result".to_string(),
        }
    }

    /// Builder: set both return paths
    pub fn with_paths(mut self, session_path: impl Into<String>, advanced_path: impl Into<String>) -> Self {
        self.session_path = session_path.into();
        self.advanced_path = advanced_path.into();
        self
    }

    pub fn session_url(&self) -> String {
        format!("{}{}", self.base_url, self.session_path)
    }

    pub fn advanced_url(&self) -> String {
        format!("{}{}", self.base_url, self.advanced_path)
    }

    /// Use the caller's return URL when it sent one
    pub fn resolve(requested: Option<&str>, default: String) -> String {
        requested
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .map(str::to_string)
            .unwrap_or(default)
    }
}

impl Default for ReturnUrls {
    fn default() -> Self {
        Self::new("http://localhost:8080")
    }
}
