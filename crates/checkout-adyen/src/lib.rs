//! # checkout-adyen
//!
//! Adyen Checkout API gateway for the drop-in checkout.
//!
//! - **AdyenCheckoutGateway** implements `PaymentGateway` against Checkout API v71
//!   (`/sessions`, `/paymentMethods`, `/payments`, `/payments/details`)
//! - **webhook** parses and HMAC-verifies standard notifications
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use checkout_adyen::AdyenCheckoutGateway;
//! use checkout_core::{PaymentGateway, SessionRequest};
//!
//! let gateway = AdyenCheckoutGateway::from_env()?.with_origin("https://shop.example");
//! let session = gateway.create_session(&request).await?;
//! // Hand session.session_id and session.session_data to the drop-in
//! ```
//!
//! ## Notifications
//!
//! ```rust,ignore
//! use checkout_adyen::{dispatch_notification, LoggingNotificationHandler, NOTIFICATION_ACCEPTED};
//!
//! for event in gateway.verify_notification(&body).await? {
//!     dispatch_notification(&LoggingNotificationHandler, &event)?;
//! }
//! // Respond with NOTIFICATION_ACCEPTED
//! ```

pub mod checkout;
pub mod config;
pub mod webhook;

// Re-exports
pub use checkout::AdyenCheckoutGateway;
pub use config::{live_checkout_url, AdyenConfig, API_VERSION, TEST_CHECKOUT_URL};
pub use webhook::{
    compute_signature, dispatch_notification, parse_notifications, LoggingNotificationHandler,
    NotificationHandler, NotificationRequest, NotificationRequestItem, NOTIFICATION_ACCEPTED,
};
