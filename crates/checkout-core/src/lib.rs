//! # checkout-core
//!
//! Core types and traits for the drop-in checkout.
//!
//! This crate provides:
//! - `classify` and `ResultRouter` for turning a payment outcome into a destination page
//! - `EventDispatcher` and `CheckoutFlow` for driving the drop-in from the page
//! - `PaymentGateway` trait for implementing the server-side processor client
//! - Request/response types shared by the browser flow and the backend
//! - `CheckoutSettings` for deployment settings
//! - `CheckoutError` for typed error handling
//!
//! ## Example
//!
//! ```rust,ignore
//! use checkout_core::{classify, ClassifyPolicy, CompletionPath, PaymentOutcome, ResultRouter};
//!
//! // Pure classification
//! let outcome = PaymentOutcome::with_code("Authorised").with_psp_reference("psp1");
//! let classification = classify(&outcome, ClassifyPolicy::for_path(CompletionPath::Direct));
//!
//! // Persist for the next page and navigate
//! let router = ResultRouter::new(store, navigator);
//! router.apply(&classification);
//! ```

pub mod amount;
pub mod classify;
pub mod dropin;
pub mod error;
pub mod events;
pub mod flow;
pub mod gateway;
pub mod notification;
pub mod outcome;
pub mod requests;
pub mod router;
pub mod settings;

// Re-exports for convenience
pub use amount::{decimal_places, Amount};
pub use classify::{
    classify, destination_for, failure_message, Classification, ClassifyPolicy, CompletionPath,
    Destination,
};
pub use dropin::{
    CardOptions, CheckoutConfiguration, ClientConfig, DropinConfiguration, IdealOptions,
    PaymentMethodOptions, SessionDescriptor,
};
pub use error::{CheckoutError, CheckoutResult};
pub use events::{AdditionalDetails, CheckoutEvent, EventDispatcher};
pub use flow::{
    AttemptState, BusyGuard, CheckoutBackend, CheckoutFlow, CheckoutForm, CheckoutUi, FlowKind,
    PaymentAction, PaymentAttempt, SubmitDecision,
};
pub use gateway::{BoxedPaymentGateway, PaymentGateway, ReturnUrls};
pub use notification::{NotificationEvent, NotificationEventCode};
pub use outcome::{FlowType, PaymentOutcome, ResultCode};
pub use requests::{
    DetailsRequest, PaymentMethodsRequest, PaymentRequest, PaymentResponse, SessionRequest,
    SessionResponse, SessionResultRequest,
};
pub use router::{
    MemoryStore, Navigator, OutcomeStore, ResultRouter, StoredResult, GENERIC_ERROR_MESSAGE,
    PAYMENT_ERROR_KEY, PAYMENT_RESULT_KEY, PENDING_PAYMENT_KEY,
};
pub use settings::{CheckoutSettings, DestinationPaths, SdkEnvironment};
