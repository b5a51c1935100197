//! # Checkout Flow
//!
//! Drives one checkout page: validates the form, talks to the backend,
//! builds the drop-in configuration and turns SDK callbacks into routed
//! outcomes.
//!
//! ```text
//!   start(form) ──▶ backend (session | paymentMethods) ──▶ CheckoutConfiguration
//!        │
//!   SDK callbacks ──▶ handle_event ──▶ EventDispatcher ──▶ ResultRouter
//!   onSubmit      ──▶ submit_payment ──▶ Resolve | Reject | Routed
//!   page load     ──▶ resume_redirect ──▶ ResultRouter (redirect policy)
//! ```
//!
//! Collaborators are `?Send` and take `&self`: the browser runs one task at
//! a time but two handlers may overlap across an `await`.

use crate::amount::Amount;
use crate::classify::{classify, CompletionPath, Destination};
use crate::dropin::{CheckoutConfiguration, ClientConfig};
use crate::error::{CheckoutError, CheckoutResult};
use crate::events::{AdditionalDetails, CheckoutEvent, EventDispatcher};
use crate::outcome::{FlowType, PaymentOutcome};
use crate::requests::{
    DetailsRequest, PaymentMethodsRequest, PaymentRequest, PaymentResponse, SessionRequest,
    SessionResponse,
};
use crate::router::{Navigator, OutcomeStore, ResultRouter};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cell::RefCell;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Form field carrying the shopper reference
pub const SHOPPER_REFERENCE_FIELD: &str = "shopperReference";

/// Shortest shopper reference the processor accepts
pub const MIN_SHOPPER_REFERENCE_LEN: usize = 3;

/// Message stored when a 3DS details submission fails without a message
pub const THREE_DS_ERROR_MESSAGE: &str = "Error processing 3DS authentication";

/// Which integration the page uses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlowKind {
    Sessions,
    Advanced,
}

impl FlowKind {
    pub fn flow_type(&self) -> FlowType {
        match self {
            FlowKind::Sessions => FlowType::Sessions,
            FlowKind::Advanced => FlowType::Advanced,
        }
    }

    /// Backend endpoint for a details submission
    pub fn details_endpoint(&self, details: &DetailsRequest) -> &'static str {
        match (self, details.is_three_ds()) {
            (FlowKind::Sessions, true) => "/api/payments/3DSDetails",
            (FlowKind::Sessions, false) => "/api/payments/details",
            (FlowKind::Advanced, _) => "/advanced/api/payments/details",
        }
    }
}

/// Checkout form as read from the page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutForm {
    /// Whole units
    pub amount: i64,
    pub currency: String,
    pub country_code: String,
    #[serde(default)]
    pub enable_recurring: bool,
    #[serde(default)]
    pub shopper_reference: String,
}

impl CheckoutForm {
    /// Shopper reference is required and at least three characters
    pub fn validate(&self) -> CheckoutResult<()> {
        if self.shopper_reference.is_empty() {
            return Err(CheckoutError::validation(
                SHOPPER_REFERENCE_FIELD,
                "Shopper Reference is required",
            ));
        }
        if self.shopper_reference.chars().count() < MIN_SHOPPER_REFERENCE_LEN {
            return Err(CheckoutError::validation(
                SHOPPER_REFERENCE_FIELD,
                "Shopper Reference must be at least 3 characters",
            ));
        }
        Ok(())
    }

    /// Amount in minor units
    pub fn amount(&self) -> Amount {
        Amount::from_major(self.amount, &self.currency)
    }

    pub fn session_request(&self, return_url: impl Into<String>) -> SessionRequest {
        SessionRequest {
            amount: self.amount,
            currency: self.currency.clone(),
            country_code: self.country_code.clone(),
            return_url: Some(return_url.into()),
            enable_recurring: self.enable_recurring,
            shopper_reference: Some(self.shopper_reference.clone()),
        }
    }

    pub fn payment_methods_request(&self) -> PaymentMethodsRequest {
        PaymentMethodsRequest {
            amount: self.amount,
            currency: self.currency.clone(),
            country_code: self.country_code.clone(),
            shopper_reference: Some(self.shopper_reference.clone()),
            enable_recurring: self.enable_recurring,
        }
    }

    /// `/payments` body from the SDK's `state.data`
    pub fn payment_request(&self, state_data: &Value, return_url: impl Into<String>) -> PaymentRequest {
        PaymentRequest {
            amount: self.amount(),
            payment_method: state_data.get("paymentMethod").cloned().unwrap_or(Value::Null),
            shopper_reference: Some(self.shopper_reference.clone()),
            country_code: Some(self.country_code.clone()),
            enable_recurring: self.enable_recurring,
            browser_info: state_data.get("browserInfo").cloned(),
            return_url: Some(return_url.into()),
        }
    }
}

/// Where a payment attempt is in its life
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptState {
    Idle,
    Submitting,
    /// Final result code received
    Completed(String),
    /// Waiting on a details submission
    Redirected,
    /// Transport failure
    Failed(String),
    Classified(Destination),
    Navigated,
}

impl AttemptState {
    pub fn name(&self) -> &'static str {
        match self {
            AttemptState::Idle => "idle",
            AttemptState::Submitting => "submitting",
            AttemptState::Completed(_) => "completed",
            AttemptState::Redirected => "redirected",
            AttemptState::Failed(_) => "failed",
            AttemptState::Classified(_) => "classified",
            AttemptState::Navigated => "navigated",
        }
    }

    fn allows(&self, next: &AttemptState) -> bool {
        use AttemptState::*;
        matches!(
            (self, next),
            (Idle, Submitting)
                | (Submitting, Completed(_))
                | (Submitting, Redirected)
                | (Submitting, Failed(_))
                | (Redirected, Completed(_))
                | (Redirected, Failed(_))
                | (Completed(_), Classified(_))
                | (Failed(_), Classified(_))
                | (Classified(_), Navigated)
        )
    }
}

/// One payment attempt
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentAttempt {
    pub id: Uuid,
    state: AttemptState,
}

impl PaymentAttempt {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            state: AttemptState::Idle,
        }
    }

    pub fn state(&self) -> &AttemptState {
        &self.state
    }

    pub fn transition(&mut self, next: AttemptState) -> CheckoutResult<()> {
        if !self.state.allows(&next) {
            return Err(CheckoutError::InvalidTransition {
                from: self.state.name().to_string(),
                to: next.name().to_string(),
            });
        }
        debug!("Attempt {}: {} -> {}", self.id, self.state.name(), next.name());
        self.state = next;
        Ok(())
    }

    /// Navigation ends the attempt
    pub fn is_finished(&self) -> bool {
        self.state == AttemptState::Navigated
    }
}

impl Default for PaymentAttempt {
    fn default() -> Self {
        Self::new()
    }
}

/// Backend endpoints the page calls
#[async_trait(?Send)]
pub trait CheckoutBackend {
    /// `POST /api/sessions`
    async fn create_session(&self, request: &SessionRequest) -> CheckoutResult<SessionResponse>;

    /// `POST /advanced/api/paymentMethods`; the payload is opaque
    async fn payment_methods(&self, request: &PaymentMethodsRequest) -> CheckoutResult<Value>;

    /// `POST /advanced/api/payments`
    async fn make_payment(&self, request: &PaymentRequest) -> CheckoutResult<PaymentResponse>;

    /// Redirect or 3DS details; the endpoint is [`FlowKind::details_endpoint`]
    async fn submit_details(
        &self,
        kind: FlowKind,
        details: &DetailsRequest,
    ) -> CheckoutResult<PaymentOutcome>;
}

/// Page elements the flow touches
pub trait CheckoutUi {
    fn set_busy(&self, busy: bool);

    fn show_error(&self, message: &str);

    fn clear_error(&self);

    /// Inline message next to a form field
    fn show_field_error(&self, field: &str, message: &str);

    fn clear_field_error(&self, field: &str);

    fn open_modal(&self);

    fn close_modal(&self);
}

/// Shows the busy indicator until dropped
pub struct BusyGuard<'a, U: CheckoutUi + ?Sized> {
    ui: &'a U,
}

impl<'a, U: CheckoutUi + ?Sized> BusyGuard<'a, U> {
    pub fn new(ui: &'a U) -> Self {
        ui.set_busy(true);
        Self { ui }
    }
}

impl<U: CheckoutUi + ?Sized> Drop for BusyGuard<'_, U> {
    fn drop(&mut self) {
        self.ui.set_busy(false);
    }
}

/// What the SDK's `onSubmit` should do with the `/payments` response
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "decision", rename_all = "camelCase")]
pub enum SubmitDecision {
    /// `actions.resolve(...)`: the SDK performs the action
    Resolve(PaymentAction),
    /// `actions.reject()`
    Reject { message: String },
    /// Final result already routed
    Routed { destination: Destination },
}

/// Payload for `actions.resolve`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentAction {
    pub result_code: String,
    pub action: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub donation_token: Option<String>,
}

/// Checkout driver for one page
pub struct CheckoutFlow<B, S, N, U> {
    kind: FlowKind,
    client: ClientConfig,
    origin: String,
    backend: B,
    router: ResultRouter<S, N>,
    ui: U,
    attempt: RefCell<PaymentAttempt>,
    dispatcher: EventDispatcher,
    form: RefCell<Option<CheckoutForm>>,
}

impl<B, S, N, U> CheckoutFlow<B, S, N, U>
where
    B: CheckoutBackend,
    S: OutcomeStore,
    N: Navigator,
    U: CheckoutUi,
{
    /// Flow for a page served at `origin` (e.g. `https://shop.example`)
    pub fn new(
        kind: FlowKind,
        client: ClientConfig,
        origin: impl Into<String>,
        backend: B,
        store: S,
        navigator: N,
        ui: U,
    ) -> Self {
        let mut router = ResultRouter::new(store, navigator).with_paths(client.pages.clone());
        if let Some(policy) = client.settings().policy_override() {
            router = router.with_policy(policy);
        }

        Self {
            kind,
            client,
            origin: origin.into().trim_end_matches('/').to_string(),
            backend,
            router,
            ui,
            attempt: RefCell::new(PaymentAttempt::new()),
            dispatcher: EventDispatcher::new(),
            form: RefCell::new(None),
        }
    }

    pub fn kind(&self) -> FlowKind {
        self.kind
    }

    pub fn router(&self) -> &ResultRouter<S, N> {
        &self.router
    }

    pub fn ui(&self) -> &U {
        &self.ui
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn attempt_state(&self) -> AttemptState {
        self.attempt.borrow().state().clone()
    }

    pub fn attempt_id(&self) -> Uuid {
        self.attempt.borrow().id
    }

    /// Return URL for off-site steps of this flow
    pub fn return_url(&self) -> String {
        let settings = self.client.settings();
        let path = match self.kind {
            FlowKind::Sessions => settings.return_path,
            FlowKind::Advanced => settings.advanced_return_path,
        };
        format!("{}{}", self.origin, path)
    }

    /// `redirectResult` to resume on page load; never on a success page
    /// (`/success`, `/advanced/success`)
    pub fn pending_redirect(&self, current_path: &str, redirect_result: Option<&str>) -> Option<String> {
        if current_path.contains(self.client.pages.success.as_str()) {
            return None;
        }
        redirect_result
            .filter(|r| !r.is_empty())
            .map(str::to_string)
    }

    /// Validate the form, fetch a session or payment methods and open the drop-in.
    ///
    /// Validation failures are shown next to the field before anything else
    /// happens. Transport failures are shown on screen and end the attempt.
    pub async fn start(&self, form: CheckoutForm) -> CheckoutResult<CheckoutConfiguration> {
        if let Err(e) = form.validate() {
            if let CheckoutError::Validation { field, message } = &e {
                self.ui.show_field_error(field, message);
            }
            return Err(e);
        }
        self.ui.clear_field_error(SHOPPER_REFERENCE_FIELD);

        self.begin_attempt();
        self.advance(AttemptState::Submitting);
        let _busy = BusyGuard::new(&self.ui);
        self.ui.clear_error();

        match self.load_configuration(&form).await {
            Ok(config) => {
                info!("Starting {} checkout for attempt {}", self.kind.flow_type(), self.attempt_id());
                *self.form.borrow_mut() = Some(form);
                self.ui.open_modal();
                Ok(config)
            }
            Err(e) => {
                warn!("Could not start checkout: {}", e);
                self.advance(AttemptState::Failed(e.to_string()));
                self.ui.show_error(&e.to_string());
                Err(e)
            }
        }
    }

    async fn load_configuration(&self, form: &CheckoutForm) -> CheckoutResult<CheckoutConfiguration> {
        if self.client.client_key.is_empty() {
            return Err(CheckoutError::Configuration("Client key is not configured".to_string()));
        }
        let config = CheckoutConfiguration::new(&self.client, form.amount(), &form.country_code);

        match self.kind {
            FlowKind::Sessions => {
                let session = self
                    .backend
                    .create_session(&form.session_request(self.return_url()))
                    .await?;
                Ok(config.with_session(&session))
            }
            FlowKind::Advanced => {
                let methods = self
                    .backend
                    .payment_methods(&form.payment_methods_request())
                    .await?;
                Ok(config.with_payment_methods(methods))
            }
        }
    }

    /// `onSubmit` for the advanced flow
    pub async fn submit_payment(&self, state_data: Value) -> SubmitDecision {
        let Some(form) = self.form.borrow().clone() else {
            return SubmitDecision::Reject {
                message: "Checkout has not been started".to_string(),
            };
        };
        let request = form.payment_request(&state_data, self.return_url());

        let response = self.backend.make_payment(&request).await;
        if self.dispatcher.is_terminated() {
            debug!("Dropping /payments response; attempt {} already ended", self.attempt_id());
            return SubmitDecision::Reject {
                message: "Payment attempt has already ended".to_string(),
            };
        }
        let response = match response {
            Ok(response) => response,
            Err(e) => {
                warn!("Payment request failed: {}", e);
                return SubmitDecision::Reject {
                    message: e.to_string(),
                };
            }
        };

        let Some(result_code) = response
            .result_code
            .clone()
            .filter(|code| !code.trim().is_empty())
        else {
            return SubmitDecision::Reject {
                message: "Payment response had no result code".to_string(),
            };
        };

        if let Some(action) = response.action.clone() {
            self.mark_redirected();
            return SubmitDecision::Resolve(PaymentAction {
                result_code,
                action,
                order: response.order,
                donation_token: response.donation_token,
            });
        }

        let outcome = response.into_outcome().tagged(FlowType::Advanced);
        let destination = self.complete(&outcome, CompletionPath::Direct);
        SubmitDecision::Routed { destination }
    }

    /// `onAdditionalDetails`: submit a 3DS result and route the answer.
    /// Returns `None` for payloads that are not 3DS results.
    pub async fn additional_details(&self, details: AdditionalDetails) -> Option<Destination> {
        let Some(request) = details.three_ds_request() else {
            debug!("Ignoring additional details without a 3DS result");
            return None;
        };
        self.mark_redirected();

        let result = self.backend.submit_details(self.kind, &request).await;
        if self.dispatcher.is_terminated() {
            debug!("Dropping 3DS details result; attempt {} already ended", self.attempt_id());
            return None;
        }

        match result {
            Ok(outcome) => {
                let outcome = outcome.tagged(self.kind.flow_type());
                Some(self.complete(&outcome, CompletionPath::Direct))
            }
            Err(e) => {
                warn!("3DS details submission failed: {}", e);
                let message = e.to_string();
                let message = if message.trim().is_empty() {
                    THREE_DS_ERROR_MESSAGE.to_string()
                } else {
                    message
                };
                self.advance(AttemptState::Failed(message.clone()));
                self.advance(AttemptState::Classified(Destination::Failed));
                let destination = self.router.fail(&message);
                self.finish("details_error");
                Some(destination)
            }
        }
    }

    /// Resume after an off-site step using the `redirectResult` query parameter
    pub async fn resume_redirect(&self, redirect_result: &str) -> CheckoutResult<Destination> {
        self.begin_attempt();
        self.advance(AttemptState::Submitting);
        self.advance(AttemptState::Redirected);
        let _busy = BusyGuard::new(&self.ui);

        let request = DetailsRequest::redirect(redirect_result);
        match self.backend.submit_details(self.kind, &request).await {
            Ok(outcome) => {
                let outcome = outcome.tagged(self.kind.flow_type());
                Ok(self.complete(&outcome, CompletionPath::RedirectContinuation))
            }
            Err(e) => {
                warn!("Redirect details submission failed: {}", e);
                self.advance(AttemptState::Failed(e.to_string()));
                self.ui.show_error(&e.to_string());
                Err(e)
            }
        }
    }

    /// Deliver an SDK callback. Returns the destination when the event routed.
    pub async fn handle_event(&self, event: CheckoutEvent) -> Option<Destination> {
        if !self.dispatcher.admit(&event) {
            return None;
        }

        match event {
            CheckoutEvent::Completed(outcome) => {
                self.ui.close_modal();
                let outcome = outcome.tagged(self.kind.flow_type());
                Some(self.complete(&outcome, CompletionPath::Direct))
            }
            CheckoutEvent::Failed(outcome) => {
                self.ui.close_modal();
                let outcome = outcome.tagged(self.kind.flow_type());
                self.record_completion(&outcome);
                self.advance(AttemptState::Classified(Destination::Failed));
                let destination = self.router.route_failed(&outcome);
                self.finish("failed");
                Some(destination)
            }
            CheckoutEvent::AdditionalDetailsRequired(details) => {
                self.additional_details(details).await
            }
            CheckoutEvent::Redirect => {
                self.ui.close_modal();
                None
            }
            CheckoutEvent::Error(message) => {
                self.ui.close_modal();
                warn!("Drop-in reported an error: {}", message);
                self.advance(AttemptState::Failed(message.clone()));
                self.advance(AttemptState::Classified(Destination::Failed));
                let destination = self.router.fail(&message);
                self.finish("error");
                Some(destination)
            }
        }
    }

    fn complete(&self, outcome: &PaymentOutcome, path: CompletionPath) -> Destination {
        self.record_completion(outcome);
        let classification = classify(outcome, self.router.policy(path));
        self.advance(AttemptState::Classified(classification.destination));
        let destination = self.router.apply(&classification);
        self.finish("routed");
        destination
    }

    fn record_completion(&self, outcome: &PaymentOutcome) {
        self.advance(AttemptState::Completed(outcome.normalized_code()));
    }

    fn mark_redirected(&self) {
        if *self.attempt.borrow().state() != AttemptState::Redirected {
            self.advance(AttemptState::Redirected);
        }
    }

    fn finish(&self, reason: &'static str) {
        self.advance(AttemptState::Navigated);
        self.dispatcher.mark_terminal(reason);
    }

    fn begin_attempt(&self) {
        *self.attempt.borrow_mut() = PaymentAttempt::new();
        self.dispatcher.reset();
    }

    // Attempt tracking never blocks routing; out-of-order steps are logged
    fn advance(&self, next: AttemptState) {
        if let Err(e) = self.attempt.borrow_mut().transition(next) {
            warn!("{}", e);
        }
    }
}
