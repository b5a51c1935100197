//! # checkout-wasm
//!
//! WebAssembly driver for the drop-in checkout pages.
//!
//! The page creates a `Checkout`, starts it from the form and forwards the
//! drop-in's callbacks into it. Routing (storage + navigation) happens in Rust.
//!
//! ## Usage (JavaScript)
//!
//! ```javascript
//! import init, { Checkout } from 'dropin-checkout-wasm';
//!
//! await init();
//!
//! const clientConfig = await (await fetch('/api/config')).json();
//! const checkout = new Checkout('sessions', clientConfig);
//!
//! const configuration = await checkout.start({
//!   amount: 10, currency: 'EUR', countryCode: 'NL',
//!   enableRecurring: true, shopperReference: 'shopper-1',
//! });
//!
//! const adyenCheckout = await AdyenCheckout({
//!   ...configuration,
//!   onPaymentCompleted: (result) => checkout.onPaymentCompleted(result),
//!   onPaymentFailed: (result) => checkout.onPaymentFailed(result),
//!   onAdditionalDetails: (state) => checkout.onAdditionalDetails(state.data),
//!   onError: (error) => checkout.onError(error),
//! });
//! ```
//!
//! ## Building
//!
//! ```bash
//! wasm-pack build --target web
//! ```

pub mod backend;
pub mod browser;

use backend::FetchBackend;
use browser::{js_message, DomUi, SessionStorageStore, WindowNavigator};
use checkout_core::{
    classify, AdditionalDetails, CheckoutEvent, CheckoutFlow, CheckoutForm, ClassifyPolicy,
    ClientConfig, CompletionPath, Destination, FlowKind, PaymentOutcome, StoredResult,
};
use js_sys::Promise;
use serde::Serialize;
use std::rc::Rc;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::future_to_promise;

type BrowserFlow = CheckoutFlow<FetchBackend, SessionStorageStore, WindowNavigator, DomUi>;

/// Serialize to a plain JS object (maps become objects, not `Map`s)
fn to_js<T: Serialize + ?Sized>(value: &T) -> Result<JsValue, JsValue> {
    value
        .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
        .map_err(|e| JsValue::from_str(&e.to_string()))
}

fn from_js<T: serde::de::DeserializeOwned>(value: JsValue, what: &str) -> Result<T, JsValue> {
    serde_wasm_bindgen::from_value(value)
        .map_err(|e| JsValue::from_str(&format!("Invalid {}: {}", what, e)))
}

fn parse_kind(kind: &str) -> Option<FlowKind> {
    match kind {
        "sessions" => Some(FlowKind::Sessions),
        "advanced" => Some(FlowKind::Advanced),
        _ => None,
    }
}

fn destination_js(destination: Option<Destination>) -> JsValue {
    destination
        .map(|d| JsValue::from_str(d.path()))
        .unwrap_or(JsValue::NULL)
}

/// Checkout driver for one page
#[wasm_bindgen]
pub struct Checkout {
    flow: Rc<BrowserFlow>,
}

#[wasm_bindgen]
impl Checkout {
    /// `kind` is `"sessions"` or `"advanced"`; `client_config` is the `/api/config` response
    #[wasm_bindgen(constructor)]
    pub fn new(kind: &str, client_config: JsValue) -> Result<Checkout, JsValue> {
        let kind = parse_kind(kind)
            .ok_or_else(|| JsValue::from_str(&format!("Unknown checkout flow: {}", kind)))?;
        let client: ClientConfig = from_js(client_config, "client config")?;

        let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
        let origin = window.location().origin()?;
        let ui = DomUi::from_window().map_err(|e| JsValue::from_str(&e.to_string()))?;

        let flow = CheckoutFlow::new(
            kind,
            client,
            origin.clone(),
            FetchBackend::new(origin),
            SessionStorageStore,
            WindowNavigator,
            ui,
        );

        Ok(Self {
            flow: Rc::new(flow),
        })
    }

    /// Validate the form and build the drop-in configuration.
    /// Rejects with the message already shown on the page.
    pub fn start(&self, form: JsValue) -> Promise {
        let flow = Rc::clone(&self.flow);
        future_to_promise(async move {
            let form: CheckoutForm = from_js(form, "checkout form")?;
            let configuration = flow
                .start(form)
                .await
                .map_err(|e| JsValue::from_str(&e.to_string()))?;
            to_js(&configuration)
        })
    }

    /// `onSubmit` (advanced flow): resolves with `{decision, ...}`
    #[wasm_bindgen(js_name = onSubmit)]
    pub fn on_submit(&self, state_data: JsValue) -> Promise {
        let flow = Rc::clone(&self.flow);
        future_to_promise(async move {
            let state_data: serde_json::Value = from_js(state_data, "state data")?;
            let decision = flow.submit_payment(state_data).await;
            to_js(&decision)
        })
    }

    /// `onPaymentCompleted`: resolves with the destination path, or `null` when ignored
    #[wasm_bindgen(js_name = onPaymentCompleted)]
    pub fn on_payment_completed(&self, result: JsValue) -> Promise {
        let flow = Rc::clone(&self.flow);
        future_to_promise(async move {
            let outcome: PaymentOutcome = from_js(result, "payment result")?;
            Ok(destination_js(flow.handle_event(CheckoutEvent::Completed(outcome)).await))
        })
    }

    #[wasm_bindgen(js_name = onPaymentFailed)]
    pub fn on_payment_failed(&self, result: JsValue) -> Promise {
        let flow = Rc::clone(&self.flow);
        future_to_promise(async move {
            let outcome: PaymentOutcome = from_js(result, "payment result")?;
            Ok(destination_js(flow.handle_event(CheckoutEvent::Failed(outcome)).await))
        })
    }

    /// `onAdditionalDetails` with `state.data`
    #[wasm_bindgen(js_name = onAdditionalDetails)]
    pub fn on_additional_details(&self, state_data: JsValue) -> Promise {
        let flow = Rc::clone(&self.flow);
        future_to_promise(async move {
            let details: AdditionalDetails = from_js(state_data, "additional details")?;
            Ok(destination_js(
                flow.handle_event(CheckoutEvent::AdditionalDetailsRequired(details))
                    .await,
            ))
        })
    }

    #[wasm_bindgen(js_name = onRedirect)]
    pub fn on_redirect(&self) -> Promise {
        let flow = Rc::clone(&self.flow);
        future_to_promise(async move {
            Ok(destination_js(flow.handle_event(CheckoutEvent::Redirect).await))
        })
    }

    #[wasm_bindgen(js_name = onError)]
    pub fn on_error(&self, error: JsValue) -> Promise {
        let flow = Rc::clone(&self.flow);
        let message = if error.is_undefined() || error.is_null() {
            String::new()
        } else {
            js_message(&error)
        };
        future_to_promise(async move {
            Ok(destination_js(flow.handle_event(CheckoutEvent::Error(message)).await))
        })
    }

    /// Resume a `redirectResult` in the current URL. Resolves with the
    /// destination path, or `null` when there is nothing to resume.
    #[wasm_bindgen(js_name = resumeRedirect)]
    pub fn resume_redirect(&self) -> Promise {
        let flow = Rc::clone(&self.flow);
        future_to_promise(async move {
            let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
            let location = window.location();
            let path = location.pathname()?;
            let params = web_sys::UrlSearchParams::new_with_str(&location.search()?)?;

            let Some(redirect_result) =
                flow.pending_redirect(&path, params.get("redirectResult").as_deref())
            else {
                return Ok(JsValue::NULL);
            };

            let destination = flow
                .resume_redirect(&redirect_result)
                .await
                .map_err(|e| JsValue::from_str(&e.to_string()))?;
            Ok(JsValue::from_str(destination.path()))
        })
    }

    #[wasm_bindgen(getter, js_name = attemptId)]
    pub fn attempt_id(&self) -> String {
        self.flow.attempt_id().to_string()
    }

    #[wasm_bindgen(getter, js_name = returnUrl)]
    pub fn return_url(&self) -> String {
        self.flow.return_url()
    }
}

/// Classification as seen from JS
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassificationView {
    pub destination: Destination,
    pub path: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ClassificationView {
    pub fn of(outcome: &PaymentOutcome, redirect_continuation: bool) -> Self {
        let path = if redirect_continuation {
            CompletionPath::RedirectContinuation
        } else {
            CompletionPath::Direct
        };
        let classification = classify(outcome, ClassifyPolicy::for_path(path));
        Self {
            destination: classification.destination,
            path: classification.destination.path(),
            message: classification.stored_message,
        }
    }
}

/// Classify a payment result without storing or navigating
#[wasm_bindgen(js_name = classifyOutcome)]
pub fn classify_outcome(outcome: JsValue, redirect_continuation: bool) -> Result<JsValue, JsValue> {
    let outcome: PaymentOutcome = from_js(outcome, "payment result")?;
    to_js(&ClassificationView::of(&outcome, redirect_continuation))
}

/// Error message for a shopper reference, or `undefined` when it is valid
#[wasm_bindgen(js_name = validateShopperReference)]
pub fn validate_shopper_reference(reference: &str) -> Option<String> {
    let form = CheckoutForm {
        amount: 0,
        currency: String::new(),
        country_code: String::new(),
        enable_recurring: false,
        shopper_reference: reference.to_string(),
    };
    form.validate().err().map(|e| e.to_string())
}

/// Stored values for a destination page, removed from `sessionStorage`
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct StoredView {
    payment_result: Option<PaymentOutcome>,
    pending_payment: Option<PaymentOutcome>,
    payment_error: Option<String>,
}

/// Read and clear what the router stored for this page
#[wasm_bindgen(js_name = takePaymentResult)]
pub fn take_payment_result() -> Result<JsValue, JsValue> {
    let stored = StoredResult::take(&SessionStorageStore)
        .map_err(|e| JsValue::from_str(&e.to_string()))?;
    to_js(&StoredView {
        payment_result: stored.outcome,
        pending_payment: stored.pending,
        payment_error: stored.error,
    })
}

/// Log to browser console
#[wasm_bindgen]
pub fn log(message: &str) {
    web_sys::console::log_1(&JsValue::from_str(message));
}

/// Get library version
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn outcome(value: serde_json::Value) -> PaymentOutcome {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_parse_kind() {
        assert_eq!(parse_kind("sessions"), Some(FlowKind::Sessions));
        assert_eq!(parse_kind("advanced"), Some(FlowKind::Advanced));
        assert_eq!(parse_kind("hosted"), None);
    }

    #[test]
    fn test_classification_view() {
        let view = ClassificationView::of(&outcome(json!({"resultCode": "received"})), false);
        assert_eq!(view.destination, Destination::Pending);
        assert_eq!(view.path, "/pending");
        assert!(view.message.is_none());

        let view = ClassificationView::of(
            &outcome(json!({"resultCode": "refused", "refusalReason": "Insufficient funds"})),
            false,
        );
        assert_eq!(view.path, "/failed");
        assert_eq!(view.message.as_deref(), Some("Payment failed: refused"));
    }

    #[test]
    fn test_classification_view_authenticated_depends_on_path() {
        let authenticated = outcome(json!({"resultCode": "Authenticated"}));
        assert_eq!(
            ClassificationView::of(&authenticated, true).destination,
            Destination::Success
        );
        assert_eq!(
            ClassificationView::of(&authenticated, false).destination,
            Destination::Failed
        );
    }

    #[test]
    fn test_validate_shopper_reference() {
        assert_eq!(
            validate_shopper_reference("").as_deref(),
            Some("Shopper Reference is required")
        );
        assert_eq!(
            validate_shopper_reference("ab").as_deref(),
            Some("Shopper Reference must be at least 3 characters")
        );
        assert_eq!(validate_shopper_reference("abc"), None);
    }

    #[test]
    fn test_version() {
        assert_eq!(version(), env!("CARGO_PKG_VERSION"));
    }
}
