//! `fetch`-based client for the checkout backend.

use crate::browser::js_message;
use async_trait::async_trait;
use checkout_core::{
    CheckoutBackend, CheckoutError, CheckoutResult, DetailsRequest, FlowKind,
    PaymentMethodsRequest, PaymentOutcome, PaymentRequest, PaymentResponse, SessionRequest,
    SessionResponse,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::{Request, RequestInit, Response};

const SESSIONS_ENDPOINT: &str = "/api/sessions";
const PAYMENT_METHODS_ENDPOINT: &str = "/advanced/api/paymentMethods";
const PAYMENTS_ENDPOINT: &str = "/advanced/api/payments";

/// Operation named in the error shown when a call fails
pub fn operation_for(endpoint: &str) -> &'static str {
    match endpoint {
        SESSIONS_ENDPOINT => "create payment session",
        PAYMENT_METHODS_ENDPOINT => "get payment methods",
        PAYMENTS_ENDPOINT => "make payment",
        "/api/payments/3DSDetails" => "process 3DS details",
        _ => "process payment details",
    }
}

/// Backend reached with `window.fetch`, relative to the page's origin
#[derive(Debug, Clone, Default)]
pub struct FetchBackend {
    base_url: String,
}

impl FetchBackend {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    async fn post_json<T, R>(&self, endpoint: &str, body: &T) -> CheckoutResult<R>
    where
        T: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let operation = operation_for(endpoint);
        let payload = serde_json::to_string(body)?;

        let init = RequestInit::new();
        init.set_method("POST");
        init.set_body(&JsValue::from_str(&payload));

        let url = format!("{}{}", self.base_url, endpoint);
        let request = Request::new_with_str_and_init(&url, &init)
            .map_err(|e| CheckoutError::Internal(js_message(&e)))?;
        request
            .headers()
            .set("Content-Type", "application/json")
            .map_err(|e| CheckoutError::Internal(js_message(&e)))?;

        let window = web_sys::window()
            .ok_or_else(|| CheckoutError::Internal("no window".to_string()))?;
        let response: Response = JsFuture::from(window.fetch_with_request(&request))
            .await
            .map_err(|e| {
                crate::log(&format!("{} failed: {}", endpoint, js_message(&e)));
                CheckoutError::transport(endpoint, operation, None)
            })?
            .dyn_into()
            .map_err(|e| CheckoutError::Internal(js_message(&e)))?;

        if !response.ok() {
            return Err(CheckoutError::transport(
                endpoint,
                operation,
                Some(response.status()),
            ));
        }

        let text = JsFuture::from(
            response
                .text()
                .map_err(|e| CheckoutError::Internal(js_message(&e)))?,
        )
        .await
        .map_err(|_| CheckoutError::transport(endpoint, operation, None))?
        .as_string()
        .unwrap_or_default();

        serde_json::from_str(&text).map_err(|e| {
            CheckoutError::Serialization(format!("Unexpected response from {}: {}", endpoint, e))
        })
    }
}

#[async_trait(?Send)]
impl CheckoutBackend for FetchBackend {
    async fn create_session(&self, request: &SessionRequest) -> CheckoutResult<SessionResponse> {
        self.post_json(SESSIONS_ENDPOINT, request).await
    }

    async fn payment_methods(&self, request: &PaymentMethodsRequest) -> CheckoutResult<Value> {
        self.post_json(PAYMENT_METHODS_ENDPOINT, request).await
    }

    async fn make_payment(&self, request: &PaymentRequest) -> CheckoutResult<PaymentResponse> {
        self.post_json(PAYMENTS_ENDPOINT, request).await
    }

    async fn submit_details(
        &self,
        kind: FlowKind,
        details: &DetailsRequest,
    ) -> CheckoutResult<PaymentOutcome> {
        self.post_json(kind.details_endpoint(details), details).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operation_names() {
        assert_eq!(operation_for("/api/sessions"), "create payment session");
        assert_eq!(operation_for("/advanced/api/paymentMethods"), "get payment methods");
        assert_eq!(operation_for("/api/payments/3DSDetails"), "process 3DS details");
        assert_eq!(operation_for("/api/payments/details"), "process payment details");

        let err = CheckoutError::transport("/api/sessions", operation_for("/api/sessions"), Some(500));
        assert_eq!(err.to_string(), "Failed to create payment session: 500");
    }

    #[test]
    fn test_base_url_is_trimmed() {
        let backend = FetchBackend::new("https://shop.example/");
        assert_eq!(backend.base_url, "https://shop.example");
    }
}
