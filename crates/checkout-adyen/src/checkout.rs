//! # Adyen Checkout API
//!
//! `PaymentGateway` implementation against the Adyen Checkout API (v71):
//! sessions, payment methods, payments, payment details and session results.

use crate::config::AdyenConfig;
use crate::webhook::parse_notifications;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use checkout_core::{
    Amount, CheckoutError, CheckoutResult, DetailsRequest, NotificationEvent, PaymentGateway,
    PaymentMethodsRequest, PaymentOutcome, PaymentRequest, PaymentResponse, SessionRequest,
    SessionResponse,
};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::HashMap;
use tracing::{debug, error, info, instrument};
use uuid::Uuid;

const PROVIDER: &str = "adyen";

/// Adyen Checkout gateway
pub struct AdyenCheckoutGateway {
    config: AdyenConfig,
    client: Client,
    origin: String,
}

impl AdyenCheckoutGateway {
    /// Create a new Adyen gateway
    pub fn new(config: AdyenConfig) -> CheckoutResult<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .map_err(|e| CheckoutError::Configuration(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            config,
            client,
            origin: "http://localhost:8080".to_string(),
        })
    }

    /// Create from environment variables
    pub fn from_env() -> CheckoutResult<Self> {
        Self::new(AdyenConfig::from_env()?)
    }

    /// Builder: origin sent with `/payments` for native 3DS
    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = origin.into().trim_end_matches('/').to_string();
        self
    }

    pub fn config(&self) -> &AdyenConfig {
        &self.config
    }

    fn reference() -> String {
        format!("ORDER-{}", Uuid::new_v4())
    }

    /// Recurring fields for a session or payment
    fn recurring_fields(stored_method: bool, enable_recurring: bool) -> RecurringFields {
        if stored_method {
            RecurringFields {
                recurring_processing_model: Some("CardOnFile"),
                shopper_interaction: Some("ContAuth"),
                store: Some(false),
            }
        } else if enable_recurring {
            RecurringFields {
                recurring_processing_model: Some("CardOnFile"),
                shopper_interaction: Some("Ecommerce"),
                store: Some(true),
            }
        } else {
            RecurringFields::default()
        }
    }

    async fn send(&self, request: RequestBuilder) -> CheckoutResult<(StatusCode, String)> {
        let response = request
            .header("X-API-Key", &self.config.api_key)
            .send()
            .await
            .map_err(|e| CheckoutError::NetworkError(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| CheckoutError::NetworkError(e.to_string()))?;

        Ok((status, body))
    }

    fn parse_response<R: DeserializeOwned>(
        status: StatusCode,
        body: &str,
        operation: &str,
    ) -> CheckoutResult<R> {
        if !status.is_success() {
            error!("Adyen API error: operation={}, status={}, body={}", operation, status, body);

            // Parse Adyen error
            if let Ok(api_error) = serde_json::from_str::<AdyenErrorResponse>(body) {
                debug!(
                    "Adyen error detail: status={:?}, type={:?}, psp={:?}",
                    api_error.status, api_error.error_type, api_error.psp_reference
                );
                return Err(CheckoutError::ProviderError {
                    provider: PROVIDER.to_string(),
                    message: format!("{} ({})", api_error.message, api_error.error_code),
                });
            }

            return Err(CheckoutError::ProviderError {
                provider: PROVIDER.to_string(),
                message: format!("HTTP {}: {}", status, body),
            });
        }

        serde_json::from_str(body).map_err(|e| {
            CheckoutError::Serialization(format!("Failed to parse Adyen {} response: {}", operation, e))
        })
    }

    async fn post<B: Serialize, R: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
        idempotency_key: Option<&str>,
        operation: &str,
    ) -> CheckoutResult<R> {
        let mut request = self.client.post(self.config.checkout_url(path)).json(body);
        if let Some(key) = idempotency_key {
            request = request.header("Idempotency-Key", key);
        }

        let (status, body) = self.send(request).await?;
        Self::parse_response(status, &body, operation)
    }
}

#[async_trait]
impl PaymentGateway for AdyenCheckoutGateway {
    #[instrument(skip(self, request), fields(currency = %request.currency, country = %request.country_code))]
    async fn create_session(&self, request: &SessionRequest) -> CheckoutResult<SessionResponse> {
        let return_url = request.return_url.clone().ok_or_else(|| {
            CheckoutError::InvalidRequest("returnUrl is required".to_string())
        })?;
        let recurring = Self::recurring_fields(
            false,
            request.enable_recurring && request.shopper_reference.is_some(),
        );

        let body = AdyenSessionRequest {
            merchant_account: &self.config.merchant_account,
            amount: request.minor_amount(),
            return_url,
            reference: Self::reference(),
            country_code: &request.country_code,
            shopper_reference: request.shopper_reference.as_deref(),
            authentication_data: AuthenticationData::native_preferred(),
            recurring_processing_model: recurring.recurring_processing_model,
            shopper_interaction: recurring.shopper_interaction,
            store_payment_method_mode: recurring.store.map(|_| "enabled"),
        };

        debug!(
            "Creating Adyen session: reference={}, amount={}",
            body.reference,
            body.amount.display()
        );

        let response: AdyenSessionResponse = self.post("/sessions", &body, None, "sessions").await?;

        info!("Created Adyen payment session: id={}", response.id);

        Ok(SessionResponse {
            session_id: response.id,
            session_data: response.session_data,
            client_key: Some(self.config.client_key.clone()),
            expires_at: response.expires_at,
        })
    }

    #[instrument(skip(self, request), fields(currency = %request.currency, country = %request.country_code))]
    async fn payment_methods(&self, request: &PaymentMethodsRequest) -> CheckoutResult<Value> {
        let body = AdyenPaymentMethodsRequest {
            merchant_account: &self.config.merchant_account,
            amount: request.minor_amount(),
            country_code: &request.country_code,
            shopper_locale: "en-US",
            shopper_reference: request
                .shopper_reference
                .as_deref()
                .filter(|r| !r.is_empty()),
        };

        let response: AdyenPaymentMethodsResponse = self
            .post("/paymentMethods", &body, None, "paymentMethods")
            .await?;

        info!(
            "Retrieved payment methods: {} available, {} stored",
            response.payment_methods.len(),
            response.stored_payment_methods.len()
        );

        Ok(json!({
            "paymentMethods": response.payment_methods,
            "storedPaymentMethods": response.stored_payment_methods,
        }))
    }

    #[instrument(skip(self, request), fields(amount = %request.amount.display()))]
    async fn make_payment(&self, request: &PaymentRequest) -> CheckoutResult<PaymentResponse> {
        if request.payment_method.is_null() {
            return Err(CheckoutError::InvalidRequest(
                "paymentMethod is required".to_string(),
            ));
        }
        let return_url = request.return_url.clone().ok_or_else(|| {
            CheckoutError::InvalidRequest("returnUrl is required".to_string())
        })?;

        let stored = request.uses_stored_payment_method();
        if stored {
            debug!("Using stored payment method");
        }
        let recurring = Self::recurring_fields(stored, request.enable_recurring);

        let body = AdyenPaymentRequest {
            merchant_account: &self.config.merchant_account,
            amount: request.amount.clone(),
            reference: Self::reference(),
            return_url,
            payment_method: &request.payment_method,
            shopper_reference: request.shopper_reference.as_deref(),
            country_code: request.country_code.as_deref(),
            recurring_processing_model: recurring.recurring_processing_model,
            shopper_interaction: recurring.shopper_interaction,
            store_payment_method: recurring.store,
            browser_info: request.browser_info.as_ref(),
            authentication_data: AuthenticationData::native_preferred(),
            channel: "Web",
            origin: &self.origin,
        };

        let response: PaymentResponse = self.post("/payments", &body, None, "payments").await?;

        info!(
            "Adyen payment: result={:?}, psp={:?}, action={}",
            response.result_code,
            response.psp_reference,
            response.action.is_some()
        );

        Ok(response)
    }

    #[instrument(skip(self, details), fields(three_ds = details.is_three_ds()))]
    async fn submit_details(&self, details: &DetailsRequest) -> CheckoutResult<PaymentResponse> {
        let completion = match details {
            DetailsRequest::Redirect {
                redirect_result, ..
            } => json!({ "redirectResult": redirect_result }),
            DetailsRequest::ThreeDs {
                three_ds_result, ..
            } => json!({ "threeDSResult": three_ds_result }),
        };

        let body = AdyenDetailsRequest {
            details: completion,
            payment_data: details.payment_data().filter(|d| !d.is_empty()),
        };
        let idempotency_key = Uuid::new_v4().to_string();

        let response: PaymentResponse = self
            .post("/payments/details", &body, Some(&idempotency_key), "payments/details")
            .await?;

        info!(
            "Adyen payment details: result={:?}, psp={:?}",
            response.result_code, response.psp_reference
        );

        Ok(response)
    }

    #[instrument(skip(self, session_result))]
    async fn session_result(
        &self,
        session_id: &str,
        session_result: &str,
    ) -> CheckoutResult<PaymentOutcome> {
        let request = self
            .client
            .get(self.config.checkout_url(&format!("/sessions/{}", session_id)))
            .query(&[("sessionResult", session_result)]);

        let (status, body) = self.send(request).await?;
        if status == StatusCode::NOT_FOUND {
            return Err(CheckoutError::SessionNotFound {
                session_id: session_id.to_string(),
            });
        }
        let response: AdyenSessionResultResponse =
            Self::parse_response(status, &body, "session result")?;

        let outcome = response.into_outcome();
        info!(
            "Session {} result: {:?}",
            session_id, outcome.result_code
        );
        Ok(outcome)
    }

    #[instrument(skip(self, payload))]
    async fn verify_notification(&self, payload: &[u8]) -> CheckoutResult<Vec<NotificationEvent>> {
        parse_notifications(payload, self.config.hmac_key.as_deref())
    }

    fn provider_name(&self) -> &'static str {
        PROVIDER
    }
}

/// Result code for a session status when no payment carries one
fn session_status_code(status: &str) -> String {
    match status {
        "completed" => "Authorised",
        "paymentPending" => "Pending",
        "refused" => "Refused",
        "canceled" => "Cancelled",
        "expired" => "Expired",
        other => other,
    }
    .to_string()
}

// =============================================================================
// Adyen API Types
// =============================================================================

#[derive(Debug, Default)]
struct RecurringFields {
    recurring_processing_model: Option<&'static str>,
    shopper_interaction: Option<&'static str>,
    store: Option<bool>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AuthenticationData {
    #[serde(rename = "threeDSRequestData")]
    three_ds_request_data: ThreeDsRequestData,
}

impl AuthenticationData {
    fn native_preferred() -> Self {
        Self {
            three_ds_request_data: ThreeDsRequestData {
                native_three_ds: "preferred",
            },
        }
    }
}

#[derive(Debug, Serialize)]
struct ThreeDsRequestData {
    #[serde(rename = "nativeThreeDS")]
    native_three_ds: &'static str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AdyenSessionRequest<'a> {
    merchant_account: &'a str,
    amount: Amount,
    return_url: String,
    reference: String,
    country_code: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    shopper_reference: Option<&'a str>,
    authentication_data: AuthenticationData,
    #[serde(skip_serializing_if = "Option::is_none")]
    recurring_processing_model: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    shopper_interaction: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    store_payment_method_mode: Option<&'static str>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AdyenSessionResponse {
    id: String,
    session_data: String,
    #[serde(default)]
    expires_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AdyenPaymentMethodsRequest<'a> {
    merchant_account: &'a str,
    amount: Amount,
    country_code: &'a str,
    shopper_locale: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    shopper_reference: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AdyenPaymentMethodsResponse {
    #[serde(default)]
    payment_methods: Vec<Value>,
    #[serde(default)]
    stored_payment_methods: Vec<Value>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AdyenPaymentRequest<'a> {
    merchant_account: &'a str,
    amount: Amount,
    reference: String,
    return_url: String,
    payment_method: &'a Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    shopper_reference: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    country_code: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    recurring_processing_model: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    shopper_interaction: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    store_payment_method: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    browser_info: Option<&'a Value>,
    authentication_data: AuthenticationData,
    channel: &'static str,
    origin: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AdyenDetailsRequest<'a> {
    details: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    payment_data: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AdyenSessionResultResponse {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    reference: Option<String>,
    #[serde(default)]
    payments: Vec<AdyenSessionPayment>,
    #[serde(default)]
    additional_data: Option<HashMap<String, String>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AdyenSessionPayment {
    #[serde(default)]
    psp_reference: Option<String>,
    #[serde(default)]
    result_code: Option<String>,
}

impl AdyenSessionResultResponse {
    fn into_outcome(self) -> PaymentOutcome {
        let first = self.payments.into_iter().next();
        let psp_reference = first.as_ref().and_then(|p| p.psp_reference.clone());
        let result_code = first
            .and_then(|p| p.result_code)
            .or_else(|| self.status.as_deref().map(session_status_code));

        PaymentOutcome {
            result_code,
            psp_reference,
            merchant_reference: self.reference,
            additional_data: self.additional_data,
            ..Default::default()
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AdyenErrorResponse {
    #[serde(default)]
    status: Option<u16>,
    error_code: String,
    message: String,
    #[serde(default)]
    error_type: Option<String>,
    #[serde(default)]
    psp_reference: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, header_exists, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn gateway(server: &MockServer) -> AdyenCheckoutGateway {
        let config = AdyenConfig::new("AQE_test", "ShopECOM", "test_CLIENT")
            .with_checkout_base_url(server.uri());
        AdyenCheckoutGateway::new(config)
            .unwrap()
            .with_origin("https://shop.example/")
    }

    fn session_request(enable_recurring: bool) -> SessionRequest {
        SessionRequest {
            amount: 10,
            currency: "EUR".to_string(),
            country_code: "NL".to_string(),
            return_url: Some("https://shop.example/success".to_string()),
            enable_recurring,
            shopper_reference: Some("shopper-1".to_string()),
        }
    }

    fn payment_request(payment_method: Value, enable_recurring: bool) -> PaymentRequest {
        PaymentRequest {
            amount: Amount::new("EUR", 1000),
            payment_method,
            shopper_reference: Some("shopper-1".to_string()),
            country_code: Some("NL".to_string()),
            enable_recurring,
            browser_info: Some(json!({"userAgent": "test"})),
            return_url: Some("https://shop.example/advanced/result".to_string()),
        }
    }

    #[test]
    fn test_recurring_fields() {
        let stored = AdyenCheckoutGateway::recurring_fields(true, true);
        assert_eq!(stored.shopper_interaction, Some("ContAuth"));
        assert_eq!(stored.store, Some(false));

        let new = AdyenCheckoutGateway::recurring_fields(false, true);
        assert_eq!(new.recurring_processing_model, Some("CardOnFile"));
        assert_eq!(new.shopper_interaction, Some("Ecommerce"));
        assert_eq!(new.store, Some(true));

        let none = AdyenCheckoutGateway::recurring_fields(false, false);
        assert!(none.recurring_processing_model.is_none());
    }

    #[test]
    fn test_session_status_mapping() {
        assert_eq!(session_status_code("completed"), "Authorised");
        assert_eq!(session_status_code("paymentPending"), "Pending");
        assert_eq!(session_status_code("refused"), "Refused");
        assert_eq!(session_status_code("canceled"), "Cancelled");
        assert_eq!(session_status_code("expired"), "Expired");
        assert_eq!(session_status_code("active"), "active");
    }

    #[test]
    fn test_reference_format() {
        let reference = AdyenCheckoutGateway::reference();
        assert!(reference.starts_with("ORDER-"));
        assert_eq!(reference.len(), "ORDER-".len() + 36);
    }

    #[tokio::test]
    async fn test_create_session_with_recurring() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/sessions"))
            .and(header("X-API-Key", "AQE_test"))
            .and(body_partial_json(json!({
                "merchantAccount": "ShopECOM",
                "amount": {"currency": "EUR", "value": 1000},
                "countryCode": "NL",
                "shopperReference": "shopper-1",
                "returnUrl": "https://shop.example/success",
                "authenticationData": {"threeDSRequestData": {"nativeThreeDS": "preferred"}},
                "recurringProcessingModel": "CardOnFile",
                "shopperInteraction": "Ecommerce",
                "storePaymentMethodMode": "enabled"
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "id": "CS451F2AB1ED897A94",
                "sessionData": "Ab02b4c0...",
                "expiresAt": "2024-01-01T12:00:00+01:00",
                "reference": "ORDER-x"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let session = gateway(&server)
            .await
            .create_session(&session_request(true))
            .await
            .unwrap();

        assert_eq!(session.session_id, "CS451F2AB1ED897A94");
        assert_eq!(session.client_key.as_deref(), Some("test_CLIENT"));
        assert_eq!(
            session.expires_at.map(|d| d.to_rfc3339()),
            Some("2024-01-01T11:00:00+00:00".to_string())
        );
    }

    #[tokio::test]
    async fn test_create_session_requires_return_url() {
        let server = MockServer::start().await;
        let mut request = session_request(false);
        request.return_url = None;

        let err = gateway(&server).await.create_session(&request).await.unwrap_err();
        assert!(matches!(err, CheckoutError::InvalidRequest(_)));
    }

    #[tokio::test]
    async fn test_provider_error_is_parsed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/sessions"))
            .respond_with(ResponseTemplate::new(422).set_body_json(json!({
                "status": 422,
                "errorCode": "14_030",
                "message": "Return URL is missing.",
                "errorType": "validation",
                "pspReference": "psp"
            })))
            .mount(&server)
            .await;

        let err = gateway(&server)
            .await
            .create_session(&session_request(false))
            .await
            .unwrap_err();

        assert_eq!(
            err.to_string(),
            "Provider error [adyen]: Return URL is missing. (14_030)"
        );
        assert_eq!(err.status_code(), 502);
    }

    #[tokio::test]
    async fn test_unparseable_error_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/paymentMethods"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let request = PaymentMethodsRequest {
            amount: 10,
            currency: "EUR".to_string(),
            country_code: "NL".to_string(),
            shopper_reference: None,
            enable_recurring: false,
        };
        let err = gateway(&server).await.payment_methods(&request).await.unwrap_err();
        assert!(err.to_string().contains("HTTP 500"));
    }

    #[tokio::test]
    async fn test_payment_methods() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/paymentMethods"))
            .and(body_partial_json(json!({
                "shopperLocale": "en-US",
                "shopperReference": "shopper-1",
                "amount": {"currency": "JPY", "value": 1500}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "paymentMethods": [{"type": "scheme", "name": "Cards"}],
                "storedPaymentMethods": [{"id": "8315", "type": "scheme"}]
            })))
            .mount(&server)
            .await;

        let request = PaymentMethodsRequest {
            amount: 1500,
            currency: "JPY".to_string(),
            country_code: "JP".to_string(),
            shopper_reference: Some("shopper-1".to_string()),
            enable_recurring: true,
        };
        let methods = gateway(&server).await.payment_methods(&request).await.unwrap();

        assert_eq!(methods["paymentMethods"][0]["type"], json!("scheme"));
        assert_eq!(methods["storedPaymentMethods"][0]["id"], json!("8315"));
    }

    #[tokio::test]
    async fn test_payment_with_stored_method() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/payments"))
            .and(body_partial_json(json!({
                "recurringProcessingModel": "CardOnFile",
                "shopperInteraction": "ContAuth",
                "storePaymentMethod": false,
                "channel": "Web",
                "origin": "https://shop.example",
                "browserInfo": {"userAgent": "test"},
                "returnUrl": "https://shop.example/advanced/result"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "resultCode": "Authorised",
                "pspReference": "993617895204576J",
                "merchantReference": "ORDER-1"
            })))
            .mount(&server)
            .await;

        let request = payment_request(json!({"type": "scheme", "storedPaymentMethodId": "8315"}), true);
        let response = gateway(&server).await.make_payment(&request).await.unwrap();

        assert_eq!(response.result_code.as_deref(), Some("Authorised"));
        assert!(response.action.is_none());
    }

    #[tokio::test]
    async fn test_payment_with_action() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/payments"))
            .and(body_partial_json(json!({
                "shopperInteraction": "Ecommerce",
                "storePaymentMethod": true
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "resultCode": "IdentifyShopper",
                "action": {"type": "threeDS2", "token": "tok"}
            })))
            .mount(&server)
            .await;

        let request = payment_request(json!({"type": "scheme", "encryptedCardNumber": "x"}), true);
        let response = gateway(&server).await.make_payment(&request).await.unwrap();

        assert_eq!(response.action.as_ref().map(|a| a["type"].clone()), Some(json!("threeDS2")));
    }

    #[tokio::test]
    async fn test_payment_requires_method() {
        let server = MockServer::start().await;
        let request = payment_request(Value::Null, false);

        let err = gateway(&server).await.make_payment(&request).await.unwrap_err();
        assert!(matches!(err, CheckoutError::InvalidRequest(_)));
    }

    #[tokio::test]
    async fn test_submit_details_sends_idempotency_key() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/payments/details"))
            .and(header_exists("Idempotency-Key"))
            .and(body_partial_json(json!({
                "details": {"threeDSResult": "eyJ0cmFuc1N0YXR1cyI6IlkifQ=="},
                "paymentData": "Ab02"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "resultCode": "Authorised",
                "pspReference": "psp-3ds"
            })))
            .mount(&server)
            .await;

        let details = DetailsRequest::three_ds("eyJ0cmFuc1N0YXR1cyI6IlkifQ==", Some("Ab02".to_string()));
        let response = gateway(&server).await.submit_details(&details).await.unwrap();

        assert_eq!(response.psp_reference.as_deref(), Some("psp-3ds"));
    }

    #[tokio::test]
    async fn test_session_result_prefers_payment_code() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/sessions/CS1"))
            .and(query_param("sessionResult", "res"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "CS1",
                "status": "completed",
                "reference": "ORDER-1",
                "payments": [{"pspReference": "psp1", "resultCode": "Authorised", "amount": {"currency": "EUR", "value": 1000}}]
            })))
            .mount(&server)
            .await;

        let outcome = gateway(&server).await.session_result("CS1", "res").await.unwrap();

        assert_eq!(outcome.result_code.as_deref(), Some("Authorised"));
        assert_eq!(outcome.psp_reference.as_deref(), Some("psp1"));
        assert_eq!(outcome.merchant_reference.as_deref(), Some("ORDER-1"));
    }

    #[tokio::test]
    async fn test_session_result_maps_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/sessions/CS2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "CS2",
                "status": "paymentPending"
            })))
            .mount(&server)
            .await;

        let outcome = gateway(&server).await.session_result("CS2", "res").await.unwrap();
        assert_eq!(outcome.result_code.as_deref(), Some("Pending"));
        assert!(outcome.psp_reference.is_none());
    }

    #[tokio::test]
    async fn test_session_result_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/sessions/missing"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let err = gateway(&server)
            .await
            .session_result("missing", "res")
            .await
            .unwrap_err();
        assert!(matches!(err, CheckoutError::SessionNotFound { .. }));
    }
}
