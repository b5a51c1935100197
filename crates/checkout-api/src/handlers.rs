//! # Request Handlers
//!
//! Axum request handlers for the checkout API.
//! JSON endpoints forward to the payment gateway; the result pages classify
//! redirect continuations server-side.

use crate::state::AppState;
use axum::{
    body::Bytes,
    extract::{Query, State},
    http::StatusCode,
    response::{Html, IntoResponse},
    Json,
};
use checkout_adyen::{dispatch_notification, NOTIFICATION_ACCEPTED};
use checkout_core::{
    classify, CheckoutError, ClientConfig, CompletionPath, Destination, DetailsRequest, FlowKind,
    PaymentMethodsRequest, PaymentOutcome, PaymentRequest, PaymentResponse, ReturnUrls,
    SessionRequest, SessionResponse, SessionResultRequest, PAYMENT_ERROR_KEY, PAYMENT_RESULT_KEY,
    PENDING_PAYMENT_KEY,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{error, info, instrument, warn};

// =============================================================================
// Request/Response Types
// =============================================================================

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, code: u16) -> Self {
        Self {
            error: error.into(),
            code,
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

pub type ApiError = (StatusCode, Json<ErrorResponse>);

fn checkout_error_to_response(err: CheckoutError) -> ApiError {
    let code = err.status_code();
    let response = ErrorResponse::new(err.to_string(), code);
    (StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR), Json(response))
}

fn bad_request(message: &str) -> ApiError {
    checkout_error_to_response(CheckoutError::InvalidRequest(message.to_string()))
}

/// Query of the pages the processor redirects back to
#[derive(Debug, Default, Deserialize)]
pub struct RedirectQuery {
    #[serde(rename = "redirectResult", default)]
    pub redirect_result: Option<String>,
}

// =============================================================================
// Handlers
// =============================================================================

/// Health check endpoint
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "dropin-checkout",
        "provider": state.gateway.provider_name(),
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Client key, environment, locale and payment-method options for the drop-in
pub async fn client_config(State(state): State<AppState>) -> Json<ClientConfig> {
    Json(state.client_config.clone())
}

/// Create a payment session (sessions flow)
#[instrument(skip(state, request), fields(currency = %request.currency, recurring = request.enable_recurring))]
pub async fn create_session(
    State(state): State<AppState>,
    Json(mut request): Json<SessionRequest>,
) -> Result<Json<SessionResponse>, ApiError> {
    let has_reference = request
        .shopper_reference
        .as_deref()
        .is_some_and(|r| !r.trim().is_empty());
    if !has_reference {
        error!("Missing required field: shopperReference");
        return Err(bad_request("shopperReference is required"));
    }

    request.return_url = Some(ReturnUrls::resolve(
        request.return_url.as_deref(),
        state.return_urls.session_url(),
    ));

    let session = state
        .gateway
        .create_session(&request)
        .await
        .map_err(|e| {
            error!("Error creating payment session: {}", e);
            checkout_error_to_response(e)
        })?;

    info!("Created session {}", session.session_id);
    Ok(Json(session))
}

/// Session result by `{sessionId, sessionResult}`
#[instrument(skip(state, request))]
pub async fn session_result(
    State(state): State<AppState>,
    Json(request): Json<SessionResultRequest>,
) -> Result<Json<PaymentOutcome>, ApiError> {
    let (Some(session_id), Some(session_result)) = (request.session_id, request.session_result)
    else {
        error!("Missing sessionId or sessionResult in request");
        return Err(bad_request("sessionId and sessionResult are required"));
    };

    let outcome = state
        .gateway
        .session_result(&session_id, &session_result)
        .await
        .map_err(checkout_error_to_response)?;

    Ok(Json(outcome))
}

/// Redirect or 3DS details (sessions redirect and advanced flow)
#[instrument(skip(state, details), fields(three_ds = details.is_three_ds()))]
pub async fn payment_details(
    State(state): State<AppState>,
    Json(details): Json<DetailsRequest>,
) -> Result<Json<PaymentResponse>, ApiError> {
    submit_details(&state, &details).await.map(Json)
}

/// 3DS details from the sessions flow
#[instrument(skip(state, details))]
pub async fn three_ds_details(
    State(state): State<AppState>,
    Json(details): Json<DetailsRequest>,
) -> Result<Json<PaymentResponse>, ApiError> {
    if !details.is_three_ds() {
        return Err(bad_request("threeDSResult is required"));
    }

    submit_details(&state, &details).await.map(Json)
}

async fn submit_details(
    state: &AppState,
    details: &DetailsRequest,
) -> Result<PaymentResponse, ApiError> {
    let response = state.gateway.submit_details(details).await.map_err(|e| {
        error!("Error submitting payment details: {}", e);
        checkout_error_to_response(e)
    })?;

    info!("Details processed with result: {:?}", response.result_code);
    Ok(response)
}

/// Processor notification webhook
#[instrument(skip(state, body), fields(bytes = body.len()))]
pub async fn notification_webhook(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<Value>, ApiError> {
    let events = state
        .gateway
        .verify_notification(&body)
        .await
        .map_err(|e| {
            warn!("Rejected notification: {}", e);
            checkout_error_to_response(e)
        })?;

    for event in &events {
        // The processor retries unless we accept, so handler errors are only logged
        if let Err(e) = dispatch_notification(state.notifications.as_ref(), event) {
            error!(
                "Notification handler failed: psp={}, error={}",
                event.psp_reference, e
            );
        }
    }

    Ok(Json(serde_json::json!({
        "notificationResponse": NOTIFICATION_ACCEPTED
    })))
}

/// Available payment methods (advanced flow)
#[instrument(skip(state, request), fields(currency = %request.currency, country = %request.country_code))]
pub async fn payment_methods(
    State(state): State<AppState>,
    Json(request): Json<PaymentMethodsRequest>,
) -> Result<Json<Value>, ApiError> {
    state
        .gateway
        .payment_methods(&request)
        .await
        .map(Json)
        .map_err(|e| {
            error!("Error fetching payment methods: {}", e);
            checkout_error_to_response(e)
        })
}

/// Make a payment (advanced flow)
#[instrument(skip(state, request), fields(amount = %request.amount.display()))]
pub async fn make_payment(
    State(state): State<AppState>,
    Json(mut request): Json<PaymentRequest>,
) -> Result<Json<PaymentResponse>, ApiError> {
    request.return_url = Some(ReturnUrls::resolve(
        request.return_url.as_deref(),
        state.return_urls.advanced_url(),
    ));

    let response = state.gateway.make_payment(&request).await.map_err(|e| {
        error!("Error making payment: {}", e);
        checkout_error_to_response(e)
    })?;

    Ok(Json(response))
}

/// Redirect continuation page (`/success`, `/result`, `/advanced/result`).
///
/// With a `redirectResult` the details are submitted and the outcome is
/// classified here; without one the success page renders whatever the
/// browser stored.
#[instrument(skip(state, query), fields(redirect = query.redirect_result.is_some()))]
pub async fn redirect_result(
    State(state): State<AppState>,
    Query(query): Query<RedirectQuery>,
) -> Html<String> {
    let Some(redirect_result) = query.redirect_result.filter(|r| !r.is_empty()) else {
        info!("No redirectResult parameter, showing success page with client-side data");
        return render_page(Destination::Success, None);
    };

    info!("Received redirect with redirectResult parameter");
    let details = DetailsRequest::redirect(redirect_result);
    match state.gateway.submit_details(&details).await {
        Ok(response) => {
            let outcome = response.into_outcome();
            let classification = classify(&outcome, state.policy(CompletionPath::RedirectContinuation));
            info!(
                "Redirect result {:?} -> {}",
                outcome.result_code, classification.destination
            );

            let detail = match classification.destination {
                Destination::Failed => classification.stored_message,
                _ => outcome.psp_reference.map(|psp| format!("Reference: {}", psp)),
            };
            render_page(classification.destination, detail.as_deref())
        }
        Err(e) => {
            error!("Error processing redirect result: {}", e);
            render_page(
                Destination::Failed,
                Some(&format!("Error processing payment: {}", e)),
            )
        }
    }
}

/// Success page without redirect handling (`/advanced/success`)
pub async fn success_page() -> Html<String> {
    render_page(Destination::Success, None)
}

/// Pending page
pub async fn pending_page() -> Html<String> {
    render_page(Destination::Pending, None)
}

/// Failed page (`/failed`, `/advanced/failed`)
pub async fn failed_page() -> Html<String> {
    render_page(Destination::Failed, None)
}

/// Flow selection page
pub async fn home_page() -> Html<String> {
    Html(HOME_PAGE.to_string())
}

/// Sessions flow checkout page
pub async fn sessions_checkout_page() -> Html<String> {
    render_checkout_page(FlowKind::Sessions)
}

/// Advanced flow checkout page
pub async fn advanced_checkout_page() -> Html<String> {
    render_checkout_page(FlowKind::Advanced)
}

// =============================================================================
// Pages
// =============================================================================

struct PageCopy {
    title: &'static str,
    icon: &'static str,
    heading: &'static str,
    body: &'static str,
    /// sessionStorage key filled in when the server has no detail
    storage_key: &'static str,
}

fn page_copy(destination: Destination) -> PageCopy {
    match destination {
        Destination::Success => PageCopy {
            title: "Payment Successful",
            icon: "✅",
            heading: "Payment Successful!",
            body: "Your payment was processed successfully.",
            storage_key: PAYMENT_RESULT_KEY,
        },
        Destination::Pending => PageCopy {
            title: "Payment Pending",
            icon: "⏳",
            heading: "Payment Pending",
            body: "We will update you once the payment is confirmed.",
            storage_key: PENDING_PAYMENT_KEY,
        },
        Destination::Failed => PageCopy {
            title: "Payment Failed",
            icon: "❌",
            heading: "Payment Failed",
            body: "No charges were made.",
            storage_key: PAYMENT_ERROR_KEY,
        },
    }
}

fn escape_html(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

fn render_page(destination: Destination, detail: Option<&str>) -> Html<String> {
    let copy = page_copy(destination);
    let detail = detail.map(escape_html).unwrap_or_default();

    Html(format!(r#"
<!DOCTYPE html>
<html>
<head><title>{title}</title></head>
<body style="font-family: system-ui; display: flex; justify-content: center; align-items: center; height: 100vh; margin: 0; background: linear-gradient(135deg, #1a1a2e 0%, #16213e 100%);">
    <div style="background: white; padding: 60px; border-radius: 16px; text-align: center;">
        <div style="font-size: 60px;">{icon}</div>
        <h1>{heading}</h1>
        <p id="detail"><code>{detail}</code></p>
        <p style="color: #666;">{body}</p>
        <a href="/">Back to checkout</a>
    </div>
    <script>
        (function () {{
            var stored = sessionStorage.getItem('{storage_key}');
            ['{result_key}', '{pending_key}', '{error_key}'].forEach(function (key) {{
                sessionStorage.removeItem(key);
            }});
            var el = document.querySelector('#detail code');
            if (el.textContent || !stored) return;
            try {{
                var result = JSON.parse(stored);
                el.textContent = result.pspReference ? 'Reference: ' + result.pspReference : (result.resultCode || '');
            }} catch (e) {{
                el.textContent = stored;
            }}
        }})();
    </script>
</body>
</html>
"#,
        title = copy.title,
        icon = copy.icon,
        heading = copy.heading,
        detail = detail,
        body = copy.body,
        storage_key = copy.storage_key,
        result_key = PAYMENT_RESULT_KEY,
        pending_key = PENDING_PAYMENT_KEY,
        error_key = PAYMENT_ERROR_KEY,
    ))
}

const HOME_PAGE: &str = r#"
<!DOCTYPE html>
<html>
<head><title>Drop-in Checkout</title></head>
<body style="font-family: system-ui; max-width: 640px; margin: 60px auto;">
    <h1>Choose a checkout flow</h1>
    <ul>
        <li><a href="/sessions">Sessions flow</a>: one session call, the drop-in handles the rest</li>
        <li><a href="/advanced">Advanced flow</a>: payment methods, payments and details calls</li>
    </ul>
</body>
</html>
"#;

// Loads the wasm driver from /pkg and mounts the drop-in into the modal
const CHECKOUT_SCRIPT: &str = r#"
import init, { Checkout } from '/pkg/checkout_wasm.js';

await init();
const kind = document.body.dataset.flow;
const clientConfig = await (await fetch('/api/config')).json();
const checkout = new Checkout(kind, clientConfig);
checkout.resumeRedirect().catch(() => {});

const recurring = document.getElementById('enableRecurring');
document.querySelector('.close-modal').addEventListener('click', () => {
    document.getElementById('payment-modal').style.display = 'none';
});

document.getElementById('pay-button').addEventListener('click', async () => {
    document.getElementById('payment-container').innerHTML = '';
    let configuration;
    try {
        configuration = await checkout.start({
            amount: parseInt(document.getElementById('amount').value, 10),
            currency: document.getElementById('currency').value,
            countryCode: document.getElementById('countryCode').value,
            enableRecurring: recurring.checked,
            shopperReference: document.getElementById('shopperReference').value,
        });
    } catch (e) {
        return;
    }

    const { AdyenCheckout, Dropin } = window.AdyenWeb;
    const callbacks = {
        onPaymentCompleted: (result) => checkout.onPaymentCompleted(result),
        onPaymentFailed: (result) => checkout.onPaymentFailed(result),
        onAdditionalDetails: (state) => checkout.onAdditionalDetails(state.data),
        onRedirect: () => checkout.onRedirect(),
        onError: (error) => checkout.onError(error),
    };
    if (kind === 'advanced') {
        callbacks.onSubmit = async (state, component, actions) => {
            const decision = await checkout.onSubmit(state.data);
            if (decision.decision === 'resolve') {
                actions.resolve({ resultCode: decision.resultCode, action: decision.action, order: decision.order });
            } else if (decision.decision === 'reject') {
                actions.reject();
            }
        };
    }

    const adyenCheckout = await AdyenCheckout({ ...configuration, ...callbacks });
    new Dropin(adyenCheckout, configuration.dropin || {}).mount('#payment-container');
});
"#;

const SDK_BASE: &str = "https://checkoutshopper-test.cdn.adyen.com/checkoutshopper/sdk/6.0.0";

fn render_checkout_page(kind: FlowKind) -> Html<String> {
    let (flow, title) = match kind {
        FlowKind::Sessions => ("sessions", "Sessions Flow"),
        FlowKind::Advanced => ("advanced", "Advanced Flow"),
    };

    Html(format!(r#"
<!DOCTYPE html>
<html>
<head>
    <title>{title}</title>
    <link rel="stylesheet" href="{sdk}/adyen.css">
    <script src="{sdk}/adyen.js"></script>
    <style>
        .is-invalid {{ border-color: #dc3545; }}
        .field-error, #error, #loading, #payment-modal {{ display: none; }}
        .field-error {{ color: #dc3545; font-size: 0.9em; }}
    </style>
</head>
<body data-flow="{flow}" style="font-family: system-ui; max-width: 640px; margin: 40px auto;">
    <h1>{title}</h1>
    <label>Amount <input id="amount" type="number" min="1" value="10"></label>
    <label>Currency
        <select id="currency"><option>EUR</option><option>USD</option><option>GBP</option></select>
    </label>
    <label>Country
        <select id="countryCode"><option>NL</option><option>US</option><option>GB</option></select>
    </label>
    <label><input id="enableRecurring" type="checkbox"> Save for recurring payments</label>
    <div id="shopperReferenceGroup">
        <label>Shopper Reference <input id="shopperReference" type="text"></label>
        <div id="shopperReference-error" class="field-error"></div>
    </div>
    <button id="pay-button">Pay</button>
    <div id="loading">Loading...</div>
    <div id="error" style="color: #dc3545;"></div>
    <div id="payment-modal">
        <span class="close-modal">&times;</span>
        <div id="payment-container"></div>
    </div>
    <p><a href="/">Choose another flow</a></p>
    <script type="module">{script}</script>
</body>
</html>
"#,
        title = title,
        sdk = SDK_BASE,
        flow = flow,
        script = CHECKOUT_SCRIPT,
    ))
}
