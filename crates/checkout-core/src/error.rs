//! # Checkout Error Types
//!
//! Typed error handling for the drop-in checkout engine.
//! All checkout operations return `Result<T, CheckoutError>`.
//!
//! An unsuccessful result code is *not* an error: it is a normal outcome
//! that the router sends to the failed page.

use thiserror::Error;

/// Core error type for all checkout operations
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// Configuration errors (missing keys, invalid config)
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Form input rejected before any network call
    #[error("{message}")]
    Validation { field: String, message: String },

    /// Invalid request data received by the backend
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Non-2xx or network failure on a backend call made by the browser flow
    #[error("{message}")]
    Transport { endpoint: String, message: String },

    /// The vendor SDK reported an error through `onError`
    #[error("{0}")]
    Sdk(String),

    /// Payment provider API error
    #[error("Provider error [{provider}]: {message}")]
    ProviderError { provider: String, message: String },

    /// Network/HTTP error communicating with provider
    #[error("Network error: {0}")]
    NetworkError(String),

    /// Notification signature verification failed
    #[error("Webhook verification failed: {0}")]
    WebhookVerificationFailed(String),

    /// Notification payload parsing error
    #[error("Webhook parse error: {0}")]
    WebhookParseError(String),

    /// Session expired or not found
    #[error("Session not found or expired: {session_id}")]
    SessionNotFound { session_id: String },

    /// Tab storage rejected a read or write
    #[error("Storage error: {0}")]
    Storage(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Attempt state machine was driven out of order
    #[error("Invalid attempt transition: {from} -> {to}")]
    InvalidTransition { from: String, to: String },

    /// Internal error (should not happen)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CheckoutError {
    /// Validation error for a named form field
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        CheckoutError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Transport error for a backend call, e.g. `Failed to create payment session: 500`
    pub fn transport(endpoint: impl Into<String>, operation: &str, status: Option<u16>) -> Self {
        let message = match status {
            Some(code) => format!("Failed to {}: {}", operation, code),
            None => format!("Failed to {}", operation),
        };
        CheckoutError::Transport {
            endpoint: endpoint.into(),
            message,
        }
    }

    /// Returns true if this error is transient.
    ///
    /// Nothing in the checkout flow retries on its own; callers may use this
    /// to decide whether to offer the shopper another try.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            CheckoutError::NetworkError(_)
                | CheckoutError::Transport { .. }
                | CheckoutError::ProviderError { .. }
        )
    }

    /// Returns the HTTP status code appropriate for this error
    pub fn status_code(&self) -> u16 {
        match self {
            CheckoutError::Configuration(_) => 500,
            CheckoutError::Validation { .. } => 400,
            CheckoutError::InvalidRequest(_) => 400,
            CheckoutError::Transport { .. } => 502,
            CheckoutError::Sdk(_) => 500,
            CheckoutError::ProviderError { .. } => 502,
            CheckoutError::NetworkError(_) => 503,
            CheckoutError::WebhookVerificationFailed(_) => 401,
            CheckoutError::WebhookParseError(_) => 400,
            CheckoutError::SessionNotFound { .. } => 404,
            CheckoutError::Storage(_) => 500,
            CheckoutError::Serialization(_) => 500,
            CheckoutError::InvalidTransition { .. } => 409,
            CheckoutError::Internal(_) => 500,
        }
    }
}

impl From<serde_json::Error> for CheckoutError {
    fn from(err: serde_json::Error) -> Self {
        CheckoutError::Serialization(err.to_string())
    }
}

/// Result type alias for checkout operations
pub type CheckoutResult<T> = Result<T, CheckoutError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_errors() {
        assert!(CheckoutError::NetworkError("timeout".into()).is_retryable());
        assert!(CheckoutError::transport("/api/sessions", "create payment session", Some(500))
            .is_retryable());
        assert!(!CheckoutError::InvalidRequest("bad data".into()).is_retryable());
        assert!(!CheckoutError::validation("shopperReference", "too short").is_retryable());
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(
            CheckoutError::InvalidRequest("test".into()).status_code(),
            400
        );
        assert_eq!(
            CheckoutError::SessionNotFound {
                session_id: "x".into()
            }
            .status_code(),
            404
        );
        assert_eq!(
            CheckoutError::WebhookVerificationFailed("bad hmac".into()).status_code(),
            401
        );
    }

    #[test]
    fn test_transport_message() {
        let err = CheckoutError::transport("/api/sessions", "create payment session", Some(500));
        assert_eq!(err.to_string(), "Failed to create payment session: 500");

        let err = CheckoutError::transport("/api/payments/details", "process redirect result", None);
        assert_eq!(err.to_string(), "Failed to process redirect result");
    }

    #[test]
    fn test_validation_message_is_bare() {
        let err = CheckoutError::validation(
            "shopperReference",
            "Shopper Reference must be at least 3 characters",
        );
        assert_eq!(
            err.to_string(),
            "Shopper Reference must be at least 3 characters"
        );
    }
}
