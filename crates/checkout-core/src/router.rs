//! # Redirect Router
//!
//! Applies a [`Classification`]: writes the outcome to tab storage and
//! navigates to the destination page. Navigation always happens, even
//! when storage refuses the write.
//!
//! Storage layout (tab-scoped, string keys):
//!
//! | Key | Value | Written for |
//! |-----|-------|-------------|
//! | `paymentResult` | serialized outcome | every destination |
//! | `pendingPayment` | serialized outcome | pending |
//! | `paymentError` | human-readable message | failed |

use crate::classify::{
    classify, failure_message, Classification, ClassifyPolicy, CompletionPath, Destination,
};
use crate::error::{CheckoutError, CheckoutResult};
use crate::outcome::PaymentOutcome;
use crate::settings::DestinationPaths;
use std::cell::RefCell;
use std::collections::HashMap;
use tracing::{debug, info, warn};

pub const PAYMENT_RESULT_KEY: &str = "paymentResult";
pub const PENDING_PAYMENT_KEY: &str = "pendingPayment";
pub const PAYMENT_ERROR_KEY: &str = "paymentError";

/// Message stored when the outcome itself could not be stored, or the SDK gave none
pub const GENERIC_ERROR_MESSAGE: &str = "Something went wrong with the payment";

/// Tab-scoped key/value storage (`sessionStorage` in the browser)
pub trait OutcomeStore {
    fn set_item(&self, key: &str, value: &str) -> CheckoutResult<()>;

    fn get_item(&self, key: &str) -> CheckoutResult<Option<String>>;

    fn remove_item(&self, key: &str) -> CheckoutResult<()>;
}

/// Page navigation (`window.location` in the browser)
pub trait Navigator {
    fn navigate(&self, path: &str);
}

/// In-memory [`OutcomeStore`]
#[derive(Debug, Default)]
pub struct MemoryStore {
    items: RefCell<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys
    pub fn len(&self) -> usize {
        self.items.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.borrow().is_empty()
    }
}

impl OutcomeStore for MemoryStore {
    fn set_item(&self, key: &str, value: &str) -> CheckoutResult<()> {
        self.items
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn get_item(&self, key: &str) -> CheckoutResult<Option<String>> {
        Ok(self.items.borrow().get(key).cloned())
    }

    fn remove_item(&self, key: &str) -> CheckoutResult<()> {
        self.items.borrow_mut().remove(key);
        Ok(())
    }
}

/// Classification plus effect application
pub struct ResultRouter<S, N> {
    store: S,
    navigator: N,
    paths: DestinationPaths,
    direct_policy: ClassifyPolicy,
    redirect_policy: ClassifyPolicy,
}

impl<S: OutcomeStore, N: Navigator> ResultRouter<S, N> {
    pub fn new(store: S, navigator: N) -> Self {
        Self {
            store,
            navigator,
            paths: DestinationPaths::default(),
            direct_policy: ClassifyPolicy::for_path(CompletionPath::Direct),
            redirect_policy: ClassifyPolicy::for_path(CompletionPath::RedirectContinuation),
        }
    }

    /// Builder: set destination page paths
    pub fn with_paths(mut self, paths: DestinationPaths) -> Self {
        self.paths = paths;
        self
    }

    /// Builder: use one policy for every completion path
    pub fn with_policy(mut self, policy: ClassifyPolicy) -> Self {
        self.direct_policy = policy;
        self.redirect_policy = policy;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn navigator(&self) -> &N {
        &self.navigator
    }

    /// Policy used for a completion path
    pub fn policy(&self, path: CompletionPath) -> ClassifyPolicy {
        match path {
            CompletionPath::Direct => self.direct_policy,
            CompletionPath::RedirectContinuation => self.redirect_policy,
        }
    }

    /// Classify, persist and navigate
    pub fn route(&self, outcome: &PaymentOutcome, path: CompletionPath) -> Destination {
        let classification = classify(outcome, self.policy(path));
        self.apply(&classification)
    }

    /// Persist and navigate to the failed page regardless of the result code
    /// (`onPaymentFailed`)
    pub fn route_failed(&self, outcome: &PaymentOutcome) -> Destination {
        let classification = Classification {
            destination: Destination::Failed,
            stored_result: outcome.clone(),
            pending_result: None,
            stored_message: Some(failure_message(outcome)),
        };
        self.apply(&classification)
    }

    /// Navigate to the failed page with a message and no outcome
    /// (`onError`, failed details submission)
    pub fn fail(&self, message: &str) -> Destination {
        let message = if message.trim().is_empty() {
            GENERIC_ERROR_MESSAGE
        } else {
            message
        };
        if let Err(e) = self.store.set_item(PAYMENT_ERROR_KEY, message) {
            warn!("Could not store payment error: {}", e);
        }
        self.go(Destination::Failed)
    }

    /// Apply a classification. Storage failures send the shopper to the
    /// failed page with [`GENERIC_ERROR_MESSAGE`].
    pub fn apply(&self, classification: &Classification) -> Destination {
        match self.persist(classification) {
            Ok(()) => {
                info!(
                    "Routing payment result {:?} to {}",
                    classification.stored_result.result_code, classification.destination
                );
                self.go(classification.destination)
            }
            Err(e) => {
                warn!("Could not persist payment result, routing to failed: {}", e);
                self.clear_stale(PAYMENT_RESULT_KEY);
                self.clear_stale(PENDING_PAYMENT_KEY);
                if let Err(e) = self.store.set_item(PAYMENT_ERROR_KEY, GENERIC_ERROR_MESSAGE) {
                    warn!("Could not store fallback payment error: {}", e);
                }
                self.go(Destination::Failed)
            }
        }
    }

    fn persist(&self, classification: &Classification) -> CheckoutResult<()> {
        let serialized = serde_json::to_string(&classification.stored_result)?;
        self.store.set_item(PAYMENT_RESULT_KEY, &serialized)?;

        match &classification.pending_result {
            Some(pending) => {
                let serialized = serde_json::to_string(pending)?;
                self.store.set_item(PENDING_PAYMENT_KEY, &serialized)?;
            }
            None => self.clear_stale(PENDING_PAYMENT_KEY),
        }

        match &classification.stored_message {
            Some(message) => self.store.set_item(PAYMENT_ERROR_KEY, message)?,
            None => self.clear_stale(PAYMENT_ERROR_KEY),
        }

        Ok(())
    }

    // Values left over from an earlier attempt in the same tab
    fn clear_stale(&self, key: &str) {
        if let Err(e) = self.store.remove_item(key) {
            debug!("Could not clear {}: {}", key, e);
        }
    }

    fn go(&self, destination: Destination) -> Destination {
        self.navigator.navigate(self.paths.path_for(destination));
        destination
    }
}

/// What a destination page finds in storage. Taking it removes it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StoredResult {
    pub outcome: Option<PaymentOutcome>,
    pub pending: Option<PaymentOutcome>,
    pub error: Option<String>,
}

impl StoredResult {
    /// Read and remove all stored values
    pub fn take(store: &impl OutcomeStore) -> CheckoutResult<Self> {
        let outcome = take_json(store, PAYMENT_RESULT_KEY)?;
        let pending = take_json(store, PENDING_PAYMENT_KEY)?;
        let error = store.get_item(PAYMENT_ERROR_KEY)?;
        store.remove_item(PAYMENT_ERROR_KEY)?;

        Ok(Self {
            outcome,
            pending,
            error,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.outcome.is_none() && self.pending.is_none() && self.error.is_none()
    }
}

fn take_json(store: &impl OutcomeStore, key: &str) -> CheckoutResult<Option<PaymentOutcome>> {
    let Some(raw) = store.get_item(key)? else {
        return Ok(None);
    };
    store.remove_item(key)?;
    serde_json::from_str(&raw)
        .map(Some)
        .map_err(|e| CheckoutError::Serialization(format!("{} is not a payment result: {}", key, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::cell::RefCell;

    #[derive(Default)]
    struct RecordingNavigator {
        visited: RefCell<Vec<String>>,
    }

    impl Navigator for RecordingNavigator {
        fn navigate(&self, path: &str) {
            self.visited.borrow_mut().push(path.to_string());
        }
    }

    impl RecordingNavigator {
        fn last(&self) -> Option<String> {
            self.visited.borrow().last().cloned()
        }
    }

    /// Store whose writes always fail
    struct BrokenStore;

    impl OutcomeStore for BrokenStore {
        fn set_item(&self, _key: &str, _value: &str) -> CheckoutResult<()> {
            Err(CheckoutError::Storage("QuotaExceededError".to_string()))
        }

        fn get_item(&self, _key: &str) -> CheckoutResult<Option<String>> {
            Ok(None)
        }

        fn remove_item(&self, _key: &str) -> CheckoutResult<()> {
            Ok(())
        }
    }

    /// Store that accepts only the error message
    #[derive(Default)]
    struct ErrorOnlyStore {
        inner: MemoryStore,
    }

    impl OutcomeStore for ErrorOnlyStore {
        fn set_item(&self, key: &str, value: &str) -> CheckoutResult<()> {
            if key == PAYMENT_ERROR_KEY {
                self.inner.set_item(key, value)
            } else {
                Err(CheckoutError::Storage("write refused".to_string()))
            }
        }

        fn get_item(&self, key: &str) -> CheckoutResult<Option<String>> {
            self.inner.get_item(key)
        }

        fn remove_item(&self, key: &str) -> CheckoutResult<()> {
            self.inner.remove_item(key)
        }
    }

    /// Store that refuses the pending copy only
    #[derive(Default)]
    struct NoPendingStore {
        inner: MemoryStore,
    }

    impl OutcomeStore for NoPendingStore {
        fn set_item(&self, key: &str, value: &str) -> CheckoutResult<()> {
            if key == PENDING_PAYMENT_KEY {
                return Err(CheckoutError::Storage("write refused".to_string()));
            }
            self.inner.set_item(key, value)
        }

        fn get_item(&self, key: &str) -> CheckoutResult<Option<String>> {
            self.inner.get_item(key)
        }

        fn remove_item(&self, key: &str) -> CheckoutResult<()> {
            self.inner.remove_item(key)
        }
    }

    fn router() -> ResultRouter<MemoryStore, RecordingNavigator> {
        ResultRouter::new(MemoryStore::new(), RecordingNavigator::default())
    }

    fn outcome(value: serde_json::Value) -> PaymentOutcome {
        serde_json::from_value(value).unwrap()
    }

    fn stored(router: &ResultRouter<MemoryStore, RecordingNavigator>, key: &str) -> Option<String> {
        router.store().get_item(key).unwrap()
    }

    #[test]
    fn test_authorised_goes_to_success_with_full_object() {
        let router = router();
        let o = outcome(json!({"resultCode": "Authorised", "pspReference": "psp1"}));

        let dest = router.route(&o, CompletionPath::Direct);

        assert_eq!(dest, Destination::Success);
        assert_eq!(router.navigator().last().as_deref(), Some("/success"));
        let saved: serde_json::Value =
            serde_json::from_str(&stored(&router, PAYMENT_RESULT_KEY).unwrap()).unwrap();
        assert_eq!(saved, json!({"resultCode": "Authorised", "pspReference": "psp1"}));
        assert!(stored(&router, PAYMENT_ERROR_KEY).is_none());
    }

    #[test]
    fn test_pending_writes_both_keys() {
        let router = router();

        let dest = router.route(&outcome(json!({"resultCode": "pending"})), CompletionPath::Direct);

        assert_eq!(dest, Destination::Pending);
        assert_eq!(router.navigator().last().as_deref(), Some("/pending"));
        assert!(stored(&router, PAYMENT_RESULT_KEY).is_some());
        assert_eq!(
            stored(&router, PENDING_PAYMENT_KEY),
            stored(&router, PAYMENT_RESULT_KEY)
        );
    }

    #[test]
    fn test_refused_stores_message_from_code() {
        let router = router();
        let o = outcome(json!({"resultCode": "refused", "refusalReason": "Insufficient funds"}));

        let dest = router.route(&o, CompletionPath::Direct);

        assert_eq!(dest, Destination::Failed);
        assert_eq!(router.navigator().last().as_deref(), Some("/failed"));
        assert_eq!(
            stored(&router, PAYMENT_ERROR_KEY).as_deref(),
            Some("Payment failed: refused")
        );
    }

    #[test]
    fn test_empty_outcome_uses_fallback_reason() {
        let router = router();

        let dest = router.route(&outcome(json!({})), CompletionPath::Direct);

        assert_eq!(dest, Destination::Failed);
        let message = stored(&router, PAYMENT_ERROR_KEY).unwrap();
        assert!(message.contains("Unknown reason"));
    }

    #[test]
    fn test_storage_failure_still_navigates_to_failed() {
        let router = ResultRouter::new(BrokenStore, RecordingNavigator::default());

        let dest = router.route(
            &outcome(json!({"resultCode": "Authorised"})),
            CompletionPath::Direct,
        );

        assert_eq!(dest, Destination::Failed);
        assert_eq!(router.navigator().last().as_deref(), Some("/failed"));
    }

    #[test]
    fn test_storage_failure_keeps_generic_message_when_possible() {
        let router = ResultRouter::new(ErrorOnlyStore::default(), RecordingNavigator::default());

        router.route(&outcome(json!({"resultCode": "Pending"})), CompletionPath::Direct);

        assert_eq!(
            router.store().get_item(PAYMENT_ERROR_KEY).unwrap().as_deref(),
            Some(GENERIC_ERROR_MESSAGE)
        );
        assert_eq!(router.navigator().last().as_deref(), Some("/failed"));
    }

    #[test]
    fn test_partial_write_leaves_no_outcome_behind() {
        let router = ResultRouter::new(NoPendingStore::default(), RecordingNavigator::default());

        let dest = router.route(&outcome(json!({"resultCode": "Received"})), CompletionPath::Direct);

        assert_eq!(dest, Destination::Failed);
        assert_eq!(router.store().get_item(PAYMENT_RESULT_KEY).unwrap(), None);
        assert_eq!(
            router.store().get_item(PAYMENT_ERROR_KEY).unwrap().as_deref(),
            Some(GENERIC_ERROR_MESSAGE)
        );
    }

    #[test]
    fn test_routing_twice_is_stable() {
        let router = router();
        let o = outcome(json!({"resultCode": "Refused", "pspReference": "p"}));

        let first = router.route(&o, CompletionPath::Direct);
        let first_value = stored(&router, PAYMENT_RESULT_KEY);
        let second = router.route(&o, CompletionPath::Direct);

        assert_eq!(first, second);
        assert_eq!(first_value, stored(&router, PAYMENT_RESULT_KEY));
    }

    #[test]
    fn test_success_clears_stale_error() {
        let router = router();
        router.fail("old failure");

        router.route(&outcome(json!({"resultCode": "Authorised"})), CompletionPath::Direct);

        assert!(stored(&router, PAYMENT_ERROR_KEY).is_none());
    }

    #[test]
    fn test_fail_uses_generic_message_for_blank() {
        let router = router();

        router.fail("  ");

        assert_eq!(
            stored(&router, PAYMENT_ERROR_KEY).as_deref(),
            Some(GENERIC_ERROR_MESSAGE)
        );
        assert!(stored(&router, PAYMENT_RESULT_KEY).is_none());
    }

    #[test]
    fn test_route_failed_ignores_code() {
        let router = router();
        let o = outcome(json!({"refusalReason": "Expired Card"}));

        assert_eq!(router.route_failed(&o), Destination::Failed);
        assert_eq!(
            stored(&router, PAYMENT_ERROR_KEY).as_deref(),
            Some("Payment failed: Expired Card")
        );
    }

    #[test]
    fn test_custom_paths() {
        let paths = DestinationPaths {
            success: "/checkout/done".to_string(),
            ..DestinationPaths::default()
        };
        let router = router().with_paths(paths);

        router.route(&PaymentOutcome::with_code("Authorised"), CompletionPath::Direct);

        assert_eq!(router.navigator().last().as_deref(), Some("/checkout/done"));
    }

    #[test]
    fn test_stored_result_is_read_once() {
        let router = router();
        router.route(&PaymentOutcome::with_code("Received"), CompletionPath::Direct);

        let first = StoredResult::take(router.store()).unwrap();
        assert_eq!(
            first.outcome.as_ref().and_then(|o| o.result_code.as_deref()),
            Some("Received")
        );
        assert!(first.pending.is_some());

        let second = StoredResult::take(router.store()).unwrap();
        assert!(second.is_empty());
        assert!(router.store().is_empty());
    }
}
