//! Browser implementations of the flow's collaborators:
//! `sessionStorage`, `window.location` and the checkout page's DOM.

use checkout_core::{CheckoutError, CheckoutResult, CheckoutUi, Navigator, OutcomeStore};
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{Document, HtmlElement, HtmlInputElement, Storage};

/// Readable text of a thrown JS value
pub fn js_message(value: &JsValue) -> String {
    if let Some(text) = value.as_string() {
        return text;
    }
    js_sys::Reflect::get(value, &JsValue::from_str("message"))
        .ok()
        .and_then(|m| m.as_string())
        .unwrap_or_else(|| format!("{:?}", value))
}

/// Id of the inline message element next to a form field
pub fn field_error_id(field: &str) -> String {
    format!("{}-error", field)
}

/// Tab-scoped `sessionStorage`
#[derive(Debug, Default, Clone, Copy)]
pub struct SessionStorageStore;

impl SessionStorageStore {
    fn storage(&self) -> CheckoutResult<Storage> {
        let window = web_sys::window()
            .ok_or_else(|| CheckoutError::Storage("no window".to_string()))?;
        window
            .session_storage()
            .map_err(|e| CheckoutError::Storage(js_message(&e)))?
            .ok_or_else(|| CheckoutError::Storage("sessionStorage is unavailable".to_string()))
    }
}

impl OutcomeStore for SessionStorageStore {
    fn set_item(&self, key: &str, value: &str) -> CheckoutResult<()> {
        self.storage()?
            .set_item(key, value)
            .map_err(|e| CheckoutError::Storage(js_message(&e)))
    }

    fn get_item(&self, key: &str) -> CheckoutResult<Option<String>> {
        self.storage()?
            .get_item(key)
            .map_err(|e| CheckoutError::Storage(js_message(&e)))
    }

    fn remove_item(&self, key: &str) -> CheckoutResult<()> {
        self.storage()?
            .remove_item(key)
            .map_err(|e| CheckoutError::Storage(js_message(&e)))
    }
}

/// Navigates by assigning `window.location.href`
#[derive(Debug, Default, Clone, Copy)]
pub struct WindowNavigator;

impl Navigator for WindowNavigator {
    fn navigate(&self, path: &str) {
        let Some(window) = web_sys::window() else {
            return;
        };
        if let Err(e) = window.location().set_href(path) {
            crate::log(&format!("Navigation to {} failed: {}", path, js_message(&e)));
        }
    }
}

/// Element ids the checkout page provides
#[derive(Debug, Clone)]
pub struct PageElements {
    pub loading: String,
    pub error: String,
    pub modal: String,
    pub pay_button: String,
}

impl Default for PageElements {
    fn default() -> Self {
        Self {
            loading: "loading".to_string(),
            error: "error".to_string(),
            modal: "payment-modal".to_string(),
            pay_button: "pay-button".to_string(),
        }
    }
}

/// The checkout page. Missing elements are skipped.
pub struct DomUi {
    document: Document,
    elements: PageElements,
}

impl DomUi {
    pub fn new(document: Document, elements: PageElements) -> Self {
        Self { document, elements }
    }

    /// Current page's document with the default element ids
    pub fn from_window() -> CheckoutResult<Self> {
        let document = web_sys::window()
            .and_then(|w| w.document())
            .ok_or_else(|| CheckoutError::Internal("no document".to_string()))?;
        Ok(Self::new(document, PageElements::default()))
    }

    fn element(&self, id: &str) -> Option<HtmlElement> {
        self.document
            .get_element_by_id(id)
            .and_then(|el| el.dyn_into::<HtmlElement>().ok())
    }

    fn set_display(&self, id: &str, visible: bool) {
        if let Some(el) = self.element(id) {
            let _ = el
                .style()
                .set_property("display", if visible { "block" } else { "none" });
        }
    }

    fn set_text(&self, id: &str, message: Option<&str>) {
        if let Some(el) = self.element(id) {
            el.set_text_content(message);
        }
    }
}

impl CheckoutUi for DomUi {
    fn set_busy(&self, busy: bool) {
        self.set_display(&self.elements.loading, busy);
        if let Some(button) = self
            .document
            .get_element_by_id(&self.elements.pay_button)
        {
            let _ = if busy {
                button.set_attribute("disabled", "")
            } else {
                button.remove_attribute("disabled")
            };
        }
    }

    fn show_error(&self, message: &str) {
        self.set_text(&self.elements.error, Some(message));
        self.set_display(&self.elements.error, true);
    }

    fn clear_error(&self) {
        self.set_display(&self.elements.error, false);
    }

    fn show_field_error(&self, field: &str, message: &str) {
        let message_id = field_error_id(field);
        self.set_text(&message_id, Some(message));
        self.set_display(&message_id, true);
        if let Some(input) = self
            .document
            .get_element_by_id(field)
            .and_then(|el| el.dyn_into::<HtmlInputElement>().ok())
        {
            let _ = input.class_list().add_1("is-invalid");
            let _ = input.focus();
        }
    }

    fn clear_field_error(&self, field: &str) {
        let message_id = field_error_id(field);
        self.set_text(&message_id, None);
        self.set_display(&message_id, false);
        if let Some(input) = self.document.get_element_by_id(field) {
            let _ = input.class_list().remove_1("is-invalid");
        }
    }

    fn open_modal(&self) {
        self.set_display(&self.elements.modal, true);
    }

    fn close_modal(&self) {
        self.set_display(&self.elements.modal, false);
    }
}
