//! Access to the page the console runs in
//!
//! Login and logout navigate the whole page. Everything that touches
//! `window.location` or `sessionStorage` goes through [`BrowserEnv`] so the
//! session logic can run outside a browser.

use std::rc::Rc;
use web_sys::Storage;

pub trait BrowserEnv {
    /// Full URL of the current page
    fn current_url(&self) -> String;

    /// Scheme, host and port of the current page
    fn origin(&self) -> String;

    /// Navigate away; the page unloads
    fn assign(&self, url: &str);

    /// Rewrite the address bar without loading anything
    fn replace_url(&self, url: &str);

    /// Reload the current page
    fn reload(&self);

    fn session_get(&self, key: &str) -> Option<String>;
    fn session_set(&self, key: &str, value: &str);
    fn session_remove(&self, key: &str);
}

/// [`BrowserEnv`] backed by `web_sys::window()`
#[derive(Clone, Copy, Debug, Default)]
pub struct WebEnv;

impl WebEnv {
    pub fn shared() -> Rc<dyn BrowserEnv> {
        Rc::new(Self)
    }
}

/// Get sessionStorage
fn get_session_storage() -> Option<Storage> {
    web_sys::window().and_then(|w| w.session_storage().ok().flatten())
}

impl BrowserEnv for WebEnv {
    fn current_url(&self) -> String {
        web_sys::window()
            .and_then(|w| w.location().href().ok())
            .unwrap_or_default()
    }

    fn origin(&self) -> String {
        web_sys::window()
            .and_then(|w| w.location().origin().ok())
            .unwrap_or_default()
    }

    fn assign(&self, url: &str) {
        if let Some(window) = web_sys::window() {
            if let Err(error) = window.location().assign(url) {
                tracing::error!(?error, url, "navigation failed");
            }
        }
    }

    fn replace_url(&self, url: &str) {
        if let Some(history) = web_sys::window().and_then(|w| w.history().ok()) {
            let _ = history.replace_state_with_url(&wasm_bindgen::JsValue::NULL, "", Some(url));
        }
    }

    fn reload(&self) {
        if let Some(window) = web_sys::window() {
            let _ = window.location().reload();
        }
    }

    fn session_get(&self, key: &str) -> Option<String> {
        get_session_storage().and_then(|storage| storage.get_item(key).ok().flatten())
    }

    fn session_set(&self, key: &str, value: &str) {
        if let Some(storage) = get_session_storage() {
            let _ = storage.set_item(key, value);
        }
    }

    fn session_remove(&self, key: &str) {
        if let Some(storage) = get_session_storage() {
            let _ = storage.remove_item(key);
        }
    }
}
