//! `window.history` bindings.

use tracing::warn;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{PopStateEvent, Window};

use super::hash::hash_history;
use super::web::{BrowserApi, BrowserLocation, EntryState, PopStateHandler, WebHistory};
use crate::error::{NavError, Result};
use crate::subscription::Subscription;

fn js_error(error: &JsValue) -> String {
    format!("{error:?}")
}

fn state_to_js(state: &EntryState) -> std::result::Result<JsValue, String> {
    let json = serde_json::to_string(state).map_err(|e| e.to_string())?;
    js_sys::JSON::parse(&json).map_err(|e| js_error(&e))
}

fn state_from_js(value: &JsValue) -> Option<EntryState> {
    if value.is_null() || value.is_undefined() {
        return None;
    }
    let json: String = js_sys::JSON::stringify(value).ok()?.into();
    serde_json::from_str(&json).ok()
}

/// [`BrowserApi`] backed by the global `window`.
pub struct WindowApi {
    window: Window,
}

impl WindowApi {
    /// Binds to the global `window`.
    pub fn new() -> Result<Self> {
        let window = web_sys::window().ok_or_else(|| NavError::History("no global window".into()))?;
        Ok(Self { window })
    }
}

impl BrowserApi for WindowApi {
    fn location(&self) -> BrowserLocation {
        let location = self.window.location();
        BrowserLocation {
            pathname: location.pathname().unwrap_or_else(|_| "/".to_string()),
            search: location.search().unwrap_or_default(),
            hash: location.hash().unwrap_or_default(),
        }
    }

    fn state(&self) -> Option<EntryState> {
        let state = self.window.history().ok()?.state().ok()?;
        state_from_js(&state)
    }

    fn base_href(&self) -> Option<String> {
        self.window
            .document()?
            .query_selector("base")
            .ok()??
            .get_attribute("href")
    }

    fn push_state(&self, state: &EntryState, url: &str) -> std::result::Result<(), String> {
        let history = self.window.history().map_err(|e| js_error(&e))?;
        history
            .push_state_with_url(&state_to_js(state)?, "", Some(url))
            .map_err(|e| js_error(&e))
    }

    fn replace_state(&self, state: &EntryState, url: &str) -> std::result::Result<(), String> {
        let history = self.window.history().map_err(|e| js_error(&e))?;
        history
            .replace_state_with_url(&state_to_js(state)?, "", Some(url))
            .map_err(|e| js_error(&e))
    }

    fn assign(&self, url: &str) -> std::result::Result<(), String> {
        self.window.location().assign(url).map_err(|e| js_error(&e))
    }

    fn replace_location(&self, url: &str) -> std::result::Result<(), String> {
        self.window.location().replace(url).map_err(|e| js_error(&e))
    }

    fn go(&self, delta: i64) {
        let delta = i32::try_from(delta).unwrap_or(if delta < 0 { i32::MIN } else { i32::MAX });
        let result = self
            .window
            .history()
            .and_then(|history| history.go_with_delta(delta));
        if let Err(error) = result {
            warn!(error = %js_error(&error), "history.go failed");
        }
    }

    fn on_popstate(&self, handler: PopStateHandler) -> Subscription {
        let closure = Closure::wrap(Box::new(move |event: PopStateEvent| {
            handler(state_from_js(&event.state()));
        }) as Box<dyn Fn(PopStateEvent)>);

        if let Err(error) = self
            .window
            .add_event_listener_with_callback("popstate", closure.as_ref().unchecked_ref())
        {
            warn!(error = %js_error(&error), "could not attach popstate listener");
            return Subscription::noop();
        }

        let window = self.window.clone();
        Subscription::new(move || {
            if let Err(error) = window
                .remove_event_listener_with_callback("popstate", closure.as_ref().unchecked_ref())
            {
                warn!(error = %js_error(&error), "could not detach popstate listener");
            }
            drop(closure);
        })
    }
}

/// Browser history over `window.history`.
pub fn browser_history(base: Option<&str>) -> Result<WebHistory<WindowApi>> {
    Ok(WebHistory::new(WindowApi::new()?, base))
}

/// Hash history over `window.history`.
pub fn browser_hash_history(base: Option<&str>) -> Result<WebHistory<WindowApi>> {
    Ok(hash_history(WindowApi::new()?, base))
}
