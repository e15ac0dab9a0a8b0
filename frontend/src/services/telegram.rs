use js_sys::{Function, Promise, Reflect};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;

use super::logging::Logger;

/// Wrapper around the `window.Telegram.WebApp` host object.
///
/// Everything here is best-effort: when the app runs outside the Telegram
/// webview (plain browser during development) the bindings degrade to
/// `window.alert`/`window.confirm` and no-op haptics.
#[derive(Clone)]
pub struct TelegramWebApp {
    app: Option<JsValue>,
}

impl TelegramWebApp {
    pub fn connect() -> Self {
        let app = web_sys::window()
            .map(JsValue::from)
            .and_then(|w| Reflect::get(&w, &"Telegram".into()).ok())
            .filter(|v| !v.is_undefined() && !v.is_null())
            .and_then(|t| Reflect::get(&t, &"WebApp".into()).ok())
            .filter(|v| !v.is_undefined() && !v.is_null());
        if app.is_none() {
            Logger::warn_with_component("telegram", "Telegram.WebApp not found, running outside the webview");
        }
        Self { app }
    }

    /// Opaque per-request authentication token supplied by the host.
    /// `None` or empty means the app must not issue any server call.
    pub fn init_data(&self) -> Option<String> {
        let app = self.app.as_ref()?;
        Reflect::get(app, &"initData".into())
            .ok()?
            .as_string()
            .filter(|s| !s.is_empty())
    }

    pub fn ready(&self) {
        self.call0("ready");
    }

    pub fn expand(&self) {
        self.call0("expand");
    }

    /// The list owns vertical swipes; without this, a downward drag on the
    /// list can collapse the whole webview.
    pub fn disable_vertical_swipes(&self) {
        self.call0("disableVerticalSwipes");
    }

    pub fn show_alert(&self, message: &str) {
        if self.call1("showAlert", &JsValue::from_str(message)) {
            return;
        }
        if let Some(window) = web_sys::window() {
            let _ = window.alert_with_message(message);
        }
    }

    /// Native yes/no dialog; resolves once the user answers.
    pub async fn show_confirm(&self, message: &str) -> bool {
        let Some(app) = self.app.clone() else {
            return web_sys::window()
                .and_then(|w| w.confirm_with_message(message).ok())
                .unwrap_or(false);
        };
        let Some(func) = Self::method(&app, "showConfirm") else {
            return false;
        };

        let message = JsValue::from_str(message);
        let promise = Promise::new(&mut |resolve, _reject| {
            let callback = Closure::once_into_js(move |confirmed: JsValue| {
                let _ = resolve.call1(&JsValue::NULL, &confirmed);
            });
            if func
                .call2(&app, &message, callback.unchecked_ref::<Function>())
                .is_err()
            {
                Logger::error_with_component("telegram", "showConfirm call failed");
            }
        });
        JsFuture::from(promise)
            .await
            .map(|v| v.is_truthy())
            .unwrap_or(false)
    }

    /// `style` is one of `light`, `medium`, `heavy`.
    pub fn haptic_impact(&self, style: &str) {
        self.haptic("impactOccurred", style);
    }

    /// `kind` is one of `success`, `warning`, `error`.
    pub fn haptic_notification(&self, kind: &str) {
        self.haptic("notificationOccurred", kind);
    }

    fn haptic(&self, method: &str, argument: &str) {
        let Some(app) = self.app.as_ref() else {
            return;
        };
        let Ok(haptics) = Reflect::get(app, &"HapticFeedback".into()) else {
            return;
        };
        if haptics.is_undefined() || haptics.is_null() {
            return;
        }
        if let Some(func) = Self::method(&haptics, method) {
            let _ = func.call1(&haptics, &JsValue::from_str(argument));
        }
    }

    fn call0(&self, method: &str) -> bool {
        let Some(app) = self.app.as_ref() else {
            return false;
        };
        match Self::method(app, method) {
            Some(func) => func.call0(app).is_ok(),
            None => false,
        }
    }

    fn call1(&self, method: &str, argument: &JsValue) -> bool {
        let Some(app) = self.app.as_ref() else {
            return false;
        };
        match Self::method(app, method) {
            Some(func) => func.call1(app, argument).is_ok(),
            None => false,
        }
    }

    fn method(target: &JsValue, name: &str) -> Option<Function> {
        Reflect::get(target, &name.into())
            .ok()
            .and_then(|v| v.dyn_into::<Function>().ok())
    }
}

// Integration tests that require wasm-bindgen-test
#[cfg(test)]
mod wasm_tests {
    use super::*;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    #[wasm_bindgen_test]
    fn connect_outside_the_webview_degrades_to_no_ops() {
        // The test browser has no Telegram host object.
        let telegram = TelegramWebApp::connect();
        assert!(telegram.init_data().is_none());

        // Host-object calls must be no-ops out here, not panics.
        telegram.ready();
        telegram.expand();
        telegram.disable_vertical_swipes();
        telegram.haptic_impact("light");
        telegram.haptic_notification("success");
    }
}
