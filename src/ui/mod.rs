/// UI module exports
pub mod actions;
pub mod components;
pub mod events_tab;
pub mod popup;
pub mod properties_tab;
pub mod timeline_tab;

use wasm_bindgen_futures::JsFuture;
use yew::Callback;

use crate::analytics;
use crate::bridge::{self, ActiveTab};
use crate::error::{NavigatorError, Result};
use crate::messages::{CurrentEvents, Request};

/// Outcome line shown under the header.
#[derive(Clone, Debug, PartialEq)]
pub enum Status {
    Success(String),
    Error(String),
}

pub type StatusCallback = Callback<Status>;

pub fn report<T>(on_status: &StatusCallback, result: Result<T>, success: impl FnOnce(T) -> String) {
    match result {
        Ok(value) => on_status.emit(Status::Success(success(value))),
        Err(e) => report_error(on_status, e),
    }
}

/// Show the error and send it to telemetry.
pub fn report_error(on_status: &StatusCallback, e: NavigatorError) {
    log::warn!("{}", e);
    on_status.emit(Status::Error(e.to_string()));
    wasm_bindgen_futures::spawn_local(async move {
        analytics::track_error(&e, serde_json::json!({ "surface": "popup" })).await;
    });
}

/// User-facing text for a failed request to the page.
pub fn page_error_message(e: &NavigatorError) -> String {
    match e {
        NavigatorError::Bridge(msg) if msg.contains("invalidated") => {
            "Extension updated. Please refresh the page.".to_string()
        }
        _ if e.is_connection_error() => "Please refresh the Mixpanel page".to_string(),
        other => format!("Error: {}", other),
    }
}

/// The content script answers `getCurrentEvents` on any feed page it runs on.
pub async fn content_script_loaded(tab: &ActiveTab) -> bool {
    bridge::send_tab_message::<_, CurrentEvents>(tab.id, &Request::GetCurrentEvents)
        .await
        .is_ok()
}

pub async fn sleep(ms: u32) {
    let promise = js_sys::Promise::new(&mut |resolve, _reject| {
        if let Some(window) = web_sys::window() {
            let _ = window.set_timeout_with_callback_and_timeout_and_arguments_0(&resolve, ms as i32);
        }
    });
    let _ = JsFuture::from(promise).await;
}
