/// Bindings to the extension APIs exposed by `js/bridge.js`
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use wasm_bindgen::prelude::*;

use crate::error::{NavigatorError, Result};

#[wasm_bindgen(module = "/js/bridge.js")]
extern "C" {
    #[wasm_bindgen(catch)]
    async fn getStorage(keys: JsValue) -> std::result::Result<JsValue, JsValue>;

    #[wasm_bindgen(catch)]
    async fn setStorage(items: JsValue) -> std::result::Result<(), JsValue>;

    fn onStorageChanged(callback: &js_sys::Function);

    #[wasm_bindgen(catch)]
    async fn getActiveTab() -> std::result::Result<JsValue, JsValue>;

    #[wasm_bindgen(catch)]
    async fn sendTabMessage(tab_id: i32, message: JsValue) -> std::result::Result<JsValue, JsValue>;

    #[wasm_bindgen(catch)]
    async fn updateTabUrl(tab_id: i32, url: &str) -> std::result::Result<(), JsValue>;

    #[wasm_bindgen(catch)]
    async fn createTab(url: &str) -> std::result::Result<(), JsValue>;

    fn onRuntimeMessage(handler: &js_sys::Function);

    #[wasm_bindgen(catch)]
    fn getManifestVersion() -> std::result::Result<String, JsValue>;

    #[wasm_bindgen(catch)]
    async fn copyToClipboard(text: &str) -> std::result::Result<(), JsValue>;

    fn exportToFile(data: &str, filename: &str);

    #[wasm_bindgen(catch)]
    async fn postJson(url: &str, body: &str) -> std::result::Result<JsValue, JsValue>;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActiveTab {
    pub id: i32,
    pub url: String,
}

pub async fn storage_get<T: DeserializeOwned>(keys: &[&str]) -> Result<T> {
    let keys_js = serde_wasm_bindgen::to_value(keys)?;
    let items = getStorage(keys_js).await.map_err(NavigatorError::from_js)?;
    Ok(serde_wasm_bindgen::from_value(items)?)
}

pub async fn storage_set<T: Serialize>(items: &T) -> Result<()> {
    let serializer = serde_wasm_bindgen::Serializer::json_compatible();
    let items_js = items.serialize(&serializer)?;
    setStorage(items_js).await.map_err(NavigatorError::from_js)
}

/// `callback` receives the names of the keys that changed in local storage.
pub fn on_storage_changed(mut callback: impl FnMut(Vec<String>) + 'static) {
    let closure = Closure::wrap(Box::new(move |keys: JsValue| {
        let keys: Vec<String> = serde_wasm_bindgen::from_value(keys).unwrap_or_default();
        callback(keys);
    }) as Box<dyn FnMut(JsValue)>);
    onStorageChanged(closure.as_ref().unchecked_ref());
    // Listener lives as long as the page.
    closure.forget();
}

pub async fn active_tab() -> Result<Option<ActiveTab>> {
    let tab = getActiveTab().await.map_err(NavigatorError::from_js)?;
    if tab.is_null() || tab.is_undefined() {
        return Ok(None);
    }
    Ok(Some(serde_wasm_bindgen::from_value(tab)?))
}

pub async fn send_tab_message<Req, Resp>(tab_id: i32, request: &Req) -> Result<Resp>
where
    Req: Serialize,
    Resp: DeserializeOwned,
{
    let serializer = serde_wasm_bindgen::Serializer::json_compatible();
    let message = request.serialize(&serializer)?;
    let response = sendTabMessage(tab_id, message).await.map_err(NavigatorError::from_js)?;
    if response.is_undefined() {
        return Err(NavigatorError::Bridge("No response from content script".to_string()));
    }
    Ok(serde_wasm_bindgen::from_value(response)?)
}

pub async fn navigate_tab(tab: Option<&ActiveTab>, url: &str) -> Result<()> {
    let result = match tab {
        Some(tab) => updateTabUrl(tab.id, url).await,
        None => createTab(url).await,
    };
    result.map_err(NavigatorError::from_js)
}

/// Register the content script's message handler. The handler answers synchronously.
pub fn on_runtime_message(handler: impl Fn(JsValue) -> JsValue + 'static) {
    let closure = Closure::wrap(Box::new(handler) as Box<dyn Fn(JsValue) -> JsValue>);
    onRuntimeMessage(closure.as_ref().unchecked_ref());
    closure.forget();
}

pub fn manifest_version() -> String {
    getManifestVersion().unwrap_or_else(|_| env!("CARGO_PKG_VERSION").to_string())
}

pub async fn copy_to_clipboard(text: &str) -> Result<()> {
    copyToClipboard(text).await.map_err(NavigatorError::from_js)
}

pub fn download_text(content: &str, filename: &str) {
    exportToFile(content, filename);
}

pub async fn post_json(url: &str, body: &str) -> Result<u16> {
    let status = postJson(url, body).await.map_err(NavigatorError::from_js)?;
    Ok(status.as_f64().unwrap_or_default() as u16)
}

pub fn confirm(message: &str) -> bool {
    web_sys::window()
        .and_then(|window| window.confirm_with_message(message).ok())
        .unwrap_or(false)
}
