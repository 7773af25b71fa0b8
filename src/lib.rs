/// Activity Navigator - Chrome extension for Mixpanel activity feeds
/// Built with Rust + WASM + Yew

pub mod analytics;
pub mod bridge;
pub mod config;
pub mod content;
pub mod error;
pub mod events;
pub mod hash;
pub mod messages;
pub mod page;
pub mod properties;
pub mod storage;
pub mod timeline;
pub mod ui;

use wasm_bindgen::prelude::*;

use crate::config::ExtensionConfig;

// Set up panic hook for better error messages in the browser console
#[wasm_bindgen(start)]
pub fn main() {
    console_error_panic_hook::set_once();
    let config = ExtensionConfig::from_build_env();
    wasm_logger::init(wasm_logger::Config::new(config.log_level()));
}

// Start the Yew app for the popup
#[wasm_bindgen]
pub fn start_popup() {
    yew::Renderer::<ui::popup::App>::new().render();
}

// Attach to the host page
#[wasm_bindgen]
pub fn start_content_script() {
    content::start();
}
