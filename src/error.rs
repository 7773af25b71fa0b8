/// Error type shared by the popup and the content script

use thiserror::Error;
use wasm_bindgen::JsValue;

#[derive(Debug, Error)]
pub enum NavigatorError {
    #[error("browser API call failed: {0}")]
    Bridge(String),

    #[error("failed to convert value: {0}")]
    Convert(#[from] serde_wasm_bindgen::Error),

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Failure reported back by the content script.
    #[error("{0}")]
    Page(String),

    #[error("Not on activity feed page")]
    NotOnActivityFeed,

    #[error("{0}")]
    NotFound(&'static str),

    #[error("{0} cannot be empty")]
    EmptyName(&'static str),

    #[error("{0} already exists")]
    AlreadyExists(String),

    #[error("{0}")]
    NothingToDo(&'static str),
}

impl NavigatorError {
    /// Wrap a rejected promise or thrown JS exception.
    pub fn from_js(value: JsValue) -> Self {
        let message = value
            .as_string()
            .or_else(|| {
                js_sys::Reflect::get(&value, &JsValue::from_str("message"))
                    .ok()
                    .and_then(|m| m.as_string())
            })
            .unwrap_or_else(|| format!("{:?}", value));
        NavigatorError::Bridge(message)
    }

    /// The page has no content script listening (stale tab after an update).
    pub fn is_connection_error(&self) -> bool {
        matches!(self, NavigatorError::Bridge(msg)
            if msg.contains("Could not establish connection") || msg.contains("invalidated"))
    }
}

pub type Result<T> = std::result::Result<T, NavigatorError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        assert_eq!(NavigatorError::NotOnActivityFeed.to_string(), "Not on activity feed page");
        assert_eq!(NavigatorError::EmptyName("Event name").to_string(), "Event name cannot be empty");
        assert_eq!(
            NavigatorError::AlreadyExists("Event".to_string()).to_string(),
            "Event already exists"
        );
        assert_eq!(NavigatorError::Page("Event not found on page".to_string()).to_string(), "Event not found on page");
    }

    #[test]
    fn test_connection_error_detection() {
        let err = NavigatorError::Bridge(
            "Could not establish connection. Receiving end does not exist.".to_string(),
        );
        assert!(err.is_connection_error());
        assert!(!NavigatorError::NotFound("Event not found on page").is_connection_error());
    }
}
