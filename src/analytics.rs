/// Usage telemetry over the GA4 measurement protocol, enabled only when the
/// build carries credentials
use std::sync::LazyLock;

use log::{debug, warn};
use regex::Regex;
use serde::Serialize;
use serde_json::{Map, Value, json};
use uuid::Uuid;

use crate::bridge;
use crate::config::{EXTENSION_NAME, ExtensionConfig};
use crate::error::Result;
use crate::storage::{self, AnalyticsIdentity};

const SESSION_KEY: &str = "analytics_session_id";

static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Payload {
    pub client_id: String,
    pub events: Vec<PayloadEvent>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PayloadEvent {
    pub name: String,
    pub params: Map<String, Value>,
}

/// `Apply Events` → `apply_events`
pub fn normalize_event_name(name: &str) -> String {
    WHITESPACE.replace_all(&name.to_lowercase(), "_").into_owned()
}

pub fn new_client_id() -> String {
    format!("ext_{}", Uuid::new_v4().simple())
}

pub fn new_session_id() -> String {
    format!("session_{}", Uuid::new_v4().simple())
}

pub struct PayloadContext<'a> {
    pub client_id: &'a str,
    pub session_id: &'a str,
    pub extension_version: &'a str,
    pub timestamp: &'a str,
}

pub fn build_payload(ctx: &PayloadContext<'_>, event_name: &str, properties: Map<String, Value>) -> Payload {
    let mut params = Map::new();
    params.insert("extension_version".to_string(), json!(ctx.extension_version));
    params.insert("extension_name".to_string(), json!(EXTENSION_NAME));
    params.insert("session_id".to_string(), json!(ctx.session_id));
    params.insert("timestamp".to_string(), json!(ctx.timestamp));
    params.extend(properties);

    Payload {
        client_id: ctx.client_id.to_string(),
        events: vec![PayloadEvent { name: normalize_event_name(event_name), params }],
    }
}

pub fn error_properties(error: &dyn std::error::Error, context: &Value) -> Map<String, Value> {
    let mut props = Map::new();
    props.insert("error_message".to_string(), json!(error.to_string()));
    props.insert("error_type".to_string(), json!(short_type_name(error)));
    props.insert("context".to_string(), json!(context.to_string()));
    props
}

fn short_type_name(error: &dyn std::error::Error) -> String {
    // Debug output starts with the variant name, e.g. `Bridge("...")`.
    let debug = format!("{:?}", error);
    debug
        .split(|c: char| !c.is_alphanumeric() && c != '_')
        .next()
        .filter(|name| !name.is_empty())
        .unwrap_or("UnknownError")
        .to_string()
}

/// Stable per-install identifier, created on first use.
async fn client_id() -> Result<String> {
    let identity: AnalyticsIdentity = storage::load().await?;
    if let Some(id) = identity.analytics_client_id {
        return Ok(id);
    }
    let id = new_client_id();
    storage::save(&AnalyticsIdentity { analytics_client_id: Some(id.clone()) }).await?;
    Ok(id)
}

/// Per-popup-session identifier kept in sessionStorage.
fn session_id() -> String {
    let storage = web_sys::window().and_then(|w| w.session_storage().ok().flatten());
    let Some(storage) = storage else {
        return new_session_id();
    };
    if let Ok(Some(id)) = storage.get_item(SESSION_KEY) {
        return id;
    }
    let id = new_session_id();
    let _ = storage.set_item(SESSION_KEY, &id);
    id
}

pub async fn track_event(event_name: &str, properties: Map<String, Value>) {
    let config = ExtensionConfig::from_build_env();
    let debug_payloads = config.debug;
    let Some(analytics) = config.analytics else {
        return;
    };

    let result: Result<u16> = async move {
        let client_id = client_id().await?;
        let session_id = session_id();
        let version = bridge::manifest_version();
        let timestamp: String = js_sys::Date::new_0().to_iso_string().into();
        let ctx = PayloadContext {
            client_id: &client_id,
            session_id: &session_id,
            extension_version: &version,
            timestamp: &timestamp,
        };
        let payload = build_payload(&ctx, event_name, properties);
        let body = serde_json::to_string(&payload)?;
        if debug_payloads {
            debug!("analytics payload: {}", body);
        }
        bridge::post_json(&analytics.collect_url(), &body).await
    }
    .await;

    match result {
        Ok(status) => debug!("analytics event {} sent, status {}", event_name, status),
        Err(e) => warn!("failed to track event {}: {}", event_name, e),
    }
}

pub async fn track_error(error: &dyn std::error::Error, context: Value) {
    track_event("extension_error", error_properties(error, &context)).await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::NavigatorError;

    #[test]
    fn test_normalize_event_name() {
        assert_eq!(normalize_event_name("Apply  Hidden\tEvents"), "apply_hidden_events");
        assert_eq!(normalize_event_name("popup_opened"), "popup_opened");
    }

    #[test]
    fn test_ids_have_prefixes() {
        assert!(new_client_id().starts_with("ext_"));
        assert!(new_session_id().starts_with("session_"));
        assert_ne!(new_client_id(), new_client_id());
    }

    #[test]
    fn test_build_payload() {
        let ctx = PayloadContext {
            client_id: "ext_1",
            session_id: "session_1",
            extension_version: "1.2.0",
            timestamp: "2025-11-06T10:00:00.000Z",
        };
        let mut props = Map::new();
        props.insert("event_count".to_string(), json!(3));

        let payload = build_payload(&ctx, "Events Applied", props);
        let value = serde_json::to_value(&payload).unwrap();
        assert_eq!(value["client_id"], "ext_1");
        assert_eq!(value["events"][0]["name"], "events_applied");
        assert_eq!(value["events"][0]["params"]["extension_name"], EXTENSION_NAME);
        assert_eq!(value["events"][0]["params"]["event_count"], 3);
        assert_eq!(value["events"][0]["params"]["session_id"], "session_1");
    }

    #[test]
    fn test_error_properties() {
        let err = NavigatorError::NotFound("Event not found on page");
        let props = error_properties(&err, &json!({ "action": "openEvent" }));
        assert_eq!(props["error_message"], "Event not found on page");
        assert_eq!(props["error_type"], "NotFound");
        assert_eq!(props["context"], r#"{"action":"openEvent"}"#);
    }
}
