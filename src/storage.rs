/// Typed groups of keys in chrome.storage.local

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::bridge;
use crate::error::Result;
use crate::events::EventCatalog;
use crate::properties::PropertyCatalog;
use crate::timeline::TimelineSelection;

pub const HIDDEN_EVENTS: &str = "hiddenEvents";
pub const MANUAL_EVENTS: &str = "manualEvents";
pub const DISCOVERED_PROPERTIES: &str = "discoveredProperties";
pub const SELECTED_PROPERTIES: &str = "selectedProperties";
pub const SELECTED_TIMELINE_EVENTS: &str = "selectedTimelineEvents";
pub const HIDDEN_TIMELINE_EVENTS: &str = "hiddenTimelineEvents";
pub const LAST_ACTIVE_TAB: &str = "lastActiveTab";
pub const ANALYTICS_CLIENT_ID: &str = "analytics_client_id";

/// A struct whose fields map one-to-one onto storage keys. Missing keys
/// deserialize to the field defaults.
pub trait StoredGroup: Serialize + DeserializeOwned + Default {
    const KEYS: &'static [&'static str];

    fn touches(changed: &[String]) -> bool {
        changed.iter().any(|key| Self::KEYS.contains(&key.as_str()))
    }
}

impl StoredGroup for EventCatalog {
    const KEYS: &'static [&'static str] = &[HIDDEN_EVENTS, MANUAL_EVENTS];
}

impl StoredGroup for PropertyCatalog {
    const KEYS: &'static [&'static str] = &[DISCOVERED_PROPERTIES, SELECTED_PROPERTIES];
}

impl StoredGroup for TimelineSelection {
    const KEYS: &'static [&'static str] = &[SELECTED_TIMELINE_EVENTS, HIDDEN_TIMELINE_EVENTS];
}

/// Popup tabs, persisted so the popup reopens where it was left.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PopupTab {
    #[default]
    FilterEvents,
    FilterProperties,
    EventTimeline,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Preferences {
    #[serde(default)]
    pub last_active_tab: PopupTab,
}

impl StoredGroup for Preferences {
    const KEYS: &'static [&'static str] = &[LAST_ACTIVE_TAB];
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsIdentity {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analytics_client_id: Option<String>,
}

impl StoredGroup for AnalyticsIdentity {
    const KEYS: &'static [&'static str] = &[ANALYTICS_CLIENT_ID];
}

pub async fn load<T: StoredGroup>() -> Result<T> {
    bridge::storage_get(T::KEYS).await
}

pub async fn save<T: StoredGroup>(group: &T) -> Result<()> {
    bridge::storage_set(group).await
}

/// A write of one key, leaving the rest of its group as stored.
pub type Entry<'a, V> = BTreeMap<&'static str, &'a V>;

pub fn entry<'a, V: Serialize>(key: &'static str, value: &'a V) -> Entry<'a, V> {
    BTreeMap::from([(key, value)])
}

/// Writes only `key`. The popup and the content script both write to the
/// catalogs, so each side saves just the keys it changed.
pub async fn save_entry<V: Serialize>(key: &'static str, value: &V) -> Result<()> {
    bridge::storage_set(&entry(key, value)).await
}
