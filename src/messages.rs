/// Messages exchanged between the popup and the content script
use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::NavigatorError;
use crate::timeline::FeedEvent;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum Request {
    ApplyHiddenEvents {
        events: Vec<String>,
    },
    GetCurrentEvents,
    GetAllProperties,
    GetEventDatabase,
    GetEarliestEvent,
    ClickShowMore,
    #[serde(rename_all = "camelCase")]
    OpenEvent {
        event_name: String,
        event_time: String,
    },
}

/// Outcome of a page action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ack {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Ack {
    pub fn ok() -> Self {
        Ack { success: true, error: None }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Ack { success: false, error: Some(error.into()) }
    }

    pub fn into_result(self) -> Result<(), NavigatorError> {
        if self.success {
            Ok(())
        } else {
            Err(NavigatorError::Page(self.error.unwrap_or_else(|| "Unknown error".to_string())))
        }
    }
}

impl From<Result<(), NavigatorError>> for Ack {
    fn from(result: Result<(), NavigatorError>) -> Self {
        match result {
            Ok(()) => Ack::ok(),
            Err(e) => Ack::failed(e.to_string()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CurrentEvents {
    #[serde(default)]
    pub events: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AllProperties {
    #[serde(default)]
    pub properties: HashMap<String, String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventDatabase {
    #[serde(default)]
    pub events: Vec<FeedEvent>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EarliestEvent {
    #[serde(default)]
    pub earliest_event: Option<String>,
}

/// Any reply the content script can send back.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Response {
    Ack(Ack),
    CurrentEvents(CurrentEvents),
    AllProperties(AllProperties),
    EventDatabase(EventDatabase),
    EarliestEvent(EarliestEvent),
}
