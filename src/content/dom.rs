//! Scraping and driving the host's activity feed markup.
//!
//! Selectors used here belong to the host application:
//! - `profile-editable-property[property]` carries a JSON description of
//!   one profile property.
//! - `profile-activity > div` holds the feed: date headings are bare text
//!   nodes, events are `.activity-event-wrapper` elements with
//!   `.activity-time` and `.activity-event-title` children.
//! - `mp-section` expands an event; its title lives in the shadow root.
use std::collections::HashMap;
use std::sync::LazyLock;

use log::{debug, warn};
use regex::Regex;
use serde_json::Value;
use wasm_bindgen::JsCast;
use web_sys::{
    Document, Element, HtmlElement, Node, ScrollBehavior, ScrollIntoViewOptions,
    ScrollLogicalPosition,
};

use crate::error::{NavigatorError, Result};
use crate::timeline::{FeedEvent, UNKNOWN_DATE};

pub const PROPERTY_TAG: &str = "profile-editable-property";
pub const ACTIVITY_TAG: &str = "profile-activity";
pub const EVENT_WRAPPER_CLASS: &str = "activity-event-wrapper";
const EVENT_WRAPPER_SELECTOR: &str = ".activity-event-wrapper";
const EVENT_TIME_SELECTOR: &str = ".activity-time";
const EVENT_TITLE_SELECTOR: &str = ".activity-event-title";
const SINCE_DATE_SELECTOR: &str = ".since-date-wrapper";
const SHOW_MORE_LABEL: &str = "Show more";

static FULL_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z][a-z]+\s+\d+,\s+\d{4}$").expect("valid regex"));

/// `Today · November 6, 2025` or `November 6, 2025`
pub fn is_date_heading(text: &str) -> bool {
    !text.is_empty() && (text.contains('·') || FULL_DATE.is_match(text))
}

/// Name and display value from a `property` attribute.
pub fn parse_property_attr(raw: &str) -> Result<Option<(String, String)>> {
    let data: Value = serde_json::from_str(raw)?;
    let Some(name) = data.pointer("/name/raw").and_then(Value::as_str) else {
        return Ok(None);
    };
    if name.is_empty() {
        return Ok(None);
    }

    let value = match data.pointer("/renderValue/renderString") {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    };
    Ok(Some((name.to_string(), value)))
}

fn trimmed_text(node: &Node) -> String {
    node.text_content().unwrap_or_default().trim().to_string()
}

fn child_text(parent: &Element, selector: &str) -> Option<String> {
    parent
        .query_selector(selector)
        .ok()
        .flatten()
        .map(|el| trimmed_text(&el))
}

fn elements(document: &Document, selector: &str) -> Vec<Element> {
    let Ok(list) = document.query_selector_all(selector) else {
        return Vec::new();
    };
    (0..list.length())
        .filter_map(|i| list.get(i))
        .filter_map(|node| node.dyn_into::<Element>().ok())
        .collect()
}

/// Every property rendered on the profile, keyed by raw name.
pub fn scrape_properties(document: &Document) -> HashMap<String, String> {
    let mut properties = HashMap::new();
    for element in elements(document, PROPERTY_TAG) {
        let Some(raw) = element.get_attribute("property") else {
            continue;
        };
        match parse_property_attr(&raw) {
            Ok(Some((name, value))) => {
                properties.insert(name, value);
            }
            Ok(None) => {}
            Err(e) => warn!("error parsing property: {}", e),
        }
    }
    properties
}

/// Events in feed order, each tagged with the nearest preceding date heading.
pub fn scrape_feed_events(document: &Document) -> Vec<FeedEvent> {
    let container = document
        .query_selector(ACTIVITY_TAG)
        .ok()
        .flatten()
        .and_then(|activity| activity.query_selector("div").ok().flatten());

    let Some(container) = container else {
        debug!("activity feed not rendered");
        return Vec::new();
    };

    let mut events = Vec::new();
    let mut current_date: Option<String> = None;
    walk_feed(&container, &mut current_date, &mut events);
    events
}

fn walk_feed(parent: &Node, current_date: &mut Option<String>, events: &mut Vec<FeedEvent>) {
    let children = parent.child_nodes();
    for i in 0..children.length() {
        let Some(node) = children.get(i) else {
            continue;
        };

        match node.node_type() {
            Node::TEXT_NODE => {
                let text = trimmed_text(&node);
                if is_date_heading(&text) {
                    *current_date = Some(text);
                }
            }
            Node::ELEMENT_NODE => {
                let Ok(element) = node.dyn_into::<Element>() else {
                    continue;
                };
                if element.class_list().contains(EVENT_WRAPPER_CLASS) {
                    let time = child_text(&element, EVENT_TIME_SELECTOR);
                    let name = child_text(&element, EVENT_TITLE_SELECTOR);
                    if let (Some(display_time), Some(name)) = (time, name) {
                        events.push(FeedEvent {
                            name,
                            display_time,
                            date: current_date.clone().unwrap_or_else(|| UNKNOWN_DATE.to_string()),
                        });
                    }
                } else {
                    walk_feed(&element, current_date, events);
                }
            }
            _ => {}
        }
    }
}

/// Text of the "Since <date>" marker at the bottom of a fully loaded feed.
pub fn earliest_event(document: &Document) -> Option<String> {
    document
        .query_selector(SINCE_DATE_SELECTOR)
        .ok()
        .flatten()
        .and_then(|el| el.text_content())
}

pub fn click_show_more(document: &Document) -> Result<()> {
    let activity = document
        .query_selector(ACTIVITY_TAG)
        .ok()
        .flatten()
        .ok_or(NavigatorError::NotFound("Activity feed not found"))?;

    let buttons = activity.query_selector_all("mp-button").map_err(NavigatorError::from_js)?;
    for i in 0..buttons.length() {
        let Some(button) = buttons.get(i) else {
            continue;
        };
        if trimmed_text(&button) == SHOW_MORE_LABEL {
            if let Ok(button) = button.dyn_into::<HtmlElement>() {
                button.click();
                return Ok(());
            }
        }
    }
    Err(NavigatorError::NotFound("Show more button not found"))
}

/// Expand the matching feed entry and scroll it into view.
pub fn open_event(document: &Document, event_name: &str, event_time: &str) -> Result<()> {
    for wrapper in elements(document, EVENT_WRAPPER_SELECTOR) {
        let name = child_text(&wrapper, EVENT_TITLE_SELECTOR);
        let time = child_text(&wrapper, EVENT_TIME_SELECTOR);
        if name.as_deref() != Some(event_name) || time.as_deref() != Some(event_time) {
            continue;
        }

        let Some(section) = wrapper.query_selector("mp-section").ok().flatten() else {
            continue;
        };

        let title = section
            .shadow_root()
            .and_then(|root| root.query_selector(".mp-section-title-container").ok().flatten())
            .and_then(|el| el.dyn_into::<HtmlElement>().ok());
        if let Some(title) = title {
            title.click();
        }

        let options = ScrollIntoViewOptions::new();
        options.set_behavior(ScrollBehavior::Smooth);
        options.set_block(ScrollLogicalPosition::Center);
        wrapper.scroll_into_view_with_scroll_into_view_options(&options);

        return Ok(());
    }
    Err(NavigatorError::NotFound("Event not found on page"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_date_heading() {
        assert!(is_date_heading("Today · November 6, 2025"));
        assert!(is_date_heading("November 6, 2025"));
        assert!(is_date_heading("May 12,  2024"));
        assert!(!is_date_heading("10:02 AM"));
        assert!(!is_date_heading("Page View"));
        assert!(!is_date_heading(""));
    }

    #[test]
    fn test_parse_property_attr() {
        let raw = r#"{"name":{"raw":"$city","display":"City"},"renderValue":{"renderString":"Oslo"}}"#;
        assert_eq!(parse_property_attr(raw).unwrap(), Some(("$city".to_string(), "Oslo".to_string())));
    }

    #[test]
    fn test_parse_property_attr_missing_value() {
        let raw = r#"{"name":{"raw":"plan"}}"#;
        assert_eq!(parse_property_attr(raw).unwrap(), Some(("plan".to_string(), String::new())));

        let raw = r#"{"name":{"raw":"age"},"renderValue":{"renderString":42}}"#;
        assert_eq!(parse_property_attr(raw).unwrap(), Some(("age".to_string(), "42".to_string())));
    }

    #[test]
    fn test_parse_property_attr_without_name() {
        assert_eq!(parse_property_attr(r#"{"renderValue":{}}"#).unwrap(), None);
        assert_eq!(parse_property_attr(r#"{"name":{"raw":""}}"#).unwrap(), None);
        assert!(parse_property_attr("{not json").is_err());
    }
}
