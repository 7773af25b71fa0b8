/// Timeline of selected event types, derived from the scraped activity feed
use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::{NavigatorError, Result};

pub const UNKNOWN_DATE: &str = "Unknown Date";
const KEY_SEPARATOR: &str = "|||";

/// An event row as rendered in the host's activity feed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedEvent {
    pub name: String,
    pub display_time: String,
    #[serde(default = "unknown_date")]
    pub date: String,
}

fn unknown_date() -> String {
    UNKNOWN_DATE.to_string()
}

impl FeedEvent {
    /// Identifies one occurrence, used to hide it from the timeline.
    pub fn instance_key(&self) -> String {
        [self.name.as_str(), self.date.as_str(), self.display_time.as_str()].join(KEY_SEPARATOR)
    }
}

fn key_event_name(key: &str) -> &str {
    key.split(KEY_SEPARATOR).next().unwrap_or(key)
}

/// Selections are global: the same event names are tracked on every profile.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineSelection {
    #[serde(default)]
    pub selected_timeline_events: Vec<String>,
    #[serde(default)]
    pub hidden_timeline_events: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DateGroup<'a> {
    pub date: &'a str,
    pub events: Vec<&'a FeedEvent>,
}

/// Distinct event names, sorted, for the selection checklist.
pub fn unique_names(events: &[FeedEvent]) -> Vec<String> {
    let mut names: Vec<String> = events
        .iter()
        .map(|e| e.name.clone())
        .collect::<HashSet<_>>()
        .into_iter()
        .collect();
    names.sort();
    names
}

impl TimelineSelection {
    pub fn is_selected(&self, name: &str) -> bool {
        self.selected_timeline_events.iter().any(|n| n == name)
    }

    /// Replace the selection. Hidden occurrences of names that were
    /// unselected are forgotten.
    pub fn update_selection(&mut self, selected: Vec<String>) {
        let unchecked: Vec<&String> = self
            .selected_timeline_events
            .iter()
            .filter(|name| !selected.contains(name))
            .collect();

        if !unchecked.is_empty() {
            let unchecked: HashSet<&str> = unchecked.into_iter().map(String::as_str).collect();
            self.hidden_timeline_events
                .retain(|key| !unchecked.contains(key_event_name(key)));
        }

        self.selected_timeline_events = selected;
    }

    pub fn set_selected(&mut self, name: &str, selected: bool) {
        let mut next = self.selected_timeline_events.clone();
        if selected {
            if !next.iter().any(|n| n == name) {
                next.push(name.to_string());
            }
        } else {
            next.retain(|n| n != name);
        }
        self.update_selection(next);
    }

    /// Returns false when the occurrence was already hidden.
    pub fn hide(&mut self, event: &FeedEvent) -> bool {
        let key = event.instance_key();
        if self.hidden_timeline_events.contains(&key) {
            return false;
        }
        self.hidden_timeline_events.push(key);
        true
    }

    pub fn is_empty(&self) -> bool {
        self.selected_timeline_events.is_empty() && self.hidden_timeline_events.is_empty()
    }

    pub fn clear(&mut self) {
        self.selected_timeline_events.clear();
        self.hidden_timeline_events.clear();
    }

    /// Selected, non-hidden events in feed order.
    pub fn visible<'a>(&self, events: &'a [FeedEvent]) -> Vec<&'a FeedEvent> {
        events
            .iter()
            .filter(|event| self.is_selected(&event.name))
            .filter(|event| !self.hidden_timeline_events.contains(&event.instance_key()))
            .collect()
    }

    pub fn export_text(&self, user_id: &str, events: &[FeedEvent]) -> Result<(String, usize)> {
        if self.selected_timeline_events.is_empty() {
            return Err(NavigatorError::NothingToDo("No events selected to export"));
        }
        let visible = self.visible(events);
        if visible.is_empty() {
            return Err(NavigatorError::NothingToDo("No events in timeline to export"));
        }

        let groups = group_by_date(&visible);
        let body = groups
            .iter()
            .map(|group| {
                let lines: String = group
                    .events
                    .iter()
                    .map(|event| format!("{} {}\n", event.display_time, event.name))
                    .collect();
                format!("----{}----\n{}", group.date, lines)
            })
            .collect::<Vec<String>>()
            .join("\n");

        Ok((format!("user_id: {}\n\n{}", user_id, body), visible.len()))
    }
}

/// Group by day, days in order of first appearance (the feed is newest first).
pub fn group_by_date<'a>(events: &[&'a FeedEvent]) -> Vec<DateGroup<'a>> {
    let mut groups: Vec<DateGroup<'a>> = Vec::new();
    for &event in events {
        let date = if event.date.is_empty() { UNKNOWN_DATE } else { event.date.as_str() };
        match groups.iter_mut().find(|g| g.date == date) {
            Some(group) => group.events.push(event),
            None => groups.push(DateGroup { date, events: vec![event] }),
        }
    }
    groups
}

pub fn export_filename(user_id: &str) -> String {
    let safe: String = user_id
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    format!("timeline_{}.txt", safe)
}

/// `Since November 1, 2025` → `November 1, 2025`
pub fn strip_since(text: &str) -> &str {
    let trimmed = text.trim_start();
    match (trimmed.get(..5), trimmed.get(5..)) {
        (Some(word), Some(rest)) if word.eq_ignore_ascii_case("since") && rest.starts_with(char::is_whitespace) => {
            rest.trim_start()
        }
        _ => trimmed,
    }
}

pub fn count_label(count: usize) -> String {
    format!("({} {} tracked)", count, if count == 1 { "event" } else { "events" })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(name: &str, date: &str, time: &str) -> FeedEvent {
        FeedEvent { name: name.to_string(), display_time: time.to_string(), date: date.to_string() }
    }

    fn feed() -> Vec<FeedEvent> {
        vec![
            event("Login", "Today · November 6, 2025", "10:02 AM"),
            event("Page View", "Today · November 6, 2025", "10:01 AM"),
            event("Login", "November 5, 2025", "9:00 PM"),
            event("Purchase", "November 5, 2025", "8:55 PM"),
        ]
    }

    fn selection(selected: &[&str]) -> TimelineSelection {
        TimelineSelection {
            selected_timeline_events: selected.iter().map(|s| s.to_string()).collect(),
            hidden_timeline_events: Vec::new(),
        }
    }

    #[test]
    fn test_instance_key() {
        assert_eq!(event("A", "Day", "1:00 PM").instance_key(), "A|||Day|||1:00 PM");
    }

    #[test]
    fn test_feed_event_json_shape() {
        let json = r#"{"name":"Login","displayTime":"10:02 AM"}"#;
        let parsed: FeedEvent = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.date, UNKNOWN_DATE);

        let value = serde_json::to_value(&parsed).unwrap();
        assert_eq!(value["displayTime"], "10:02 AM");
    }

    #[test]
    fn test_unique_names() {
        assert_eq!(unique_names(&feed()), vec!["Login", "Page View", "Purchase"]);
    }

    #[test]
    fn test_visible_respects_selection_and_hidden() {
        let events = feed();
        let mut timeline = selection(&["Login"]);
        assert_eq!(timeline.visible(&events).len(), 2);

        assert!(timeline.hide(&events[0]));
        assert!(!timeline.hide(&events[0]));
        let visible = timeline.visible(&events);
        assert_eq!(visible, vec![&events[2]]);
    }

    #[test]
    fn test_unselecting_forgets_hidden_instances() {
        let events = feed();
        let mut timeline = selection(&["Login", "Purchase"]);
        timeline.hide(&events[0]);
        timeline.hide(&events[3]);

        timeline.set_selected("Login", false);
        assert_eq!(timeline.hidden_timeline_events, vec![events[3].instance_key()]);

        timeline.set_selected("Login", true);
        assert_eq!(timeline.visible(&events).len(), 2);
    }

    #[test]
    fn test_group_by_date_keeps_feed_order() {
        let events = feed();
        let visible: Vec<&FeedEvent> = events.iter().collect();
        let groups = group_by_date(&visible);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].date, "Today · November 6, 2025");
        assert_eq!(groups[1].events.len(), 2);
    }

    #[test]
    fn test_export_text() {
        let events = feed();
        let timeline = selection(&["Login", "Purchase"]);
        let (text, count) = timeline.export_text("user@example.com", &events).unwrap();
        assert_eq!(count, 3);
        assert_eq!(
            text,
            "user_id: user@example.com\n\n\
             ----Today · November 6, 2025----\n\
             10:02 AM Login\n\
             \n\
             ----November 5, 2025----\n\
             9:00 PM Login\n\
             8:55 PM Purchase\n"
        );
    }

    #[test]
    fn test_export_text_errors() {
        let events = feed();
        assert!(selection(&[]).export_text("u", &events).is_err());
        assert!(selection(&["Signup"]).export_text("u", &events).is_err());
    }

    #[test]
    fn test_export_filename() {
        assert_eq!(export_filename("user@example.com"), "timeline_user_example_com.txt");
    }

    #[test]
    fn test_strip_since() {
        assert_eq!(strip_since("Since November 1, 2025"), "November 1, 2025");
        assert_eq!(strip_since("since  Nov 1"), "Nov 1");
        assert_eq!(strip_since("November 1, 2025"), "November 1, 2025");
        assert_eq!(strip_since("Sinc"), "Sinc");
        assert_eq!(strip_since("Since\tNov 1"), "Nov 1");
        assert_eq!(strip_since("SINCE\u{a0}Nov 1"), "Nov 1");
        assert_eq!(strip_since("Sincerely"), "Sincerely");
    }

    #[test]
    fn test_clear_and_count_label() {
        let mut timeline = selection(&["Login"]);
        assert!(!timeline.is_empty());
        timeline.clear();
        assert!(timeline.is_empty());
        assert_eq!(count_label(1), "(1 event tracked)");
        assert_eq!(count_label(2), "(2 events tracked)");
    }
}
