/// Catalog of event names the user may hide from the activity feed
use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::error::{NavigatorError, Result};

pub const EXPORT_FILENAME: &str = "mixpanel_events.txt";

/// Auto-discovered names (read back from the page's fragment) and names
/// typed in by the user.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventCatalog {
    #[serde(default)]
    pub hidden_events: Vec<String>,
    #[serde(default)]
    pub manual_events: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EventEntry {
    pub name: String,
    pub manual: bool,
}

impl EventEntry {
    pub fn display_label(&self) -> String {
        if self.manual {
            format!("{} [m]", self.name)
        } else {
            self.name.clone()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ImportMode {
    Replace,
    Merge,
}

impl EventCatalog {
    /// Add names found on the page. Returns false when nothing was new, in
    /// which case the catalog is untouched.
    pub fn merge_discovered(&mut self, found: &[String]) -> bool {
        if found.iter().all(|e| self.hidden_events.contains(e)) {
            return false;
        }
        self.hidden_events = union(&[self.hidden_events.as_slice(), found]);
        true
    }

    /// Manual names that have since been discovered are dropped. Returns
    /// true when the manual list changed.
    pub fn dedupe_manual(&mut self) -> bool {
        let before = self.manual_events.len();
        let auto = &self.hidden_events;
        self.manual_events.retain(|name| !auto.contains(name));
        self.manual_events.len() != before
    }

    /// Every known name, sorted for display.
    pub fn entries(&self) -> Vec<EventEntry> {
        let mut entries: Vec<EventEntry> = self
            .hidden_events
            .iter()
            .map(|name| EventEntry { name: name.clone(), manual: false })
            .chain(self.manual_events.iter().map(|name| EventEntry { name: name.clone(), manual: true }))
            .collect();
        entries.sort_by(|a, b| compare_names(&a.name, &b.name));
        entries
    }

    pub fn add_manual(&mut self, name: &str) -> Result<String> {
        let name = name.trim();
        if name.is_empty() {
            return Err(NavigatorError::EmptyName("Event name"));
        }
        if self.hidden_events.iter().any(|e| e == name) || self.manual_events.iter().any(|e| e == name) {
            return Err(NavigatorError::AlreadyExists("Event".to_string()));
        }
        self.manual_events.push(name.to_string());
        Ok(name.to_string())
    }

    pub fn delete(&mut self, name: &str, manual: bool) {
        if manual {
            self.manual_events.retain(|e| e != name);
        } else {
            self.hidden_events.retain(|e| e != name);
        }
    }

    pub fn total(&self) -> usize {
        self.hidden_events.len() + self.manual_events.len()
    }

    pub fn clear(&mut self) {
        self.hidden_events.clear();
        self.manual_events.clear();
    }

    /// One name per line, sorted, both lists combined.
    pub fn export_text(&self) -> Result<(String, usize)> {
        let mut all = union(&[self.hidden_events.as_slice(), self.manual_events.as_slice()]);
        if all.is_empty() {
            return Err(NavigatorError::NothingToDo("No events to export"));
        }
        all.sort();
        Ok((all.join("\n"), all.len()))
    }

    /// Imported names become auto-discovered; the manual list is emptied either way.
    pub fn import(&mut self, names: &[String], mode: ImportMode) {
        self.hidden_events = match mode {
            ImportMode::Replace => names.to_vec(),
            ImportMode::Merge => union(&[self.hidden_events.as_slice(), self.manual_events.as_slice(), names]),
        };
        self.manual_events.clear();
    }
}

/// Split an imported text file into unique, trimmed, non-empty lines.
pub fn parse_import(content: &str) -> Result<Vec<String>> {
    let lines: Vec<String> = content
        .split('\n')
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect();

    if lines.is_empty() {
        return Err(NavigatorError::NothingToDo("Nothing found in file"));
    }
    Ok(union(&[lines.as_slice()]))
}

/// Case-insensitive display order, ties broken by the raw name.
pub fn compare_names(a: &str, b: &str) -> std::cmp::Ordering {
    a.to_lowercase().cmp(&b.to_lowercase()).then_with(|| a.cmp(b))
}

/// Concatenate, keeping the first occurrence of each name.
pub fn union(lists: &[&[String]]) -> Vec<String> {
    let mut seen = HashSet::new();
    lists
        .iter()
        .flat_map(|list| list.iter())
        .filter(|name| seen.insert(name.as_str()))
        .cloned()
        .collect()
}

/// Checkbox state for each entry after a re-render.
///
/// States the user already set survive; new rows start checked. When the
/// page currently hides some events, rows mirror the page instead.
pub fn initial_selection(
    entries: &[EventEntry],
    previous: &HashMap<String, bool>,
    page_hidden: Option<&[String]>,
) -> HashMap<String, bool> {
    if previous.is_empty() {
        if let Some(page_hidden) = page_hidden.filter(|events| !events.is_empty()) {
            return entries
                .iter()
                .map(|entry| (entry.name.clone(), page_hidden.contains(&entry.name)))
                .collect();
        }
    }

    entries
        .iter()
        .map(|entry| (entry.name.clone(), previous.get(&entry.name).copied().unwrap_or(true)))
        .collect()
}

pub fn matches_search(label: &str, term: &str) -> bool {
    label.to_lowercase().contains(&term.trim().to_lowercase())
}

pub fn count_label(count: usize, singular: &str, plural: &str) -> String {
    format!("{} {} selected", count, if count == 1 { singular } else { plural })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn catalog(hidden: &[&str], manual: &[&str]) -> EventCatalog {
        EventCatalog { hidden_events: names(hidden), manual_events: names(manual) }
    }

    #[test]
    fn test_merge_discovered_only_when_new() {
        let mut events = catalog(&["A", "B"], &[]);
        assert!(!events.merge_discovered(&names(&["B", "A"])));
        assert_eq!(events.hidden_events, names(&["A", "B"]));

        assert!(events.merge_discovered(&names(&["B", "C", "C"])));
        assert_eq!(events.hidden_events, names(&["A", "B", "C"]));
    }

    #[test]
    fn test_dedupe_manual() {
        let mut events = catalog(&["A"], &["A", "M"]);
        assert!(events.dedupe_manual());
        assert_eq!(events.manual_events, names(&["M"]));
        assert!(!events.dedupe_manual());
    }

    #[test]
    fn test_entries_sorted_with_manual_flag() {
        let events = catalog(&["login", "Checkout"], &["Browse"]);
        let entries = events.entries();
        let labels: Vec<String> = entries.iter().map(EventEntry::display_label).collect();
        assert_eq!(labels, names(&["Browse [m]", "Checkout", "login"]));
    }

    #[test]
    fn test_add_manual() {
        let mut events = catalog(&["A"], &[]);
        assert_eq!(events.add_manual("  New  ").unwrap(), "New");
        assert_eq!(events.manual_events, names(&["New"]));

        assert!(matches!(events.add_manual("   "), Err(NavigatorError::EmptyName(_))));
        assert!(matches!(events.add_manual("A"), Err(NavigatorError::AlreadyExists(_))));
        assert!(matches!(events.add_manual("New"), Err(NavigatorError::AlreadyExists(_))));
    }

    #[test]
    fn test_delete() {
        let mut events = catalog(&["A", "B"], &["M"]);
        events.delete("A", false);
        events.delete("M", true);
        events.delete("B", true);
        assert_eq!(events, catalog(&["B"], &[]));
    }

    #[test]
    fn test_export_text() {
        let events = catalog(&["b", "a"], &["c", "a"]);
        let (text, count) = events.export_text().unwrap();
        assert_eq!(text, "a\nb\nc");
        assert_eq!(count, 3);

        assert!(EventCatalog::default().export_text().is_err());
    }

    #[test]
    fn test_parse_import() {
        let lines = parse_import("  A \r\n\nB\nA\n   \n").unwrap();
        assert_eq!(lines, names(&["A", "B"]));
        assert!(parse_import("\n  \n").is_err());
    }

    #[test]
    fn test_import_replace_and_merge() {
        let mut events = catalog(&["A"], &["M"]);
        events.import(&names(&["X"]), ImportMode::Replace);
        assert_eq!(events, catalog(&["X"], &[]));

        let mut events = catalog(&["A"], &["M"]);
        events.import(&names(&["X", "A"]), ImportMode::Merge);
        assert_eq!(events, catalog(&["A", "M", "X"], &[]));
    }

    #[test]
    fn test_initial_selection_defaults_to_checked() {
        let entries = catalog(&["A", "B"], &[]).entries();
        let selection = initial_selection(&entries, &HashMap::new(), None);
        assert_eq!(selection.get("A"), Some(&true));
        assert_eq!(selection.get("B"), Some(&true));
    }

    #[test]
    fn test_initial_selection_mirrors_page() {
        let entries = catalog(&["A", "B"], &[]).entries();
        let page = names(&["B"]);
        let selection = initial_selection(&entries, &HashMap::new(), Some(&page));
        assert_eq!(selection.get("A"), Some(&false));
        assert_eq!(selection.get("B"), Some(&true));

        // Empty page list keeps the default.
        let selection = initial_selection(&entries, &HashMap::new(), Some(&[]));
        assert_eq!(selection.get("A"), Some(&true));
    }

    #[test]
    fn test_initial_selection_keeps_user_state() {
        let entries = catalog(&["A", "B", "C"], &[]).entries();
        let previous = HashMap::from([("A".to_string(), false), ("B".to_string(), true)]);
        let page = names(&["A"]);
        let selection = initial_selection(&entries, &previous, Some(&page));
        assert_eq!(selection.get("A"), Some(&false));
        assert_eq!(selection.get("B"), Some(&true));
        assert_eq!(selection.get("C"), Some(&true));
    }

    #[test]
    fn test_search_and_count_label() {
        assert!(matches_search("Page View [m]", " page "));
        assert!(!matches_search("Login", "view"));
        assert_eq!(count_label(1, "event", "events"), "1 event selected");
        assert_eq!(count_label(3, "property", "properties"), "3 properties selected");
    }
}
