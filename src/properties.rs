/// Profile properties discovered on the page and the subset the user watches
use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{NavigatorError, Result};
use crate::events::{compare_names, union};

pub const EXPORT_FILENAME: &str = "mixpanel_properties.txt";
pub const MISSING_VALUE: &str = "Not found on this profile";
pub const EMPTY_VALUE: &str = "(empty)";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyCatalog {
    #[serde(default)]
    pub discovered_properties: Vec<String>,
    #[serde(default)]
    pub selected_properties: Vec<String>,
}

/// One line of the "current values" panel.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyValueRow {
    pub name: String,
    pub label: String,
    pub value: String,
    pub missing: bool,
}

/// Render a raw property name the way the host UI labels it:
/// `$browser_version` becomes `Browser Version`.
pub fn format_property_name(name: &str) -> String {
    let name = name.strip_prefix('$').unwrap_or(name);
    name.replace('_', " ")
        .split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.as_str().to_lowercase().chars()).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

impl PropertyCatalog {
    /// Returns false, leaving the catalog untouched, when every name is known.
    pub fn merge_discovered<'a, I>(&mut self, names: I) -> bool
    where
        I: IntoIterator<Item = &'a String>,
    {
        let found: Vec<String> = names.into_iter().cloned().collect();
        if found.iter().all(|name| self.discovered_properties.contains(name)) {
            return false;
        }
        self.discovered_properties = union(&[self.discovered_properties.as_slice(), found.as_slice()]);
        true
    }

    pub fn sorted_names(&self) -> Vec<String> {
        let mut names = self.discovered_properties.clone();
        names.sort_by(|a, b| compare_names(a, b));
        names
    }

    pub fn is_selected(&self, name: &str) -> bool {
        self.selected_properties.iter().any(|p| p == name)
    }

    pub fn set_selected(&mut self, name: &str, selected: bool) {
        if selected {
            if !self.is_selected(name) {
                self.selected_properties.push(name.to_string());
            }
        } else {
            self.selected_properties.retain(|p| p != name);
        }
    }

    /// Removed until the page shows it again.
    pub fn delete(&mut self, name: &str) {
        self.discovered_properties.retain(|p| p != name);
        self.selected_properties.retain(|p| p != name);
    }

    /// Imported names are both discovered and selected.
    pub fn import(&mut self, names: &[String]) {
        self.discovered_properties = union(&[self.discovered_properties.as_slice(), names]);
        self.selected_properties = union(&[self.selected_properties.as_slice(), names]);
    }

    pub fn export_text(&self) -> Result<(String, usize)> {
        if self.selected_properties.is_empty() {
            return Err(NavigatorError::NothingToDo("No properties selected to export"));
        }
        let mut selected = self.selected_properties.clone();
        selected.sort();
        Ok((selected.join("\n"), selected.len()))
    }

    pub fn clear(&mut self) {
        self.discovered_properties.clear();
        self.selected_properties.clear();
    }

    /// Selected properties with the values the page currently shows.
    pub fn value_rows(&self, page_values: &HashMap<String, String>) -> Vec<PropertyValueRow> {
        let mut selected = self.selected_properties.clone();
        selected.sort_by(|a, b| compare_names(a, b));
        selected
            .into_iter()
            .map(|name| {
                let label = format_property_name(&name);
                match page_values.get(&name) {
                    Some(value) => PropertyValueRow {
                        value: if value.is_empty() { EMPTY_VALUE.to_string() } else { value.clone() },
                        missing: false,
                        name,
                        label,
                    },
                    None => PropertyValueRow {
                        value: MISSING_VALUE.to_string(),
                        missing: true,
                        name,
                        label,
                    },
                }
            })
            .collect()
    }
}

/// Search matches either the raw name or its display label.
pub fn matches_search(name: &str, term: &str) -> bool {
    let term = term.trim().to_lowercase();
    name.to_lowercase().contains(&term) || format_property_name(name).to_lowercase().contains(&term)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_format_property_name() {
        assert_eq!(format_property_name("$browser_version"), "Browser Version");
        assert_eq!(format_property_name("plan TYPE"), "Plan Type");
        assert_eq!(format_property_name("$$odd"), "$odd");
        assert_eq!(format_property_name("a__b"), "A  B");
        assert_eq!(format_property_name(""), "");
    }

    #[test]
    fn test_merge_discovered() {
        let mut props = PropertyCatalog::default();
        let page = names(&["$email", "plan"]);
        assert!(props.merge_discovered(&page));
        assert!(!props.merge_discovered(&page));
        assert!(props.merge_discovered(&names(&["plan", "$city"])));
        assert_eq!(props.discovered_properties, names(&["$email", "plan", "$city"]));
        assert_eq!(props.sorted_names(), names(&["$city", "$email", "plan"]));
    }

    #[test]
    fn test_names_sort_ignoring_case() {
        let props = PropertyCatalog {
            discovered_properties: names(&["Plan", "age", "$city", "Zone"]),
            selected_properties: names(&["Plan", "age"]),
        };
        assert_eq!(props.sorted_names(), names(&["$city", "age", "Plan", "Zone"]));

        let rows = props.value_rows(&HashMap::new());
        assert_eq!(rows[0].name, "age");
        assert_eq!(rows[1].name, "Plan");
    }

    #[test]
    fn test_selection_and_delete() {
        let mut props = PropertyCatalog {
            discovered_properties: names(&["a", "b"]),
            selected_properties: Vec::new(),
        };
        props.set_selected("a", true);
        props.set_selected("a", true);
        props.set_selected("b", true);
        assert_eq!(props.selected_properties, names(&["a", "b"]));

        props.set_selected("b", false);
        assert!(!props.is_selected("b"));

        props.delete("a");
        assert_eq!(props.discovered_properties, names(&["b"]));
        assert!(props.selected_properties.is_empty());
    }

    #[test]
    fn test_import_selects_everything() {
        let mut props = PropertyCatalog {
            discovered_properties: names(&["a"]),
            selected_properties: names(&["a"]),
        };
        props.import(&names(&["b", "a"]));
        assert_eq!(props.discovered_properties, names(&["a", "b"]));
        assert_eq!(props.selected_properties, names(&["a", "b"]));
    }

    #[test]
    fn test_export_text() {
        let props = PropertyCatalog {
            discovered_properties: names(&["z", "a", "m"]),
            selected_properties: names(&["z", "a"]),
        };
        assert_eq!(props.export_text().unwrap(), ("a\nz".to_string(), 2));
        assert!(PropertyCatalog::default().export_text().is_err());
    }

    #[test]
    fn test_value_rows() {
        let props = PropertyCatalog {
            discovered_properties: Vec::new(),
            selected_properties: names(&["plan", "$email", "$city"]),
        };
        let page = HashMap::from([
            ("$email".to_string(), "a@b.c".to_string()),
            ("plan".to_string(), String::new()),
        ]);

        let rows = props.value_rows(&page);
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].label, "City");
        assert!(rows[0].missing);
        assert_eq!(rows[0].value, MISSING_VALUE);
        assert_eq!(rows[1].value, "a@b.c");
        assert_eq!(rows[2].value, EMPTY_VALUE);
        assert!(!rows[2].missing);
    }

    #[test]
    fn test_matches_search() {
        assert!(matches_search("$browser_version", "browser version"));
        assert!(matches_search("$browser_version", "_ver"));
        assert!(!matches_search("$city", "email"));
    }
}
