/// Reading and rewriting the host page's URL-fragment filter syntax
///
/// The activity feed keeps its filters in the fragment, e.g.
/// `#distinct_id=42&~(excludedEvents~(~'Page%20View~'Login)~dateRange~(...))`.
/// Hidden event names live in the `excludedEvents~(...)` section, each
/// prefixed with `~'`.
use std::sync::LazyLock;

use percent_encoding::percent_decode_str;
use regex::Regex;

const DISTINCT_ID_PARAM: &str = "distinct_id=";

static EXCLUDED_SECTION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"excludedEvents~\(([^)]*)\)").expect("valid regex"));

static EXCLUDED_SECTION_WITH_SEPARATOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"excludedEvents~\([^)]*\)~").expect("valid regex"));

static EXCLUDED_ONLY_GROUP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"&~\(excludedEvents~\([^)]*\)\)").expect("valid regex"));

/// True when the fragment identifies a single user's activity feed.
pub fn is_activity_feed_hash(hash: &str) -> bool {
    !hash.is_empty() && hash.contains(DISTINCT_ID_PARAM)
}

/// Event names currently hidden by the fragment, in fragment order.
pub fn extract_hidden_events(hash: &str) -> Vec<String> {
    let Some(captures) = EXCLUDED_SECTION.captures(hash) else {
        return Vec::new();
    };

    captures[1]
        .split("~'")
        .filter(|event| !event.is_empty())
        .map(|event| event.trim().to_string())
        .collect()
}

/// Build the `excludedEvents~(...)` section, or `None` when nothing is hidden.
pub fn excluded_events_section(events: &[String]) -> Option<String> {
    if events.is_empty() {
        return None;
    }
    let body: String = events.iter().map(|e| format!("~'{}", e)).collect();
    Some(format!("excludedEvents~({})", body))
}

/// Rewrite a fragment body (without the leading `#`) so that exactly
/// `events` are hidden.
pub fn apply_hidden_events(hash_content: &str, events: &[String]) -> String {
    let section = excluded_events_section(events);

    if EXCLUDED_SECTION.is_match(hash_content) {
        return match section {
            // `NoExpand` keeps `$` in event names literal.
            Some(section) => EXCLUDED_SECTION
                .replace(hash_content, regex::NoExpand(&section))
                .into_owned(),
            None => {
                // Leading member of a group: `&~(excludedEvents~(...)~dateRange~(...))`
                let content = EXCLUDED_SECTION_WITH_SEPARATOR.replace(hash_content, "");
                // Sole member of a group: `&~(excludedEvents~(...))`
                let content = EXCLUDED_ONLY_GROUP.replace(&content, "");
                EXCLUDED_SECTION.replace(&content, "").into_owned()
            }
        };
    }

    match section {
        Some(section) => match hash_content.find("&~(") {
            Some(pos) => {
                let insert_at = pos + "&~(".len();
                format!("{}{}~{}", &hash_content[..insert_at], section, &hash_content[insert_at..])
            }
            None => format!("{}&~({})", hash_content, section),
        },
        None => hash_content.to_string(),
    }
}

/// The profile's `distinct_id`, percent-decoded, from a full URL or a fragment.
/// A literal `+` is kept as is.
pub fn distinct_id(url: &str) -> Option<String> {
    let start = url.find(DISTINCT_ID_PARAM)? + DISTINCT_ID_PARAM.len();
    let raw = url[start..].split('&').next().unwrap_or_default();
    if raw.is_empty() {
        return None;
    }
    let decoded = percent_decode_str(raw).decode_utf8().ok()?;
    Some(decoded.into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_is_activity_feed_hash() {
        assert!(is_activity_feed_hash("#distinct_id=abc"));
        assert!(!is_activity_feed_hash(""));
        assert!(!is_activity_feed_hash("#~(dateRange~(type~'last))"));
    }

    #[test]
    fn test_extract_hidden_events() {
        let hash = "#distinct_id=1&~(excludedEvents~(~'Page View~'Login~' Logout )~dateRange~(x))";
        assert_eq!(extract_hidden_events(hash), names(&["Page View", "Login", "Logout"]));
    }

    #[test]
    fn test_extract_hidden_events_missing() {
        assert!(extract_hidden_events("").is_empty());
        assert!(extract_hidden_events("#distinct_id=1").is_empty());
        assert!(extract_hidden_events("#distinct_id=1&~(excludedEvents~())").is_empty());
    }

    #[test]
    fn test_replace_existing_section() {
        let hash = "distinct_id=1&~(excludedEvents~(~'A)~dateRange~(x))";
        assert_eq!(
            apply_hidden_events(hash, &names(&["B", "C"])),
            "distinct_id=1&~(excludedEvents~(~'B~'C)~dateRange~(x))"
        );
    }

    #[test]
    fn test_remove_section_leading_in_group() {
        let hash = "distinct_id=1&~(excludedEvents~(~'A)~dateRange~(x))";
        assert_eq!(apply_hidden_events(hash, &[]), "distinct_id=1&~(dateRange~(x))");
    }

    #[test]
    fn test_remove_section_alone_in_group() {
        let hash = "distinct_id=1&~(excludedEvents~(~'A~'B))";
        assert_eq!(apply_hidden_events(hash, &[]), "distinct_id=1");
    }

    #[test]
    fn test_remove_section_trailing_in_group() {
        let hash = "distinct_id=1&~(dateRange~(x)~excludedEvents~(~'A))";
        assert_eq!(apply_hidden_events(hash, &[]), "distinct_id=1&~(dateRange~(x)~)");
    }

    #[test]
    fn test_insert_into_existing_group() {
        let hash = "distinct_id=1&~(dateRange~(x))";
        assert_eq!(
            apply_hidden_events(hash, &names(&["A"])),
            "distinct_id=1&~(excludedEvents~(~'A)~dateRange~(x))"
        );
    }

    #[test]
    fn test_append_new_group() {
        assert_eq!(
            apply_hidden_events("distinct_id=1", &names(&["A", "B"])),
            "distinct_id=1&~(excludedEvents~(~'A~'B))"
        );
    }

    #[test]
    fn test_no_section_no_events_is_unchanged() {
        assert_eq!(apply_hidden_events("distinct_id=1", &[]), "distinct_id=1");
    }

    #[test]
    fn test_dollar_names_are_literal() {
        let hash = "distinct_id=1&~(excludedEvents~(~'A))";
        assert_eq!(
            apply_hidden_events(hash, &names(&["$mp_web_page_view"])),
            "distinct_id=1&~(excludedEvents~(~'$mp_web_page_view))"
        );
    }

    #[test]
    fn test_round_trip_through_extract() {
        let hash = apply_hidden_events("distinct_id=1&~(dateRange~(x))", &names(&["Sign Up", "Login"]));
        assert_eq!(extract_hidden_events(&hash), names(&["Sign Up", "Login"]));
    }

    #[test]
    fn test_distinct_id() {
        let url = "https://mixpanel.com/project/1/view/2/app/profile#distinct_id=user%40example.com&~(x)";
        assert_eq!(distinct_id(url), Some("user@example.com".to_string()));
        assert_eq!(distinct_id("#distinct_id=abc"), Some("abc".to_string()));
        assert_eq!(distinct_id("#distinct_id=&x"), None);
        assert_eq!(distinct_id("https://mixpanel.com/project/1"), None);
    }

    #[test]
    fn test_distinct_id_keeps_plus() {
        let url = "https://mixpanel.com/project/1/view/2/app/profile#distinct_id=user+tag%40example.com&~(x)";
        assert_eq!(distinct_id(url), Some("user+tag@example.com".to_string()));
        assert_eq!(distinct_id("#distinct_id=a%2Bb%20c"), Some("a+b c".to_string()));
        // Invalid UTF-8 after decoding
        assert_eq!(distinct_id("#distinct_id=%FF"), None);
    }
}
