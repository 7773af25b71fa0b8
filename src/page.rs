/// Classification of the active tab's URL
use std::sync::LazyLock;

use regex::Regex;
use url::Url;

use crate::config::{HOST_DOMAIN, HOST_FALLBACK_URL, HOST_ORIGIN};

static PROJECT_VIEW: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/project/(\d+)/view/(\d+)").expect("valid regex"));

#[derive(Debug, Clone, PartialEq)]
pub enum PageKind {
    /// A single user's activity feed; the only page the popup is active on.
    ActivityFeed,
    Users,
    Events,
    Project { project_id: String, view_id: String },
    OtherHostPage,
    Outside,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AppPage {
    Users,
    Events,
}

impl AppPage {
    fn path(self) -> &'static str {
        match self {
            AppPage::Users => "users",
            AppPage::Events => "events",
        }
    }
}

impl PageKind {
    pub fn classify(url: &str) -> PageKind {
        let Ok(parsed) = Url::parse(url) else {
            return PageKind::Outside;
        };
        let on_host = parsed
            .host_str()
            .map_or(false, |host| host == HOST_DOMAIN || host.ends_with(&format!(".{}", HOST_DOMAIN)));
        if !on_host || !parsed.path().starts_with("/project/") {
            return PageKind::Outside;
        }

        let path = parsed.path();
        if path.contains("/app/profile") && url.contains("distinct_id=") {
            PageKind::ActivityFeed
        } else if path.contains("/app/users") {
            PageKind::Users
        } else if path.contains("/app/events") {
            PageKind::Events
        } else if let Some((project_id, view_id)) = project_and_view(path) {
            PageKind::Project { project_id, view_id }
        } else {
            PageKind::OtherHostPage
        }
    }

    pub fn is_activity_feed(&self) -> bool {
        matches!(self, PageKind::ActivityFeed)
    }
}

fn project_and_view(path: &str) -> Option<(String, String)> {
    let captures = PROJECT_VIEW.captures(path)?;
    Some((captures[1].to_string(), captures[2].to_string()))
}

/// Deep link into the same project/view, or the host's homepage.
pub fn app_url(current_url: Option<&str>, page: AppPage) -> String {
    current_url
        .and_then(|url| Url::parse(url).ok())
        .filter(|url| url.host_str().map_or(false, |h| h.ends_with(HOST_DOMAIN)))
        .and_then(|url| project_and_view(url.path()))
        .map(|(project_id, view_id)| {
            format!("{}/project/{}/view/{}/app/{}", HOST_ORIGIN, project_id, view_id, page.path())
        })
        .unwrap_or_else(|| HOST_FALLBACK_URL.to_string())
}

/// What the inactive popup tells the user, and which buttons it offers.
#[derive(Debug, Clone, PartialEq)]
pub struct Guidance {
    pub title: &'static str,
    pub message: &'static str,
    pub show_open_host: bool,
    pub show_app_links: bool,
}

impl Guidance {
    pub fn for_page(kind: &PageKind) -> Guidance {
        let title = "Follow instruction to activate";
        match kind {
            PageKind::Users | PageKind::Events | PageKind::ActivityFeed => Guidance {
                title,
                message: "Click on a user distinct ID",
                show_open_host: false,
                show_app_links: false,
            },
            PageKind::Project { .. } => Guidance {
                title,
                message: "Click the \"Users\" or \"Events\" button on the left pane",
                show_open_host: false,
                show_app_links: true,
            },
            PageKind::OtherHostPage | PageKind::Outside => Guidance {
                title,
                message: "Go to Mixpanel, then click the \"Users\" or \"Events\" button on the left pane",
                show_open_host: true,
                show_app_links: false,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FEED: &str = "https://mixpanel.com/project/2582735/view/3122095/app/profile#distinct_id=abc";

    #[test]
    fn test_classify_activity_feed() {
        assert_eq!(PageKind::classify(FEED), PageKind::ActivityFeed);
        assert!(PageKind::classify(FEED).is_activity_feed());
    }

    #[test]
    fn test_profile_without_distinct_id_is_not_a_feed() {
        let url = "https://mixpanel.com/project/1/view/2/app/profile";
        assert_eq!(
            PageKind::classify(url),
            PageKind::Project { project_id: "1".to_string(), view_id: "2".to_string() }
        );
    }

    #[test]
    fn test_classify_app_pages() {
        assert_eq!(PageKind::classify("https://mixpanel.com/project/1/view/2/app/users"), PageKind::Users);
        assert_eq!(PageKind::classify("https://mixpanel.com/project/1/view/2/app/events#x"), PageKind::Events);
        assert_eq!(PageKind::classify("https://eu.mixpanel.com/project/1/view/2/app/home").is_activity_feed(), false);
    }

    #[test]
    fn test_classify_other_pages() {
        assert_eq!(PageKind::classify("https://mixpanel.com/project/1/settings"), PageKind::OtherHostPage);
        assert_eq!(PageKind::classify("https://mixpanel.com/pricing"), PageKind::Outside);
        assert_eq!(PageKind::classify("https://example.com/project/1/view/2"), PageKind::Outside);
        assert_eq!(PageKind::classify("chrome://extensions"), PageKind::Outside);
        assert_eq!(PageKind::classify("not a url"), PageKind::Outside);
    }

    #[test]
    fn test_content_script_runs_on_every_classified_host() {
        let manifest: serde_json::Value = serde_json::from_str(include_str!("../extension/manifest.json")).unwrap();
        let matches = &manifest["content_scripts"][0]["matches"];
        assert_eq!(matches, &serde_json::json!(["https://mixpanel.com/project/*", "https://*.mixpanel.com/project/*"]));
        assert_eq!(PageKind::classify("https://eu.mixpanel.com/project/1/view/2/app/profile#distinct_id=a"), PageKind::ActivityFeed);
    }

    #[test]
    fn test_app_url() {
        assert_eq!(
            app_url(Some("https://mixpanel.com/project/2582735/view/3122095/app/home"), AppPage::Users),
            "https://mixpanel.com/project/2582735/view/3122095/app/users"
        );
        assert_eq!(
            app_url(Some("https://mixpanel.com/project/1/view/2/app/home"), AppPage::Events),
            "https://mixpanel.com/project/1/view/2/app/events"
        );
        assert_eq!(app_url(Some("https://example.com"), AppPage::Users), "https://www.mixpanel.com");
        assert_eq!(app_url(None, AppPage::Users), "https://www.mixpanel.com");
    }

    #[test]
    fn test_guidance() {
        let project = PageKind::Project { project_id: "1".to_string(), view_id: "2".to_string() };
        assert!(Guidance::for_page(&project).show_app_links);
        assert!(!Guidance::for_page(&project).show_open_host);
        assert!(Guidance::for_page(&PageKind::Outside).show_open_host);
        assert_eq!(Guidance::for_page(&PageKind::Users).message, "Click on a user distinct ID");
    }

    #[test]
    fn test_guidance_for_host_page_without_view() {
        let guidance = Guidance::for_page(&PageKind::OtherHostPage);
        assert!(guidance.show_open_host);
        assert!(!guidance.show_app_links);
        assert_eq!(guidance, Guidance::for_page(&PageKind::Outside));
        assert!(guidance.message.starts_with("Go to Mixpanel, then"));
    }
}
