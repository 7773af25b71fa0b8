/// Build-time configuration and host-site constants

pub const EXTENSION_NAME: &str = "Mixpanel Activity Navigator";

/// Host application the extension targets.
pub const HOST_DOMAIN: &str = "mixpanel.com";
pub const HOST_ORIGIN: &str = "https://mixpanel.com";
pub const HOST_FALLBACK_URL: &str = "https://www.mixpanel.com";

/// Delay between rewriting the hash and reloading, so the host sees the change.
pub const RELOAD_DELAY_MS: i32 = 100;
/// Properties render lazily; scan once more after this delay.
pub const PROPERTY_RESCAN_DELAY_MS: i32 = 2000;
pub const HASH_POLL_INTERVAL_MS: i32 = 2000;
pub const SHOW_MORE_REFRESH_DELAY_MS: u32 = 1500;
pub const APPLY_RESYNC_DELAY_MS: u32 = 500;

pub const GA_COLLECT_ENDPOINT: &str = "https://www.google-analytics.com/mp/collect";

#[derive(Debug, Clone, PartialEq)]
pub struct AnalyticsConfig {
    pub measurement_id: String,
    pub api_secret: String,
}

impl AnalyticsConfig {
    pub fn collect_url(&self) -> String {
        format!(
            "{}?measurement_id={}&api_secret={}",
            GA_COLLECT_ENDPOINT, self.measurement_id, self.api_secret
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExtensionConfig {
    pub analytics: Option<AnalyticsConfig>,
    pub debug: bool,
}

impl ExtensionConfig {
    /// Configuration baked in at compile time.
    pub fn from_build_env() -> Self {
        Self::from_values(
            option_env!("NAVIGATOR_GA_MEASUREMENT_ID"),
            option_env!("NAVIGATOR_GA_API_SECRET"),
            option_env!("NAVIGATOR_DEBUG"),
        )
    }

    fn from_values(measurement_id: Option<&str>, api_secret: Option<&str>, debug: Option<&str>) -> Self {
        let analytics = match (measurement_id, api_secret) {
            (Some(id), Some(secret)) if !id.trim().is_empty() && !secret.trim().is_empty() => {
                Some(AnalyticsConfig {
                    measurement_id: id.trim().to_string(),
                    api_secret: secret.trim().to_string(),
                })
            }
            _ => None,
        };

        let debug = matches!(debug.map(str::trim), Some("1") | Some("true") | Some("yes"));

        ExtensionConfig { analytics, debug }
    }

    pub fn log_level(&self) -> log::Level {
        if self.debug {
            log::Level::Debug
        } else {
            log::Level::Info
        }
    }
}

impl Default for ExtensionConfig {
    fn default() -> Self {
        Self::from_build_env()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_analytics_requires_both_credentials() {
        let config = ExtensionConfig::from_values(Some("G-ABC"), None, None);
        assert!(config.analytics.is_none());

        let config = ExtensionConfig::from_values(Some("G-ABC"), Some("  "), None);
        assert!(config.analytics.is_none());

        let config = ExtensionConfig::from_values(Some("G-ABC"), Some("secret"), None);
        let analytics = config.analytics.unwrap();
        assert_eq!(analytics.measurement_id, "G-ABC");
        assert_eq!(
            analytics.collect_url(),
            "https://www.google-analytics.com/mp/collect?measurement_id=G-ABC&api_secret=secret"
        );
    }

    #[test]
    fn test_debug_flag() {
        assert!(ExtensionConfig::from_values(None, None, Some("1")).debug);
        assert!(ExtensionConfig::from_values(None, None, Some("true")).debug);
        assert!(!ExtensionConfig::from_values(None, None, Some("0")).debug);
        assert_eq!(ExtensionConfig::from_values(None, None, None).log_level(), log::Level::Info);
    }
}
