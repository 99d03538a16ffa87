//! Environment-driven configuration.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use tracing::warn;

use crate::session::RetryPolicy;

/// Tunables for one analysis run and the HTTP surface.
#[derive(Debug, Clone)]
pub struct AnalyzerConfig {
    /// Upper bound on review pages visited
    pub max_pages: u32,
    /// Wait for the review listing marker on each page
    pub page_wait: Duration,
    /// Wait per image selector on the product page
    pub image_wait: Duration,
    pub title_wait: Duration,
    pub image_fetch_timeout: Duration,
    pub session_retry: RetryPolicy,
    /// Overall analysis budget, checked between review pages; `None` means unbounded
    pub deadline: Option<Duration>,
    pub dedupe_reviews: bool,
    /// Chrome binary; auto-detected when unset
    pub chrome_path: Option<PathBuf>,
    pub bind_addr: String,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            max_pages: 15,
            page_wait: Duration::from_secs(20),
            image_wait: Duration::from_secs(20),
            title_wait: Duration::from_secs(20),
            image_fetch_timeout: Duration::from_secs(30),
            session_retry: RetryPolicy::default(),
            deadline: None,
            dedupe_reviews: false,
            chrome_path: None,
            bind_addr: "0.0.0.0:5500".to_string(),
        }
    }
}

impl AnalyzerConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup. Unparseable values fall back to
    /// the defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let secs = |key: &str, default: Duration| {
            Duration::from_secs(parse_or(&lookup, key, default.as_secs()))
        };

        Self {
            max_pages: parse_or(&lookup, "MAX_REVIEW_PAGES", defaults.max_pages),
            page_wait: secs("PAGE_WAIT_SECS", defaults.page_wait),
            image_wait: secs("IMAGE_WAIT_SECS", defaults.image_wait),
            title_wait: secs("TITLE_WAIT_SECS", defaults.title_wait),
            image_fetch_timeout: secs("IMAGE_FETCH_TIMEOUT_SECS", defaults.image_fetch_timeout),
            session_retry: RetryPolicy {
                max_attempts: parse_or(&lookup, "SESSION_MAX_ATTEMPTS", defaults.session_retry.max_attempts).max(1),
                backoff: secs("SESSION_BACKOFF_SECS", defaults.session_retry.backoff),
            },
            deadline: lookup("ANALYSIS_DEADLINE_SECS")
                .and_then(|v| parse_value::<u64>("ANALYSIS_DEADLINE_SECS", &v))
                .map(Duration::from_secs),
            dedupe_reviews: parse_or(&lookup, "DEDUPE_REVIEWS", defaults.dedupe_reviews),
            chrome_path: lookup("CHROME_PATH").filter(|p| !p.trim().is_empty()).map(PathBuf::from),
            bind_addr: lookup("BIND_ADDR").unwrap_or(defaults.bind_addr),
        }
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    lookup(key)
        .and_then(|raw| parse_value(key, &raw))
        .unwrap_or(default)
}

fn parse_value<T: FromStr>(key: &str, raw: &str) -> Option<T> {
    let parsed = raw.trim().parse().ok();
    if parsed.is_none() {
        warn!("⚠️ Ignoring unparseable {}={:?}, using default", key, raw);
    }
    parsed
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> AnalyzerConfig {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AnalyzerConfig::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn test_defaults_without_env() {
        let config = config_from(&[]);
        assert_eq!(config.max_pages, 15);
        assert_eq!(config.page_wait, Duration::from_secs(20));
        assert_eq!(config.session_retry.max_attempts, 3);
        assert_eq!(config.session_retry.backoff, Duration::from_secs(2));
        assert!(config.deadline.is_none());
        assert!(!config.dedupe_reviews);
        assert!(config.chrome_path.is_none());
    }

    #[test]
    fn test_overrides_are_applied() {
        let config = config_from(&[
            ("MAX_REVIEW_PAGES", "3"),
            ("PAGE_WAIT_SECS", "5"),
            ("ANALYSIS_DEADLINE_SECS", "90"),
            ("DEDUPE_REVIEWS", "true"),
            ("CHROME_PATH", "/usr/bin/google-chrome-stable"),
        ]);
        assert_eq!(config.max_pages, 3);
        assert_eq!(config.page_wait, Duration::from_secs(5));
        assert_eq!(config.deadline, Some(Duration::from_secs(90)));
        assert!(config.dedupe_reviews);
        assert_eq!(config.chrome_path, Some(PathBuf::from("/usr/bin/google-chrome-stable")));
    }

    #[test]
    fn test_bad_values_fall_back() {
        let config = config_from(&[("MAX_REVIEW_PAGES", "lots"), ("SESSION_MAX_ATTEMPTS", "0")]);
        assert_eq!(config.max_pages, 15);
        assert_eq!(config.session_retry.max_attempts, 1);
    }
}
