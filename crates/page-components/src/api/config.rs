// Component configuration
//
// Values read when handles are constructed. Loading them from a file is up to the caller;
// this module decodes them from JSON or from environment variables of the same names.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;

/// Default element timeout (10 seconds)
pub const DEFAULT_ELEMENT_TIMEOUT_MS: u64 = 10_000;

/// Default interval between resolution attempts and verification ticks
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 100;

/// Default browser name handed to the session provider
pub const DEFAULT_BROWSER_NAME: &str = "chrome";

/// Configuration consumed by `ExecutionContext` and the handles built from it.
///
/// Keys use PascalCase on the wire (`ElementTimeoutMs`, `FindHidden`, ...), matching the
/// environment variable names read by [`ComponentConfig::from_env`].
///
/// # Example
///
/// ```ignore
/// use page_components::ComponentConfig;
///
/// let config = ComponentConfig::from_json(r#"{"ElementTimeoutMs": 2500, "FindHidden": true}"#)?;
/// assert_eq!(config.element_timeout_ms, 2500);
/// assert!(config.find_hidden);
/// assert!(config.wait_for_ajax); // untouched keys keep their defaults
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct ComponentConfig {
    /// Default wait budget for every handle, in milliseconds
    pub element_timeout_ms: u64,

    /// When true, hidden nodes count as matches by default
    pub find_hidden: bool,

    /// Flash found elements (cosmetic, no behavioural effect)
    pub highlight_on_find: bool,

    /// Wait for in-flight ajax requests before searching
    pub wait_for_ajax: bool,

    /// Interval between resolution attempts and verification ticks, in milliseconds
    pub poll_interval_ms: u64,

    /// Base address used by page objects that do not declare their own domain
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_url: Option<String>,

    /// Browser requested from the session provider
    pub browser_name: String,
}

impl Default for ComponentConfig {
    fn default() -> Self {
        Self {
            element_timeout_ms: DEFAULT_ELEMENT_TIMEOUT_MS,
            find_hidden: false,
            highlight_on_find: false,
            wait_for_ajax: true,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            default_url: None,
            browser_name: DEFAULT_BROWSER_NAME.to_string(),
        }
    }
}

impl ComponentConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decodes a configuration from JSON; missing keys keep their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| Error::Configuration(format!("Invalid configuration JSON: {}", e)))
    }

    /// Reads overrides from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads overrides through `lookup`, which maps a key such as `ElementTimeoutMs` to a value.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(v) = parse_key(&lookup, "ElementTimeoutMs")? {
            config.element_timeout_ms = v;
        }
        if let Some(v) = parse_key(&lookup, "FindHidden")? {
            config.find_hidden = v;
        }
        if let Some(v) = parse_key(&lookup, "HighlightOnFind")? {
            config.highlight_on_find = v;
        }
        if let Some(v) = parse_key(&lookup, "WaitForAjax")? {
            config.wait_for_ajax = v;
        }
        if let Some(v) = parse_key(&lookup, "PollIntervalMs")? {
            config.poll_interval_ms = v;
        }
        if let Some(v) = lookup("DefaultUrl").filter(|v| !v.is_empty()) {
            config.default_url = Some(v);
        }
        if let Some(v) = lookup("BrowserName").filter(|v| !v.is_empty()) {
            config.browser_name = v;
        }

        Ok(config)
    }

    pub fn with_element_timeout(mut self, timeout: Duration) -> Self {
        self.element_timeout_ms = timeout.as_millis() as u64;
        self
    }

    pub fn with_find_hidden(mut self, find_hidden: bool) -> Self {
        self.find_hidden = find_hidden;
        self
    }

    pub fn with_highlight_on_find(mut self, highlight: bool) -> Self {
        self.highlight_on_find = highlight;
        self
    }

    pub fn with_wait_for_ajax(mut self, wait: bool) -> Self {
        self.wait_for_ajax = wait;
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval_ms = interval.as_millis() as u64;
        self
    }

    pub fn with_default_url(mut self, url: impl Into<String>) -> Self {
        self.default_url = Some(url.into());
        self
    }

    pub fn with_browser_name(mut self, name: impl Into<String>) -> Self {
        self.browser_name = name.into();
        self
    }

    pub fn element_timeout(&self) -> Duration {
        Duration::from_millis(self.element_timeout_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

fn parse_key<F, T>(lookup: &F, key: &str) -> Result<Option<T>>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .to_ascii_lowercase()
            .parse::<T>()
            .map(Some)
            .map_err(|e| Error::Configuration(format!("{} has invalid value '{}': {}", key, raw, e))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = ComponentConfig::default();
        assert_eq!(config.element_timeout_ms, 10_000);
        assert!(!config.find_hidden);
        assert!(!config.highlight_on_find);
        assert!(config.wait_for_ajax);
        assert_eq!(config.poll_interval(), Duration::from_millis(100));
        assert_eq!(config.browser_name, "chrome");
        assert!(config.default_url.is_none());
    }

    #[test]
    fn test_from_json_partial() {
        let config =
            ComponentConfig::from_json(r#"{"ElementTimeoutMs": 2500, "FindHidden": true}"#).unwrap();
        assert_eq!(config.element_timeout(), Duration::from_millis(2500));
        assert!(config.find_hidden);
        assert!(config.wait_for_ajax);
    }

    #[test]
    fn test_from_json_rejects_bad_types() {
        let err = ComponentConfig::from_json(r#"{"ElementTimeoutMs": "soon"}"#).unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
    }

    #[test]
    fn test_from_lookup_overrides() {
        let env: HashMap<&str, &str> = [
            ("ElementTimeoutMs", "750"),
            ("FindHidden", "True"),
            ("HighlightOnFind", "true"),
            ("DefaultUrl", "https://example.test/"),
            ("BrowserName", "firefox"),
        ]
        .into_iter()
        .collect();

        let config = ComponentConfig::from_lookup(|k| env.get(k).map(|v| v.to_string())).unwrap();
        assert_eq!(config.element_timeout_ms, 750);
        assert!(config.find_hidden);
        assert!(config.highlight_on_find);
        assert_eq!(config.default_url.as_deref(), Some("https://example.test/"));
        assert_eq!(config.browser_name, "firefox");
    }

    #[test]
    fn test_from_lookup_invalid_value() {
        let err = ComponentConfig::from_lookup(|k| (k == "FindHidden").then(|| "maybe".to_string()))
            .unwrap_err();
        assert!(err.to_string().contains("FindHidden"));
    }

    #[test]
    fn test_round_trip_keys_are_pascal_case() {
        let json = serde_json::to_value(ComponentConfig::default().with_default_url("http://x/")).unwrap();
        assert_eq!(json["ElementTimeoutMs"], 10_000);
        assert_eq!(json["DefaultUrl"], "http://x/");
    }
}
