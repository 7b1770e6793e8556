use crate::keywords::LocationKeywords;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8000";
pub const DEFAULT_PROBE_URL: &str = "https://www.google.com/favicon.ico";
pub const DEFAULT_PROBE_INTERVAL: Duration = Duration::from_secs(30);
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(5);
pub const DEFAULT_GEOLOCATION_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_ONLINE_MODEL_LABEL: &str = "Gemini AI";
pub const DEFAULT_OFFLINE_MODEL_LABEL: &str = "Phi-3 (Local)";
pub const FALLBACK_SOURCE_LABEL: &str = "Phi-3 Local - Fallback";

/// What to do when an online text query fails before a response arrives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FallbackPolicy {
    /// Retry once against the offline endpoint.
    #[default]
    OfflineRetry,
    /// Surface the failure as is.
    None,
}

impl FallbackPolicy {
    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "offline" | "offline-retry" | "retry" => Some(Self::OfflineRetry),
            "none" | "off" | "disabled" => Some(Self::None),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RouterOptions {
    pub base_url: String,
    pub probe_url: String,
    pub probe_interval: Duration,
    pub probe_timeout: Duration,
    pub request_timeout: Option<Duration>,
    /// How long a location lookup may take before the query goes without it.
    pub geolocation_timeout: Duration,
    pub fallback: FallbackPolicy,
    /// Connectivity assumed before the first reachability check.
    pub assume_online: bool,
    pub online_model_label: String,
    pub offline_model_label: String,
    /// Overrides the built-in location keyword list.
    pub location_keywords: Option<Vec<String>>,
}

impl Default for RouterOptions {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            probe_url: DEFAULT_PROBE_URL.to_string(),
            probe_interval: DEFAULT_PROBE_INTERVAL,
            probe_timeout: DEFAULT_PROBE_TIMEOUT,
            request_timeout: None,
            geolocation_timeout: DEFAULT_GEOLOCATION_TIMEOUT,
            fallback: FallbackPolicy::default(),
            assume_online: false,
            online_model_label: DEFAULT_ONLINE_MODEL_LABEL.to_string(),
            offline_model_label: DEFAULT_OFFLINE_MODEL_LABEL.to_string(),
            location_keywords: None,
        }
    }
}

impl RouterOptions {
    /// Defaults overlaid with `NANBAN_*` environment variables. Unparseable
    /// values are ignored with a warning.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut options = Self::default();

        if let Some(base_url) = lookup("NANBAN_BASE_URL") {
            options.base_url = base_url;
        }
        if let Some(probe_url) = lookup("NANBAN_PROBE_URL") {
            options.probe_url = probe_url;
        }
        if let Some(secs) = lookup("NANBAN_PROBE_INTERVAL_SECS") {
            match secs.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => options.probe_interval = Duration::from_secs(secs),
                _ => tracing::warn!(value = %secs, "ignoring invalid NANBAN_PROBE_INTERVAL_SECS"),
            }
        }
        if let Some(fallback) = lookup("NANBAN_FALLBACK") {
            match FallbackPolicy::parse(&fallback) {
                Some(policy) => options.fallback = policy,
                None => tracing::warn!(value = %fallback, "ignoring invalid NANBAN_FALLBACK"),
            }
        }

        options
    }

    pub(crate) fn keywords(&self) -> LocationKeywords {
        match &self.location_keywords {
            Some(keywords) => LocationKeywords::new(keywords),
            None => LocationKeywords::default(),
        }
    }

    /// Label shown for the backend serving the given connectivity.
    #[must_use]
    pub fn model_label(&self, online: bool) -> &str {
        if online {
            &self.online_model_label
        } else {
            &self.offline_model_label
        }
    }
}
