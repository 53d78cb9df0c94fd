//! Client configuration loaded from environment variables.
//!
//! Everything except the server URL has a usable default, so a local
//! development server only needs `HUDDLE_URL`.

use std::time::Duration;

use huddle_shared::constants::DEFAULT_API_VERSION;

/// Connection settings for one server. Passed to [`crate::Client::new`];
/// nothing here is process-global.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the server, without the API prefix.
    /// Env: `HUDDLE_URL`
    /// Default: `http://localhost:8065`
    pub url: String,

    /// API prefix appended to `url`.
    /// Env: `HUDDLE_API_VERSION`
    /// Default: `/api/v4`
    pub api_version: String,

    /// Session token from a previous login. Without one the client relies
    /// on the session cookie.
    /// Env: `HUDDLE_TOKEN`
    pub token: Option<String>,

    /// Env: `HUDDLE_USER_AGENT`
    pub user_agent: Option<String>,

    /// Sent as `Accept-Language`.
    /// Env: `HUDDLE_LOCALE`
    pub accept_language: Option<String>,

    /// Log the message of every failed request at error level.
    /// Env: `HUDDLE_LOG_ERRORS` (true/false)
    /// Default: `false`
    pub log_errors: bool,

    /// Per-request timeout.
    /// Env: `HUDDLE_TIMEOUT_SECS`
    /// Default: 30 seconds.
    pub timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:8065".to_string(),
            api_version: DEFAULT_API_VERSION.to_string(),
            token: None,
            user_agent: None,
            accept_language: None,
            log_errors: false,
            timeout: Duration::from_secs(30),
        }
    }
}

impl ClientConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }

    /// Load configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(url) = lookup("HUDDLE_URL") {
            let url = url.trim_end_matches('/');
            if url.starts_with("http://") || url.starts_with("https://") {
                config.url = url.to_string();
            } else {
                tracing::warn!(value = %url, "Invalid HUDDLE_URL, using default");
            }
        }

        if let Some(version) = lookup("HUDDLE_API_VERSION") {
            if version.starts_with('/') {
                config.api_version = version.trim_end_matches('/').to_string();
            } else {
                tracing::warn!(value = %version, "Invalid HUDDLE_API_VERSION, using default");
            }
        }

        config.token = lookup("HUDDLE_TOKEN").filter(|t| !t.is_empty());
        config.user_agent = lookup("HUDDLE_USER_AGENT").filter(|v| !v.is_empty());
        config.accept_language = lookup("HUDDLE_LOCALE").filter(|v| !v.is_empty());

        if let Some(val) = lookup("HUDDLE_LOG_ERRORS") {
            config.log_errors = val != "false" && val != "0";
        }

        if let Some(val) = lookup("HUDDLE_TIMEOUT_SECS") {
            match val.parse::<u64>() {
                Ok(secs) if secs > 0 => config.timeout = Duration::from_secs(secs),
                _ => tracing::warn!(value = %val, "Invalid HUDDLE_TIMEOUT_SECS, using default"),
            }
        }

        config
    }

    /// `url` joined with the API prefix.
    pub fn api_base(&self) -> String {
        format!("{}{}", self.url, self.api_version)
    }
}
