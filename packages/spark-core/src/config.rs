//! SDK configuration.
//!
//! Reads the access token, service endpoint and transport settings from
//! environment variables, or takes them directly from the host application.

use std::env;
use std::time::Duration;

use crate::error::{Error, Result};
use crate::logging::LogLevel;

/// Production REST endpoint.
pub const DEFAULT_BASE_URL: &str = "https://api.ciscospark.com/v1";

/// Default per-request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Configuration for a [`Spark`](crate::Spark) instance.
#[derive(Debug, Clone)]
pub struct SdkConfig {
    /// Bearer token sent with every request.
    pub access_token: Option<String>,
    /// Base URL of the REST API, without a trailing slash.
    pub base_url: String,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
    /// Value of the `User-Agent` header.
    pub user_agent: String,
    /// Level every media engine log line is pinned to.
    pub media_engine_log_level: LogLevel,
}

impl SdkConfig {
    /// Configuration with the given token and defaults for everything else.
    pub fn with_access_token(token: impl Into<String>) -> Self {
        Self {
            access_token: Some(token.into()),
            ..Self::default()
        }
    }

    /// Load configuration from environment variables.
    ///
    /// - `SPARK_ACCESS_TOKEN`
    /// - `SPARK_API_BASE_URL`
    /// - `SPARK_HTTP_TIMEOUT_SECS`
    /// - `SPARK_USER_AGENT`
    /// - `SPARK_MEDIA_ENGINE_LOG_LEVEL`
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with a custom variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let timeout_secs = match lookup("SPARK_HTTP_TIMEOUT_SECS") {
            Some(raw) => raw.trim().parse::<u64>().map_err(|_| {
                Error::InvalidConfig(format!("SPARK_HTTP_TIMEOUT_SECS is not a number: {raw}"))
            })?,
            None => defaults.timeout_secs,
        };

        let media_engine_log_level = match lookup("SPARK_MEDIA_ENGINE_LOG_LEVEL") {
            Some(raw) => raw.parse::<LogLevel>()?,
            None => defaults.media_engine_log_level,
        };

        Ok(Self {
            access_token: lookup("SPARK_ACCESS_TOKEN").filter(|t| !t.trim().is_empty()),
            base_url: lookup("SPARK_API_BASE_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or(defaults.base_url),
            timeout_secs,
            user_agent: lookup("SPARK_USER_AGENT").unwrap_or(defaults.user_agent),
            media_engine_log_level,
        })
    }

    /// Override the REST endpoint (tests point this at a mock service).
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Override the level media engine logs are pinned to.
    pub fn media_engine_log_level(mut self, level: LogLevel) -> Self {
        self.media_engine_log_level = level;
        self
    }

    /// Override the per-request timeout.
    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    /// Request timeout as a [`Duration`].
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Check the configuration is usable and return the access token.
    pub fn validate(&self) -> Result<&str> {
        let token = self
            .access_token
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or(Error::MissingAccessToken)?;

        if !(self.base_url.starts_with("https://") || self.base_url.starts_with("http://")) {
            return Err(Error::InvalidConfig(format!(
                "base_url must be an http(s) URL: {}",
                self.base_url
            )));
        }

        if self.timeout_secs == 0 {
            return Err(Error::InvalidConfig(
                "timeout_secs must be greater than zero".to_string(),
            ));
        }

        Ok(token)
    }
}

impl Default for SdkConfig {
    fn default() -> Self {
        Self {
            access_token: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            user_agent: format!("spark-core/{}", env!("CARGO_PKG_VERSION")),
            media_engine_log_level: LogLevel::Info,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = SdkConfig::default();
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.timeout_secs, 30);
        assert_eq!(config.media_engine_log_level, LogLevel::Info);
        assert!(config.user_agent.starts_with("spark-core/"));
        assert!(matches!(config.validate(), Err(Error::MissingAccessToken)));
    }

    #[test]
    fn test_from_lookup_reads_every_variable() {
        let config = SdkConfig::from_lookup(lookup_from(&[
            ("SPARK_ACCESS_TOKEN", "abc"),
            ("SPARK_API_BASE_URL", "http://127.0.0.1:9000/v1/"),
            ("SPARK_HTTP_TIMEOUT_SECS", "5"),
            ("SPARK_USER_AGENT", "host-app/2.0"),
            ("SPARK_MEDIA_ENGINE_LOG_LEVEL", "warn"),
        ]))
        .unwrap();

        assert_eq!(config.access_token.as_deref(), Some("abc"));
        assert_eq!(config.base_url, "http://127.0.0.1:9000/v1");
        assert_eq!(config.timeout(), Duration::from_secs(5));
        assert_eq!(config.user_agent, "host-app/2.0");
        assert_eq!(config.media_engine_log_level, LogLevel::Warn);
        assert_eq!(config.validate().unwrap(), "abc");
    }

    #[test]
    fn test_from_lookup_rejects_bad_values() {
        let bad_timeout =
            SdkConfig::from_lookup(lookup_from(&[("SPARK_HTTP_TIMEOUT_SECS", "soon")]));
        assert!(matches!(bad_timeout, Err(Error::InvalidConfig(_))));

        let bad_level =
            SdkConfig::from_lookup(lookup_from(&[("SPARK_MEDIA_ENGINE_LOG_LEVEL", "loud")]));
        assert!(matches!(bad_level, Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_blank_token_is_missing() {
        let config = SdkConfig::from_lookup(lookup_from(&[("SPARK_ACCESS_TOKEN", "  ")])).unwrap();
        assert!(config.access_token.is_none());
        assert!(matches!(config.validate(), Err(Error::MissingAccessToken)));
    }

    #[test]
    fn test_validate_rejects_bad_url_and_zero_timeout() {
        let config = SdkConfig::with_access_token("t").base_url("ftp://example.com");
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));

        let config = SdkConfig::with_access_token("t").timeout_secs(0);
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));
    }
}
