//! Application configuration module
//!
//! Provides configuration for the client core: the API base URL, the
//! per-request timeout, and the preview debounce window.

use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Default API base URL
const DEFAULT_API_URL: &str = "http://127.0.0.1:8000/api";

/// Default per-request deadline
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Default quiet period before a preview re-render
const DEFAULT_PREVIEW_DEBOUNCE: Duration = Duration::from_millis(1000);

/// Client configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Base URL every request path is resolved against
    pub api_base: Url,
    /// Deadline applied to each request
    pub request_timeout: Duration,
    /// Quiet period the preview synchronizer waits after an edit
    pub preview_debounce: Duration,
}

impl Default for AppConfig {
    fn default() -> Self {
        let api_base = std::env::var("CVFORGE_API_URL")
            .ok()
            .and_then(|raw| Url::parse(&raw).ok())
            .unwrap_or_else(|| Url::parse(DEFAULT_API_URL).expect("default API URL is valid"));
        Self {
            api_base,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            preview_debounce: DEFAULT_PREVIEW_DEBOUNCE,
        }
    }
}

impl AppConfig {
    /// Create a new AppConfigBuilder
    pub fn builder() -> AppConfigBuilder {
        AppConfigBuilder::default()
    }
}

/// Builder for AppConfig
#[derive(Debug, Default)]
pub struct AppConfigBuilder {
    api_base: Option<String>,
    request_timeout: Option<Duration>,
    preview_debounce: Option<Duration>,
}

impl AppConfigBuilder {
    /// Set the API base URL
    pub fn api_base(mut self, url: impl Into<String>) -> Self {
        self.api_base = Some(url.into());
        self
    }

    /// Set the per-request timeout
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    /// Set the preview debounce window
    pub fn preview_debounce(mut self, debounce: Duration) -> Self {
        self.preview_debounce = Some(debounce);
        self
    }

    /// Build the configuration
    pub fn build(self) -> Result<AppConfig, ConfigError> {
        let defaults = AppConfig::default();
        let api_base = match self.api_base {
            Some(raw) => Url::parse(&raw).map_err(|_| ConfigError::InvalidUrl(raw))?,
            None => defaults.api_base,
        };
        Ok(AppConfig {
            api_base,
            request_timeout: self.request_timeout.unwrap_or(defaults.request_timeout),
            preview_debounce: self.preview_debounce.unwrap_or(defaults.preview_debounce),
        })
    }
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid URL: {0}")]
    InvalidUrl(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_default_config() {
        std::env::remove_var("CVFORGE_API_URL");
        let config = AppConfig::default();
        assert_eq!(config.api_base.as_str(), "http://127.0.0.1:8000/api");
        assert_eq!(config.request_timeout, Duration::from_secs(15));
        assert_eq!(config.preview_debounce, Duration::from_millis(1000));
    }

    #[test]
    #[serial]
    fn test_env_override() {
        std::env::set_var("CVFORGE_API_URL", "https://cv.example.com/api");
        let config = AppConfig::default();
        assert_eq!(config.api_base.as_str(), "https://cv.example.com/api");
        std::env::remove_var("CVFORGE_API_URL");
    }

    #[test]
    #[serial]
    fn test_builder_overrides() {
        let config = AppConfig::builder()
            .api_base("http://localhost:9999")
            .request_timeout(Duration::from_millis(200))
            .preview_debounce(Duration::from_millis(50))
            .build()
            .unwrap();
        assert_eq!(config.api_base.as_str(), "http://localhost:9999/");
        assert_eq!(config.request_timeout, Duration::from_millis(200));
        assert_eq!(config.preview_debounce, Duration::from_millis(50));
    }

    #[test]
    fn test_builder_rejects_invalid_url() {
        let result = AppConfig::builder().api_base("not a url").build();
        assert!(matches!(result, Err(ConfigError::InvalidUrl(_))));
    }
}
