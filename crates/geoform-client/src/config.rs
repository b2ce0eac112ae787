//! Geo service client configuration.
//!
//! Configuration is environment-provided in deployments
//! (`GEOFORM_API_BASE_URL`, `GEOFORM_API_KEY`, `GEOFORM_APP_VERSION`).
//! Missing values are logged as warnings, never treated as fatal — a
//! client built from an incomplete environment fails at request time
//! with ordinary transport errors instead of refusing to start.

use std::env;

/// Environment variable holding the geo service base URL.
pub const ENV_BASE_URL: &str = "GEOFORM_API_BASE_URL";
/// Environment variable holding the API key forwarded as `x-api-key`.
pub const ENV_API_KEY: &str = "GEOFORM_API_KEY";
/// Environment variable holding the version forwarded as `x-app-version`.
pub const ENV_APP_VERSION: &str = "GEOFORM_APP_VERSION";

/// Default per-request timeout in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Errors from configuration values that cannot be applied.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// The value contains characters that cannot appear in an HTTP header.
    #[error("{name} contains characters invalid in an HTTP header")]
    InvalidHeaderValue {
        /// Which configuration value was rejected.
        name: &'static str,
    },
}

/// Connection settings for the remote geo service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeoServiceConfig {
    /// Base URL of the geo service (e.g. `https://geo.example.com/api`).
    pub base_url: String,
    /// API key sent as the `x-api-key` header. May be empty.
    pub api_key: String,
    /// Application version sent as the `x-app-version` header. May be empty.
    pub app_version: String,
    /// Per-request timeout in seconds (default: 30).
    pub timeout_secs: u64,
}

impl GeoServiceConfig {
    /// Create a configuration with the default timeout and empty
    /// key/version headers.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: String::new(),
            app_version: String::new(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    /// Set the API key forwarded to the service.
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = api_key.into();
        self
    }

    /// Set the application version forwarded to the service.
    pub fn with_app_version(mut self, app_version: impl Into<String>) -> Self {
        self.app_version = app_version.into();
        self
    }

    /// Override the per-request timeout.
    pub fn with_timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    /// Build a configuration from the environment.
    ///
    /// Each missing variable is logged at warning level and replaced
    /// with an empty string; nothing here is fatal.
    pub fn from_env() -> Self {
        Self {
            base_url: env_or_warn(ENV_BASE_URL),
            api_key: env_or_warn(ENV_API_KEY),
            app_version: env_or_warn(ENV_APP_VERSION),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

fn env_or_warn(name: &str) -> String {
    match env::var(name) {
        Ok(value) if !value.is_empty() => value,
        _ => {
            tracing::warn!(variable = name, "missing environment variable");
            String::new()
        }
    }
}
