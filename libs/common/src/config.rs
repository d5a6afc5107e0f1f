//! API client configuration
//!
//! Values are layered: built-in defaults first, then `CLOVER_*` environment
//! variables.

use config::{Config, Environment};
use serde::Deserialize;
use std::time::Duration;

use crate::error::{ClientError, ClientResult};

/// Default server location used when `CLOVER_BASE_URL` is unset
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";

/// Configuration for the Clover Books API client
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    /// Server origin, e.g. "https://app.cloverbooks.app"
    pub base_url: String,
    /// Per-request timeout in seconds; unset means no client-side timeout
    pub timeout_seconds: Option<u64>,
    /// User agent sent with every request
    pub user_agent: String,
}

impl ApiConfig {
    /// Create a config for `base_url` with every other value defaulted
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout_seconds: None,
            user_agent: default_user_agent(),
        }
    }

    /// Create a new ApiConfig from environment variables
    ///
    /// # Environment Variables
    /// - `CLOVER_BASE_URL`: server origin (default: "http://localhost:8000")
    /// - `CLOVER_TIMEOUT_SECONDS`: request timeout in seconds (default: none)
    /// - `CLOVER_USER_AGENT`: user agent (default: "clover-books-roles/<version>")
    pub fn from_env() -> ClientResult<Self> {
        let settings = Config::builder()
            .set_default("base_url", DEFAULT_BASE_URL)
            .and_then(|b| b.set_default("user_agent", default_user_agent()))
            .map_err(|e| ClientError::Configuration(e.to_string()))?
            .add_source(Environment::with_prefix("CLOVER").try_parsing(true))
            .build()
            .map_err(|e| ClientError::Configuration(e.to_string()))?;

        let config: ApiConfig = settings
            .try_deserialize()
            .map_err(|e| ClientError::Configuration(e.to_string()))?;

        if config.base_url.trim().is_empty() {
            return Err(ClientError::Configuration(
                "CLOVER_BASE_URL must not be empty".to_string(),
            ));
        }

        Ok(config)
    }

    /// Request timeout, if one is configured
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_seconds.map(Duration::from_secs)
    }
}

fn default_user_agent() -> String {
    format!("clover-books-roles/{}", env!("CARGO_PKG_VERSION"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_api_config_from_env_defaults() {
        unsafe {
            std::env::remove_var("CLOVER_BASE_URL");
            std::env::remove_var("CLOVER_TIMEOUT_SECONDS");
            std::env::remove_var("CLOVER_USER_AGENT");
        }

        let config = ApiConfig::from_env().unwrap();
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.timeout_seconds, None);
        assert!(config.timeout().is_none());
        assert!(config.user_agent.starts_with("clover-books-roles/"));
    }

    #[test]
    #[serial]
    fn test_api_config_from_env_with_custom_values() {
        unsafe {
            std::env::set_var("CLOVER_BASE_URL", "https://books.example.test");
            std::env::set_var("CLOVER_TIMEOUT_SECONDS", "15");
            std::env::set_var("CLOVER_USER_AGENT", "roles-test");
        }

        let config = ApiConfig::from_env().unwrap();
        assert_eq!(config.base_url, "https://books.example.test");
        assert_eq!(config.timeout(), Some(Duration::from_secs(15)));
        assert_eq!(config.user_agent, "roles-test");

        // Clean up
        unsafe {
            std::env::remove_var("CLOVER_BASE_URL");
            std::env::remove_var("CLOVER_TIMEOUT_SECONDS");
            std::env::remove_var("CLOVER_USER_AGENT");
        }
    }

    #[test]
    #[serial]
    fn test_api_config_rejects_empty_base_url() {
        unsafe {
            std::env::set_var("CLOVER_BASE_URL", " ");
        }

        let result = ApiConfig::from_env();
        assert!(matches!(result, Err(ClientError::Configuration(_))));

        unsafe {
            std::env::remove_var("CLOVER_BASE_URL");
        }
    }
}
