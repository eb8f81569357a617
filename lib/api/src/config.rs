//! Backend connection settings.

use serde::Deserialize;
use std::time::Duration;

fn default_base_url() -> String {
    "http://localhost:8000/api".to_string()
}

fn default_timeout_seconds() -> u64 {
    10
}

/// Where the REST API lives and how long to wait for it.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ApiConfig {
    /// API root, e.g. `https://tasks.example.com/api`.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Per-request timeout.
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_seconds: default_timeout_seconds(),
        }
    }
}

impl ApiConfig {
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_point_at_local_api() {
        let config = ApiConfig::default();
        assert_eq!(config.base_url, "http://localhost:8000/api");
        assert_eq!(config.timeout(), Duration::from_secs(10));
    }

    #[test]
    fn partial_config_fills_defaults() {
        let config: ApiConfig =
            serde_json::from_str(r#"{"base_url":"https://tasks.example.com/api"}"#)
                .expect("deserialize");
        assert_eq!(config.base_url, "https://tasks.example.com/api");
        assert_eq!(config.timeout_seconds, 10);
    }
}
