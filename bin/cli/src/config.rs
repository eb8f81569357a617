//! CLI configuration.
//!
//! Loaded via the `config` crate, lowest priority first:
//!
//! 1. Built-in defaults
//! 2. `taskdesk.toml` in the working directory, or the file given by `--config`
//! 3. Environment variables: `TASKDESK_` prefix, `__` between nested keys
//!    (e.g. `TASKDESK_API__BASE_URL`)

use rootcause::prelude::Report;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use taskdesk_api::ApiConfig;
use taskdesk_authz::GatePaths;

use crate::error::CliError;

/// Config file read when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "taskdesk.toml";

/// Complete CLI configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CliConfig {
    /// Local state files.
    #[serde(default)]
    pub session: SessionConfig,

    /// REST backend.
    #[serde(default)]
    pub api: ApiConfig,

    /// Redirect destinations.
    #[serde(default)]
    pub routes: GatePaths,
}

/// Where local state lives.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SessionConfig {
    /// Persisted session (token and user).
    #[serde(default = "default_session_path")]
    pub path: PathBuf,

    /// Pending navigation intent, written when a page redirects to login.
    #[serde(default = "default_intent_path")]
    pub intent_path: PathBuf,

    /// Last page shown, offered as "return to previous page" after a denial.
    #[serde(default = "default_history_path")]
    pub history_path: PathBuf,
}

fn default_session_path() -> PathBuf {
    PathBuf::from(".taskdesk/session.json")
}

fn default_intent_path() -> PathBuf {
    PathBuf::from(".taskdesk/intent.json")
}

fn default_history_path() -> PathBuf {
    PathBuf::from(".taskdesk/last_page.json")
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            path: default_session_path(),
            intent_path: default_intent_path(),
            history_path: default_history_path(),
        }
    }
}

impl CliConfig {
    /// Loads configuration from `file` (or the default file, if present) and
    /// the process environment.
    ///
    /// # Errors
    ///
    /// Returns an error if an explicit file is missing or any source is
    /// malformed.
    pub fn load(file: Option<&Path>) -> Result<Self, Report<CliError>> {
        Self::from_sources(file, environment())
    }

    fn from_sources(
        file: Option<&Path>,
        env: config::Environment,
    ) -> Result<Self, Report<CliError>> {
        let file_source = match file {
            Some(path) => config::File::from(path).required(true),
            None => config::File::with_name(DEFAULT_CONFIG_FILE).required(false),
        };

        let config = config::Config::builder()
            .add_source(file_source)
            .add_source(env)
            .build()
            .and_then(config::Config::try_deserialize)
            .map_err(|e| CliError::Config {
                reason: e.to_string(),
            })?;
        Ok(config)
    }
}

fn environment() -> config::Environment {
    config::Environment::with_prefix("TASKDESK")
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::fs;

    fn env(vars: &[(&str, &str)]) -> config::Environment {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        environment().source(Some(map))
    }

    #[test]
    fn defaults_without_sources() {
        let config = CliConfig::from_sources(None, env(&[])).expect("config");
        assert_eq!(config.session, SessionConfig::default());
        assert_eq!(
            config.session.history_path,
            PathBuf::from(".taskdesk/last_page.json")
        );
        assert_eq!(config.api.base_url, "http://localhost:8000/api");
        assert_eq!(config.routes.login, "/login");
        assert_eq!(config.routes.unauthorized, "/unauthorized");
        assert_eq!(config.routes.landing, "/dashboard");
    }

    #[test]
    fn file_values_override_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("taskdesk.toml");
        fs::write(
            &path,
            "[api]\nbase_url = \"https://tasks.example.com/api\"\ntimeout_seconds = 3\n\n[routes]\nlanding = \"/projects\"\n",
        )
        .expect("write");

        let config = CliConfig::from_sources(Some(&path), env(&[])).expect("config");
        assert_eq!(config.api.base_url, "https://tasks.example.com/api");
        assert_eq!(config.api.timeout_seconds, 3);
        assert_eq!(config.routes.landing, "/projects");
        assert_eq!(config.routes.login, "/login");
    }

    #[test]
    fn environment_overrides_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("taskdesk.toml");
        fs::write(&path, "[api]\ntimeout_seconds = 3\n").expect("write");

        let config = CliConfig::from_sources(
            Some(&path),
            env(&[
                ("TASKDESK_API__TIMEOUT_SECONDS", "30"),
                ("TASKDESK_SESSION__PATH", "/tmp/session.json"),
            ]),
        )
        .expect("config");
        assert_eq!(config.api.timeout_seconds, 30);
        assert_eq!(config.session.path, PathBuf::from("/tmp/session.json"));
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let missing = dir.path().join("nope.toml");
        assert!(CliConfig::from_sources(Some(&missing), env(&[])).is_err());
    }
}
