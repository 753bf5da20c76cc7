//! Transport configuration.
//!
//! Settings are layered, lowest priority first:
//! 1. Defaults (`TransportConfig::default`)
//! 2. An optional TOML file (`APICLIENT_CONFIG`, default `config/api-client.toml`)
//! 3. Environment variables `APICLIENT__<KEY>`, e.g.
//!    `APICLIENT__REQUEST_TIMEOUT_SECS=30`

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use config::{Environment, File};
use serde::Deserialize;
use thiserror::Error;

const CONFIG_ENV_VAR: &str = "APICLIENT_CONFIG";
const DEFAULT_CONFIG_PATH: &str = "config/api-client.toml";
const ENV_PREFIX: &str = "APICLIENT";
const ENV_SEPARATOR: &str = "__";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("invalid configuration: {0}")]
    Invalid(String),

    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[source] reqwest::Error),
}

/// Settings for `ReqwestTransport`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TransportConfig {
    pub connect_timeout_secs: u64,
    pub request_timeout_secs: u64,
    pub user_agent: String,
    pub max_redirects: usize,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            connect_timeout_secs: 10,
            request_timeout_secs: 60,
            user_agent: concat!("api-client-core/", env!("CARGO_PKG_VERSION")).to_string(),
            max_redirects: 10,
        }
    }
}

impl TransportConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Load from the default file location and the environment.
    pub fn load() -> Result<Self, ConfigError> {
        let path = env::var(CONFIG_ENV_VAR)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH));
        Self::load_from_path(path)
    }

    /// Load from `path` (skipped if missing) and the environment.
    pub fn load_from_path(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let mut builder = config::Config::builder();

        if path.exists() {
            tracing::info!("Loading client configuration from: {}", path.display());
            builder = builder.add_source(File::from(path).required(false));
        } else {
            tracing::debug!(
                "Client configuration not found at {}, using defaults and environment overrides",
                path.display()
            );
        }

        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .separator(ENV_SEPARATOR)
                .try_parsing(true),
        );

        let config: Self = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::Invalid("request_timeout_secs must be positive".to_string()));
        }
        if self.connect_timeout_secs == 0 {
            return Err(ConfigError::Invalid("connect_timeout_secs must be positive".to_string()));
        }
        if self.user_agent.trim().is_empty() {
            return Err(ConfigError::Invalid("user_agent must not be empty".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn defaults() {
        let config = TransportConfig::default();
        assert_eq!(config.connect_timeout(), Duration::from_secs(10));
        assert_eq!(config.request_timeout(), Duration::from_secs(60));
        assert_eq!(config.max_redirects, 10);
        assert!(config.user_agent.starts_with("api-client-core/"));
    }

    #[test]
    fn missing_file_uses_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let config = TransportConfig::load_from_path(temp_dir.path().join("nonexistent.toml")).unwrap();
        assert_eq!(config, TransportConfig::default());
    }

    #[test]
    fn file_overrides_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("client.toml");
        fs::write(
            &config_path,
            r#"
request_timeout_secs = 5
user_agent = "github-users/0.1"
            "#,
        )
        .unwrap();

        let config = TransportConfig::load_from_path(config_path).unwrap();
        assert_eq!(config.request_timeout(), Duration::from_secs(5));
        assert_eq!(config.user_agent, "github-users/0.1");
        assert_eq!(config.connect_timeout_secs, 10);
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("client.toml");
        fs::write(&config_path, "request_timeout_secs = 0\n").unwrap();

        let err = TransportConfig::load_from_path(config_path).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }
}
