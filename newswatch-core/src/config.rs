use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use url::Url;

use crate::error::FeedError;

/// Environment variable overriding `api.base_url`.
pub const API_URL_ENV: &str = "NEWSWATCH_API_URL";

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ClientConfig {
    pub api: ApiConfig,
    pub polling: PollingConfig,
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    pub request_timeout_seconds: u64,
    pub user_agent: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PollingConfig {
    pub interval_seconds: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory holding the read-state file. Defaults to the config directory.
    pub data_dir: Option<PathBuf>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8000/api/".to_string(),
            request_timeout_seconds: 10,
            user_agent: concat!("newswatch/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            interval_seconds: 15,
        }
    }
}

impl ClientConfig {
    /// `<config dir>/newswatch`, created if missing.
    pub fn config_dir() -> Result<PathBuf, FeedError> {
        let config_dir = dirs::config_dir().ok_or_else(|| {
            FeedError::Storage(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "no configuration directory on this platform",
            ))
        })?;

        let app_config_dir = config_dir.join("newswatch");
        std::fs::create_dir_all(&app_config_dir)?;
        Ok(app_config_dir)
    }

    pub fn config_file_path() -> Result<PathBuf, FeedError> {
        Ok(Self::config_dir()?.join("config.json"))
    }

    /// Loads the user config file, falling back to (and writing out) defaults.
    pub fn load() -> Self {
        let loaded = Self::config_file_path().and_then(|path| Self::load_from(&path));
        match loaded {
            Ok(config) => config,
            Err(e) => {
                warn!(error = %e, "could not load configuration, using defaults");
                let default_config = Self::default();
                if let Err(save_err) = default_config.save() {
                    warn!(error = %save_err, "could not save default configuration");
                }
                default_config
            }
        }
    }

    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, FeedError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content)
            .map_err(|e| FeedError::Validation(format!("{}: {e}", path.display())))
    }

    pub fn save(&self) -> Result<(), FeedError> {
        self.save_to(Self::config_file_path()?)
    }

    pub fn save_to(&self, path: impl AsRef<Path>) -> Result<(), FeedError> {
        let json = serde_json::to_string_pretty(self).map_err(FeedError::Encode)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Applies `NEWSWATCH_API_URL` when set.
    pub fn with_env_overrides(self) -> Self {
        self.with_api_url(std::env::var(API_URL_ENV).ok())
    }

    pub fn with_api_url(mut self, base_url: Option<String>) -> Self {
        if let Some(base_url) = base_url.filter(|url| !url.trim().is_empty()) {
            debug!(%base_url, "overriding API base url");
            self.api.base_url = base_url;
        }
        self
    }

    /// Base url with a guaranteed trailing slash so relative joins keep the path prefix.
    pub fn api_base(&self) -> Result<Url, FeedError> {
        let mut raw = self.api.base_url.trim().to_string();
        if !raw.ends_with('/') {
            raw.push('/');
        }
        Ok(Url::parse(&raw)?)
    }

    pub fn poll_interval(&self) -> Duration {
        // tokio intervals panic on a zero period
        Duration::from_secs(self.polling.interval_seconds.max(1))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.api.request_timeout_seconds.max(1))
    }

    pub fn data_dir(&self) -> Result<PathBuf, FeedError> {
        match &self.storage.data_dir {
            Some(dir) => Ok(dir.clone()),
            None => Self::config_dir(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn defaults_poll_every_fifteen_seconds() {
        let config = ClientConfig::default();
        assert_eq!(config.poll_interval(), Duration::from_secs(15));
        assert_eq!(config.request_timeout(), Duration::from_secs(10));
        assert!(config.storage.data_dir.is_none());
    }

    #[test]
    fn partial_file_keeps_defaults_for_missing_fields() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(br#"{ "polling": { "interval_seconds": 60 } }"#)
            .unwrap();

        let config = ClientConfig::load_from(file.path()).unwrap();
        assert_eq!(config.poll_interval(), Duration::from_secs(60));
        assert_eq!(config.api, ApiConfig::default());
    }

    #[test]
    fn invalid_file_is_a_validation_error() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"{ not json").unwrap();

        let err = ClientConfig::load_from(file.path()).unwrap_err();
        assert!(matches!(err, FeedError::Validation(_)));
    }

    #[test]
    fn save_then_load_returns_same_config() {
        let file = NamedTempFile::new().unwrap();
        let mut config = ClientConfig::default();
        config.api.base_url = "https://news.example.com/api/".into();
        config.storage.data_dir = Some(PathBuf::from("/tmp/newswatch"));

        config.save_to(file.path()).unwrap();
        assert_eq!(ClientConfig::load_from(file.path()).unwrap(), config);
    }

    #[test]
    fn api_url_override_ignores_blank_values() {
        let config = ClientConfig::default().with_api_url(Some("   ".into()));
        assert_eq!(config.api.base_url, ApiConfig::default().base_url);

        let config = config.with_api_url(Some("https://example.com/api".into()));
        assert_eq!(config.api.base_url, "https://example.com/api");
    }

    #[test]
    fn api_base_gets_trailing_slash() {
        let config = ClientConfig::default().with_api_url(Some("https://example.com/api".into()));
        let base = config.api_base().unwrap();
        assert_eq!(base.as_str(), "https://example.com/api/");
        assert_eq!(
            base.join("articles/").unwrap().as_str(),
            "https://example.com/api/articles/"
        );
    }

    #[test]
    fn zero_interval_is_clamped() {
        let mut config = ClientConfig::default();
        config.polling.interval_seconds = 0;
        assert_eq!(config.poll_interval(), Duration::from_secs(1));
    }
}
