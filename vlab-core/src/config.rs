//! Console configuration (TOML).
//!
//! Resolution order: built-in defaults, then the config file (explicit path
//! or `<config_dir>/vlab/config.toml` when present), then `VLAB_API_URL`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Environment variable that overrides `api.base_url`.
pub const API_URL_ENV: &str = "VLAB_API_URL";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Remote backtest service settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    pub run_path: String,
    pub strategies_path: String,
    /// Whole-request timeout in seconds. `0` leaves the transport default.
    pub timeout_secs: u64,
    /// Extra attempts after a connect/timeout failure. Status errors are never retried.
    pub max_retries: u32,
    /// Base delay of the exponential retry backoff.
    pub retry_backoff_ms: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".into(),
            run_path: "/backtest/run".into(),
            strategies_path: "/backtest/strategies".into(),
            timeout_secs: 60,
            max_retries: 0,
            retry_backoff_ms: 500,
        }
    }
}

impl ApiConfig {
    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_secs > 0).then(|| Duration::from_secs(self.timeout_secs))
    }
}

/// Strategy carousel settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CarouselConfig {
    pub page_size: usize,
    pub transition_ms: u64,
}

impl Default for CarouselConfig {
    fn default() -> Self {
        Self {
            page_size: 3,
            transition_ms: 300,
        }
    }
}

impl CarouselConfig {
    pub fn transition(&self) -> Duration {
        Duration::from_millis(self.transition_ms)
    }
}

/// Where the strategy list comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CatalogSource {
    #[default]
    Static,
    Remote,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct CatalogConfig {
    pub source: CatalogSource,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct VlabConfig {
    pub api: ApiConfig,
    pub carousel: CarouselConfig,
    pub catalog: CatalogConfig,
}

impl VlabConfig {
    /// Default location: `<config_dir>/vlab/config.toml`.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("vlab").join("config.toml"))
    }

    /// Load with the full resolution order. An explicit path must exist; the
    /// default path is optional.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(p) => Self::from_file(p)?,
            None => match Self::default_path() {
                Some(p) if p.exists() => Self::from_file(&p)?,
                _ => Self::default(),
            },
        };
        config.apply_env_override(std::env::var(API_URL_ENV).ok());
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Replace the base URL when the override is set and non-blank.
    pub fn apply_env_override(&mut self, base_url: Option<String>) {
        if let Some(url) = base_url.map(|u| u.trim().to_string()) {
            if !url.is_empty() {
                self.api.base_url = url;
            }
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api.base_url.trim().is_empty() {
            return Err(ConfigError::Invalid("api.base_url must not be empty".into()));
        }
        if self.carousel.page_size == 0 {
            return Err(ConfigError::Invalid(
                "carousel.page_size must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_backend_routes() {
        let c = VlabConfig::default();
        assert_eq!(c.api.run_path, "/backtest/run");
        assert_eq!(c.carousel.page_size, 3);
        assert_eq!(c.carousel.transition(), Duration::from_millis(300));
        assert_eq!(c.catalog.source, CatalogSource::Static);
    }

    #[test]
    fn partial_toml_keeps_other_defaults() {
        let c = VlabConfig::from_toml(
            r#"
            [api]
            base_url = "http://example.test"
            max_retries = 2

            [catalog]
            source = "remote"
            "#,
        )
        .unwrap();
        assert_eq!(c.api.base_url, "http://example.test");
        assert_eq!(c.api.max_retries, 2);
        assert_eq!(c.api.timeout_secs, 60);
        assert_eq!(c.carousel.page_size, 3);
        assert_eq!(c.catalog.source, CatalogSource::Remote);
    }

    #[test]
    fn zero_timeout_means_transport_default() {
        let mut api = ApiConfig::default();
        api.timeout_secs = 0;
        assert_eq!(api.timeout(), None);
    }

    #[test]
    fn env_override_ignores_blank() {
        let mut c = VlabConfig::default();
        c.apply_env_override(Some("   ".into()));
        assert_eq!(c.api.base_url, "http://localhost:8000");
        c.apply_env_override(Some("http://api.test/".into()));
        assert_eq!(c.api.base_url, "http://api.test/");
    }

    #[test]
    fn zero_page_size_is_rejected() {
        let c = VlabConfig::from_toml("[carousel]\npage_size = 0\n").unwrap();
        assert!(matches!(c.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn toml_roundtrip() {
        let c = VlabConfig::default();
        let text = c.to_toml().unwrap();
        assert_eq!(VlabConfig::from_toml(&text).unwrap(), c);
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let err = VlabConfig::load(Some(Path::new("/nonexistent/vlab.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn loads_from_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[carousel]\npage_size = 4\n").unwrap();
        let c = VlabConfig::from_file(&path).unwrap();
        assert_eq!(c.carousel.page_size, 4);
    }
}
