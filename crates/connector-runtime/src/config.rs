//! # Runtime Configuration
//!
//! One TOML file with a section per component. Environment variables
//! override the file:
//!
//! | Variable | Overrides |
//! |----------|-----------|
//! | `LC_PROXY_URL` | `proxy.server_url` |
//! | `LC_BIND_ADDR` | `server.bind_addr` |
//! | `LC_LOG` | `logging.filter` |

use lc_01_proxy_connector::{ProxyConfig, ProxyConfigError};
use lc_03_web_connector::WebConfig;
use lc_04_connector_server::{ServerConfig, ServerConfigError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const ENV_PROXY_URL: &str = "LC_PROXY_URL";
pub const ENV_BIND_ADDR: &str = "LC_BIND_ADDR";
pub const ENV_LOG: &str = "LC_LOG";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directives, used when `RUST_LOG` is unset.
    pub filter: String,
    /// Emit JSON lines instead of human-readable output.
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
            json: false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectorConfig {
    pub proxy: ProxyConfig,
    pub server: ServerConfig,
    pub web: WebConfig,
    pub logging: LoggingConfig,
}

impl ConnectorConfig {
    /// Read, apply environment overrides and validate.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config = Self::from_toml_str(&text)?;
        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    /// `load` when a path is given, otherwise defaults plus environment.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::load(path),
            None => {
                let mut config = Self::default();
                config.apply_env();
                config.validate()?;
                Ok(config)
            }
        }
    }

    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn apply_env(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Apply overrides from any variable source.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(ENV_PROXY_URL) {
            self.proxy.server_url = url;
        }
        if let Some(addr) = lookup(ENV_BIND_ADDR) {
            self.server.bind_addr = addr;
        }
        if let Some(filter) = lookup(ENV_LOG) {
            self.logging.filter = filter;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.proxy.validate()?;
        self.server.validate()?;
        if self.logging.filter.trim().is_empty() {
            return Err(ConfigError::EmptyLogFilter);
        }
        Ok(())
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to render config: {0}")]
    Render(#[from] toml::ser::Error),

    #[error(transparent)]
    Proxy(#[from] ProxyConfigError),

    #[error(transparent)]
    Server(#[from] ServerConfigError),

    #[error("logging.filter must not be empty")]
    EmptyLogFilter,
}
