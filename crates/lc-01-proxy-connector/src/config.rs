//! Proxy connector configuration with validation.

use serde::{Deserialize, Serialize};
use shared_types::DEFAULT_CONNECTOR_SERVER_URL;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProxyConfig {
    /// Connector server URL. `http(s)` is dialed as `ws(s)`.
    pub server_url: String,
    /// Close the socket as soon as the last connection is released.
    pub close_on_disconnect: bool,
    /// Upper bound on one dial attempt.
    pub connect_timeout_ms: u64,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_CONNECTOR_SERVER_URL.to_string(),
            close_on_disconnect: true,
            connect_timeout_ms: 10_000,
        }
    }
}

impl ProxyConfig {
    pub fn with_server_url(mut self, url: impl Into<String>) -> Self {
        self.server_url = url.into();
        self
    }

    /// Keep the socket open after the last connection is released.
    pub fn leave_open(mut self) -> Self {
        self.close_on_disconnect = false;
        self
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn validate(&self) -> Result<(), ProxyConfigError> {
        if self.server_url.trim().is_empty() {
            return Err(ProxyConfigError::MissingServerUrl);
        }
        if self.connect_timeout_ms == 0 {
            return Err(ProxyConfigError::InvalidTimeout);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProxyConfigError {
    #[error("proxy.server_url must not be empty")]
    MissingServerUrl,

    #[error("proxy.connect_timeout_ms must be greater than 0")]
    InvalidTimeout,
}
