//! Connector server configuration.

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:15699";

pub const DEFAULT_HANDSHAKE_TIMEOUT_MS: u64 = 10_000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address the WebSocket listener binds to.
    pub bind_addr: String,
    /// Time a client gets to complete the WebSocket upgrade.
    pub handshake_timeout_ms: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            handshake_timeout_ms: DEFAULT_HANDSHAKE_TIMEOUT_MS,
        }
    }
}

impl ServerConfig {
    pub fn handshake_timeout(&self) -> Duration {
        Duration::from_millis(self.handshake_timeout_ms)
    }

    pub fn validate(&self) -> Result<(), ServerConfigError> {
        self.bind_addr
            .parse::<SocketAddr>()
            .map_err(|e| ServerConfigError::InvalidBindAddr {
                addr: self.bind_addr.clone(),
                reason: e.to_string(),
            })?;
        if self.handshake_timeout_ms == 0 {
            return Err(ServerConfigError::InvalidHandshakeTimeout);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServerConfigError {
    #[error("server.bind_addr '{addr}' is not a socket address: {reason}")]
    InvalidBindAddr { addr: String, reason: String },

    #[error("server.handshake_timeout_ms must be greater than zero")]
    InvalidHandshakeTimeout,
}
