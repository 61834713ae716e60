//! # Identifiers
//!
//! Opaque identifiers used to correlate logical connections, logged-in
//! sessions and transport reservations.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Identifier of one logical connection multiplexed over a transport.
///
/// Assigned by whoever creates the connection (the connector server for proxy
/// connections, the manager itself for in-process connections).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConnectionId(String);

impl ConnectionId {
    /// Generate a fresh random connection ID (UUID v4).
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Borrow the ID as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for ConnectionId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for ConnectionId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// Session token handed out by `login`, used to route later calls to the
/// right logged-in identity on the remote side.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SecurityContextId(String);

impl SecurityContextId {
    /// Generate a fresh random session token (UUID v4).
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Borrow the token as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SecurityContextId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for SecurityContextId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for SecurityContextId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// Provisional entry held in a connection pool while a handshake or a
/// one-shot identity call is in flight. Keeps the transport alive without
/// being a real connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ReservationToken(Uuid);

impl ReservationToken {
    /// Create a new unique reservation.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ReservationToken {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ReservationToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "reservation-{}", self.0)
    }
}
