//! # Proxy Connector (lc-01)
//!
//! Forwards every connector call to a remote connector server over a single
//! socket and multiplexes any number of logical connections over it. The
//! server-side card and connection profile stores are reached over the same
//! socket through [`ProxyCardStore`] and [`ProxyConnectionProfileStore`].
//!
//! ## Transport Lifecycle
//!
//! ```text
//!                 ensure_connected()            dial ok
//! Disconnected ─────────────────────▶ Connecting ───────▶ Connected
//!      ▲                                  │                  │
//!      │            dial failed           │                  │
//!      ├──────────────────────────────────┘                  │
//!      │      last id released (close_on_disconnect)         │
//!      └─────────────────────────────────────────────────────┘
//! ```
//!
//! ## Invariants
//!
//! | Invariant | Description |
//! |-----------|-------------|
//! | Single dial | Concurrent callers share one in-flight connect attempt |
//! | Reference counting | The socket is open while at least one connection or reservation is outstanding |
//! | Atomic pool mutation | Insert, remove and the empty check + close happen under one lock with no await |
//! | Fail fast | A disconnected connection rejects further calls |
//!
//! ## Usage
//!
//! ```ignore
//! use lc_01_proxy_connector::{ProxyConfig, ProxyConnectionManager};
//!
//! let manager = ProxyConnectionManager::new(ProxyConfig::default());
//! let connection = manager.connect_proxy("hlfv1", Some("digitalproperty-network"), &options).await?;
//! let ctx = connection.login("admin", "adminpw").await?;
//! let version = connection.ping(&*ctx).await?;
//! connection.disconnect().await?;
//! ```

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod card_store;
pub mod config;
pub mod connection;
pub mod manager;
pub mod profile_store;
pub mod security_context;

#[cfg(test)]
pub(crate) mod test_utils;

pub use card_store::ProxyCardStore;
pub use config::{ProxyConfig, ProxyConfigError};
pub use connection::ProxyConnection;
pub use manager::{PoolKey, ProxyConnectionManager, ProxyConnectionManagerFactory, TransportStatus};
pub use profile_store::ProxyConnectionProfileStore;
pub use security_context::ProxySecurityContext;

/// Type tag served by this connector.
pub const CONNECTOR_TYPE: &str = "proxy";
