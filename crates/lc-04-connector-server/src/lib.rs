//! # Connector Server (lc-04)
//!
//! Server side of the proxy protocol. Each client transport becomes a
//! session; every request frame is dispatched by event name to a connection
//! or connection manager obtained from the connector registry, or to the
//! server-wide card and connection profile stores. Requests run
//! concurrently within a session.
//!
//! ## Request Flow
//!
//! ```text
//! client ──request{id, event, args}──▶ Session ──▶ ConnectorRegistry ──▶ ConnectionManager
//!    ▲                                   │                                   │
//!    │◀──────reply{id, error?, result}───┘                              Connection
//!    │                                                                       │
//!    └◀─────────push{events, [connectionId, batch]}──── forwarder ◀──────────┘
//! ```
//!
//! ## Error Mapping
//!
//! | Failure | Wire error name |
//! |---------|-----------------|
//! | Unknown event | `Error` |
//! | Unknown connection or security context id | `ReferenceError` |
//! | Malformed argument | `TypeError` |
//! | Error relayed from a downstream proxy | unchanged |

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod args;
pub mod config;
pub mod server;
pub mod session;
pub mod stores;

pub use config::{ServerConfig, ServerConfigError, DEFAULT_BIND_ADDR};
pub use server::ConnectorServer;
pub use session::Session;
pub use stores::{ClientStores, CARDS_COLLECTION, PROFILES_COLLECTION};
