//! # Web Connector (lc-03)
//!
//! In-process connector. Implements the same `Connection` contract as the
//! proxy, but executes every call locally against a chaincode store and a
//! runtime engine owned by the manager.
//!
//! ## Call Flow
//!
//! ```text
//! WebConnection ──install/start/upgrade──▶ ChaincodeStore ──▶ DataCollection
//!       │                                        │
//!       │                              start/upgrade ok
//!       │                                        ▼
//!       └──────query/invoke─────────────▶ RuntimeEngine ──events──▶ subscribers
//! ```
//!
//! ## Identities
//!
//! | Identity | Login rule |
//! |----------|------------|
//! | `admin` | Always accepted, not bound to a participant |
//! | Issued / imported | Secret must match the stored one |
//!
//! State is owned by the `WebConnectionManager`, so every connection made
//! through one manager sees the same networks, identities and world state.

#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod adapters;
pub mod config;
pub mod connection;
pub mod domain;
pub mod manager;
pub mod ports;
pub mod security_context;

pub use adapters::ledger_engine::LedgerEngine;
pub use config::{EngineKind, WebConfig};
pub use connection::WebConnection;
pub use domain::context::{EngineContext, EngineResponse, ADMIN_IDENTITY};
pub use domain::identity::IdentityRecord;
pub use manager::{WebConnectionManager, WebConnectionManagerFactory};
pub use ports::outbound::{DynRuntimeEngine, RuntimeEngine};
pub use security_context::WebSecurityContext;

/// Type tag served by this connector.
pub const CONNECTOR_TYPE: &str = "web";

/// Name of the identities collection.
pub const IDENTITIES_COLLECTION: &str = "identities";
