//! # Shared Types Crate
//!
//! This crate contains the contract every connector implementation shares:
//! identifiers, the wire error codec, the error taxonomy, business network
//! definitions, connection profiles and the `Connection` / `ConnectionManager`
//! traits.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: Everything that crosses a connector boundary
//!   is defined here, so the proxy, the server and the in-process connector
//!   cannot drift apart.
//! - **Explicit Registry**: Connector implementations are selected by type tag
//!   through [`ConnectorRegistry`], never by loading modules by name.
//! - **Allow-listed Errors**: Remote errors are inflated against a fixed list of
//!   built-in kinds. Unknown names degrade to a generic error instead of failing.

pub mod cards;
pub mod connector_registry;
pub mod connector_trait;
pub mod errors;
pub mod events;
pub mod ids;
pub mod network;
pub mod profile;
pub mod wire_error;

pub use cards::{BusinessNetworkCard, CardMap};
pub use connector_registry::{ConnectionManagerFactory, ConnectorRegistry};
pub use connector_trait::{
    Connection, ConnectionManager, DynConnection, DynConnectionManager, DynSecurityContext,
    EventBatch, IdentityCredentials, IdentityInfo, SecurityContext, TransactionId,
};
pub use errors::*;
pub use events::ApiEvent;
pub use ids::{ConnectionId, ReservationToken, SecurityContextId};
pub use network::{chaincode_id, NetworkDefinition};
pub use profile::{merge_options, ConnectionProfile, DEFAULT_CONNECTOR_SERVER_URL};
pub use wire_error::{ErrorKind, RemoteError, WireError};
