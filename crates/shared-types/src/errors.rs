//! # Error Types
//!
//! Defines the error taxonomy shared by every connector crate.

use crate::ids::ConnectionId;
use crate::wire_error::RemoteError;
use thiserror::Error;

/// Errors raised by the socket transport underneath a proxy connection.
///
/// `Clone` so that one failed dial can be reported to every caller sharing it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// Could not open the transport.
    #[error("Failed to connect to {url}: {reason}")]
    ConnectFailed { url: String, reason: String },

    /// The dial did not complete in time.
    #[error("Timed out after {timeout_ms}ms connecting to {url}")]
    Timeout { url: String, timeout_ms: u64 },

    /// The transport was closed while a call was outstanding.
    #[error("transport closed")]
    Closed,

    /// A frame could not be handed to the writer.
    #[error("Failed to send frame: {0}")]
    SendFailed(String),

    /// A frame could not be decoded.
    #[error("Malformed frame: {0}")]
    MalformedFrame(String),

    #[error("Invalid server URL: {0}")]
    InvalidUrl(String),
}

/// Chaincode lifecycle violations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LifecycleError {
    #[error("Chaincode already installed: {0}")]
    AlreadyInstalled(String),

    #[error("Chaincode already started: {0}")]
    AlreadyStarted(String),

    #[error("Chaincode not installed: {0}")]
    NotInstalled(String),

    #[error("Network not started: {0}")]
    NotStarted(String),
}

/// Errors from a keyed data collection.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CollectionError {
    #[error("Object with ID '{key}' in collection '{collection}' does not exist")]
    NotFound { key: String, collection: String },

    #[error("Failed to add object with ID '{key}' in collection '{collection}' as the object already exists")]
    AlreadyExists { key: String, collection: String },

    /// Stored value could not be decoded.
    #[error("Corrupt record '{key}': {reason}")]
    Corrupt { key: String, reason: String },

    #[error("Collection backend error: {0}")]
    Backend(String),
}

/// Errors from the connector registry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("Unknown connector type: {0}")]
    UnknownConnectorType(String),

    #[error("Connector factory for '{connector_type}' failed: {reason}")]
    FactoryFailed {
        connector_type: String,
        reason: String,
    },
}

/// Umbrella error returned by every connector operation.
#[derive(Debug, Clone, Error)]
pub enum ConnectorError {
    /// Transport failure (dial, send, or closed with calls in flight).
    #[error("Transport error")]
    Transport(#[from] TransportError),

    /// Error raised on the other side of the transport.
    #[error(transparent)]
    Remote(#[from] RemoteError),

    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),

    #[error(transparent)]
    Collection(#[from] CollectionError),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// The connection has already been disconnected.
    #[error("Connection {0} has been disconnected")]
    ConnectionClosed(ConnectionId),

    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// No live object is registered under the given id.
    #[error("Unknown {kind}: {id}")]
    UnknownReference { kind: &'static str, id: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Business network archive could not be built or read.
    #[error("Invalid business network archive: {0}")]
    Archive(String),

    /// The runtime engine rejected a call.
    #[error("Runtime engine error: {0}")]
    Engine(String),

    #[error("Operation not supported: {0}")]
    NotSupported(String),
}

/// Result alias used across the connector crates.
pub type ConnectorResult<T> = Result<T, ConnectorError>;
