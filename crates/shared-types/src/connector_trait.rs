//! # Connector Contract
//!
//! Defines the contract every connector implements, whether it forwards
//! calls to a connector server over a socket or executes them in-process.
//!
//! ## Example Implementation
//!
//! ```rust,ignore
//! use shared_types::{ConnectionManager, ConnectorResult, DynConnection};
//! use async_trait::async_trait;
//!
//! pub struct MyManager { /* ... */ }
//!
//! #[async_trait]
//! impl ConnectionManager for MyManager {
//!     fn connector_type(&self) -> &str { "mine" }
//!     async fn connect(&self, profile: &str, network: Option<&str>, options: &Value)
//!         -> ConnectorResult<DynConnection> { /* ... */ }
//!     // ...
//! }
//! ```

use crate::errors::ConnectorResult;
use crate::ids::{ConnectionId, SecurityContextId};
use crate::network::NetworkDefinition;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use tokio::sync::broadcast;

/// One batch of chaincode events delivered to a connection.
pub type EventBatch = Vec<Value>;

/// Logged-in identity on a connection.
///
/// Created by [`Connection::login`]. Never persisted and has no lifecycle of
/// its own: it is only meaningful while its connection is open.
pub trait SecurityContext: Send + Sync + fmt::Debug {
    /// Id of the connection that created this context.
    fn connection_id(&self) -> &ConnectionId;

    /// Enrollment id of the logged-in identity.
    fn user(&self) -> &str;

    /// Opaque session token.
    fn session_id(&self) -> &SecurityContextId;
}

/// Result of `create_identity`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityInfo {
    #[serde(rename = "userID")]
    pub user_id: String,
    #[serde(rename = "userSecret")]
    pub user_secret: String,
}

/// Credentials returned by `export_identity`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentityCredentials {
    pub certificate: String,
    pub private_key: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionId {
    pub id: String,
    #[serde(rename = "idStr")]
    pub id_str: String,
}

/// A logical connection to a business network.
#[async_trait]
pub trait Connection: Send + Sync {
    fn connection_id(&self) -> &ConnectionId;

    /// Name of the connection profile this connection was made with.
    fn profile_name(&self) -> &str;

    /// Business network this connection is bound to, if any.
    fn network_name(&self) -> Option<&str>;

    async fn login(
        &self,
        enrollment_id: &str,
        enrollment_secret: &str,
    ) -> ConnectorResult<DynSecurityContext>;

    async fn install(
        &self,
        ctx: &dyn SecurityContext,
        definition: &NetworkDefinition,
        options: &Value,
    ) -> ConnectorResult<()>;

    async fn start(
        &self,
        ctx: &dyn SecurityContext,
        network_name: &str,
        version: &str,
        start_transaction: &Value,
        options: &Value,
    ) -> ConnectorResult<()>;

    async fn upgrade(
        &self,
        ctx: &dyn SecurityContext,
        network_name: &str,
        version: &str,
        options: &Value,
    ) -> ConnectorResult<()>;

    async fn ping(&self, ctx: &dyn SecurityContext) -> ConnectorResult<Value>;

    /// Read-only chaincode call. `None` when the chaincode returned nothing.
    ///
    /// Over the proxy the payload travels as a UTF-8 string. Bytes that are
    /// not valid UTF-8 are replaced with U+FFFD, so binary payloads do not
    /// survive the round trip.
    async fn query_chaincode(
        &self,
        ctx: &dyn SecurityContext,
        function: &str,
        args: &[String],
    ) -> ConnectorResult<Option<Vec<u8>>>;

    /// Submitting chaincode call. The payload is carried the same way as
    /// [`Connection::query_chaincode`]'s, so it must be UTF-8 to arrive intact.
    async fn invoke_chaincode(
        &self,
        ctx: &dyn SecurityContext,
        function: &str,
        args: &[String],
        options: &Value,
    ) -> ConnectorResult<Option<Vec<u8>>>;

    async fn create_identity(
        &self,
        ctx: &dyn SecurityContext,
        user_id: &str,
        options: &Value,
    ) -> ConnectorResult<IdentityInfo>;

    /// Names of the started business networks.
    async fn list(&self, ctx: &dyn SecurityContext) -> ConnectorResult<Vec<String>>;

    async fn create_transaction_id(
        &self,
        ctx: &dyn SecurityContext,
    ) -> ConnectorResult<TransactionId>;

    async fn disconnect(&self) -> ConnectorResult<()>;

    /// Chaincode events for this connection only.
    fn subscribe_events(&self) -> broadcast::Receiver<EventBatch>;
}

/// Creates connections and manages the identities behind them.
#[async_trait]
pub trait ConnectionManager: Send + Sync {
    /// Type tag this manager serves (`proxy`, `web`, ...).
    fn connector_type(&self) -> &str;

    async fn connect(
        &self,
        profile_name: &str,
        network_name: Option<&str>,
        options: &Value,
    ) -> ConnectorResult<DynConnection>;

    async fn import_identity(
        &self,
        profile_name: &str,
        options: &Value,
        id: &str,
        certificate: &str,
        private_key: &str,
    ) -> ConnectorResult<()>;

    /// `None` when the identity is unknown.
    async fn export_identity(
        &self,
        profile_name: &str,
        options: &Value,
        id: &str,
    ) -> ConnectorResult<Option<IdentityCredentials>>;

    /// `true` if an identity was removed.
    async fn remove_identity(
        &self,
        profile_name: &str,
        options: &Value,
        id: &str,
    ) -> ConnectorResult<bool>;
}

/// Type alias for boxed security contexts.
pub type DynSecurityContext = Arc<dyn SecurityContext>;

/// Type alias for boxed connections.
pub type DynConnection = Arc<dyn Connection>;

/// Type alias for boxed connection managers.
pub type DynConnectionManager = Arc<dyn ConnectionManager>;
