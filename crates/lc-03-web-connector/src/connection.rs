//! # Web Connection
//!
//! Same contract as the proxy connection, executed locally against the
//! manager's chaincode store and runtime engine.

use crate::domain::context::{EngineContext, ADMIN_IDENTITY};
use crate::manager::WebConnectionManager;
use crate::security_context::WebSecurityContext;
use async_trait::async_trait;
use serde_json::Value;
use shared_types::{
    Connection, ConnectionId, ConnectorError, ConnectorResult, DynSecurityContext, EventBatch,
    IdentityInfo, NetworkDefinition, SecurityContext, TransactionId,
};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, info};

/// Capacity of the per-connection event channel.
const EVENT_CAPACITY: usize = 64;

pub struct WebConnection {
    manager: WebConnectionManager,
    connection_id: ConnectionId,
    profile_name: String,
    network_name: Option<String>,
    events: broadcast::Sender<EventBatch>,
}

impl WebConnection {
    pub(crate) fn new(
        manager: WebConnectionManager,
        connection_id: ConnectionId,
        profile_name: String,
        network_name: Option<String>,
    ) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            manager,
            connection_id,
            profile_name,
            network_name,
            events,
        }
    }

    pub fn manager(&self) -> &WebConnectionManager {
        &self.manager
    }

    /// Contexts are only valid on the connection that issued them.
    fn check_context(&self, ctx: &dyn SecurityContext) -> ConnectorResult<()> {
        if ctx.connection_id() != &self.connection_id {
            return Err(ConnectorError::InvalidArgument(format!(
                "security context belongs to connection {}",
                ctx.connection_id()
            )));
        }
        Ok(())
    }

    /// Network this connection is bound to, which must be started.
    async fn started_network(&self) -> ConnectorResult<&str> {
        let network = self.network_name.as_deref().ok_or_else(|| {
            ConnectorError::InvalidArgument(
                "connection is not bound to a business network".to_string(),
            )
        })?;
        self.manager.store().get_started_chaincode(network).await?;
        Ok(network)
    }

    async fn verify_identity(&self, enrollment_id: &str, enrollment_secret: &str) -> ConnectorResult<()> {
        if enrollment_id == ADMIN_IDENTITY {
            return Ok(());
        }
        let record = self.manager.load_identity(enrollment_id).await?.ok_or_else(|| {
            ConnectorError::Authentication(format!("Unknown user ID {enrollment_id}"))
        })?;
        if record.user_secret != enrollment_secret {
            return Err(ConnectorError::Authentication(format!(
                "The user secret specified for the user ID {enrollment_id} does not match the stored user secret"
            )));
        }
        Ok(())
    }
}

fn payload_bytes(payload: Option<Value>) -> ConnectorResult<Option<Vec<u8>>> {
    payload
        .map(|value| {
            serde_json::to_vec(&value).map_err(|e| ConnectorError::InvalidResponse(e.to_string()))
        })
        .transpose()
}

#[async_trait]
impl Connection for WebConnection {
    fn connection_id(&self) -> &ConnectionId {
        &self.connection_id
    }

    fn profile_name(&self) -> &str {
        &self.profile_name
    }

    fn network_name(&self) -> Option<&str> {
        self.network_name.as_deref()
    }

    async fn login(
        &self,
        enrollment_id: &str,
        enrollment_secret: &str,
    ) -> ConnectorResult<DynSecurityContext> {
        self.verify_identity(enrollment_id, enrollment_secret).await?;
        debug!(connection_id = %self.connection_id, user = %enrollment_id, "Logged in");
        Ok(Arc::new(WebSecurityContext::new(
            self.connection_id.clone(),
            enrollment_id,
        )))
    }

    async fn install(
        &self,
        ctx: &dyn SecurityContext,
        definition: &NetworkDefinition,
        _options: &Value,
    ) -> ConnectorResult<()> {
        self.check_context(ctx)?;
        self.manager.store().install(definition).await
    }

    async fn start(
        &self,
        ctx: &dyn SecurityContext,
        network_name: &str,
        version: &str,
        start_transaction: &Value,
        _options: &Value,
    ) -> ConnectorResult<()> {
        self.check_context(ctx)?;
        self.manager.store().start(network_name, version).await?;

        let engine_ctx = EngineContext::new(network_name, ctx.user());
        self.manager
            .engine()
            .init(&engine_ctx, "init", &[start_transaction.to_string()])
            .await?;
        info!(network = %network_name, version = %version, "Business network started");
        Ok(())
    }

    async fn upgrade(
        &self,
        ctx: &dyn SecurityContext,
        network_name: &str,
        version: &str,
        _options: &Value,
    ) -> ConnectorResult<()> {
        self.check_context(ctx)?;
        self.manager.store().upgrade(network_name, version).await?;

        let engine_ctx = EngineContext::new(network_name, ctx.user());
        self.manager.engine().init(&engine_ctx, "upgrade", &[]).await?;
        info!(network = %network_name, version = %version, "Business network upgraded");
        Ok(())
    }

    async fn ping(&self, ctx: &dyn SecurityContext) -> ConnectorResult<Value> {
        let bytes = self
            .query_chaincode(ctx, "ping", &[])
            .await?
            .ok_or_else(|| ConnectorError::InvalidResponse("ping returned nothing".to_string()))?;
        serde_json::from_slice(&bytes).map_err(|e| ConnectorError::InvalidResponse(e.to_string()))
    }

    async fn query_chaincode(
        &self,
        ctx: &dyn SecurityContext,
        function: &str,
        args: &[String],
    ) -> ConnectorResult<Option<Vec<u8>>> {
        self.check_context(ctx)?;
        let network = self.started_network().await?;
        let engine_ctx = EngineContext::new(network, ctx.user()).read_only();
        let response = self.manager.engine().query(&engine_ctx, function, args).await?;
        payload_bytes(response.payload)
    }

    async fn invoke_chaincode(
        &self,
        ctx: &dyn SecurityContext,
        function: &str,
        args: &[String],
        _options: &Value,
    ) -> ConnectorResult<Option<Vec<u8>>> {
        self.check_context(ctx)?;
        let network = self.started_network().await?;
        let engine_ctx = EngineContext::new(network, ctx.user());
        let response = self.manager.engine().invoke(&engine_ctx, function, args).await?;

        if !response.events.is_empty() {
            // No subscribers is not an error.
            let delivered = self.events.send(response.events).unwrap_or(0);
            debug!(connection_id = %self.connection_id, delivered, "Published chaincode events");
        }
        payload_bytes(response.payload)
    }

    async fn create_identity(
        &self,
        ctx: &dyn SecurityContext,
        user_id: &str,
        _options: &Value,
    ) -> ConnectorResult<IdentityInfo> {
        self.check_context(ctx)?;
        self.manager.issue_identity(user_id).await
    }

    async fn list(&self, ctx: &dyn SecurityContext) -> ConnectorResult<Vec<String>> {
        self.check_context(ctx)?;
        self.manager.store().started_networks().await
    }

    async fn create_transaction_id(
        &self,
        ctx: &dyn SecurityContext,
    ) -> ConnectorResult<TransactionId> {
        self.check_context(ctx)?;
        let id = uuid::Uuid::new_v4();
        Ok(TransactionId {
            id: id.to_string(),
            id_str: id.simple().to_string(),
        })
    }

    async fn disconnect(&self) -> ConnectorResult<()> {
        debug!(connection_id = %self.connection_id, "In-process connection closed");
        Ok(())
    }

    fn subscribe_events(&self) -> broadcast::Receiver<EventBatch> {
        self.events.subscribe()
    }
}
