//! # Proxy Connection
//!
//! One logical connection on the shared socket. Every call is forwarded as
//! `{event, [connectionId, securityContextId?, ...args]}` and resolved from
//! the single reply.

use crate::manager::{decode_reply, parse_result, ProxyConnectionManager};
use crate::security_context::ProxySecurityContext;
use async_trait::async_trait;
use serde_json::{json, Value};
use shared_bus::{payload_from_wire, RpcSocket};
use shared_types::{
    ApiEvent, Connection, ConnectionId, ConnectorError, ConnectorResult, DynSecurityContext,
    EventBatch, IdentityInfo, NetworkDefinition, SecurityContext, SecurityContextId,
    TransactionId, TransportError,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

pub struct ProxyConnection {
    manager: ProxyConnectionManager,
    /// The manager owns the socket; a connection only borrows it.
    socket: Weak<RpcSocket>,
    connection_id: ConnectionId,
    profile_name: String,
    network_name: Option<String>,
    events: broadcast::Sender<EventBatch>,
    closed: AtomicBool,
}

impl ProxyConnection {
    pub(crate) fn new(
        manager: ProxyConnectionManager,
        socket: Weak<RpcSocket>,
        connection_id: ConnectionId,
        profile_name: String,
        network_name: Option<String>,
        events: broadcast::Sender<EventBatch>,
    ) -> Self {
        Self {
            manager,
            socket,
            connection_id,
            profile_name,
            network_name,
            events,
            closed: AtomicBool::new(false),
        }
    }

    pub fn manager(&self) -> &ProxyConnectionManager {
        &self.manager
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    fn live_socket(&self) -> ConnectorResult<Arc<RpcSocket>> {
        if self.is_closed() {
            return Err(ConnectorError::ConnectionClosed(self.connection_id.clone()));
        }
        self.socket
            .upgrade()
            .filter(|socket| socket.is_open())
            .ok_or(ConnectorError::Transport(TransportError::Closed))
    }

    async fn call(&self, event: ApiEvent, args: Vec<Value>) -> ConnectorResult<Value> {
        let socket = self.live_socket()?;
        let mut full = Vec::with_capacity(args.len() + 1);
        full.push(json!(self.connection_id));
        full.extend(args);

        debug!(connection_id = %self.connection_id, event = %event, "Forwarding call");
        decode_reply(socket.emit(event.as_str(), full).await)
    }

    /// Same as `call`, with the session token as the second argument.
    async fn call_as(
        &self,
        ctx: &dyn SecurityContext,
        event: ApiEvent,
        args: Vec<Value>,
    ) -> ConnectorResult<Value> {
        let mut full = Vec::with_capacity(args.len() + 1);
        full.push(json!(ctx.session_id()));
        full.extend(args);
        self.call(event, full).await
    }
}

#[async_trait]
impl Connection for ProxyConnection {
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
        let event = ApiEvent::ConnectionLogin;
        let value = self
            .call(event, vec![json!(enrollment_id), json!(enrollment_secret)])
            .await?;
        let session_id: SecurityContextId = parse_result(event, value)?;

        Ok(Arc::new(ProxySecurityContext::new(
            self.connection_id.clone(),
            enrollment_id,
            session_id,
        )))
    }

    async fn install(
        &self,
        ctx: &dyn SecurityContext,
        definition: &NetworkDefinition,
        options: &Value,
    ) -> ConnectorResult<()> {
        let archive = definition.to_archive_hex()?;
        self.call_as(ctx, ApiEvent::ConnectionInstall, vec![json!(archive), options.clone()])
            .await?;
        Ok(())
    }

    async fn start(
        &self,
        ctx: &dyn SecurityContext,
        network_name: &str,
        version: &str,
        start_transaction: &Value,
        options: &Value,
    ) -> ConnectorResult<()> {
        self.call_as(
            ctx,
            ApiEvent::ConnectionStart,
            vec![
                json!(network_name),
                json!(version),
                start_transaction.clone(),
                options.clone(),
            ],
        )
        .await?;
        Ok(())
    }

    async fn upgrade(
        &self,
        ctx: &dyn SecurityContext,
        network_name: &str,
        version: &str,
        options: &Value,
    ) -> ConnectorResult<()> {
        self.call_as(
            ctx,
            ApiEvent::ConnectionUpgrade,
            vec![json!(network_name), json!(version), options.clone()],
        )
        .await?;
        Ok(())
    }

    async fn ping(&self, ctx: &dyn SecurityContext) -> ConnectorResult<Value> {
        self.call_as(ctx, ApiEvent::ConnectionPing, vec![]).await
    }

    async fn query_chaincode(
        &self,
        ctx: &dyn SecurityContext,
        function: &str,
        args: &[String],
    ) -> ConnectorResult<Option<Vec<u8>>> {
        let value = self
            .call_as(
                ctx,
                ApiEvent::ConnectionQueryChainCode,
                vec![json!(function), json!(args)],
            )
            .await?;
        Ok(payload_from_wire(value))
    }

    async fn invoke_chaincode(
        &self,
        ctx: &dyn SecurityContext,
        function: &str,
        args: &[String],
        options: &Value,
    ) -> ConnectorResult<Option<Vec<u8>>> {
        let value = self
            .call_as(
                ctx,
                ApiEvent::ConnectionInvokeChainCode,
                vec![json!(function), json!(args), options.clone()],
            )
            .await?;
        Ok(payload_from_wire(value))
    }

    async fn create_identity(
        &self,
        ctx: &dyn SecurityContext,
        user_id: &str,
        options: &Value,
    ) -> ConnectorResult<IdentityInfo> {
        let event = ApiEvent::ConnectionCreateIdentity;
        let value = self
            .call_as(ctx, event, vec![json!(user_id), options.clone()])
            .await?;
        parse_result(event, value)
    }

    async fn list(&self, ctx: &dyn SecurityContext) -> ConnectorResult<Vec<String>> {
        let event = ApiEvent::ConnectionList;
        let value = self.call_as(ctx, event, vec![]).await?;
        parse_result(event, value)
    }

    async fn create_transaction_id(
        &self,
        ctx: &dyn SecurityContext,
    ) -> ConnectorResult<TransactionId> {
        let event = ApiEvent::ConnectionCreateTransactionId;
        let value = self.call_as(ctx, event, vec![]).await?;
        parse_result(event, value)
    }

    /// Tell the server, then release this connection's slot in the pool.
    ///
    /// Local cleanup happens even when the server call fails. Calling it
    /// again is a no-op.
    async fn disconnect(&self) -> ConnectorResult<()> {
        if self.is_closed() {
            return Ok(());
        }

        let result = match self.live_socket() {
            Ok(socket) => decode_reply(
                socket
                    .emit(
                        ApiEvent::ConnectionDisconnect.as_str(),
                        vec![json!(self.connection_id)],
                    )
                    .await,
            )
            .map(|_| ()),
            // The socket is already gone, so the server has dropped us too.
            Err(_) => Ok(()),
        };

        self.closed.store(true, Ordering::Release);
        self.manager.unregister_events(&self.connection_id);
        self.manager.disconnect(&self.connection_id);

        match &result {
            Ok(()) => info!(connection_id = %self.connection_id, "Disconnected"),
            Err(e) => warn!(connection_id = %self.connection_id, error = %e, "Disconnect failed on server"),
        }
        result
    }

    fn subscribe_events(&self) -> broadcast::Receiver<EventBatch> {
        self.events.subscribe()
    }
}
