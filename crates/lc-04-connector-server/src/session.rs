//! # Session
//!
//! One connected client. Every request runs on its own task so a slow call
//! never holds up the others, and each request gets exactly one reply.
//! Connections and security contexts opened by a session are only visible
//! to that session and are torn down when it ends.

use crate::args::Args;
use crate::stores::ClientStores;
use parking_lot::Mutex;
use serde_json::{json, Value};
use shared_bus::{payload_to_wire, Frame};
use shared_types::events::EVENTS;
use shared_types::{
    merge_options, wire_error, ApiEvent, BusinessNetworkCard, ConnectionId, ConnectionProfile,
    ConnectorError, ConnectorRegistry, ConnectorResult, DynConnection, DynConnectionManager,
    DynSecurityContext, EventBatch, NetworkDefinition, SecurityContextId,
};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{broadcast, mpsc};
use tokio::task::{JoinHandle, JoinSet};
use tracing::{debug, info, warn};

struct OpenConnection {
    connection: DynConnection,
    forwarder: JoinHandle<()>,
}

struct OpenContext {
    connection_id: ConnectionId,
    context: DynSecurityContext,
}

/// Open ids. The lock is never held across an await.
#[derive(Default)]
struct Tables {
    connections: HashMap<ConnectionId, OpenConnection>,
    contexts: HashMap<SecurityContextId, OpenContext>,
}

/// Cheap to clone; clones share the session's tables.
#[derive(Clone)]
pub struct Session {
    registry: Arc<ConnectorRegistry>,
    stores: ClientStores,
    outbound: mpsc::Sender<Frame>,
    tables: Arc<Mutex<Tables>>,
}

impl Session {
    pub fn new(
        registry: Arc<ConnectorRegistry>,
        stores: ClientStores,
        outbound: mpsc::Sender<Frame>,
    ) -> Self {
        Self {
            registry,
            stores,
            outbound,
            tables: Arc::new(Mutex::new(Tables::default())),
        }
    }

    pub fn connection_count(&self) -> usize {
        self.tables.lock().connections.len()
    }

    pub fn context_count(&self) -> usize {
        self.tables.lock().contexts.len()
    }

    /// Serve requests until the client goes away, wait for the requests
    /// still running, then disconnect everything the session opened.
    pub async fn run(self, mut inbound: mpsc::Receiver<Frame>) {
        let mut in_flight = JoinSet::new();
        loop {
            tokio::select! {
                frame = inbound.recv() => {
                    let Some(frame) = frame else { break };
                    let Frame::Request { id, event, args } = frame else {
                        debug!("Ignoring non-request frame from client");
                        continue;
                    };
                    let session = self.clone();
                    in_flight.spawn(async move { session.respond(id, event, args).await });
                }
                Some(joined) = in_flight.join_next(), if !in_flight.is_empty() => {
                    if let Err(e) = joined {
                        warn!(error = %e, "Request task failed");
                    }
                }
            }
        }

        while let Some(joined) = in_flight.join_next().await {
            if let Err(e) = joined {
                warn!(error = %e, "Request task failed");
            }
        }
        self.close().await;
    }

    async fn respond(&self, id: u64, event: String, args: Vec<Value>) {
        let reply = match self.handle(&event, &args).await {
            Ok(result) => Frame::ok(id, result),
            Err(e) => {
                debug!(event = %event, error = %e, "Request failed");
                Frame::err(id, wire_error::serialize(&e))
            }
        };
        if self.outbound.send(reply).await.is_err() {
            debug!(id, event = %event, "Client gone before reply");
        }
    }

    /// Disconnect every connection still open on this session.
    pub async fn close(&self) {
        let connections: Vec<_> = {
            let mut tables = self.tables.lock();
            tables.contexts.clear();
            tables.connections.drain().collect()
        };
        for (connection_id, open) in connections {
            open.forwarder.abort();
            if let Err(e) = open.connection.disconnect().await {
                warn!(connection_id = %connection_id, error = %e, "Disconnect on session end failed");
            }
        }
        debug!("Session closed");
    }

    /// Dispatch one request by event name.
    pub async fn handle(&self, event: &str, args: &[Value]) -> ConnectorResult<Value> {
        let event: ApiEvent = event.parse().map_err(ConnectorError::NotSupported)?;
        let args = Args::new(event, args);

        match event {
            ApiEvent::ConnectionManagerConnect => self.connect(&args).await,
            ApiEvent::ConnectionManagerImportIdentity => {
                let manager = self.identity_manager(&args)?;
                manager
                    .import_identity(
                        args.str(0, "profileName")?,
                        &args.value(1),
                        args.str(2, "id")?,
                        args.str(3, "certificate")?,
                        args.str(4, "privateKey")?,
                    )
                    .await?;
                Ok(Value::Null)
            }
            ApiEvent::ConnectionManagerExportIdentity => {
                let manager = self.identity_manager(&args)?;
                let credentials = manager
                    .export_identity(args.str(0, "profileName")?, &args.value(1), args.str(2, "id")?)
                    .await?;
                to_json(credentials)
            }
            ApiEvent::ConnectionManagerRemoveIdentity => {
                let manager = self.identity_manager(&args)?;
                let removed = manager
                    .remove_identity(args.str(0, "profileName")?, &args.value(1), args.str(2, "id")?)
                    .await?;
                Ok(Value::Bool(removed))
            }
            ApiEvent::ConnectionDisconnect => self.disconnect(&args).await,
            ApiEvent::ConnectionLogin => self.login(&args).await,
            ApiEvent::ConnectionInstall => {
                let (connection, ctx) = self.context(&args)?;
                let definition = NetworkDefinition::from_archive_hex(args.str(2, "networkArchive")?)?;
                connection.install(&*ctx, &definition, &args.value(3)).await?;
                Ok(Value::Null)
            }
            ApiEvent::ConnectionStart => {
                let (connection, ctx) = self.context(&args)?;
                connection
                    .start(
                        &*ctx,
                        args.str(2, "networkName")?,
                        args.str(3, "version")?,
                        &args.value(4),
                        &args.value(5),
                    )
                    .await?;
                Ok(Value::Null)
            }
            ApiEvent::ConnectionUpgrade => {
                let (connection, ctx) = self.context(&args)?;
                connection
                    .upgrade(
                        &*ctx,
                        args.str(2, "networkName")?,
                        args.str(3, "version")?,
                        &args.value(4),
                    )
                    .await?;
                Ok(Value::Null)
            }
            ApiEvent::ConnectionPing => {
                let (connection, ctx) = self.context(&args)?;
                connection.ping(&*ctx).await
            }
            ApiEvent::ConnectionQueryChainCode => {
                let (connection, ctx) = self.context(&args)?;
                let payload = connection
                    .query_chaincode(&*ctx, args.str(2, "functionName")?, &args.strings(3, "args")?)
                    .await?;
                Ok(payload_to_wire(payload.as_deref()))
            }
            ApiEvent::ConnectionInvokeChainCode => {
                let (connection, ctx) = self.context(&args)?;
                let payload = connection
                    .invoke_chaincode(
                        &*ctx,
                        args.str(2, "functionName")?,
                        &args.strings(3, "args")?,
                        &args.value(4),
                    )
                    .await?;
                Ok(payload_to_wire(payload.as_deref()))
            }
            ApiEvent::ConnectionCreateIdentity => {
                let (connection, ctx) = self.context(&args)?;
                let identity = connection
                    .create_identity(&*ctx, args.str(2, "userId")?, &args.value(3))
                    .await?;
                to_json(identity)
            }
            ApiEvent::ConnectionList => {
                let (connection, ctx) = self.context(&args)?;
                to_json(connection.list(&*ctx).await?)
            }
            ApiEvent::ConnectionCreateTransactionId => {
                let (connection, ctx) = self.context(&args)?;
                to_json(connection.create_transaction_id(&*ctx).await?)
            }
            ApiEvent::ConnectionProfileStoreLoad => {
                self.stores.profile_load(args.str(0, "profileName")?).await
            }
            ApiEvent::ConnectionProfileStoreSave => {
                self.stores
                    .profile_save(args.str(0, "profileName")?, args.value(1))
                    .await?;
                Ok(Value::Null)
            }
            ApiEvent::ConnectionProfileStoreLoadAll => {
                Ok(Value::Object(self.stores.profile_load_all().await?))
            }
            ApiEvent::ConnectionProfileStoreDelete => {
                self.stores.profile_delete(args.str(0, "profileName")?).await?;
                Ok(Value::Null)
            }
            ApiEvent::BusinessNetworkCardStoreGet => {
                to_json(self.stores.card_get(args.str(0, "cardName")?).await?)
            }
            ApiEvent::BusinessNetworkCardStoreHas => {
                Ok(Value::Bool(self.stores.card_has(args.str(0, "cardName")?).await))
            }
            ApiEvent::BusinessNetworkCardStorePut => {
                let name = args.str(0, "cardName")?;
                let card: BusinessNetworkCard = serde_json::from_value(args.value(1))
                    .map_err(|e| ConnectorError::InvalidArgument(format!("{event}: card {name}: {e}")))?;
                self.stores.card_put(name, &card).await?;
                Ok(Value::Null)
            }
            ApiEvent::BusinessNetworkCardStoreGetAll => to_json(self.stores.card_get_all().await?),
            ApiEvent::BusinessNetworkCardStoreDelete => {
                let deleted = self.stores.card_delete(args.str(0, "cardName")?).await?;
                Ok(Value::Bool(deleted))
            }
        }
    }

    /// Connect using the given options laid over any profile stored under
    /// the same name. The merged profile is saved once its connector type
    /// resolves.
    async fn connect(&self, args: &Args<'_>) -> ConnectorResult<Value> {
        let profile_name = args.str(0, "profileName")?;
        let network_name = args.opt_str(1, "networkName")?;
        let options = match self.stores.profile_find(profile_name).await? {
            Some(stored) => merge_options(&stored, &args.value(2)),
            None => args.value(2),
        };
        let manager = self.manager_for(profile_name, &options)?;
        self.stores.profile_save(profile_name, options.clone()).await?;

        let connection = manager.connect(profile_name, network_name, &options).await?;
        let connection_id = ConnectionId::generate();
        let forwarder = spawn_forwarder(
            connection_id.clone(),
            connection.subscribe_events(),
            self.outbound.clone(),
        );
        self.tables.lock().connections.insert(
            connection_id.clone(),
            OpenConnection {
                connection,
                forwarder,
            },
        );

        info!(
            connection_id = %connection_id,
            profile = %profile_name,
            connector = %manager.connector_type(),
            "Connection opened for client"
        );
        Ok(json!(connection_id))
    }

    async fn login(&self, args: &Args<'_>) -> ConnectorResult<Value> {
        let connection_id = ConnectionId::from(args.str(0, "connectionId")?);
        let connection = self.connection(&connection_id)?;
        let context = connection
            .login(args.str(1, "enrollmentId")?, args.str(2, "enrollmentSecret")?)
            .await?;

        let context_id = SecurityContextId::generate();
        let mut tables = self.tables.lock();
        // The connection may have been disconnected while the login ran.
        if !tables.connections.contains_key(&connection_id) {
            return Err(unknown_connection(&connection_id));
        }
        tables.contexts.insert(
            context_id.clone(),
            OpenContext {
                connection_id,
                context,
            },
        );
        Ok(json!(context_id))
    }

    async fn disconnect(&self, args: &Args<'_>) -> ConnectorResult<Value> {
        let connection_id = ConnectionId::from(args.str(0, "connectionId")?);
        let open = {
            let mut tables = self.tables.lock();
            let Some(open) = tables.connections.remove(&connection_id) else {
                debug!(connection_id = %connection_id, "Disconnect for unknown connection ignored");
                return Ok(Value::Null);
            };
            tables
                .contexts
                .retain(|_, context| context.connection_id != connection_id);
            open
        };

        open.forwarder.abort();
        open.connection.disconnect().await?;

        info!(connection_id = %connection_id, "Connection closed for client");
        Ok(Value::Null)
    }

    /// Manager for the connector type named in `args[1]`, the options of an
    /// identity call.
    fn identity_manager(&self, args: &Args<'_>) -> ConnectorResult<DynConnectionManager> {
        self.manager_for(args.str(0, "profileName")?, &args.value(1))
    }

    fn manager_for(&self, profile_name: &str, options: &Value) -> ConnectorResult<DynConnectionManager> {
        let profile = ConnectionProfile::from_options(profile_name, options).ok_or_else(|| {
            ConnectorError::InvalidArgument(
                "connection profile options must name a connector type".to_string(),
            )
        })?;
        Ok(self.registry.manager_for(&profile.connector_type)?)
    }

    fn connection(&self, connection_id: &ConnectionId) -> ConnectorResult<DynConnection> {
        self.tables
            .lock()
            .connections
            .get(connection_id)
            .map(|open| Arc::clone(&open.connection))
            .ok_or_else(|| unknown_connection(connection_id))
    }

    /// Connection in `args[0]` and the security context in `args[1]`, which
    /// must belong to it.
    fn context(&self, args: &Args<'_>) -> ConnectorResult<(DynConnection, DynSecurityContext)> {
        let connection_id = ConnectionId::from(args.str(0, "connectionId")?);
        let context_id = SecurityContextId::from(args.str(1, "securityContextId")?);

        let tables = self.tables.lock();
        let connection = tables
            .connections
            .get(&connection_id)
            .map(|open| Arc::clone(&open.connection))
            .ok_or_else(|| unknown_connection(&connection_id))?;
        let context = tables
            .contexts
            .get(&context_id)
            .filter(|open| open.connection_id == connection_id)
            .map(|open| Arc::clone(&open.context))
            .ok_or_else(|| ConnectorError::UnknownReference {
                kind: "security context",
                id: context_id.to_string(),
            })?;
        Ok((connection, context))
    }
}

fn unknown_connection(connection_id: &ConnectionId) -> ConnectorError {
    ConnectorError::UnknownReference {
        kind: "connection",
        id: connection_id.to_string(),
    }
}

fn to_json<T: serde::Serialize>(value: T) -> ConnectorResult<Value> {
    serde_json::to_value(value).map_err(|e| ConnectorError::InvalidResponse(e.to_string()))
}

/// Relay a connection's event batches to the client as `events` pushes.
fn spawn_forwarder(
    connection_id: ConnectionId,
    mut events: broadcast::Receiver<EventBatch>,
    outbound: mpsc::Sender<Frame>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(batch) => {
                    let push = Frame::Push {
                        event: EVENTS.to_string(),
                        args: vec![json!(connection_id), Value::Array(batch)],
                    };
                    if outbound.send(push).await.is_err() {
                        break;
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!(connection_id = %connection_id, skipped, "Event forwarder lagged");
                }
                Err(RecvError::Closed) => break,
            }
        }
    })
}
