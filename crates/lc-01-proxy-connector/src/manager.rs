//! # Proxy Connection Manager
//!
//! Owns the one socket to the connector server and reference-counts it.
//!
//! The pool holds one key per live logical connection plus one per
//! in-flight reservation. A reservation is taken synchronously before the
//! transport is touched, so a concurrent `disconnect` can never see an empty
//! pool and close the socket out from under a call that is about to use it.

use crate::config::ProxyConfig;
use crate::connection::ProxyConnection;
use crate::CONNECTOR_TYPE;
use async_trait::async_trait;
use futures::future::{BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use shared_bus::{dial_with_timeout, Dialer, EventDemux, Reply, RpcSocket, WsDialer};
use shared_types::wire_error;
use shared_types::{
    ApiEvent, ConnectionId, ConnectionManager, ConnectionManagerFactory, ConnectorError,
    ConnectorResult, DynConnection, DynConnectionManager, IdentityCredentials, RegistryError,
    ReservationToken, TransportError,
};
use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Entry in the connection pool.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PoolKey {
    /// Placeholder held while a handshake or identity call is in flight.
    Reservation(ReservationToken),
    Connection(ConnectionId),
}

/// Observable transport state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportStatus {
    Disconnected,
    Connecting,
    Connected,
}

type DialAttempt = Shared<BoxFuture<'static, Result<Arc<RpcSocket>, TransportError>>>;

enum TransportState {
    Disconnected,
    /// One dial shared by every caller that arrives while it is running.
    Connecting {
        generation: u64,
        attempt: DialAttempt,
    },
    Connected(Arc<RpcSocket>),
}

struct Pool {
    transport: TransportState,
    keys: HashSet<PoolKey>,
}

struct ManagerInner {
    config: ProxyConfig,
    dialer: Arc<dyn Dialer>,
    demux: Arc<EventDemux>,
    pool: Mutex<Pool>,
    generation: AtomicU64,
}

/// Connection manager for the `proxy` connector type.
///
/// Cheap to clone; clones share the pool and the socket.
#[derive(Clone)]
pub struct ProxyConnectionManager {
    inner: Arc<ManagerInner>,
}

impl ProxyConnectionManager {
    /// Manager dialing the configured server over WebSocket.
    pub fn new(config: ProxyConfig) -> Self {
        Self::with_dialer(config, Arc::new(WsDialer))
    }

    pub fn with_dialer(config: ProxyConfig, dialer: Arc<dyn Dialer>) -> Self {
        Self {
            inner: Arc::new(ManagerInner {
                config,
                dialer,
                demux: Arc::new(EventDemux::default()),
                pool: Mutex::new(Pool {
                    transport: TransportState::Disconnected,
                    keys: HashSet::new(),
                }),
                generation: AtomicU64::new(0),
            }),
        }
    }

    pub fn config(&self) -> &ProxyConfig {
        &self.inner.config
    }

    /// Number of outstanding connections and reservations.
    pub fn pool_size(&self) -> usize {
        self.inner.pool.lock().keys.len()
    }

    pub fn has_connection(&self, connection_id: &ConnectionId) -> bool {
        self.inner
            .pool
            .lock()
            .keys
            .contains(&PoolKey::Connection(connection_id.clone()))
    }

    pub fn transport_state(&self) -> TransportStatus {
        match &self.inner.pool.lock().transport {
            TransportState::Connected(socket) if socket.is_open() => TransportStatus::Connected,
            TransportState::Connecting { .. } => TransportStatus::Connecting,
            _ => TransportStatus::Disconnected,
        }
    }

    pub fn is_transport_open(&self) -> bool {
        self.transport_state() == TransportStatus::Connected
    }

    /// Return the live socket, dialing if there is none.
    ///
    /// Concurrent callers share a single dial. A failed dial leaves the
    /// manager disconnected so the next call retries.
    pub async fn ensure_connected(&self) -> Result<Arc<RpcSocket>, TransportError> {
        let (generation, attempt) = {
            let mut pool = self.inner.pool.lock();
            match &pool.transport {
                TransportState::Connected(socket) if socket.is_open() => {
                    return Ok(Arc::clone(socket));
                }
                TransportState::Connecting {
                    generation,
                    attempt,
                } => (*generation, attempt.clone()),
                _ => {
                    let generation = self.inner.generation.fetch_add(1, Ordering::SeqCst) + 1;
                    let attempt = self.dial_attempt();
                    pool.transport = TransportState::Connecting {
                        generation,
                        attempt: attempt.clone(),
                    };
                    (generation, attempt)
                }
            }
        };

        let result = attempt.await;

        let mut pool = self.inner.pool.lock();
        let still_current = matches!(
            &pool.transport,
            TransportState::Connecting { generation: g, .. } if *g == generation
        );
        if still_current {
            pool.transport = match &result {
                Ok(socket) => TransportState::Connected(Arc::clone(socket)),
                Err(e) => {
                    warn!(url = %self.inner.config.server_url, error = %e, "Failed to connect to connector server");
                    TransportState::Disconnected
                }
            };
        }
        result
    }

    fn dial_attempt(&self) -> DialAttempt {
        let dialer = Arc::clone(&self.inner.dialer);
        let demux = Arc::clone(&self.inner.demux);
        let url = self.inner.config.server_url.clone();
        let timeout = self.inner.config.connect_timeout();

        async move {
            debug!(url = %url, "Dialing connector server");
            let pipe = dial_with_timeout(dialer.as_ref(), &url, timeout).await?;
            Ok(RpcSocket::spawn(url, pipe, demux))
        }
        .boxed()
        .shared()
    }

    /// Put a reservation in the pool. Released when the guard drops.
    fn reserve(&self) -> Reservation {
        let token = ReservationToken::new();
        self.inner
            .pool
            .lock()
            .keys
            .insert(PoolKey::Reservation(token));
        debug!(reservation = %token, "Reserved pool slot");
        Reservation {
            manager: self.clone(),
            key: Some(PoolKey::Reservation(token)),
        }
    }

    /// Remove `key` from the pool, closing the socket if it was the last one.
    fn release(&self, key: &PoolKey) -> bool {
        let mut pool = self.inner.pool.lock();
        if !pool.keys.remove(key) {
            return false;
        }

        if pool.keys.is_empty() && self.inner.config.close_on_disconnect {
            let previous = std::mem::replace(&mut pool.transport, TransportState::Disconnected);
            if let TransportState::Connected(socket) = previous {
                info!(url = %socket.url(), "Last connection released, closing socket");
                socket.close();
            }
        }
        true
    }

    /// Forget a connection. Unknown ids are ignored.
    ///
    /// With `close_on_disconnect`, releasing the last id closes the socket.
    pub fn disconnect(&self, connection_id: &ConnectionId) -> bool {
        let removed = self.release(&PoolKey::Connection(connection_id.clone()));
        if removed {
            debug!(connection_id = %connection_id, "Released connection");
        }
        removed
    }

    pub(crate) fn unregister_events(&self, connection_id: &ConnectionId) {
        self.inner.demux.unregister(connection_id);
    }

    /// Open a logical connection on the connector server.
    pub async fn connect_proxy(
        &self,
        profile_name: &str,
        network_name: Option<&str>,
        options: &Value,
    ) -> ConnectorResult<Arc<ProxyConnection>> {
        let reservation = self.reserve();
        let socket = self.ensure_connected().await?;

        let event = ApiEvent::ConnectionManagerConnect;
        let reply = socket
            .emit(
                event.as_str(),
                vec![json!(profile_name), json!(network_name), options.clone()],
            )
            .await;
        let connection_id = ConnectionId::from(parse_result::<String>(event, decode_reply(reply)?)?);

        let events = self.inner.demux.register(&connection_id);
        reservation.promote(connection_id.clone());
        info!(connection_id = %connection_id, profile = profile_name, "Connected");

        Ok(Arc::new(ProxyConnection::new(
            self.clone(),
            Arc::downgrade(&socket),
            connection_id,
            profile_name.to_string(),
            network_name.map(str::to_string),
            events,
        )))
    }

    /// One call under a reservation; the reservation is released whatever
    /// the outcome.
    pub(crate) async fn reserved_call(&self, event: ApiEvent, args: Vec<Value>) -> ConnectorResult<Value> {
        let _reservation = self.reserve();
        let socket = self.ensure_connected().await?;
        decode_reply(socket.emit(event.as_str(), args).await)
    }
}

/// Pool slot held for the duration of a call.
struct Reservation {
    manager: ProxyConnectionManager,
    key: Option<PoolKey>,
}

impl Reservation {
    /// Swap the reservation for a connection id in one pool mutation.
    fn promote(mut self, connection_id: ConnectionId) {
        if let Some(key) = self.key.take() {
            let mut pool = self.manager.inner.pool.lock();
            pool.keys.remove(&key);
            pool.keys.insert(PoolKey::Connection(connection_id));
        }
    }
}

impl Drop for Reservation {
    fn drop(&mut self) {
        if let Some(key) = self.key.take() {
            self.manager.release(&key);
        }
    }
}

/// Turn a reply into its payload or the inflated remote error.
pub(crate) fn decode_reply(reply: Result<Reply, TransportError>) -> ConnectorResult<Value> {
    reply?
        .into_result()
        .map_err(|wire| ConnectorError::Remote(wire_error::deserialize(wire)))
}

pub(crate) fn parse_result<T: DeserializeOwned>(event: ApiEvent, value: Value) -> ConnectorResult<T> {
    serde_json::from_value(value)
        .map_err(|e| ConnectorError::InvalidResponse(format!("{event}: {e}")))
}

#[async_trait]
impl ConnectionManager for ProxyConnectionManager {
    fn connector_type(&self) -> &str {
        CONNECTOR_TYPE
    }

    async fn connect(
        &self,
        profile_name: &str,
        network_name: Option<&str>,
        options: &Value,
    ) -> ConnectorResult<DynConnection> {
        let connection: DynConnection = self.connect_proxy(profile_name, network_name, options).await?;
        Ok(connection)
    }

    async fn import_identity(
        &self,
        profile_name: &str,
        options: &Value,
        id: &str,
        certificate: &str,
        private_key: &str,
    ) -> ConnectorResult<()> {
        self.reserved_call(
            ApiEvent::ConnectionManagerImportIdentity,
            vec![
                json!(profile_name),
                options.clone(),
                json!(id),
                json!(certificate),
                json!(private_key),
            ],
        )
        .await?;
        Ok(())
    }

    async fn export_identity(
        &self,
        profile_name: &str,
        options: &Value,
        id: &str,
    ) -> ConnectorResult<Option<IdentityCredentials>> {
        let event = ApiEvent::ConnectionManagerExportIdentity;
        let value = self
            .reserved_call(event, vec![json!(profile_name), options.clone(), json!(id)])
            .await?;
        parse_result(event, value)
    }

    async fn remove_identity(
        &self,
        profile_name: &str,
        options: &Value,
        id: &str,
    ) -> ConnectorResult<bool> {
        let event = ApiEvent::ConnectionManagerRemoveIdentity;
        let value = self
            .reserved_call(event, vec![json!(profile_name), options.clone(), json!(id)])
            .await?;
        parse_result(event, value)
    }
}

/// Builds [`ProxyConnectionManager`]s for the connector registry.
pub struct ProxyConnectionManagerFactory {
    config: ProxyConfig,
    dialer: Arc<dyn Dialer>,
}

impl ProxyConnectionManagerFactory {
    pub fn new(config: ProxyConfig) -> Self {
        Self::with_dialer(config, Arc::new(WsDialer))
    }

    pub fn with_dialer(config: ProxyConfig, dialer: Arc<dyn Dialer>) -> Self {
        Self { config, dialer }
    }
}

impl ConnectionManagerFactory for ProxyConnectionManagerFactory {
    fn connector_type(&self) -> &str {
        CONNECTOR_TYPE
    }

    fn create(&self) -> Result<DynConnectionManager, RegistryError> {
        self.config
            .validate()
            .map_err(|e| RegistryError::FactoryFailed {
                connector_type: CONNECTOR_TYPE.to_string(),
                reason: e.to_string(),
            })?;
        Ok(Arc::new(ProxyConnectionManager::with_dialer(
            self.config.clone(),
            Arc::clone(&self.dialer),
        )))
    }
}
