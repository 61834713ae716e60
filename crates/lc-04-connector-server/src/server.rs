//! # Connector Server
//!
//! Accepts clients from any frame transport and runs one [`Session`] per
//! client against a shared connector registry and shared client stores.

use crate::config::DEFAULT_HANDSHAKE_TIMEOUT_MS;
use crate::session::Session;
use crate::stores::ClientStores;
use shared_bus::{FramePipe, MemoryListener, WsListener};
use shared_types::{ConnectorRegistry, TransportError};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

#[derive(Clone)]
pub struct ConnectorServer {
    registry: Arc<ConnectorRegistry>,
    stores: ClientStores,
    handshake_timeout: Duration,
    active_sessions: Arc<AtomicUsize>,
}

impl ConnectorServer {
    /// Server with in-memory card and profile stores.
    pub fn new(registry: Arc<ConnectorRegistry>) -> Self {
        Self::with_stores(registry, ClientStores::in_memory())
    }

    pub fn with_stores(registry: Arc<ConnectorRegistry>, stores: ClientStores) -> Self {
        Self {
            registry,
            stores,
            handshake_timeout: Duration::from_millis(DEFAULT_HANDSHAKE_TIMEOUT_MS),
            active_sessions: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Time a WebSocket client gets to finish its upgrade before it is dropped.
    pub fn with_handshake_timeout(mut self, handshake_timeout: Duration) -> Self {
        self.handshake_timeout = handshake_timeout;
        self
    }

    pub fn registry(&self) -> &Arc<ConnectorRegistry> {
        &self.registry
    }

    pub fn stores(&self) -> &ClientStores {
        &self.stores
    }

    pub fn active_sessions(&self) -> usize {
        self.active_sessions.load(Ordering::SeqCst)
    }

    /// Serve one client until it disconnects.
    pub async fn serve_pipe(&self, pipe: FramePipe) {
        let FramePipe { outbound, inbound } = pipe;
        let active = self.active_sessions.fetch_add(1, Ordering::SeqCst) + 1;
        info!(active_sessions = active, "Client session started");

        Session::new(Arc::clone(&self.registry), self.stores.clone(), outbound)
            .run(inbound)
            .await;

        let active = self.active_sessions.fetch_sub(1, Ordering::SeqCst) - 1;
        info!(active_sessions = active, "Client session ended");
    }

    pub fn spawn_session(&self, pipe: FramePipe) -> JoinHandle<()> {
        let server = self.clone();
        tokio::spawn(async move { server.serve_pipe(pipe).await })
    }

    /// Accept WebSocket clients forever. Returns only when accepting fails.
    ///
    /// Each client is upgraded on its own task, so one that stalls in the
    /// handshake never holds up the next accept.
    pub async fn serve_ws(&self, listener: WsListener) -> Result<(), TransportError> {
        if let Ok(addr) = listener.local_addr() {
            info!(%addr, "Connector server listening");
        }
        loop {
            match listener.accept().await {
                Ok(incoming) => {
                    let server = self.clone();
                    tokio::spawn(async move {
                        let peer = incoming.peer_addr();
                        match incoming.upgrade(server.handshake_timeout).await {
                            Ok(pipe) => server.serve_pipe(pipe).await,
                            Err(e) => warn!(%peer, error = %e, "WebSocket handshake failed"),
                        }
                    });
                }
                Err(e) => {
                    error!(error = %e, "Accept failed, shutting down listener");
                    return Err(e);
                }
            }
        }
    }

    /// Accept in-process clients until every dialer is gone.
    pub async fn serve_memory(&self, mut listener: MemoryListener) {
        while let Some(pipe) = listener.accept().await {
            self.spawn_session(pipe);
        }
    }
}
