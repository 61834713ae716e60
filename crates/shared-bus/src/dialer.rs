//! # Dialers
//!
//! A dialer opens a transport to a connector server URL and hands back the
//! local end of a frame pipe.

use crate::pipe::{duplex, FramePipe};
use crate::DEFAULT_CHANNEL_CAPACITY;
use async_trait::async_trait;
use shared_types::TransportError;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::debug;

#[async_trait]
pub trait Dialer: Send + Sync {
    async fn dial(&self, url: &str) -> Result<FramePipe, TransportError>;
}

/// Dial, failing with `Timeout` if the transport is not up in time.
pub async fn dial_with_timeout(
    dialer: &dyn Dialer,
    url: &str,
    timeout: Duration,
) -> Result<FramePipe, TransportError> {
    match tokio::time::timeout(timeout, dialer.dial(url)).await {
        Ok(result) => result,
        Err(_) => Err(TransportError::Timeout {
            url: url.to_string(),
            timeout_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
        }),
    }
}

/// In-process dialer. Each dial hands the server end to the paired
/// [`MemoryListener`].
#[derive(Clone)]
pub struct MemoryDialer {
    connector: mpsc::Sender<FramePipe>,
    dials: Arc<AtomicUsize>,
}

/// Accepting side of an in-process transport.
pub struct MemoryListener {
    incoming: mpsc::Receiver<FramePipe>,
}

/// A connected dialer/listener pair.
pub fn memory_transport() -> (MemoryDialer, MemoryListener) {
    let (connector, incoming) = mpsc::channel(16);
    (
        MemoryDialer {
            connector,
            dials: Arc::new(AtomicUsize::new(0)),
        },
        MemoryListener { incoming },
    )
}

impl MemoryDialer {
    /// Number of dial attempts made so far.
    pub fn dial_count(&self) -> usize {
        self.dials.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Dialer for MemoryDialer {
    async fn dial(&self, url: &str) -> Result<FramePipe, TransportError> {
        self.dials.fetch_add(1, Ordering::SeqCst);
        let (client, server) = duplex(DEFAULT_CHANNEL_CAPACITY);
        self.connector
            .send(server)
            .await
            .map_err(|_| TransportError::ConnectFailed {
                url: url.to_string(),
                reason: "listener closed".to_string(),
            })?;
        debug!(url, "Opened in-memory transport");
        Ok(client)
    }
}

impl MemoryListener {
    /// Next incoming pipe. `None` once every dialer is gone.
    pub async fn accept(&mut self) -> Option<FramePipe> {
        self.incoming.recv().await
    }
}
