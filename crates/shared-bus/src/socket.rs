//! # RPC Socket
//!
//! Event-named request/reply calls over a [`FramePipe`], plus routing of
//! pushed event batches to logical connections.

use crate::demux::EventDemux;
use crate::frame::{Frame, Reply};
use crate::pending::PendingCalls;
use crate::pipe::FramePipe;
use parking_lot::Mutex;
use serde_json::Value;
use shared_types::events::EVENTS;
use shared_types::{ConnectionId, EventBatch, TransportError};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

pub struct RpcSocket {
    url: String,
    outbound: Mutex<Option<mpsc::Sender<Frame>>>,
    pending: Arc<PendingCalls>,
    demux: Arc<EventDemux>,
    open: Arc<AtomicBool>,
    reader: Mutex<Option<JoinHandle<()>>>,
}

impl RpcSocket {
    /// Take ownership of a pipe and start reading replies and pushes off it.
    ///
    /// Must be called inside a Tokio runtime.
    pub fn spawn(url: impl Into<String>, pipe: FramePipe, demux: Arc<EventDemux>) -> Arc<Self> {
        let FramePipe { outbound, inbound } = pipe;
        let pending = Arc::new(PendingCalls::new());
        let open = Arc::new(AtomicBool::new(true));

        let reader = tokio::spawn(read_loop(
            inbound,
            Arc::clone(&pending),
            Arc::clone(&demux),
            Arc::clone(&open),
        ));

        Arc::new(Self {
            url: url.into(),
            outbound: Mutex::new(Some(outbound)),
            pending,
            demux,
            open,
            reader: Mutex::new(Some(reader)),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// False once closed locally or by the peer.
    pub fn is_open(&self) -> bool {
        self.open.load(Ordering::Acquire)
    }

    pub fn demux(&self) -> &Arc<EventDemux> {
        &self.demux
    }

    pub fn pending_calls(&self) -> usize {
        self.pending.pending_count()
    }

    /// Send `event` with `args` and wait for its reply.
    ///
    /// Fails with `Closed` if the socket is or becomes closed before the
    /// reply arrives.
    pub async fn emit(&self, event: &str, args: Vec<Value>) -> Result<Reply, TransportError> {
        let sender = self
            .outbound
            .lock()
            .clone()
            .ok_or(TransportError::Closed)?;
        let (id, reply) = self.pending.register()?;

        debug!(call_id = id, event, "Emitting call");
        let frame = Frame::Request {
            id,
            event: event.to_string(),
            args,
        };
        if sender.send(frame).await.is_err() {
            self.pending.cancel(id);
            return Err(TransportError::Closed);
        }
        drop(sender);

        reply.await.map_err(|_| TransportError::Closed)
    }

    /// Close the socket. Outstanding calls fail with `Closed`.
    pub fn close(&self) {
        if self.open.swap(false, Ordering::AcqRel) {
            info!(url = %self.url, "Closing connector server socket");
        }
        self.outbound.lock().take();
        self.pending.fail_all();
        if let Some(reader) = self.reader.lock().take() {
            reader.abort();
        }
    }
}

impl Drop for RpcSocket {
    fn drop(&mut self) {
        self.close();
    }
}

async fn read_loop(
    mut inbound: mpsc::Receiver<Frame>,
    pending: Arc<PendingCalls>,
    demux: Arc<EventDemux>,
    open: Arc<AtomicBool>,
) {
    while let Some(frame) = inbound.recv().await {
        match frame {
            Frame::Reply { id, error, result } => {
                pending.complete(id, Reply { error, result });
            }
            Frame::Push { event, args } if event == EVENTS => match split_event_push(args) {
                Some((connection_id, batch)) => {
                    demux.dispatch(&connection_id, batch);
                }
                None => warn!("Dropping malformed events push"),
            },
            Frame::Push { event, .. } => debug!(event = %event, "Ignoring unknown push"),
            Frame::Request { id, event, .. } => {
                warn!(call_id = id, event = %event, "Ignoring request sent by server")
            }
        }
    }

    if open.swap(false, Ordering::AcqRel) {
        info!("Connector server closed the socket");
    }
    pending.fail_all();
}

/// `events` pushes carry `[connectionId, [event, ...]]`.
fn split_event_push(args: Vec<Value>) -> Option<(ConnectionId, EventBatch)> {
    let mut args = args.into_iter();
    let connection_id = match args.next()? {
        Value::String(id) => ConnectionId::from(id),
        _ => return None,
    };
    let batch = match args.next() {
        Some(Value::Array(events)) => events,
        Some(Value::Null) | None => Vec::new(),
        Some(single) => vec![single],
    };
    Some((connection_id, batch))
}
