//! Pending Call Store - maps call ids to the callers waiting on their reply.
//!
//! Flow:
//! 1. `emit` calls `register()` to get an id and a oneshot receiver
//! 2. `emit` writes the request frame carrying that id
//! 3. The socket reader receives the reply and calls `complete()`
//! 4. `emit` awaits the receiver
//!
//! When the socket dies, `fail_all()` drops every sender so each waiting
//! caller observes the close.

use crate::frame::Reply;
use dashmap::DashMap;
use shared_types::TransportError;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tokio::sync::oneshot;
use tracing::{debug, warn};

pub struct PendingCalls {
    pending: DashMap<u64, oneshot::Sender<Reply>>,
    next_id: AtomicU64,
    closed: AtomicBool,
}

impl Default for PendingCalls {
    fn default() -> Self {
        Self::new()
    }
}

impl PendingCalls {
    pub fn new() -> Self {
        Self {
            pending: DashMap::new(),
            next_id: AtomicU64::new(1),
            closed: AtomicBool::new(false),
        }
    }

    /// Allocate the next call id and a receiver for its reply.
    ///
    /// Fails with `Closed` once `fail_all` has run.
    pub fn register(&self) -> Result<(u64, oneshot::Receiver<Reply>), TransportError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(TransportError::Closed);
        }

        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let (tx, rx) = oneshot::channel();
        self.pending.insert(id, tx);

        // fail_all may have drained the map between the check and the insert
        if self.closed.load(Ordering::Acquire) {
            self.pending.remove(&id);
            return Err(TransportError::Closed);
        }

        debug!(call_id = id, "Registered pending call");
        Ok((id, rx))
    }

    /// Deliver a reply. Returns false for unknown ids or abandoned calls.
    pub fn complete(&self, id: u64, reply: Reply) -> bool {
        let Some((_, sender)) = self.pending.remove(&id) else {
            warn!(call_id = id, "Reply for unknown call id");
            return false;
        };

        if sender.send(reply).is_err() {
            debug!(call_id = id, "Caller abandoned pending call");
            return false;
        }
        true
    }

    /// Forget a call whose request never made it onto the wire.
    pub fn cancel(&self, id: u64) -> bool {
        self.pending.remove(&id).is_some()
    }

    /// Close the store and fail every outstanding call.
    pub fn fail_all(&self) -> usize {
        self.closed.store(true, Ordering::Release);
        let ids: Vec<u64> = self.pending.iter().map(|entry| *entry.key()).collect();
        let failed = ids
            .into_iter()
            .filter(|id| self.pending.remove(id).is_some())
            .count();
        if failed > 0 {
            debug!(failed, "Failed outstanding calls on close");
        }
        failed
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }
}
