//! Event demultiplexer - routes pushed event batches to the logical
//! connection they belong to.

use crate::DEFAULT_EVENT_CAPACITY;
use dashmap::DashMap;
use shared_types::{ConnectionId, EventBatch};
use tokio::sync::broadcast;
use tracing::debug;

pub struct EventDemux {
    channels: DashMap<ConnectionId, broadcast::Sender<EventBatch>>,
    capacity: usize,
}

impl Default for EventDemux {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_CAPACITY)
    }
}

impl EventDemux {
    pub fn new(capacity: usize) -> Self {
        Self {
            channels: DashMap::new(),
            capacity,
        }
    }

    /// Channel for `connection_id`, created on first registration.
    pub fn register(&self, connection_id: &ConnectionId) -> broadcast::Sender<EventBatch> {
        self.channels
            .entry(connection_id.clone())
            .or_insert_with(|| broadcast::channel(self.capacity).0)
            .clone()
    }

    pub fn unregister(&self, connection_id: &ConnectionId) -> bool {
        let removed = self.channels.remove(connection_id).is_some();
        if removed {
            debug!(connection_id = %connection_id, "Removed event channel");
        }
        removed
    }

    /// Deliver a batch to the matching connection.
    ///
    /// Returns the number of receivers reached. Batches for unknown ids are
    /// dropped.
    pub fn dispatch(&self, connection_id: &ConnectionId, batch: EventBatch) -> usize {
        let Some(sender) = self.channels.get(connection_id).map(|s| s.clone()) else {
            debug!(connection_id = %connection_id, "Dropping events for unknown connection");
            return 0;
        };

        if sender.receiver_count() == 0 {
            return 0;
        }
        sender.send(batch).unwrap_or(0)
    }

    pub fn is_registered(&self, connection_id: &ConnectionId) -> bool {
        self.channels.contains_key(connection_id)
    }

    pub fn len(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }
}
