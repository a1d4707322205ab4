//! In-memory event bus implementation using tokio broadcast channels.
//!
//! This implementation is suitable for:
//! - Single server deployments
//! - Development and testing
//!
//! For multi-replica deployments, use a Redis or Postgres event bus instead.

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use taskhub_events::{EventBus, EventBusError, EventStream, ListChangeEvent};
use taskhub_storage::ListId;
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt;

const CHANNEL_CAPACITY: usize = 100;

/// In-memory event bus using tokio broadcast channels, one per list.
///
/// Events are only broadcast within a single process. Multiple server
/// replicas will NOT receive each other's events.
pub struct MemoryEventBus {
    channels: Arc<DashMap<ListId, broadcast::Sender<ListChangeEvent>>>,
}

impl MemoryEventBus {
    pub fn new() -> Self {
        Self {
            channels: Arc::new(DashMap::new()),
        }
    }

    fn get_or_create_channel(&self, list_id: &ListId) -> broadcast::Sender<ListChangeEvent> {
        self.channels
            .entry(*list_id)
            .or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0)
            .clone()
    }
}

impl Default for MemoryEventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EventBus for MemoryEventBus {
    async fn publish(
        &self,
        list_id: &ListId,
        event: ListChangeEvent,
    ) -> Result<(), EventBusError> {
        let tx = self.get_or_create_channel(list_id);

        // Ignore error if no receivers (this is fine)
        let _ = tx.send(event);

        Ok(())
    }

    async fn subscribe(&self, list_id: &ListId) -> Result<EventStream, EventBusError> {
        let tx = self.get_or_create_channel(list_id);
        let rx = tx.subscribe();

        // Drop lagged errors: a receiver that fell behind should do a full
        // resync rather than replay.
        let stream = BroadcastStream::new(rx).filter_map(|result| result.ok());

        Ok(Box::pin(stream))
    }
}
