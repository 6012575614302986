//! In-memory domain event bus backed by a tokio broadcast channel.

use async_trait::async_trait;
use tokio::sync::broadcast;

use courtsync_core::availability::DomainEvent;
use courtsync_core::cache::{EventPublisher, Result};

/// Channel capacity for pub/sub messages.
const CHANNEL_CAPACITY: usize = 100;

/// In-memory event publisher.
///
/// All events go out on a single channel; slow subscribers lag and skip
/// the oldest events rather than block publishers.
#[derive(Debug, Clone)]
pub struct MemoryPubSub {
    sender: broadcast::Sender<DomainEvent>,
}

impl MemoryPubSub {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { sender }
    }
}

impl Default for MemoryPubSub {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EventPublisher for MemoryPubSub {
    async fn publish(&self, event: &DomainEvent) -> Result<()> {
        // No receivers just means nobody is listening right now.
        let _ = self.sender.send(event.clone());
        Ok(())
    }

    async fn subscribe(&self) -> Result<broadcast::Receiver<DomainEvent>> {
        Ok(self.sender.subscribe())
    }
}
