use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::broadcast;

use crate::availability::DomainEvent;

use super::Result;

/// Trait for basic cache operations.
///
/// Implementations synchronize internally; callers share one instance
/// through an `Arc` and never lock around it.
#[async_trait]
pub trait Cache: Send + Sync {
    /// Gets a value from the cache by key. Expired entries are misses.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Sets a value in the cache, expiring after `ttl`.
    async fn set(&self, key: &str, value: &[u8], ttl: Duration) -> Result<()>;

    /// Deletes a value from the cache by key.
    async fn delete(&self, key: &str) -> Result<()>;

    /// Deletes all values matching a `prefix*` or exact pattern and returns
    /// how many live entries were removed.
    async fn delete_pattern(&self, pattern: &str) -> Result<usize>;
}

/// Trait for publishing domain events to downstream consumers.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    /// Publishes a domain event to every subscriber.
    async fn publish(&self, event: &DomainEvent) -> Result<()>;

    /// Subscribes to domain events.
    async fn subscribe(&self) -> Result<broadcast::Receiver<DomainEvent>>;
}
