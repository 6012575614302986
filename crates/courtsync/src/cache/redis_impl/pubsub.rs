//! Redis pub/sub implementation for domain events.

use std::sync::Arc;

use async_trait::async_trait;
use futures_util::StreamExt;
use redis::AsyncCommands;
use tokio::sync::{broadcast, RwLock};

use courtsync_core::availability::DomainEvent;
use courtsync_core::cache::{events_channel, CacheError, EventPublisher, Result};

use super::error::map_redis_error;

/// Channel capacity for locally fanned-out events.
const CHANNEL_CAPACITY: usize = 100;

/// Redis pub/sub backend for broadcasting domain events across instances.
///
/// A single Redis subscription per process feeds a local broadcast channel
/// that every `subscribe` caller shares.
pub struct RedisPubSub {
    client: redis::Client,
    subscription: Arc<RwLock<Option<broadcast::Sender<DomainEvent>>>>,
}

impl RedisPubSub {
    /// Creates a new Redis pub/sub connection.
    ///
    /// # Errors
    ///
    /// Returns `CacheError::ConnectionFailed` if the connection cannot be established.
    pub async fn new(url: &str) -> Result<Self> {
        let client = redis::Client::open(url).map_err(map_redis_error)?;

        // Verify connection by getting a connection
        let _ = client
            .get_multiplexed_async_connection()
            .await
            .map_err(map_redis_error)?;

        Ok(Self {
            client,
            subscription: Arc::new(RwLock::new(None)),
        })
    }
}

#[async_trait]
impl EventPublisher for RedisPubSub {
    async fn publish(&self, event: &DomainEvent) -> Result<()> {
        let payload =
            serde_json::to_string(event).map_err(|e| CacheError::Serialization(e.to_string()))?;

        let mut conn = self
            .client
            .get_multiplexed_async_connection()
            .await
            .map_err(map_redis_error)?;

        conn.publish::<_, _, ()>(events_channel(), &payload)
            .await
            .map_err(|e| CacheError::PublishFailed(e.to_string()))?;

        Ok(())
    }

    async fn subscribe(&self) -> Result<broadcast::Receiver<DomainEvent>> {
        {
            let subscription = self.subscription.read().await;
            if let Some(sender) = subscription.as_ref() {
                return Ok(sender.subscribe());
            }
        }

        let mut subscription = self.subscription.write().await;
        // Double-check in case another task created it
        if let Some(sender) = subscription.as_ref() {
            return Ok(sender.subscribe());
        }

        let (tx, rx) = broadcast::channel(CHANNEL_CAPACITY);
        *subscription = Some(tx.clone());

        let client = self.client.clone();
        let slot = Arc::clone(&self.subscription);
        tokio::spawn(async move {
            if let Err(e) = run_subscription_loop(client, tx).await {
                tracing::error!(error = %e, "Redis event subscription failed");
            }
            // Let the next subscribe call start a fresh loop.
            slot.write().await.take();
        });

        Ok(rx)
    }
}

/// Forwards messages from the Redis events channel to the local broadcast channel.
async fn run_subscription_loop(
    client: redis::Client,
    tx: broadcast::Sender<DomainEvent>,
) -> Result<()> {
    let mut pubsub = client.get_async_pubsub().await.map_err(map_redis_error)?;
    pubsub
        .subscribe(events_channel())
        .await
        .map_err(map_redis_error)?;

    let mut stream = pubsub.on_message();
    while let Some(msg) = stream.next().await {
        let payload: String = msg.get_payload().map_err(map_redis_error)?;

        match serde_json::from_str::<DomainEvent>(&payload) {
            Ok(event) => {
                let _ = tx.send(event);
            }
            Err(e) => {
                tracing::warn!(error = %e, %payload, "Failed to deserialize domain event");
            }
        }
    }

    tracing::info!("Redis event subscription stream ended");
    Ok(())
}
