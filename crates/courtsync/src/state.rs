//! Application state shared by every request handler.
//!
//! The cache backend is chosen at compile time via feature flags; everything
//! above it only sees the `Cache` and `EventPublisher` trait objects.

use std::sync::Arc;

use tokio::sync::broadcast;

use courtsync_core::cache::{Cache, EventPublisher};
use courtsync_core::upstream::UpstreamClient;

use crate::aggregator::Aggregator;
use crate::config::Config;
use crate::invalidation::InvalidationHandler;
use crate::upstream::CachedUpstreamClient;

/// Shared application state.
///
/// Cloned for each request; every field is a cheap handle.
#[derive(Clone)]
pub struct AppState {
    /// Composes availability answers (query cache + fan-out).
    pub aggregator: Arc<Aggregator>,
    /// Applies upstream change notifications.
    pub invalidation: Arc<InvalidationHandler>,
    /// Cache store, also probed by the readiness check.
    pub cache: Arc<dyn Cache>,
    /// Domain event bus.
    pub publisher: Arc<dyn EventPublisher>,
    /// Shutdown signal sender for background tasks.
    pub shutdown_tx: broadcast::Sender<()>,
}

impl AppState {
    /// Wires the services on top of a cache backend and an upstream client.
    ///
    /// The aggregator reads through the entity cache, so the same store holds
    /// entity lists and composed query results.
    pub fn from_parts(
        cache: Arc<dyn Cache>,
        publisher: Arc<dyn EventPublisher>,
        upstream: Arc<dyn UpstreamClient>,
        config: &Config,
    ) -> Self {
        let cached_upstream = Arc::new(CachedUpstreamClient::new(
            upstream,
            cache.clone(),
            config.entity_ttls(),
        ));
        let aggregator = Arc::new(Aggregator::new(
            cached_upstream,
            cache.clone(),
            config.aggregator_settings(),
        ));
        let invalidation = Arc::new(InvalidationHandler::new(cache.clone(), publisher.clone()));
        let (shutdown_tx, _) = broadcast::channel(1);

        Self {
            aggregator,
            invalidation,
            cache,
            publisher,
            shutdown_tx,
        }
    }

    /// Spawns a background task that logs every published domain event.
    ///
    /// With the Redis backend this also surfaces events published by other
    /// instances. The task ends on shutdown or when the bus closes.
    pub async fn spawn_event_listener(&self) -> anyhow::Result<()> {
        let mut receiver = self.publisher.subscribe().await?;
        let mut shutdown_rx = self.subscribe_shutdown();

        tokio::spawn(async move {
            tracing::debug!("Event listener started");

            loop {
                tokio::select! {
                    result = receiver.recv() => {
                        match result {
                            Ok(event) => {
                                tracing::info!(?event, "Domain event");
                            }
                            Err(broadcast::error::RecvError::Lagged(n)) => {
                                tracing::warn!(lagged = n, "Event listener lagged");
                            }
                            Err(broadcast::error::RecvError::Closed) => {
                                tracing::info!("Event channel closed");
                                break;
                            }
                        }
                    }
                    _ = shutdown_rx.recv() => {
                        tracing::debug!("Event listener shutting down");
                        break;
                    }
                }
            }
        });

        Ok(())
    }

    /// Subscribe to shutdown signal.
    pub fn subscribe_shutdown(&self) -> broadcast::Receiver<()> {
        self.shutdown_tx.subscribe()
    }

    /// Signal all background tasks to shut down.
    pub fn signal_shutdown(&self) {
        let _ = self.shutdown_tx.send(());
    }
}

// ============================================================================
// Factory functions for the cache backends
// ============================================================================

#[cfg(feature = "memory")]
mod memory_backend {
    use super::*;
    use crate::cache::{MemoryCache, MemoryPubSub};
    use crate::upstream::HttpUpstreamClient;

    impl AppState {
        /// Creates AppState with the in-process cache and event bus.
        pub async fn new(config: &Config) -> Result<Self, anyhow::Error> {
            let upstream = Arc::new(HttpUpstreamClient::new(
                config.upstream_base_url.clone(),
                config.upstream_timeout(),
            )?);
            let cache = Arc::new(MemoryCache::new(config.cache_max_entries));
            let pubsub = Arc::new(MemoryPubSub::new());

            tracing::info!(
                max_entries = config.cache_max_entries,
                upstream = %upstream.base_url(),
                "Using in-memory cache"
            );

            Ok(Self::from_parts(cache, pubsub, upstream, config))
        }
    }
}

#[cfg(feature = "redis")]
mod redis_backend {
    use super::*;
    use crate::cache::{RedisCache, RedisPubSub};
    use crate::upstream::HttpUpstreamClient;

    impl AppState {
        /// Creates AppState with the shared Redis cache and pub/sub.
        ///
        /// Fails when Redis cannot be reached at startup.
        pub async fn new(config: &Config) -> Result<Self, anyhow::Error> {
            let upstream = Arc::new(HttpUpstreamClient::new(
                config.upstream_base_url.clone(),
                config.upstream_timeout(),
            )?);
            let cache = Arc::new(RedisCache::new(&config.redis_url).await?);
            let pubsub = Arc::new(RedisPubSub::new(&config.redis_url).await?);

            tracing::info!(
                redis = %config.redis_url,
                upstream = %upstream.base_url(),
                "Using Redis cache"
            );

            Ok(Self::from_parts(cache, pubsub, upstream, config))
        }
    }
}
