//! Cached upstream client decorator.
//!
//! Wraps an `UpstreamClient` with the cache-aside pattern: reads check the
//! entity cache first and populate it only after a successful fetch. Nothing
//! is ever written on failure, so a cancelled or failed fetch cannot leave a
//! partial entry behind.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{de::DeserializeOwned, Serialize};

use courtsync_core::availability::{Club, Court, Slot};
use courtsync_core::cache::{
    clubs_key, courts_key, deserialize_clubs, deserialize_courts, deserialize_slots,
    serialize_clubs, serialize_courts, serialize_slots, slots_key, Cache, SerializationError,
};
use courtsync_core::upstream::{Result, UpstreamClient};

/// Time-to-live of each entity cache domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntityTtls {
    pub clubs: Duration,
    pub courts: Duration,
    pub slots: Duration,
}

impl Default for EntityTtls {
    fn default() -> Self {
        Self {
            clubs: Duration::from_secs(3600),
            courts: Duration::from_secs(3600),
            slots: Duration::from_secs(300),
        }
    }
}

/// Cached `UpstreamClient` decorator.
///
/// Cache failures degrade to misses: a failing `get` falls through to the
/// upstream fetch and a failing `set` is logged and ignored.
pub struct CachedUpstreamClient {
    inner: Arc<dyn UpstreamClient>,
    cache: Arc<dyn Cache>,
    ttls: EntityTtls,
}

impl CachedUpstreamClient {
    /// Creates a new cached upstream client.
    ///
    /// # Arguments
    ///
    /// * `inner` - The client that actually talks to the provider
    /// * `cache` - The entity cache
    /// * `ttls` - Time-to-live per entity domain
    pub fn new(inner: Arc<dyn UpstreamClient>, cache: Arc<dyn Cache>, ttls: EntityTtls) -> Self {
        Self { inner, cache, ttls }
    }

    /// Returns the cached list under `key`, or fetches and caches it.
    async fn read_through<T, F, Fut>(
        &self,
        key: &str,
        ttl: Duration,
        encode: fn(&[T]) -> std::result::Result<Vec<u8>, SerializationError>,
        decode: fn(&[u8]) -> std::result::Result<Vec<T>, SerializationError>,
        fetch: F,
    ) -> Result<Vec<T>>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Vec<T>>>,
    {
        match self.cache.get(key).await {
            Ok(Some(bytes)) => match decode(&bytes) {
                Ok(items) => {
                    tracing::trace!(key, "Cache hit");
                    return Ok(items);
                }
                // Treat a corrupt entry as a miss; the fetch below overwrites it.
                Err(err) => tracing::warn!(key, error = %err, "Cache entry deserialization failed"),
            },
            Ok(None) => {}
            Err(err) => tracing::warn!(key, error = %err, "Cache read failed, treating as miss"),
        }

        tracing::trace!(key, "Cache miss");
        let items = fetch().await?;

        match encode(&items) {
            Ok(bytes) => {
                if let Err(err) = self.cache.set(key, &bytes, ttl).await {
                    tracing::warn!(key, error = %err, "Failed to populate cache");
                }
            }
            Err(err) => tracing::warn!(key, error = %err, "Cache entry serialization failed"),
        }

        Ok(items)
    }
}

#[async_trait]
impl UpstreamClient for CachedUpstreamClient {
    async fn get_clubs(&self, place_id: &str) -> Result<Vec<Club>> {
        self.read_through(
            &clubs_key(place_id),
            self.ttls.clubs,
            serialize_clubs,
            deserialize_clubs,
            || self.inner.get_clubs(place_id),
        )
        .await
    }

    async fn get_courts(&self, club_id: i64) -> Result<Vec<Court>> {
        self.read_through(
            &courts_key(club_id),
            self.ttls.courts,
            serialize_courts,
            deserialize_courts,
            || self.inner.get_courts(club_id),
        )
        .await
    }

    async fn get_available_slots(
        &self,
        club_id: i64,
        court_id: i64,
        date: NaiveDate,
    ) -> Result<Vec<Slot>> {
        self.read_through(
            &slots_key(club_id, court_id, date),
            self.ttls.slots,
            serialize_slots,
            deserialize_slots,
            || self.inner.get_available_slots(club_id, court_id, date),
        )
        .await
    }
}
