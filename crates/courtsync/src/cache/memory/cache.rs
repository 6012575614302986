//! In-memory cache implementation with LRU eviction.
//!
//! Provides a thread-safe in-memory cache with TTL support using
//! tokio synchronization primitives and LRU eviction policy.
//!
//! Keys are indexed by domain (`clubs`, `courts`, `slots`, ...) so that
//! pattern deletion only visits the keys of the pattern's domain. The store
//! and the index live behind the same lock, so a `get` racing a
//! `delete_pattern` sees either the old value or a miss, never a half-applied
//! deletion.

use std::collections::{HashMap, HashSet};
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use lru::LruCache;
use tokio::sync::RwLock;
use tokio::time::Instant;

use courtsync_core::cache::{key_domain, Cache, KeyPattern, Result};

/// A single cache entry with its expiration instant.
#[derive(Debug, Clone)]
struct CacheEntry {
    value: Vec<u8>,
    expires_at: Instant,
}

impl CacheEntry {
    fn new(value: Vec<u8>, ttl: Duration) -> Self {
        Self {
            value,
            expires_at: Instant::now() + ttl,
        }
    }

    /// Returns true once the entry reached its expiration instant.
    fn is_expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }
}

#[derive(Debug)]
struct Inner {
    /// Main key-value store with LRU eviction.
    store: LruCache<String, CacheEntry>,
    /// Maps domain -> set of cache keys in that domain.
    index: HashMap<String, HashSet<String>>,
}

impl Inner {
    fn track(&mut self, key: &str) {
        if let Some(domain) = key_domain(key) {
            self.index
                .entry(domain.to_string())
                .or_default()
                .insert(key.to_string());
        }
    }

    fn untrack(&mut self, key: &str) {
        let Some(domain) = key_domain(key) else {
            return;
        };
        if let Some(keys) = self.index.get_mut(domain) {
            keys.remove(key);
            if keys.is_empty() {
                self.index.remove(domain);
            }
        }
    }

    /// Removes a key from store and index. Returns true if a live entry was removed.
    fn remove(&mut self, key: &str) -> bool {
        self.untrack(key);
        self.store.pop(key).is_some_and(|entry| !entry.is_expired())
    }
}

/// In-memory cache implementation with LRU eviction.
///
/// Thread-safe cache using `Arc<RwLock<..>>` for concurrent access.
/// Expired entries are dropped lazily when they are read or deleted.
/// Uses LRU eviction to limit memory usage when max_entries is reached.
#[derive(Debug, Clone)]
pub struct MemoryCache {
    inner: Arc<RwLock<Inner>>,
}

impl MemoryCache {
    /// Creates a new in-memory cache with LRU eviction.
    ///
    /// # Arguments
    ///
    /// * `max_entries` - Maximum number of entries before LRU eviction kicks in.
    ///
    /// # Panics
    ///
    /// Panics if `max_entries` is 0.
    pub fn new(max_entries: usize) -> Self {
        let capacity = NonZeroUsize::new(max_entries).expect("max_entries must be > 0");
        Self {
            inner: Arc::new(RwLock::new(Inner {
                store: LruCache::new(capacity),
                index: HashMap::new(),
            })),
        }
    }
}

#[async_trait]
impl Cache for MemoryCache {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        // LRU reads reorder the list, so even gets take the write lock.
        let mut inner = self.inner.write().await;

        match inner.store.get(key) {
            Some(entry) if entry.is_expired() => {
                inner.remove(key);
                Ok(None)
            }
            Some(entry) => Ok(Some(entry.value.clone())),
            None => Ok(None),
        }
    }

    async fn set(&self, key: &str, value: &[u8], ttl: Duration) -> Result<()> {
        let mut inner = self.inner.write().await;

        let entry = CacheEntry::new(value.to_vec(), ttl);
        if let Some((evicted, _)) = inner.store.push(key.to_string(), entry) {
            if evicted != key {
                inner.untrack(&evicted);
            }
        }
        inner.track(key);

        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let mut inner = self.inner.write().await;
        inner.remove(key);
        Ok(())
    }

    async fn delete_pattern(&self, pattern: &str) -> Result<usize> {
        let parsed = KeyPattern::parse(pattern)?;
        let mut inner = self.inner.write().await;

        let keys_to_delete: Vec<String> = match parsed.domain() {
            Some(domain) => inner
                .index
                .get(domain)
                .map(|keys| keys.iter().filter(|k| parsed.matches(k)).cloned().collect())
                .unwrap_or_default(),
            // The pattern spans domains, fall back to a full scan
            None => inner
                .store
                .iter()
                .filter(|(key, _)| parsed.matches(key))
                .map(|(key, _)| key.clone())
                .collect(),
        };

        let deleted = keys_to_delete
            .iter()
            .filter(|key| inner.remove(key))
            .count();

        tracing::trace!(pattern, deleted, "Deleted cache keys by pattern");
        Ok(deleted)
    }
}
