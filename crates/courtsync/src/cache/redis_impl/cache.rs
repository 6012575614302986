//! Redis cache implementation.
//!
//! Every key with a domain is also added to the sorted set `_keys:{domain}`,
//! scored by its expiry as a Unix timestamp, and the domain itself to
//! `_domains`, so pattern deletion can enumerate candidates without `KEYS`
//! or `SCAN`.
//!
//! Tracking members whose score is older than the prune grace are removed on
//! every write to the domain and before every lookup, so a tracking set only
//! holds keys that can still be alive. The grace absorbs clock skew between
//! instances.
//!
//! # Atomicity
//!
//! `set` and `delete` write the entry and its tracking member in one
//! `MULTI`/`EXEC` pipeline, so a concurrent `delete_pattern` never sees one
//! without the other.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use redis::AsyncCommands;

use courtsync_core::cache::{
    domain_tracking_key, key_domain, tracked_domains_key, Cache, KeyPattern, Result,
};

use super::error::map_redis_error;

const DEFAULT_PRUNE_GRACE: Duration = Duration::from_secs(60);

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs())
        .unwrap_or_default()
}

/// Redis cache backend using a connection manager for reconnects.
#[derive(Clone)]
pub struct RedisCache {
    conn: redis::aio::ConnectionManager,
    prune_grace: Duration,
}

impl RedisCache {
    /// Creates a new Redis cache connection.
    ///
    /// # Arguments
    ///
    /// * `url` - Redis connection URL (e.g., "redis://localhost:6379")
    ///
    /// # Errors
    ///
    /// Returns `CacheError::ConnectionFailed` if the connection cannot be established.
    pub async fn new(url: &str) -> Result<Self> {
        let client = redis::Client::open(url).map_err(map_redis_error)?;
        let conn = redis::aio::ConnectionManager::new(client)
            .await
            .map_err(map_redis_error)?;
        Ok(Self {
            conn,
            prune_grace: DEFAULT_PRUNE_GRACE,
        })
    }

    /// Highest tracking score that is certainly expired.
    fn prune_before(&self) -> u64 {
        unix_now().saturating_sub(self.prune_grace.as_secs())
    }

    /// Returns the tracked keys of the given domains that match the pattern.
    async fn tracked_matching(
        &self,
        pattern: &KeyPattern<'_>,
        domains: &[String],
    ) -> Result<Vec<String>> {
        let mut conn = self.conn.clone();
        let mut keys = Vec::new();
        for domain in domains {
            let tracking = domain_tracking_key(domain);
            let (tracked,): (Vec<String>,) = redis::pipe()
                .atomic()
                .zrembyscore(&tracking, "-inf", self.prune_before())
                .ignore()
                .zrange(&tracking, 0, -1)
                .query_async(&mut conn)
                .await
                .map_err(map_redis_error)?;
            keys.extend(tracked.into_iter().filter(|k| pattern.matches(k)));
        }
        Ok(keys)
    }

    /// Lists the tracked domains a pattern without a fixed domain can reach.
    async fn candidate_domains(&self, pattern: &KeyPattern<'_>) -> Result<Vec<String>> {
        let KeyPattern::Prefix(prefix) = pattern else {
            return Ok(Vec::new());
        };
        let mut conn = self.conn.clone();
        let domains: Vec<String> = conn
            .smembers(tracked_domains_key())
            .await
            .map_err(map_redis_error)?;
        Ok(domains
            .into_iter()
            .filter(|domain| domain.starts_with(prefix))
            .collect())
    }
}

#[async_trait]
impl Cache for RedisCache {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let mut conn = self.conn.clone();
        let result: Option<Vec<u8>> = conn.get(key).await.map_err(map_redis_error)?;
        Ok(result)
    }

    async fn set(&self, key: &str, value: &[u8], ttl: Duration) -> Result<()> {
        let mut conn = self.conn.clone();
        let seconds = ttl.as_secs().max(1);

        let mut pipe = redis::pipe();
        pipe.atomic().set_ex(key, value, seconds).ignore();
        if let Some(domain) = key_domain(key) {
            let tracking = domain_tracking_key(domain);
            pipe.zrembyscore(&tracking, "-inf", self.prune_before())
                .ignore()
                .zadd(&tracking, key, unix_now() + seconds)
                .ignore()
                .sadd(tracked_domains_key(), domain)
                .ignore();
        }

        let () = pipe.query_async(&mut conn).await.map_err(map_redis_error)?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let mut conn = self.conn.clone();

        let mut pipe = redis::pipe();
        pipe.atomic().del(key).ignore();
        if let Some(domain) = key_domain(key) {
            pipe.zrem(domain_tracking_key(domain), key).ignore();
        }

        let () = pipe.query_async(&mut conn).await.map_err(map_redis_error)?;
        Ok(())
    }

    async fn delete_pattern(&self, pattern: &str) -> Result<usize> {
        let parsed = KeyPattern::parse(pattern)?;
        let mut conn = self.conn.clone();

        let keys_to_delete = match (parsed, parsed.domain()) {
            (_, Some(domain)) => {
                self.tracked_matching(&parsed, &[domain.to_string()])
                    .await?
            }
            // Keys without a domain are never tracked, so delete them directly.
            (KeyPattern::Exact(key), None) => vec![key.to_string()],
            (KeyPattern::Prefix(_), None) => {
                let domains = self.candidate_domains(&parsed).await?;
                self.tracked_matching(&parsed, &domains).await?
            }
        };

        if keys_to_delete.is_empty() {
            return Ok(0);
        }

        // DEL only counts keys that still existed, so expired entries are not reported.
        let mut pipe = redis::pipe();
        pipe.atomic().del(&keys_to_delete);
        for key in &keys_to_delete {
            if let Some(domain) = key_domain(key) {
                pipe.zrem(domain_tracking_key(domain), key).ignore();
            }
        }
        let (deleted,): (usize,) = pipe.query_async(&mut conn).await.map_err(map_redis_error)?;

        tracing::trace!(pattern, deleted, "Deleted cache keys by pattern");
        Ok(deleted)
    }
}
