//! Redis cache backend.
//!
//! A shared store for multi-instance deployments: TTL via `SET EX`,
//! set-based key tracking for pattern deletion, and Redis pub/sub for
//! domain events.

mod cache;
mod error;
mod pubsub;

pub use cache::RedisCache;
pub use pubsub::RedisPubSub;
