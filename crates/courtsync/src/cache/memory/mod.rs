//! In-memory cache backend.
//!
//! A bounded LRU store with per-entry TTL and an in-process event bus, for
//! single-instance deployments and tests.

mod cache;
mod pubsub;

pub use cache::MemoryCache;
pub use pubsub::MemoryPubSub;
