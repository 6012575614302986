//! Cache backend implementations.
//!
//! Concrete implementations of the `Cache` and `EventPublisher` traits from
//! `courtsync_core::cache`, selected at compile time via feature flags.
//!
//! # Feature Flags
//!
//! - `memory` (default): single-process LRU cache with a broadcast event bus
//! - `redis`: shared Redis store with Redis pub/sub for events
//!
//! Only one backend can be enabled at a time.

#[cfg(all(feature = "memory", feature = "redis"))]
compile_error!(
    "Features 'memory' and 'redis' are mutually exclusive. \
    Enable only one cache backend at a time."
);

#[cfg(not(any(feature = "memory", feature = "redis")))]
compile_error!(
    "No cache backend selected. Enable 'memory' or 'redis' feature. \
    Example: cargo build -p courtsync --no-default-features --features redis"
);

#[cfg(feature = "memory")]
pub mod memory;

#[cfg(feature = "redis")]
pub mod redis_impl;

#[cfg(feature = "memory")]
pub use memory::{MemoryCache, MemoryPubSub};

#[cfg(feature = "redis")]
pub use redis_impl::{RedisCache, RedisPubSub};
