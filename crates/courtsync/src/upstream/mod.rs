//! Upstream provider access.
//!
//! [`HttpUpstreamClient`] talks to the provider over HTTP; [`CachedUpstreamClient`]
//! wraps any `UpstreamClient` with the entity cache.

mod cached;
mod http;

pub use cached::{CachedUpstreamClient, EntityTtls};
pub use http::HttpUpstreamClient;
