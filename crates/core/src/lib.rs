//! Functional core of courtsync.
//!
//! Domain types, cache key layout, invalidation rules and the traits the
//! service wires together. Nothing in this crate performs I/O.

pub mod availability;
pub mod cache;
pub mod http_mapping;
pub mod invalidation;
pub mod upstream;
