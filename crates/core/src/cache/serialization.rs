//! Pure functions for serializing/deserializing domain types to/from cache bytes.
//!
//! These functions use JSON serialization for cache storage, providing human-readable
//! cache values that are easy to debug and inspect.

use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;

use crate::availability::{Club, ClubWithAvailability, Court, Slot};

/// Errors that can occur during cache serialization/deserialization.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SerializationError {
    /// Failed to serialize a value to bytes.
    #[error("Failed to serialize: {0}")]
    SerializeFailed(String),
    /// Failed to deserialize bytes to a value.
    #[error("Failed to deserialize: {0}")]
    DeserializeFailed(String),
}

/// Result type for serialization operations.
pub type Result<T> = std::result::Result<T, SerializationError>;

fn to_bytes<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>> {
    serde_json::to_vec(value).map_err(|e| SerializationError::SerializeFailed(e.to_string()))
}

fn from_bytes<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    serde_json::from_slice(bytes).map_err(|e| SerializationError::DeserializeFailed(e.to_string()))
}

/// Serializes a club list to JSON bytes.
pub fn serialize_clubs(clubs: &[Club]) -> Result<Vec<u8>> {
    to_bytes(clubs)
}

/// Deserializes JSON bytes to a club list.
pub fn deserialize_clubs(bytes: &[u8]) -> Result<Vec<Club>> {
    from_bytes(bytes)
}

/// Serializes a court list to JSON bytes.
pub fn serialize_courts(courts: &[Court]) -> Result<Vec<u8>> {
    to_bytes(courts)
}

/// Deserializes JSON bytes to a court list.
pub fn deserialize_courts(bytes: &[u8]) -> Result<Vec<Court>> {
    from_bytes(bytes)
}

/// Serializes a slot list to JSON bytes.
pub fn serialize_slots(slots: &[Slot]) -> Result<Vec<u8>> {
    to_bytes(slots)
}

/// Deserializes JSON bytes to a slot list.
pub fn deserialize_slots(bytes: &[u8]) -> Result<Vec<Slot>> {
    from_bytes(bytes)
}

/// Serializes a composed availability result to JSON bytes.
///
/// # Arguments
/// * `clubs` - The composed clubs, courts and slots
///
/// # Returns
/// JSON-encoded bytes, stable across round trips (object keys are sorted)
pub fn serialize_availability(clubs: &[ClubWithAvailability]) -> Result<Vec<u8>> {
    to_bytes(clubs)
}

/// Deserializes JSON bytes to a composed availability result.
pub fn deserialize_availability(bytes: &[u8]) -> Result<Vec<ClubWithAvailability>> {
    from_bytes(bytes)
}
