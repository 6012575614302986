use thiserror::Error;

use crate::upstream::UpstreamError;

/// Errors that can occur while answering an availability query.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AvailabilityError {
    /// A fetch in the fan-out failed; no partial result is returned.
    #[error("Aggregation failed: {0}")]
    Upstream(#[from] UpstreamError),
    #[error("Invalid query: {0}")]
    InvalidQuery(String),
}

/// Result type for availability operations.
pub type Result<T> = std::result::Result<T, AvailabilityError>;
