use thiserror::Error;

/// Errors raised while fetching from the upstream provider.
///
/// Every variant is an `UpstreamUnavailable` condition: the fetch produced
/// nothing usable, nothing gets cached, and the caller decides on retries.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum UpstreamError {
    #[error("Upstream unavailable fetching {resource}: {reason}")]
    Unavailable { resource: String, reason: String },
    #[error("Upstream returned {status} fetching {resource}")]
    BadStatus { resource: String, status: u16 },
    #[error("Invalid upstream response for {resource}: {reason}")]
    InvalidResponse { resource: String, reason: String },
}

impl UpstreamError {
    /// Returns the upstream resource the failed fetch targeted.
    pub fn resource(&self) -> &str {
        match self {
            UpstreamError::Unavailable { resource, .. }
            | UpstreamError::BadStatus { resource, .. }
            | UpstreamError::InvalidResponse { resource, .. } => resource,
        }
    }
}

/// Result type for upstream operations.
pub type Result<T> = std::result::Result<T, UpstreamError>;
