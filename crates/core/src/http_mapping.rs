//! Pure functions for mapping domain errors to HTTP status codes.
//!
//! Following the Functional Core pattern, the transport layer asks these
//! functions for a status instead of matching on error variants itself.

use crate::availability::AvailabilityError;
use crate::cache::CacheError;
use crate::invalidation::InvalidationError;

/// Maps an [`AvailabilityError`] to an HTTP status code.
///
/// - `Upstream` -> 502 (Bad Gateway)
/// - `InvalidQuery` -> 400 (Bad Request)
///
/// # Examples
///
/// ```
/// use courtsync_core::availability::AvailabilityError;
/// use courtsync_core::http_mapping::availability_error_to_status_code;
///
/// let error = AvailabilityError::InvalidQuery("placeId cannot be empty".to_string());
/// assert_eq!(availability_error_to_status_code(&error), 400);
/// ```
pub fn availability_error_to_status_code(error: &AvailabilityError) -> u16 {
    match error {
        AvailabilityError::Upstream(_) => 502,
        AvailabilityError::InvalidQuery(_) => 400,
    }
}

/// Maps an [`InvalidationError`] to an HTTP status code.
///
/// Both variants are 503 (Service Unavailable): the notifier should retry,
/// and retrying is safe because invalidation is idempotent.
pub fn invalidation_error_to_status_code(error: &InvalidationError) -> u16 {
    match error {
        InvalidationError::CacheUnavailable { .. } => 503,
        InvalidationError::PublishFailed(_) => 503,
    }
}

/// Maps a [`CacheError`] to an HTTP status code.
///
/// - `InvalidPattern` -> 400 (Bad Request)
/// - everything else -> 503 (Service Unavailable)
pub fn cache_error_to_status_code(error: &CacheError) -> u16 {
    match error {
        CacheError::InvalidPattern(_) => 400,
        CacheError::ConnectionFailed(_)
        | CacheError::OperationFailed(_)
        | CacheError::Serialization(_)
        | CacheError::PublishFailed(_) => 503,
    }
}
