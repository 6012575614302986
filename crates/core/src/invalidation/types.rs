use thiserror::Error;

use crate::availability::DomainEvent;
use crate::cache::CacheError;

/// Progress of a single notification through the invalidation protocol.
///
/// Stages only move forward: an event is never published before every
/// pattern of the notification has been deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum InvalidationStage {
    Received,
    Invalidated,
    Published,
}

impl std::fmt::Display for InvalidationStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            InvalidationStage::Received => "received",
            InvalidationStage::Invalidated => "invalidated",
            InvalidationStage::Published => "published",
        };
        f.write_str(name)
    }
}

/// Result of handling one change notification.
#[derive(Debug, Clone, PartialEq)]
pub struct InvalidationOutcome {
    pub stage: InvalidationStage,
    /// Number of live cache entries removed.
    pub keys_deleted: usize,
    /// The event that was published.
    pub event: DomainEvent,
}

/// Errors that can occur while handling a change notification.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InvalidationError {
    /// Deleting cache entries failed; the event was not published.
    #[error("Cache unavailable while invalidating {pattern}: {source}")]
    CacheUnavailable { pattern: String, source: CacheError },
    /// Entries were deleted but the event could not be published.
    #[error("Event publish failed after invalidation: {0}")]
    PublishFailed(CacheError),
}

impl InvalidationError {
    /// Returns the last stage the notification reached before failing.
    pub fn stage(&self) -> InvalidationStage {
        match self {
            InvalidationError::CacheUnavailable { .. } => InvalidationStage::Received,
            InvalidationError::PublishFailed(_) => InvalidationStage::Invalidated,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_ordering() {
        assert!(InvalidationStage::Received < InvalidationStage::Invalidated);
        assert!(InvalidationStage::Invalidated < InvalidationStage::Published);
        assert_eq!(InvalidationStage::Published.to_string(), "published");
    }

    #[test]
    fn test_cache_unavailable_stops_at_received() {
        let error = InvalidationError::CacheUnavailable {
            pattern: "slots:5:9:*".to_string(),
            source: CacheError::ConnectionFailed("refused".to_string()),
        };
        assert_eq!(error.stage(), InvalidationStage::Received);
        assert_eq!(
            error.to_string(),
            "Cache unavailable while invalidating slots:5:9:*: Cache connection failed: refused"
        );
    }

    #[test]
    fn test_publish_failed_stops_at_invalidated() {
        let error = InvalidationError::PublishFailed(CacheError::PublishFailed("closed".into()));
        assert_eq!(error.stage(), InvalidationStage::Invalidated);
    }
}
