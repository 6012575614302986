//! Change-notification handling.
//!
//! Each notification moves through `received -> invalidated -> published`:
//! every cache pattern it maps to is deleted first, and only then is the
//! corresponding domain event published. A failed deletion stops the
//! notification before anything is published.

use std::sync::Arc;

use courtsync_core::availability::{ChangeNotification, DomainEvent};
use courtsync_core::cache::{Cache, EventPublisher};
use courtsync_core::invalidation::{
    invalidation_patterns, InvalidationError, InvalidationOutcome, InvalidationStage,
};

/// Applies change notifications to the cache and announces them.
pub struct InvalidationHandler {
    cache: Arc<dyn Cache>,
    publisher: Arc<dyn EventPublisher>,
}

impl InvalidationHandler {
    pub fn new(cache: Arc<dyn Cache>, publisher: Arc<dyn EventPublisher>) -> Self {
        Self { cache, publisher }
    }

    /// Deletes the cache entries a notification affects, then publishes its domain event.
    pub async fn handle(
        &self,
        notification: ChangeNotification,
    ) -> Result<InvalidationOutcome, InvalidationError> {
        let kind = notification.kind();
        let club_id = notification.club_id();
        let court_id = notification.court_id();
        tracing::debug!(
            kind,
            club_id,
            ?court_id,
            stage = %InvalidationStage::Received,
            "Change notification"
        );

        let mut keys_deleted = 0;
        for pattern in invalidation_patterns(&notification) {
            keys_deleted += self.cache.delete_pattern(&pattern).await.map_err(|source| {
                tracing::warn!(kind, club_id, %pattern, error = %source, "Invalidation failed");
                InvalidationError::CacheUnavailable {
                    pattern: pattern.clone(),
                    source,
                }
            })?;
        }
        tracing::debug!(
            kind,
            club_id,
            keys_deleted,
            stage = %InvalidationStage::Invalidated,
            "Change notification"
        );

        let event = DomainEvent::from(notification);
        self.publisher.publish(&event).await.map_err(|source| {
            tracing::warn!(kind, club_id, error = %source, "Domain event publish failed");
            InvalidationError::PublishFailed(source)
        })?;
        tracing::debug!(kind, club_id, stage = %InvalidationStage::Published, "Change notification");

        Ok(InvalidationOutcome {
            stage: InvalidationStage::Published,
            keys_deleted,
            event,
        })
    }
}
