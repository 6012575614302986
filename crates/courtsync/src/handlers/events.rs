//! Inbound change notifications from the upstream provider.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Json,
};

use courtsync_core::availability::ChangeNotification;

use crate::handlers::{error::RequestError, AppError};
use crate::state::AppState;

/// POST /events - Apply a change notification to the cache.
///
/// Any body that does not decode to a known notification type is a 400,
/// including the extractor's own 415/422 rejections.
#[axum::debug_handler]
pub async fn receive_event(
    State(state): State<AppState>,
    payload: Result<Json<ChangeNotification>, JsonRejection>,
) -> Result<StatusCode, AppError> {
    let Json(notification) =
        payload.map_err(|rejection| RequestError::InvalidNotification(rejection.body_text()))?;

    let outcome = state.invalidation.handle(notification).await?;
    tracing::info!(
        keys_deleted = outcome.keys_deleted,
        stage = %outcome.stage,
        "Change notification applied"
    );

    Ok(StatusCode::NO_CONTENT)
}
