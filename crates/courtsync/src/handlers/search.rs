//! Availability search endpoint.

use axum::{
    extract::{Query, State},
    Json,
};
use chrono::NaiveDate;
use serde::Deserialize;

use courtsync_core::availability::ClubWithAvailability;

use crate::handlers::AppError;
use crate::state::AppState;

/// Query parameters of `GET /search`.
///
/// Missing or malformed parameters are rejected by the extractor with 400.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchQuery {
    pub place_id: String,
    /// Day to search, as `YYYY-MM-DD`.
    pub date: NaiveDate,
}

/// GET /search?placeId=&date= - Clubs of a place with their free slots on a day.
#[axum::debug_handler]
pub async fn search(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<ClubWithAvailability>>, AppError> {
    let clubs = state
        .aggregator
        .get_availability(&query.place_id, query.date)
        .await?;
    Ok(Json(clubs))
}
