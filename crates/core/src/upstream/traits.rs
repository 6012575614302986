use async_trait::async_trait;
use chrono::NaiveDate;

use crate::availability::{Club, Court, Slot};

use super::Result;

/// Read-only access to the upstream clubs/courts/slots provider.
///
/// Implemented both by the raw transport and by the caching decorator that
/// wraps it, so callers never know which one they hold.
#[async_trait]
pub trait UpstreamClient: Send + Sync {
    /// Lists the clubs of a place.
    async fn get_clubs(&self, place_id: &str) -> Result<Vec<Club>>;

    /// Lists the courts of a club.
    async fn get_courts(&self, club_id: i64) -> Result<Vec<Court>>;

    /// Lists the available slots of a court on a calendar day.
    async fn get_available_slots(
        &self,
        club_id: i64,
        court_id: i64,
        date: NaiveDate,
    ) -> Result<Vec<Slot>>;
}
