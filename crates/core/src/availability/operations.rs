use super::{
    AvailabilityError, Club, ClubWithAvailability, Court, CourtWithAvailability, Result, Slot,
};

/// Validates a place ID before it becomes part of a cache key.
///
/// Place IDs are opaque upstream strings, but they must be non-blank and
/// must not contain the `*` wildcard, which would turn the key into a
/// pattern.
pub fn validate_place_id(place_id: &str) -> Result<()> {
    if place_id.trim().is_empty() {
        return Err(AvailabilityError::InvalidQuery(
            "placeId cannot be empty".to_string(),
        ));
    }
    if place_id.contains('*') {
        return Err(AvailabilityError::InvalidQuery(format!(
            "placeId cannot contain '*': {place_id}"
        )));
    }
    Ok(())
}

/// Composes a club with its courts, each court carrying its slots for the day.
///
/// Court order is preserved, so the composed list follows upstream order.
/// Upstream `courts` and `available` fields are overwritten by the composed ones.
pub fn compose_club(club: Club, courts: Vec<(Court, Vec<Slot>)>) -> ClubWithAvailability {
    let courts = courts
        .into_iter()
        .map(|(court, available)| CourtWithAvailability::new(court, available))
        .collect();
    ClubWithAvailability::new(club, courts)
}
