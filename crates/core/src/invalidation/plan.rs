//! Pure mapping from change notifications to the cache keys they invalidate.

use crate::availability::ChangeNotification;
use crate::cache::{all_clubs_pattern, club_slots_pattern, court_slots_pattern, courts_key};

/// Returns the key patterns to delete for a change notification.
///
/// Bookings and court edits only touch the slot lists of that court. Club
/// edits clear every club list because the place a club belongs to is not
/// known locally, plus the club's courts and all of its slot lists.
/// Availability query entries are left to expire on their own TTL.
///
/// # Examples
///
/// ```
/// use courtsync_core::availability::ChangeNotification;
/// use courtsync_core::invalidation::invalidation_patterns;
///
/// let notification = ChangeNotification::ClubUpdated { club_id: 5, fields: vec![] };
/// assert_eq!(
///     invalidation_patterns(&notification),
///     vec!["clubs:*", "courts:5", "slots:5:*"]
/// );
/// ```
pub fn invalidation_patterns(notification: &ChangeNotification) -> Vec<String> {
    match notification {
        ChangeNotification::BookingCreated {
            club_id, court_id, ..
        }
        | ChangeNotification::BookingCancelled {
            club_id, court_id, ..
        }
        | ChangeNotification::CourtUpdated {
            club_id, court_id, ..
        } => vec![court_slots_pattern(*club_id, *court_id)],
        ChangeNotification::ClubUpdated { club_id, .. } => vec![
            all_clubs_pattern(),
            courts_key(*club_id),
            club_slots_pattern(*club_id),
        ],
    }
}
