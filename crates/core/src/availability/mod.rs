mod error;
mod notification;
mod operations;
mod types;

pub use error::{AvailabilityError, Result};
pub use notification::{ChangeNotification, ClubField, CourtField, DomainEvent};
pub use operations::{compose_club, validate_place_id};
pub use types::{Club, ClubWithAvailability, Court, CourtWithAvailability, Slot};
