mod error;
mod keys;
mod patterns;
mod serialization;
mod traits;

pub use error::{CacheError, Result};
pub use keys::{
    all_clubs_pattern, availability_key, club_slots_pattern, clubs_key, court_slots_pattern,
    courts_key, domain_tracking_key, events_channel, key_domain, slots_key, tracked_domains_key,
    AVAILABILITY_DOMAIN, CLUBS_DOMAIN, COURTS_DOMAIN, SLOTS_DOMAIN,
};
pub use patterns::KeyPattern;
pub use serialization::{
    deserialize_availability, deserialize_clubs, deserialize_courts, deserialize_slots,
    serialize_availability, serialize_clubs, serialize_courts, serialize_slots,
    SerializationError,
};
pub use traits::{Cache, EventPublisher};
