//! Cache key layout.
//!
//! Keys are colon-delimited: `domain:id[:id...]`. The first segment is the
//! key's domain, which the backends use to index keys for wildcard deletion.

use chrono::NaiveDate;

/// Domain of the per-place club lists.
pub const CLUBS_DOMAIN: &str = "clubs";
/// Domain of the per-club court lists.
pub const COURTS_DOMAIN: &str = "courts";
/// Domain of the per-(club, court, day) slot lists.
pub const SLOTS_DOMAIN: &str = "slots";
/// Domain of the composed availability query results.
pub const AVAILABILITY_DOMAIN: &str = "availability";

/// Returns the cache key for the clubs of a place.
pub fn clubs_key(place_id: &str) -> String {
    format!("{CLUBS_DOMAIN}:{place_id}")
}

/// Returns the cache key for the courts of a club.
pub fn courts_key(club_id: i64) -> String {
    format!("{COURTS_DOMAIN}:{club_id}")
}

/// Returns the cache key for the slots of a court on a given day.
pub fn slots_key(club_id: i64, court_id: i64, date: NaiveDate) -> String {
    format!("{SLOTS_DOMAIN}:{club_id}:{court_id}:{}", date.format("%Y-%m-%d"))
}

/// Returns the query-cache key for a composed availability result.
pub fn availability_key(place_id: &str, date: NaiveDate) -> String {
    format!(
        "{AVAILABILITY_DOMAIN}:{place_id}:{}",
        date.format("%Y-%m-%d")
    )
}

/// Returns the pattern matching the club lists of every place.
pub fn all_clubs_pattern() -> String {
    format!("{CLUBS_DOMAIN}:*")
}

/// Returns the pattern matching every slot list of a club.
pub fn club_slots_pattern(club_id: i64) -> String {
    format!("{SLOTS_DOMAIN}:{club_id}:*")
}

/// Returns the pattern matching every slot list of a single court.
pub fn court_slots_pattern(club_id: i64, court_id: i64) -> String {
    format!("{SLOTS_DOMAIN}:{club_id}:{court_id}:*")
}

/// Returns the pub/sub channel name for domain events.
pub fn events_channel() -> &'static str {
    "channel:events"
}

/// Returns the Redis sorted set key that tracks every cache key of a domain,
/// scored by the key's expiry time.
///
/// The set lets pattern deletion enumerate candidate keys without `KEYS`.
pub fn domain_tracking_key(domain: &str) -> String {
    format!("_keys:{domain}")
}

/// Returns the Redis Set key listing every domain that has tracked keys.
pub fn tracked_domains_key() -> &'static str {
    "_domains"
}

/// Extracts the domain (first segment) of a cache key.
///
/// Returns `None` for keys without a `:` separator.
///
/// # Examples
///
/// ```
/// use courtsync_core::cache::key_domain;
///
/// assert_eq!(key_domain("slots:5:9:2024-01-01"), Some("slots"));
/// assert_eq!(key_domain("orphan"), None);
/// ```
pub fn key_domain(key: &str) -> Option<&str> {
    key.split_once(':').map(|(domain, _)| domain)
}
