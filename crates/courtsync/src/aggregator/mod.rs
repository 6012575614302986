//! Availability aggregation.
//!
//! Answers "which courts are free at this place on this day" by fanning out
//! over clubs, then courts, then slots, and caching the composed result
//! under a query-cache key.

mod single_flight;

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use futures_util::future::try_join_all;
use tokio::sync::Semaphore;

use courtsync_core::availability::{
    compose_club, validate_place_id, AvailabilityError, Club, ClubWithAvailability, Court, Result,
    Slot,
};
use courtsync_core::cache::{
    availability_key, deserialize_availability, serialize_availability, Cache,
};
use courtsync_core::upstream::{UpstreamClient, UpstreamError};

pub use single_flight::SingleFlight;

/// What to do when a court or slot fetch fails mid fan-out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AggregationPolicy {
    /// Any failed fetch fails the whole query.
    #[default]
    FailFast,
    /// Drop the clubs and courts whose fetch failed and return the rest.
    /// Degraded results are never stored in the query cache.
    BestEffort,
}

impl FromStr for AggregationPolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fail_fast" | "fail-fast" => Ok(AggregationPolicy::FailFast),
            "best_effort" | "best-effort" => Ok(AggregationPolicy::BestEffort),
            other => Err(format!("unknown aggregation policy: {other}")),
        }
    }
}

/// Tuning knobs of the aggregator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AggregatorSettings {
    pub query_ttl: Duration,
    /// Upper bound on upstream fetches in flight for this process.
    pub max_concurrent_fetches: usize,
    pub policy: AggregationPolicy,
    pub single_flight: bool,
}

impl Default for AggregatorSettings {
    fn default() -> Self {
        Self {
            query_ttl: Duration::from_secs(300),
            max_concurrent_fetches: 32,
            policy: AggregationPolicy::FailFast,
            single_flight: true,
        }
    }
}

/// A fan-out result, plus whether anything was dropped while building it.
struct Gathered<T> {
    value: Option<T>,
    complete: bool,
}

impl<T> Gathered<T> {
    fn complete(value: T) -> Self {
        Self {
            value: Some(value),
            complete: true,
        }
    }

    fn partial(value: T) -> Self {
        Self {
            value: Some(value),
            complete: false,
        }
    }

    fn dropped() -> Self {
        Self {
            value: None,
            complete: false,
        }
    }
}

/// Composes availability answers from the upstream hierarchy.
pub struct Aggregator {
    upstream: Arc<dyn UpstreamClient>,
    cache: Arc<dyn Cache>,
    permits: Semaphore,
    settings: AggregatorSettings,
    flights: Option<SingleFlight<Result<Vec<ClubWithAvailability>>>>,
}

impl Aggregator {
    /// Creates an aggregator.
    ///
    /// `upstream` is usually the cached client, so the entity cache absorbs
    /// repeated fetches across queries; `cache` holds the composed results.
    pub fn new(
        upstream: Arc<dyn UpstreamClient>,
        cache: Arc<dyn Cache>,
        settings: AggregatorSettings,
    ) -> Self {
        Self {
            upstream,
            cache,
            permits: Semaphore::new(settings.max_concurrent_fetches.max(1)),
            settings,
            flights: settings.single_flight.then(SingleFlight::new),
        }
    }

    /// Returns every club of `place_id` with its courts and their free slots on `date`.
    pub async fn get_availability(
        &self,
        place_id: &str,
        date: NaiveDate,
    ) -> Result<Vec<ClubWithAvailability>> {
        validate_place_id(place_id)?;

        let key = availability_key(place_id, date);
        if let Some(clubs) = self.cached(&key).await {
            return Ok(clubs);
        }

        match &self.flights {
            Some(flights) => {
                flights
                    .run(&key, || self.compute(&key, place_id, date))
                    .await
            }
            None => self.compute(&key, place_id, date).await,
        }
    }

    /// Reads the query cache. Any failure counts as a miss.
    async fn cached(&self, key: &str) -> Option<Vec<ClubWithAvailability>> {
        match self.cache.get(key).await {
            Ok(Some(bytes)) => match deserialize_availability(&bytes) {
                Ok(clubs) => {
                    tracing::trace!(key, "Query cache hit");
                    Some(clubs)
                }
                Err(err) => {
                    tracing::warn!(key, error = %err, "Query cache entry deserialization failed");
                    // A degraded recompute is not stored, so the entry would outlive it.
                    if let Err(err) = self.cache.delete(key).await {
                        tracing::warn!(key, error = %err, "Failed to drop corrupt query cache entry");
                    }
                    None
                }
            },
            Ok(None) => {
                tracing::trace!(key, "Query cache miss");
                None
            }
            Err(err) => {
                tracing::warn!(key, error = %err, "Query cache read failed, treating as miss");
                None
            }
        }
    }

    /// Runs the full fan-out and stores complete results in the query cache.
    async fn compute(
        &self,
        key: &str,
        place_id: &str,
        date: NaiveDate,
    ) -> Result<Vec<ClubWithAvailability>> {
        let clubs = self.limited(self.upstream.get_clubs(place_id)).await?;
        tracing::debug!(place_id, %date, clubs = clubs.len(), "Aggregating availability");

        let gathered = try_join_all(clubs.into_iter().map(|club| self.gather_club(club, date)))
            .await?;

        let complete = gathered.iter().all(|g| g.complete);
        let result: Vec<ClubWithAvailability> =
            gathered.into_iter().filter_map(|g| g.value).collect();

        if complete {
            self.store(key, &result).await;
        } else {
            tracing::warn!(key, "Returning degraded availability, not caching it");
        }

        Ok(result)
    }

    async fn gather_club(
        &self,
        club: Club,
        date: NaiveDate,
    ) -> Result<Gathered<ClubWithAvailability>> {
        let courts = match self.limited(self.upstream.get_courts(club.id)).await {
            Ok(courts) => courts,
            Err(err) => return self.degrade(err).map(|()| Gathered::dropped()),
        };

        let club_id = club.id;
        let gathered = try_join_all(
            courts
                .into_iter()
                .map(|court| self.gather_court(club_id, court, date)),
        )
        .await?;

        let complete = gathered.iter().all(|g| g.complete);
        let courts = gathered.into_iter().filter_map(|g| g.value).collect();
        let composed = compose_club(club, courts);

        Ok(if complete {
            Gathered::complete(composed)
        } else {
            Gathered::partial(composed)
        })
    }

    async fn gather_court(
        &self,
        club_id: i64,
        court: Court,
        date: NaiveDate,
    ) -> Result<Gathered<(Court, Vec<Slot>)>> {
        let fetch = self.upstream.get_available_slots(club_id, court.id, date);
        match self.limited(fetch).await {
            Ok(slots) => Ok(Gathered::complete((court, slots))),
            Err(err) => self.degrade(err).map(|()| Gathered::dropped()),
        }
    }

    /// Applies the partial-failure policy to a failed fetch.
    ///
    /// Fail-fast turns it into an aggregation error; best-effort logs it and
    /// lets the caller drop the affected branch.
    fn degrade(&self, err: UpstreamError) -> Result<()> {
        match self.settings.policy {
            AggregationPolicy::FailFast => Err(AvailabilityError::Upstream(err)),
            AggregationPolicy::BestEffort => {
                tracing::warn!(resource = err.resource(), error = %err, "Dropping failed branch");
                Ok(())
            }
        }
    }

    /// Runs one upstream fetch under the concurrency limit.
    ///
    /// The permit covers the fetch only, never a nested fan-out, so a small
    /// limit cannot deadlock the levels against each other.
    async fn limited<T, F>(&self, fetch: F) -> std::result::Result<T, UpstreamError>
    where
        F: std::future::Future<Output = std::result::Result<T, UpstreamError>>,
    {
        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|e| UpstreamError::Unavailable {
                resource: "fetch limiter".to_string(),
                reason: e.to_string(),
            })?;
        fetch.await
    }

    async fn store(&self, key: &str, clubs: &[ClubWithAvailability]) {
        match serialize_availability(clubs) {
            Ok(bytes) => {
                if let Err(err) = self.cache.set(key, &bytes, self.settings.query_ttl).await {
                    tracing::warn!(key, error = %err, "Failed to cache availability");
                }
            }
            Err(err) => tracing::warn!(key, error = %err, "Availability serialization failed"),
        }
    }
}

#[cfg(all(test, feature = "memory"))]
mod tests {
    use super::*;
    use std::sync::atomic::Ordering;

    use async_trait::async_trait;
    use courtsync_core::upstream::Result as UpstreamResult;
    use serde_json::json;

    use crate::cache::MemoryCache;
    use crate::test_support::{slot, FailingCache, MockUpstream};
    use crate::upstream::{CachedUpstreamClient, EntityTtls};

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
    }

    fn aggregator(upstream: Arc<MockUpstream>, settings: AggregatorSettings) -> Aggregator {
        Aggregator::new(upstream, Arc::new(MemoryCache::new(1000)), settings)
    }

    /// Upstream with a single club, court and slot.
    struct OneClubUpstream;

    #[async_trait]
    impl UpstreamClient for OneClubUpstream {
        async fn get_clubs(&self, _place_id: &str) -> UpstreamResult<Vec<Club>> {
            Ok(vec![Club::new(1)])
        }

        async fn get_courts(&self, _club_id: i64) -> UpstreamResult<Vec<Court>> {
            Ok(vec![Court::new(10)])
        }

        async fn get_available_slots(
            &self,
            _club_id: i64,
            _court_id: i64,
            _date: NaiveDate,
        ) -> UpstreamResult<Vec<Slot>> {
            Ok(vec![slot("10:00")])
        }
    }

    #[tokio::test]
    async fn test_composes_hierarchy() {
        let aggregator = Aggregator::new(
            Arc::new(OneClubUpstream),
            Arc::new(MemoryCache::new(100)),
            AggregatorSettings::default(),
        );

        let clubs = aggregator.get_availability("place-1", date()).await.unwrap();

        let value = serde_json::to_value(&clubs).unwrap();
        assert_eq!(
            value,
            json!([{
                "id": 1,
                "courts": [{
                    "id": 10,
                    "available": [{
                        "price": 4500.0,
                        "duration": 60.0,
                        "datetime": "2024-01-01T10:00:00",
                        "start": "10:00",
                        "end": "11:00",
                        "_priority": 0.0
                    }]
                }]
            }])
        );
    }

    #[tokio::test]
    async fn test_fans_out_over_every_club_and_court() {
        let upstream = Arc::new(MockUpstream::default());
        let aggregator = aggregator(upstream.clone(), AggregatorSettings::default());

        let clubs = aggregator.get_availability("place-1", date()).await.unwrap();

        assert_eq!(clubs.len(), 2);
        assert_eq!(clubs[1].club.id, 2);
        assert_eq!(clubs[1].courts[1].court.id, 21);
        assert_eq!(upstream.courts_calls.load(Ordering::SeqCst), 2);
        assert_eq!(upstream.slots_calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn test_second_call_served_from_query_cache() {
        let upstream = Arc::new(MockUpstream::default());
        let aggregator = aggregator(upstream.clone(), AggregatorSettings::default());

        let first = aggregator.get_availability("place-1", date()).await.unwrap();
        let second = aggregator.get_availability("place-1", date()).await.unwrap();

        assert_eq!(
            serde_json::to_vec(&first).unwrap(),
            serde_json::to_vec(&second).unwrap()
        );
        assert_eq!(upstream.clubs_calls.load(Ordering::SeqCst), 1);
        assert_eq!(upstream.slots_calls.load(Ordering::SeqCst), 4);
    }

    /// Upstream whose club and court payloads already carry nested fields.
    #[derive(Default)]
    struct NestedFieldsUpstream {
        clubs_calls: std::sync::atomic::AtomicUsize,
    }

    #[async_trait]
    impl UpstreamClient for NestedFieldsUpstream {
        async fn get_clubs(&self, _place_id: &str) -> UpstreamResult<Vec<Club>> {
            self.clubs_calls.fetch_add(1, Ordering::SeqCst);
            Ok(vec![serde_json::from_value(json!({"id": 1, "courts": [{"id": 10}]})).unwrap()])
        }

        async fn get_courts(&self, _club_id: i64) -> UpstreamResult<Vec<Court>> {
            Ok(vec![serde_json::from_value(json!({"id": 10, "available": true})).unwrap()])
        }

        async fn get_available_slots(
            &self,
            _club_id: i64,
            _court_id: i64,
            _date: NaiveDate,
        ) -> UpstreamResult<Vec<Slot>> {
            Ok(vec![slot("10:00")])
        }
    }

    #[tokio::test]
    async fn test_upstream_nested_fields_do_not_defeat_query_cache() {
        let upstream = Arc::new(NestedFieldsUpstream::default());
        let aggregator = Aggregator::new(
            upstream.clone(),
            Arc::new(MemoryCache::new(100)),
            AggregatorSettings::default(),
        );

        let first = aggregator.get_availability("place-1", date()).await.unwrap();
        let second = aggregator.get_availability("place-1", date()).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(upstream.clubs_calls.load(Ordering::SeqCst), 1);

        let text = String::from_utf8(serde_json::to_vec(&first).unwrap()).unwrap();
        assert_eq!(text.matches("\"courts\"").count(), 1);
        assert_eq!(text.matches("\"available\"").count(), 1);
        assert_eq!(first[0].courts[0].available.len(), 1);
    }

    #[tokio::test]
    async fn test_corrupt_query_entry_is_dropped() {
        let upstream = Arc::new(MockUpstream::default());
        upstream.fail_all.store(true, Ordering::SeqCst);
        let cache = Arc::new(MemoryCache::new(100));
        let key = availability_key("place-1", date());
        cache
            .set(&key, b"not json", Duration::from_secs(300))
            .await
            .unwrap();
        let aggregator = Aggregator::new(upstream, cache.clone(), AggregatorSettings::default());

        assert!(aggregator.get_availability("place-1", date()).await.is_err());
        assert!(cache.get(&key).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_failed_court_fetch_fails_whole_query() {
        let upstream = Arc::new(MockUpstream {
            fail_courts_of: Some(2),
            ..Default::default()
        });
        let cache = Arc::new(MemoryCache::new(100));
        let aggregator = Aggregator::new(upstream, cache.clone(), AggregatorSettings::default());

        let err = aggregator
            .get_availability("place-1", date())
            .await
            .unwrap_err();

        assert!(matches!(err, AvailabilityError::Upstream(_)));
        let key = availability_key("place-1", date());
        assert!(cache.get(&key).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_failed_slot_fetch_fails_whole_query() {
        let upstream = Arc::new(MockUpstream {
            fail_slots_of: Some(11),
            ..Default::default()
        });
        let aggregator = aggregator(upstream, AggregatorSettings::default());

        let err = aggregator
            .get_availability("place-1", date())
            .await
            .unwrap_err();
        assert_eq!(
            err,
            AvailabilityError::Upstream(UpstreamError::Unavailable {
                resource: "clubs/1/courts/11/slots".to_string(),
                reason: "connection refused".to_string(),
            })
        );
    }

    #[tokio::test]
    async fn test_best_effort_drops_failed_branches_and_skips_cache() {
        let upstream = Arc::new(MockUpstream {
            fail_courts_of: Some(2),
            fail_slots_of: Some(11),
            ..Default::default()
        });
        let cache = Arc::new(MemoryCache::new(100));
        let settings = AggregatorSettings {
            policy: AggregationPolicy::BestEffort,
            ..Default::default()
        };
        let aggregator = Aggregator::new(upstream.clone(), cache.clone(), settings);

        let clubs = aggregator.get_availability("place-1", date()).await.unwrap();

        assert_eq!(clubs.len(), 1);
        assert_eq!(clubs[0].club.id, 1);
        assert_eq!(clubs[0].courts.len(), 1);
        assert_eq!(clubs[0].courts[0].court.id, 10);

        let key = availability_key("place-1", date());
        assert!(cache.get(&key).await.unwrap().is_none());

        aggregator.get_availability("place-1", date()).await.unwrap();
        assert_eq!(upstream.clubs_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_best_effort_still_fails_when_clubs_fail() {
        let upstream = Arc::new(MockUpstream::default());
        upstream.fail_all.store(true, Ordering::SeqCst);
        let settings = AggregatorSettings {
            policy: AggregationPolicy::BestEffort,
            ..Default::default()
        };
        let aggregator = aggregator(upstream, settings);

        assert!(aggregator.get_availability("place-1", date()).await.is_err());
    }

    #[tokio::test]
    async fn test_invalid_place_id_is_rejected_before_fetching() {
        let upstream = Arc::new(MockUpstream::default());
        let aggregator = aggregator(upstream.clone(), AggregatorSettings::default());

        let err = aggregator.get_availability("slots:*", date()).await.unwrap_err();

        assert!(matches!(err, AvailabilityError::InvalidQuery(_)));
        assert_eq!(upstream.clubs_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_unreachable_cache_still_answers() {
        let upstream = Arc::new(MockUpstream::default());
        let aggregator = Aggregator::new(
            upstream.clone(),
            Arc::new(FailingCache),
            AggregatorSettings::default(),
        );

        assert_eq!(
            aggregator.get_availability("place-1", date()).await.unwrap().len(),
            2
        );
        assert_eq!(
            aggregator.get_availability("place-1", date()).await.unwrap().len(),
            2
        );
        assert_eq!(upstream.clubs_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_query_and_entity_ttls() {
        let upstream = Arc::new(MockUpstream::default());
        let cache = Arc::new(MemoryCache::new(1000));
        let cached_upstream = Arc::new(CachedUpstreamClient::new(
            upstream.clone(),
            cache.clone(),
            EntityTtls::default(),
        ));
        let aggregator = Aggregator::new(cached_upstream, cache, AggregatorSettings::default());

        aggregator.get_availability("place-1", date()).await.unwrap();

        tokio::time::advance(Duration::from_secs(299)).await;
        aggregator.get_availability("place-1", date()).await.unwrap();
        assert_eq!(upstream.slots_calls.load(Ordering::SeqCst), 4);

        // Query and slot entries expire at 300s; clubs and courts live on.
        tokio::time::advance(Duration::from_secs(1)).await;
        aggregator.get_availability("place-1", date()).await.unwrap();
        assert_eq!(upstream.slots_calls.load(Ordering::SeqCst), 8);
        assert_eq!(upstream.clubs_calls.load(Ordering::SeqCst), 1);
        assert_eq!(upstream.courts_calls.load(Ordering::SeqCst), 2);

        // Clubs and courts expire at 3600s.
        tokio::time::advance(Duration::from_secs(3300)).await;
        aggregator.get_availability("place-1", date()).await.unwrap();
        assert_eq!(upstream.clubs_calls.load(Ordering::SeqCst), 2);
        assert_eq!(upstream.courts_calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_misses_share_one_fan_out() {
        let upstream = Arc::new(MockUpstream {
            slots_delay: Some(Duration::from_secs(1)),
            ..Default::default()
        });
        let aggregator = aggregator(upstream.clone(), AggregatorSettings::default());

        let (a, b) = tokio::join!(
            aggregator.get_availability("place-1", date()),
            aggregator.get_availability("place-1", date()),
        );

        assert_eq!(a.unwrap(), b.unwrap());
        assert_eq!(upstream.clubs_calls.load(Ordering::SeqCst), 1);
        assert_eq!(upstream.slots_calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_without_single_flight_misses_fan_out_separately() {
        let upstream = Arc::new(MockUpstream {
            slots_delay: Some(Duration::from_secs(1)),
            ..Default::default()
        });
        let settings = AggregatorSettings {
            single_flight: false,
            ..Default::default()
        };
        let aggregator = aggregator(upstream.clone(), settings);

        let (a, b) = tokio::join!(
            aggregator.get_availability("place-1", date()),
            aggregator.get_availability("place-1", date()),
        );

        assert!(a.is_ok() && b.is_ok());
        assert_eq!(upstream.clubs_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fetch_limit_of_one_completes() {
        let upstream = Arc::new(MockUpstream {
            slots_delay: Some(Duration::from_millis(10)),
            ..Default::default()
        });
        let settings = AggregatorSettings {
            max_concurrent_fetches: 1,
            ..Default::default()
        };
        let aggregator = aggregator(upstream.clone(), settings);

        let clubs = aggregator.get_availability("place-1", date()).await.unwrap();
        assert_eq!(clubs.len(), 2);
    }

    #[test]
    fn test_policy_from_str() {
        assert_eq!(
            "fail_fast".parse::<AggregationPolicy>().unwrap(),
            AggregationPolicy::FailFast
        );
        assert_eq!(
            "BEST_EFFORT".parse::<AggregationPolicy>().unwrap(),
            AggregationPolicy::BestEffort
        );
        assert!("sometimes".parse::<AggregationPolicy>().is_err());
    }
}
