//! Test doubles shared by the unit tests of several modules.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;

use courtsync_core::availability::{Club, Court, DomainEvent, Slot};
use courtsync_core::cache::{Cache, CacheError, EventPublisher, Result as CacheResult};
use courtsync_core::upstream::{Result, UpstreamClient, UpstreamError};
use tokio::sync::broadcast;

pub fn slot(start: &str) -> Slot {
    Slot {
        price: 4500.0,
        duration: 60.0,
        datetime: format!("2024-01-01T{start}:00"),
        start: start.to_string(),
        end: "11:00".to_string(),
        priority: 0.0,
        attributes: serde_json::Map::new(),
    }
}

fn unavailable(resource: String) -> UpstreamError {
    UpstreamError::Unavailable {
        resource,
        reason: "connection refused".to_string(),
    }
}

/// Upstream double serving clubs 1 and 2, courts `{club}0` and `{club}1`,
/// one 10:00 slot per court, and counting every call.
#[derive(Default)]
pub struct MockUpstream {
    pub clubs_calls: AtomicUsize,
    pub courts_calls: AtomicUsize,
    pub slots_calls: AtomicUsize,
    pub fail_courts_of: Option<i64>,
    pub fail_slots_of: Option<i64>,
    pub fail_all: AtomicBool,
    /// Delays every slots response, to hold fan-outs in flight.
    pub slots_delay: Option<Duration>,
}

#[async_trait]
impl UpstreamClient for MockUpstream {
    async fn get_clubs(&self, _place_id: &str) -> Result<Vec<Club>> {
        self.clubs_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_all.load(Ordering::SeqCst) {
            return Err(unavailable("clubs".to_string()));
        }
        Ok(vec![Club::new(1), Club::new(2)])
    }

    async fn get_courts(&self, club_id: i64) -> Result<Vec<Court>> {
        self.courts_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_courts_of == Some(club_id) || self.fail_all.load(Ordering::SeqCst) {
            return Err(unavailable(format!("clubs/{club_id}/courts")));
        }
        Ok(vec![Court::new(club_id * 10), Court::new(club_id * 10 + 1)])
    }

    async fn get_available_slots(
        &self,
        club_id: i64,
        court_id: i64,
        _date: NaiveDate,
    ) -> Result<Vec<Slot>> {
        self.slots_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.slots_delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_slots_of == Some(court_id) || self.fail_all.load(Ordering::SeqCst) {
            return Err(unavailable(format!(
                "clubs/{club_id}/courts/{court_id}/slots"
            )));
        }
        Ok(vec![slot("10:00")])
    }
}

/// Cache whose every operation fails, as if the store were unreachable.
pub struct FailingCache;

fn refused() -> CacheError {
    CacheError::ConnectionFailed("refused".to_string())
}

#[async_trait]
impl Cache for FailingCache {
    async fn get(&self, _key: &str) -> CacheResult<Option<Vec<u8>>> {
        Err(refused())
    }

    async fn set(&self, _key: &str, _value: &[u8], _ttl: Duration) -> CacheResult<()> {
        Err(refused())
    }

    async fn delete(&self, _key: &str) -> CacheResult<()> {
        Err(refused())
    }

    async fn delete_pattern(&self, _pattern: &str) -> CacheResult<usize> {
        Err(refused())
    }
}

/// Publisher that records events, or refuses them when `fail` is set.
#[derive(Default)]
pub struct RecordingPublisher {
    pub published: std::sync::Mutex<Vec<DomainEvent>>,
    pub fail: bool,
}

impl RecordingPublisher {
    pub fn events(&self) -> Vec<DomainEvent> {
        self.published.lock().unwrap().clone()
    }
}

#[async_trait]
impl EventPublisher for RecordingPublisher {
    async fn publish(&self, event: &DomainEvent) -> CacheResult<()> {
        if self.fail {
            return Err(CacheError::PublishFailed("channel closed".to_string()));
        }
        self.published.lock().unwrap().push(event.clone());
        Ok(())
    }

    async fn subscribe(&self) -> CacheResult<broadcast::Receiver<DomainEvent>> {
        Err(CacheError::OperationFailed("not supported".to_string()))
    }
}
