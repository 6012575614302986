//! Coalesces concurrent computations of the same key.
//!
//! The first caller for a key becomes the leader and runs the computation;
//! callers arriving while it is in flight wait for the leader's result
//! instead of repeating the work. If the leader is dropped before finishing
//! (its request was cancelled), waiters run the computation themselves.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Mutex, PoisonError};

use tokio::sync::broadcast;

/// In-flight computations keyed by cache key.
#[derive(Debug)]
pub struct SingleFlight<T> {
    in_flight: Mutex<HashMap<String, broadcast::Sender<T>>>,
}

enum Role<'a, T> {
    Leader(LeaderGuard<'a, T>),
    Waiter(broadcast::Receiver<T>),
}

/// Owns a key's in-flight slot; releases it on completion or drop.
struct LeaderGuard<'a, T> {
    flights: &'a SingleFlight<T>,
    key: String,
}

impl<T: Clone> LeaderGuard<'_, T> {
    fn complete(self, value: T) {
        if let Some(sender) = self.flights.release(&self.key) {
            // Waiters may all have been cancelled.
            let _ = sender.send(value);
        }
    }
}

impl<T> Drop for LeaderGuard<'_, T> {
    fn drop(&mut self) {
        // A completed leader already released the slot, so this is a no-op.
        // Otherwise dropping the sender closes the waiters' channel.
        self.flights.release(&self.key);
    }
}

impl<T: Clone> SingleFlight<T> {
    pub fn new() -> Self {
        Self {
            in_flight: Mutex::new(HashMap::new()),
        }
    }

    /// Runs `compute` for `key`, or joins the computation already in flight.
    pub async fn run<F, Fut>(&self, key: &str, compute: F) -> T
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        match self.join(key) {
            Role::Leader(guard) => {
                let value = compute().await;
                guard.complete(value.clone());
                value
            }
            Role::Waiter(mut receiver) => match receiver.recv().await {
                Ok(value) => {
                    tracing::trace!(key, "Joined in-flight computation");
                    value
                }
                Err(_) => {
                    tracing::debug!(key, "In-flight leader went away, computing locally");
                    compute().await
                }
            },
        }
    }

    #[cfg(test)]
    fn in_flight(&self) -> usize {
        self.lock().len()
    }

    fn join(&self, key: &str) -> Role<'_, T> {
        let mut in_flight = self.lock();
        if let Some(sender) = in_flight.get(key) {
            return Role::Waiter(sender.subscribe());
        }

        let (sender, _) = broadcast::channel(1);
        in_flight.insert(key.to_string(), sender);
        Role::Leader(LeaderGuard {
            flights: self,
            key: key.to_string(),
        })
    }
}

impl<T> SingleFlight<T> {
    fn release(&self, key: &str) -> Option<broadcast::Sender<T>> {
        self.lock().remove(key)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, broadcast::Sender<T>>> {
        // The map stays consistent even if a holder panicked.
        self.in_flight.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T: Clone> Default for SingleFlight<T> {
    fn default() -> Self {
        Self::new()
    }
}
