//! Short-lived memo of search results keyed by rounded origin and filters.
//!
//! Concurrent identical searches share one computation. Committed entries are
//! replaced whole under the lock. Degraded results are handed to every waiter
//! but never committed, so the next search tries the live backends again.
//! A computation whose waiters have all gone away is dropped from the
//! in-flight map; the next identical search starts a new one.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use carefind_core::{round_coordinate, SearchFilters, SearchResult};
use futures::future::{BoxFuture, FutureExt, Shared};
use sha2::{Digest, Sha256};
use tokio::time::Instant;

/// Decimal places kept from origin coordinates (about 11 m at the equator).
pub const KEY_COORDINATE_PLACES: u32 = 4;

type SharedSearch = Shared<BoxFuture<'static, SearchResult>>;

/// Cache key: rounded origin, query radius and a digest of the filters.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    lat_e4: i64,
    lng_e4: i64,
    radius_m: u64,
    filters_digest: String,
}

impl CacheKey {
    #[must_use]
    pub fn new(latitude: f64, longitude: f64, radius_meters: f64, filters: &SearchFilters) -> Self {
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let radius_m = radius_meters.max(0.0).round() as u64;
        Self {
            lat_e4: round_coordinate(latitude, KEY_COORDINATE_PLACES),
            lng_e4: round_coordinate(longitude, KEY_COORDINATE_PLACES),
            radius_m,
            filters_digest: filters_digest(filters),
        }
    }
}

/// SHA-256 over a canonical rendering of every filter field. Hex-encoded.
fn filters_digest(filters: &SearchFilters) -> String {
    let input = format!(
        "{:.1}\x00{:.2}\x00{}\x00{}\x00{:?}\x00{}",
        filters.max_distance_meters,
        filters.min_rating,
        filters
            .specialization_id
            .as_ref()
            .map_or("", |id| id.as_str()),
        filters.emergency_only,
        filters.sort_by,
        filters.limit,
    );
    format!("{:x}", Sha256::digest(input.as_bytes()))
}

struct Entry {
    result: SearchResult,
    stored_at: Instant,
}

struct InFlight {
    id: u64,
    future: SharedSearch,
    waiters: usize,
}

#[derive(Default)]
struct Slots {
    committed: HashMap<CacheKey, Entry>,
    in_flight: HashMap<CacheKey, InFlight>,
    next_id: u64,
}

/// Counters for monitoring cache effectiveness.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    /// Requests that waited on an identical in-flight computation.
    pub coalesced: u64,
}

pub struct ResultCache {
    ttl: Duration,
    slots: Mutex<Slots>,
    hits: AtomicU64,
    misses: AtomicU64,
    coalesced: AtomicU64,
}

impl ResultCache {
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            slots: Mutex::new(Slots::default()),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            coalesced: AtomicU64::new(0),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Slots> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns the committed result for `key`, joins an identical computation
    /// in flight, or runs `compute`.
    pub async fn get_or_compute<F>(&self, key: CacheKey, compute: F) -> SearchResult
    where
        F: FnOnce() -> BoxFuture<'static, SearchResult>,
    {
        let (id, future) = {
            let mut slots = self.lock();
            let ttl = self.ttl;
            slots.committed.retain(|_, e| e.stored_at.elapsed() < ttl);

            if let Some(entry) = slots.committed.get(&key) {
                self.hits.fetch_add(1, Ordering::Relaxed);
                tracing::debug!("search result cache hit");
                return entry.result.clone();
            }

            if let Some(in_flight) = slots.in_flight.get_mut(&key) {
                in_flight.waiters += 1;
                self.coalesced.fetch_add(1, Ordering::Relaxed);
                tracing::debug!(search = in_flight.id, "joining in-flight search");
                (in_flight.id, in_flight.future.clone())
            } else {
                self.misses.fetch_add(1, Ordering::Relaxed);
                slots.next_id += 1;
                let id = slots.next_id;
                let future = compute().shared();
                slots.in_flight.insert(
                    key.clone(),
                    InFlight {
                        id,
                        future: future.clone(),
                        waiters: 1,
                    },
                );
                (id, future)
            }
        };

        let waiter = Waiter {
            cache: self,
            key,
            id,
        };
        let result = future.await;
        self.complete(&waiter.key, id, &result);
        result
    }

    /// Retires in-flight computation `id` and commits its result. Whichever
    /// waiter finishes first does this; later calls find nothing to retire.
    fn complete(&self, key: &CacheKey, id: u64, result: &SearchResult) {
        let mut slots = self.lock();
        if !slots.in_flight.get(key).is_some_and(|f| f.id == id) {
            return;
        }
        slots.in_flight.remove(key);
        if result.degraded {
            tracing::debug!("not caching degraded search result");
            return;
        }
        slots.committed.insert(
            key.clone(),
            Entry {
                result: result.clone(),
                stored_at: Instant::now(),
            },
        );
    }

    /// Drops the entry for `key`, or every entry when `key` is `None`.
    ///
    /// Computations already running are detached from the cache: their waiters
    /// still get the result but it is not committed.
    pub fn invalidate(&self, key: Option<&CacheKey>) {
        let mut slots = self.lock();
        match key {
            Some(key) => {
                slots.committed.remove(key);
                slots.in_flight.remove(key);
            }
            None => {
                slots.committed.clear();
                slots.in_flight.clear();
            }
        }
        tracing::debug!(all = key.is_none(), "invalidated search result cache");
    }

    #[must_use]
    pub fn len(&self) -> usize {
        let mut slots = self.lock();
        let ttl = self.ttl;
        slots.committed.retain(|_, e| e.stored_at.elapsed() < ttl);
        slots.committed.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drops one waiter of computation `id`, discarding the computation when
    /// it was the last one.
    fn leave(&self, key: &CacheKey, id: u64) {
        let mut slots = self.lock();
        let abandoned = match slots.in_flight.get_mut(key) {
            Some(in_flight) if in_flight.id == id => {
                in_flight.waiters = in_flight.waiters.saturating_sub(1);
                in_flight.waiters == 0
            }
            _ => false,
        };
        if abandoned {
            slots.in_flight.remove(key);
            tracing::debug!(search = id, "discarded abandoned in-flight search");
        }
    }

    /// Number of computations currently running.
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.lock().in_flight.len()
    }

    #[must_use]
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            coalesced: self.coalesced.load(Ordering::Relaxed),
        }
    }
}

/// Leaves the in-flight entry when the awaiting caller completes or is dropped.
struct Waiter<'a> {
    cache: &'a ResultCache,
    key: CacheKey,
    id: u64,
}

impl Drop for Waiter<'_> {
    fn drop(&mut self) {
        self.cache.leave(&self.key, self.id);
    }
}
