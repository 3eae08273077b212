//! Most recent known position plus the in-flight acquisition slot.
//!
//! Committed fixes are replaced whole under the lock, so readers never see a
//! partially updated position. The in-flight slot holds at most one shared
//! acquisition future; concurrent callers join it instead of starting their own.

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use carefind_core::GeoPosition;
use futures::future::{BoxFuture, Shared};
use tokio::time::Instant;

use crate::error::LocationError;

pub(crate) type SharedFix = Shared<BoxFuture<'static, Result<GeoPosition, LocationError>>>;

struct CachedFix {
    position: GeoPosition,
    stored_at: Instant,
}

struct InFlight {
    id: u64,
    future: SharedFix,
    waiters: usize,
}

#[derive(Default)]
struct Slots {
    latest: Option<CachedFix>,
    in_flight: Option<InFlight>,
    next_id: u64,
}

/// Injectable position state shared by [`crate::LocationAcquirer`] and
/// [`crate::WatchHub`].
#[derive(Default)]
pub struct PositionCache {
    slots: Mutex<Slots>,
}

impl PositionCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Slots> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Latest fix if it was stored less than `ttl` ago, relabelled as cached.
    #[must_use]
    pub fn fresh(&self, ttl: Duration) -> Option<GeoPosition> {
        let slots = self.lock();
        slots
            .latest
            .as_ref()
            .filter(|c| c.stored_at.elapsed() < ttl)
            .map(|c| c.position.as_cached())
    }

    /// Latest fix regardless of age.
    #[must_use]
    pub fn latest(&self) -> Option<GeoPosition> {
        self.lock().latest.as_ref().map(|c| c.position.clone())
    }

    /// Commits `position` unless it is older than the fix already held.
    ///
    /// Returns `true` when the fix was stored.
    pub fn store(&self, position: GeoPosition) -> bool {
        let mut slots = self.lock();
        if let Some(current) = &slots.latest {
            if position.timestamp < current.position.timestamp {
                tracing::debug!(
                    incoming = %position.timestamp,
                    current = %current.position.timestamp,
                    "ignoring out-of-order position fix"
                );
                return false;
            }
        }
        slots.latest = Some(CachedFix {
            position,
            stored_at: Instant::now(),
        });
        true
    }

    /// Drops the committed fix. An in-flight acquisition is left running.
    pub fn clear(&self) {
        self.lock().latest = None;
    }

    /// Joins the running acquisition, or installs the one built by `start`.
    ///
    /// Returns the slot id to pass to [`PositionCache::finish`] and whether
    /// this caller started the acquisition.
    pub(crate) fn join_or_start<F>(&self, start: F) -> (u64, SharedFix, bool)
    where
        F: FnOnce() -> BoxFuture<'static, Result<GeoPosition, LocationError>>,
    {
        let mut slots = self.lock();
        if let Some(in_flight) = &mut slots.in_flight {
            in_flight.waiters += 1;
            return (in_flight.id, in_flight.future.clone(), false);
        }
        slots.next_id += 1;
        let id = slots.next_id;
        let future = futures::FutureExt::shared(start());
        slots.in_flight = Some(InFlight {
            id,
            future: future.clone(),
            waiters: 1,
        });
        (id, future, true)
    }

    /// Clears the in-flight slot if it still belongs to acquisition `id`.
    pub(crate) fn finish(&self, id: u64) {
        let mut slots = self.lock();
        if slots.in_flight.as_ref().is_some_and(|f| f.id == id) {
            slots.in_flight = None;
        }
    }

    /// Drops one waiter of acquisition `id`. When no waiter is left the
    /// unfinished acquisition is discarded so the next caller starts afresh.
    pub(crate) fn leave(&self, id: u64) {
        let mut slots = self.lock();
        let abandoned = match &mut slots.in_flight {
            Some(in_flight) if in_flight.id == id => {
                in_flight.waiters = in_flight.waiters.saturating_sub(1);
                in_flight.waiters == 0
            }
            _ => false,
        };
        if abandoned {
            slots.in_flight = None;
            tracing::debug!(acquisition = id, "discarded abandoned location acquisition");
        }
    }

    #[must_use]
    pub fn has_in_flight(&self) -> bool {
        self.lock().in_flight.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use carefind_core::PositionSource;

    fn fix(lat: f64) -> GeoPosition {
        GeoPosition::new(lat, 77.59, 15.0, PositionSource::Gps).unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn fresh_respects_ttl() {
        let cache = PositionCache::new();
        cache.store(fix(12.97));
        assert!(cache.fresh(Duration::from_secs(300)).is_some());

        tokio::time::advance(Duration::from_secs(301)).await;
        assert!(cache.fresh(Duration::from_secs(300)).is_none());
        assert!(cache.latest().is_some(), "stale fix is still the latest known");
    }

    #[tokio::test]
    async fn fresh_fix_is_labelled_cached() {
        let cache = PositionCache::new();
        cache.store(fix(12.97));
        let cached = cache.fresh(Duration::from_secs(60)).unwrap();
        assert_eq!(cached.source, PositionSource::Cached);
        assert_eq!(cache.latest().unwrap().source, PositionSource::Gps);
    }

    #[test]
    fn older_fix_does_not_replace_newer() {
        let cache = PositionCache::new();
        let older = fix(1.0);
        let mut newer = fix(2.0);
        newer.timestamp = older.timestamp + chrono::TimeDelta::seconds(5);

        assert!(cache.store(newer));
        assert!(!cache.store(older));
        assert!((cache.latest().unwrap().latitude - 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn clear_drops_committed_fix() {
        let cache = PositionCache::new();
        cache.store(fix(1.0));
        cache.clear();
        assert!(cache.latest().is_none());
    }

    #[tokio::test]
    async fn second_caller_joins_in_flight_slot() {
        use futures::FutureExt;

        let cache = PositionCache::new();
        let (id_a, fut_a, leader_a) =
            cache.join_or_start(|| async { Ok::<_, LocationError>(fix(3.0)) }.boxed());
        let (id_b, fut_b, leader_b) = cache.join_or_start(|| panic!("must not start twice"));

        assert!(leader_a);
        assert!(!leader_b);
        assert_eq!(id_a, id_b);
        assert_eq!(fut_a.await, fut_b.await);

        cache.finish(id_a);
        assert!(!cache.has_in_flight());
    }

    #[test]
    fn last_waiter_leaving_discards_unfinished_acquisition() {
        use futures::FutureExt;

        let cache = PositionCache::new();
        let (id, _, _) = cache.join_or_start(|| futures::future::pending::<Result<GeoPosition, LocationError>>().boxed());
        let (joined, _, _) = cache.join_or_start(|| panic!("must not start twice"));
        assert_eq!(id, joined);

        cache.leave(id);
        assert!(cache.has_in_flight());
        cache.leave(id);
        assert!(!cache.has_in_flight());
    }

    #[test]
    fn finish_ignores_stale_ids() {
        use futures::FutureExt;

        let cache = PositionCache::new();
        let (id, _fut, _) =
            cache.join_or_start(|| async { Ok::<_, LocationError>(fix(3.0)) }.boxed());
        cache.finish(id + 1);
        assert!(cache.has_in_flight());
    }
}
