//! Location acquisition with accuracy escalation.
//!
//! The first attempt asks the provider for a low-power fix. When that fix is
//! coarser than the target, later attempts switch to high-accuracy mode. The
//! best (lowest `accuracy_meters`) fix seen across attempts wins, and the
//! whole acquisition stops at `max_wait`, returning that best fix if there is
//! one. Permission and capability failures end the acquisition immediately.

use std::sync::Arc;
use std::time::Duration;

use carefind_core::{duration_millis, EngineConfig, GeoPosition};
use futures::FutureExt;
use tokio::time::Instant;

use crate::cache::PositionCache;
use crate::error::{LocationError, SensorError};
use crate::provider::LocationProvider;

/// How good a fix must be and how long to try for it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AccuracyTarget {
    pub accuracy_meters: f64,
    /// Total sensor calls allowed, including the initial low-power one.
    pub max_attempts: u32,
    pub max_wait: Duration,
}

impl AccuracyTarget {
    #[must_use]
    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            accuracy_meters: config.location_accuracy_meters,
            max_attempts: config.location_max_attempts,
            max_wait: config.location_max_wait(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AcquireOptions {
    pub target: AccuracyTarget,
    /// Skip the TTL cache and always consult the sensor.
    pub force_refresh: bool,
}

/// Obtains positions from a [`LocationProvider`], reusing and updating a
/// shared [`PositionCache`].
pub struct LocationAcquirer {
    provider: Arc<dyn LocationProvider>,
    cache: Arc<PositionCache>,
    ttl: Duration,
}

impl LocationAcquirer {
    #[must_use]
    pub fn new(provider: Arc<dyn LocationProvider>, cache: Arc<PositionCache>, ttl: Duration) -> Self {
        Self {
            provider,
            cache,
            ttl,
        }
    }

    #[must_use]
    pub fn cache(&self) -> &Arc<PositionCache> {
        &self.cache
    }

    /// Returns a position, from cache when a young enough fix exists.
    ///
    /// Concurrent callers share one underlying acquisition: while an
    /// acquisition is in flight, no second sensor call is made and every
    /// caller resolves to the same outcome. A caller that joins a running
    /// acquisition gets the fix obtained under the starting caller's
    /// [`AccuracyTarget`]; its own `options.target` is not applied.
    ///
    /// Dropping the returned future leaves the acquisition; once every caller
    /// has left, the unfinished acquisition is discarded.
    ///
    /// # Errors
    ///
    /// - [`LocationError::PermissionDenied`] / [`LocationError::Unavailable`]
    ///   as soon as the provider reports them.
    /// - [`LocationError::Timeout`] when no fix arrived within the attempt
    ///   budget and `max_wait`.
    pub async fn acquire(&self, options: AcquireOptions) -> Result<GeoPosition, LocationError> {
        if !options.force_refresh {
            if let Some(cached) = self.cache.fresh(self.ttl) {
                tracing::debug!(
                    accuracy_m = cached.accuracy_meters,
                    "serving position from cache"
                );
                return Ok(cached);
            }
        }

        let provider = Arc::clone(&self.provider);
        let cache = Arc::clone(&self.cache);
        let target = options.target;
        let (id, shared, leader) = self
            .cache
            .join_or_start(move || run_acquisition(provider, cache, target).boxed());
        if !leader {
            tracing::debug!(acquisition = id, "joining in-flight location acquisition");
        }

        let _waiter = Waiter {
            cache: &self.cache,
            id,
        };
        let outcome = shared.await;
        self.cache.finish(id);
        outcome
    }
}

/// Leaves the in-flight slot when the awaiting caller completes or is dropped.
struct Waiter<'a> {
    cache: &'a PositionCache,
    id: u64,
}

impl Drop for Waiter<'_> {
    fn drop(&mut self) {
        self.cache.leave(self.id);
    }
}

async fn run_acquisition(
    provider: Arc<dyn LocationProvider>,
    cache: Arc<PositionCache>,
    target: AccuracyTarget,
) -> Result<GeoPosition, LocationError> {
    let deadline = Instant::now() + target.max_wait;
    let mut best: Option<GeoPosition> = None;

    for attempt in 0..target.max_attempts {
        let now = Instant::now();
        if now >= deadline {
            break;
        }
        // Split what is left of the wait budget evenly over the remaining attempts.
        let attempt_timeout = (deadline - now) / (target.max_attempts - attempt);
        let high_accuracy = attempt > 0;

        let outcome =
            tokio::time::timeout(attempt_timeout, provider.get_fix(high_accuracy, attempt_timeout))
                .await;

        match outcome {
            Ok(Ok(fix)) => {
                tracing::debug!(
                    attempt,
                    high_accuracy,
                    accuracy_m = fix.accuracy_meters,
                    source = %fix.source,
                    "received location fix"
                );
                if best
                    .as_ref()
                    .is_none_or(|b| fix.accuracy_meters < b.accuracy_meters)
                {
                    best = Some(fix);
                }
                if best
                    .as_ref()
                    .is_some_and(|b| b.accuracy_meters <= target.accuracy_meters)
                {
                    break;
                }
            }
            Ok(Err(SensorError::PermissionDenied)) => {
                tracing::warn!(attempt, "location permission denied");
                return Err(LocationError::PermissionDenied);
            }
            Ok(Err(SensorError::Unavailable(reason))) => {
                tracing::warn!(attempt, reason, "location sensor unavailable");
                return Err(LocationError::Unavailable(reason));
            }
            Ok(Err(SensorError::Timeout)) | Err(_) => {
                tracing::warn!(
                    attempt,
                    max_attempts = target.max_attempts,
                    timeout_ms = duration_millis(attempt_timeout),
                    "location fix attempt timed out"
                );
            }
        }
    }

    match best {
        Some(fix) => {
            cache.store(fix.clone());
            Ok(fix)
        }
        None => Err(LocationError::Timeout),
    }
}
