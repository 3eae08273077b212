//! Continuous position updates shared across subscribers.
//!
//! The first subscriber starts the provider's watch stream; later subscribers
//! attach to the same broadcast. Dropping a [`PositionSubscription`]
//! decrements the subscriber count, and the provider stream is released only
//! when the last one goes away. Every watched fix is committed to the
//! [`PositionCache`].

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use carefind_core::GeoPosition;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;

use crate::cache::PositionCache;
use crate::error::LocationError;
use crate::provider::LocationProvider;

const BROADCAST_CAPACITY: usize = 16;

#[derive(Default)]
struct HubState {
    /// Bumped every time the underlying stream stops, so subscriptions from
    /// an earlier stream never decrement the count of a newer one.
    generation: u64,
    subscribers: usize,
    sender: Option<broadcast::Sender<GeoPosition>>,
    pump: Option<JoinHandle<()>>,
}

fn lock_state(state: &Mutex<HubState>) -> MutexGuard<'_, HubState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Reference-counted owner of a single provider watch stream.
pub struct WatchHub {
    provider: Arc<dyn LocationProvider>,
    cache: Arc<PositionCache>,
    state: Arc<Mutex<HubState>>,
    start_gate: tokio::sync::Mutex<()>,
}

impl WatchHub {
    #[must_use]
    pub fn new(provider: Arc<dyn LocationProvider>, cache: Arc<PositionCache>) -> Self {
        Self {
            provider,
            cache,
            state: Arc::new(Mutex::new(HubState::default())),
            start_gate: tokio::sync::Mutex::new(()),
        }
    }

    /// Attaches a subscriber, starting the provider stream if none is running.
    ///
    /// # Errors
    ///
    /// Returns the provider's failure mapped to [`LocationError`] when the
    /// stream has to be started and the provider refuses.
    pub async fn subscribe(&self) -> Result<PositionSubscription, LocationError> {
        // Serialises stream start-up so two first subscribers cannot both
        // open a provider stream.
        let _gate = self.start_gate.lock().await;

        if let Some(subscription) = self.attach_existing() {
            return Ok(subscription);
        }

        let stream = self.provider.watch().await?;
        let (sender, receiver) = broadcast::channel(BROADCAST_CAPACITY);

        let mut state = lock_state(&self.state);
        let generation = state.generation;
        let pump = tokio::spawn(pump_positions(
            stream,
            sender.clone(),
            Arc::clone(&self.cache),
            Arc::clone(&self.state),
            generation,
        ));
        state.sender = Some(sender);
        state.pump = Some(pump);
        state.subscribers = 1;
        tracing::debug!(generation, "started shared location watch");

        Ok(PositionSubscription {
            receiver,
            state: Arc::clone(&self.state),
            generation,
        })
    }

    fn attach_existing(&self) -> Option<PositionSubscription> {
        let mut state = lock_state(&self.state);
        let receiver = state.sender.as_ref()?.subscribe();
        state.subscribers += 1;
        tracing::debug!(
            subscribers = state.subscribers,
            "attached to running location watch"
        );
        Some(PositionSubscription {
            receiver,
            state: Arc::clone(&self.state),
            generation: state.generation,
        })
    }

    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        lock_state(&self.state).subscribers
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        lock_state(&self.state).sender.is_some()
    }
}

async fn pump_positions(
    mut stream: mpsc::Receiver<GeoPosition>,
    sender: broadcast::Sender<GeoPosition>,
    cache: Arc<PositionCache>,
    state: Arc<Mutex<HubState>>,
    generation: u64,
) {
    while let Some(fix) = stream.recv().await {
        cache.store(fix.clone());
        // No receivers is fine: the last one may be mid-drop.
        let _ = sender.send(fix);
    }

    tracing::debug!(generation, "provider watch stream ended");
    let mut state = lock_state(&state);
    if state.generation == generation {
        state.generation += 1;
        state.subscribers = 0;
        state.sender = None;
        state.pump = None;
    }
}

/// A live subscription to watched positions. Drop to unsubscribe.
pub struct PositionSubscription {
    receiver: broadcast::Receiver<GeoPosition>,
    state: Arc<Mutex<HubState>>,
    generation: u64,
}

impl PositionSubscription {
    /// Waits for the next fix. Returns `None` once the provider stream ends.
    pub async fn next(&mut self) -> Option<GeoPosition> {
        loop {
            match self.receiver.recv().await {
                Ok(fix) => return Some(fix),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::debug!(skipped, "location subscriber lagged; skipping stale fixes");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}

impl Drop for PositionSubscription {
    fn drop(&mut self) {
        let mut state = lock_state(&self.state);
        if state.generation != self.generation {
            return;
        }
        state.subscribers = state.subscribers.saturating_sub(1);
        if state.subscribers == 0 {
            if let Some(pump) = state.pump.take() {
                pump.abort();
            }
            state.sender = None;
            state.generation += 1;
            tracing::debug!("last location subscriber left; released provider watch");
        }
    }
}
