//! Debounced, cancel-on-supersede searches for one interactive caller.
//!
//! Each call to [`SearchSession::search`] takes a new generation number.
//! A search that is overtaken by a newer one, or by
//! [`SearchSession::cancel`], stops at once, whether it is still in the
//! debounce delay or already querying, and resolves to `Ok(None)`.

use std::sync::Arc;
use std::time::Duration;

use carefind_core::{SearchFilters, SearchResult};
use tokio::sync::watch;

use crate::discovery::DiscoveryEngine;
use crate::error::DiscoveryError;

pub struct SearchSession {
    engine: Arc<DiscoveryEngine>,
    debounce: Duration,
    generation: watch::Sender<u64>,
}

impl SearchSession {
    /// Uses the engine's configured debounce delay.
    #[must_use]
    pub fn new(engine: Arc<DiscoveryEngine>) -> Self {
        let debounce = engine.config().search_debounce();
        Self::with_debounce(engine, debounce)
    }

    #[must_use]
    pub fn with_debounce(engine: Arc<DiscoveryEngine>, debounce: Duration) -> Self {
        let (generation, _) = watch::channel(0);
        Self {
            engine,
            debounce,
            generation,
        }
    }

    fn advance(&self) -> u64 {
        let mut current = 0;
        self.generation.send_modify(|generation| {
            *generation += 1;
            current = *generation;
        });
        current
    }

    /// Searches with `filters` after the debounce delay.
    ///
    /// Returns `Ok(None)` as soon as a newer search or
    /// [`SearchSession::cancel`] supersedes this one; the running query is
    /// dropped.
    ///
    /// # Errors
    ///
    /// Propagates [`DiscoveryError`] from the engine for the current search
    /// only.
    pub async fn search(
        &self,
        filters: SearchFilters,
    ) -> Result<Option<SearchResult>, DiscoveryError> {
        let generation = self.advance();
        let mut updates = self.generation.subscribe();

        tokio::select! {
            biased;
            _ = updates.wait_for(|current| *current != generation) => {
                tracing::debug!(generation, "search superseded; dropping it");
                Ok(None)
            }
            outcome = async {
                tokio::time::sleep(self.debounce).await;
                self.engine.find_nearby_facilities(filters).await
            } => outcome.map(Some),
        }
    }

    /// Supersedes any pending search without starting a new one.
    pub fn cancel(&self) {
        self.advance();
    }

    #[must_use]
    pub fn generation(&self) -> u64 {
        *self.generation.borrow()
    }
}
