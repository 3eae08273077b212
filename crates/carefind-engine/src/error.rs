use std::time::Duration;

use carefind_core::{Locale, UserMessage};
use carefind_location::LocationError;
use carefind_overpass::QueryError;
use carefind_triage::CatalogError;
use thiserror::Error;

/// Failures that reach callers of the discovery operations.
///
/// Transient backend failures never appear here: they are retried, failed
/// over, or degraded to fallback data inside the query engine.
#[derive(Debug, Clone, Error)]
pub enum DiscoveryError {
    #[error(transparent)]
    Location(#[from] LocationError),

    /// The overall ceiling elapsed before any usable result existed.
    #[error("discovery timed out after {}ms with no usable result", .0.as_millis())]
    TimedOut(Duration),

    #[error("invalid search filters: {0}")]
    InvalidFilters(String),
}

impl DiscoveryError {
    /// Human-readable explanation in `locale`.
    #[must_use]
    pub fn user_message(&self, locale: Locale) -> &'static str {
        match self {
            DiscoveryError::Location(err) => err.user_message(locale),
            DiscoveryError::TimedOut(_) => UserMessage::SearchTimedOut.text(locale),
            DiscoveryError::InvalidFilters(_) => UserMessage::InvalidSearch.text(locale),
        }
    }
}

/// Errors raised while assembling a [`crate::DiscoveryEngine`] from configuration.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("facility query engine: {0}")]
    Query(#[from] QueryError),

    #[error("specialization catalog: {0}")]
    Catalog(#[from] CatalogError),
}
