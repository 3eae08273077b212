//! Facility discovery: ranking, result caching and the public operations.
//!
//! [`DiscoveryEngine`] composes location acquisition, the facility query
//! engine and the symptom classifier. [`SearchSession`] adds debouncing and
//! stale-result suppression for interactive callers.

pub mod discovery;
pub mod error;
pub mod ranking;
pub mod result_cache;
pub mod session;

pub use discovery::{validate_filters, DiscoveryEngine, MAX_QUERY_RADIUS_METERS};
pub use error::{BuildError, DiscoveryError};
pub use ranking::rank_facilities;
pub use result_cache::{CacheKey, CacheStats, ResultCache};
pub use session::SearchSession;
