//! Facility search against OpenStreetMap Overpass API mirrors.
//!
//! [`FacilityQueryEngine`] walks the configured endpoints in order, retrying
//! transient failures with back-off, and normalizes raw elements into
//! [`carefind_core::Facility`] values. When every endpoint fails it returns
//! the built-in fallback dataset flagged `degraded`.

pub mod client;
pub mod dedup;
pub mod engine;
pub mod error;
pub mod fallback;
pub mod hours;
pub mod normalize;
pub mod query;
pub mod retry;
pub mod types;

pub use client::{Endpoint, OverpassClient};
pub use dedup::{dedup_facilities, DUPLICATE_RADIUS_METERS};
pub use engine::{FacilityQueryEngine, FacilityQueryResult, FacilitySource, LiveFetch};
pub use error::{is_transient, QueryError};
pub use fallback::fallback_facilities;
pub use hours::parse_opening_hours;
pub use normalize::{map_speciality, normalize_element, normalize_elements, SkipReason, SkippedRecord};
pub use query::FacilityQuery;
pub use retry::{EndpointCursor, EndpointRetryState, RetryDecision, RetryPolicy};
