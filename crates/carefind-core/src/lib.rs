//! Shared domain model, geo helpers and configuration for carefind.

pub mod app_config;
pub mod config;
pub mod error;
pub mod geo;
pub mod hours;
pub mod messages;
pub mod types;

pub use app_config::{duration_millis, EngineConfig};
pub use config::{build_engine_config, load_engine_config, load_engine_config_from_env};
pub use error::{ConfigError, CoreError};
pub use geo::{haversine_distance_meters, offset_position, round_coordinate, EARTH_RADIUS_M};
pub use hours::{DaySchedule, OpeningHours, TimeRange, MINUTES_PER_DAY};
pub use messages::{normalize_locale, Locale, UserMessage};
pub use types::{
    valid_coordinates, Classification, Facility, GeoPosition, PositionSource, SearchFilters,
    SearchResult, SortBy, Specialization, SpecializationId, UrgencyLevel,
};
