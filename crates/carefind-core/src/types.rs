//! Canonical domain types shared by every carefind crate.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::hours::OpeningHours;

/// Where a position fix came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PositionSource {
    Gps,
    Network,
    Cached,
}

impl std::fmt::Display for PositionSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PositionSource::Gps => write!(f, "gps"),
            PositionSource::Network => write!(f, "network"),
            PositionSource::Cached => write!(f, "cached"),
        }
    }
}

/// A single location fix.
///
/// `accuracy_meters` is always strictly positive; construct through
/// [`GeoPosition::new`] to have that checked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoPosition {
    pub latitude: f64,
    pub longitude: f64,
    pub accuracy_meters: f64,
    pub altitude: Option<f64>,
    pub speed: Option<f64>,
    pub heading: Option<f64>,
    pub source: PositionSource,
    pub timestamp: DateTime<Utc>,
}

impl GeoPosition {
    /// Builds a fix stamped with the current time.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidAccuracy`] when `accuracy_meters` is not a
    /// positive finite number, or [`CoreError::InvalidCoordinates`] when the
    /// coordinates fall outside WGS84 bounds.
    pub fn new(
        latitude: f64,
        longitude: f64,
        accuracy_meters: f64,
        source: PositionSource,
    ) -> Result<Self, CoreError> {
        if !accuracy_meters.is_finite() || accuracy_meters <= 0.0 {
            return Err(CoreError::InvalidAccuracy(accuracy_meters));
        }
        if !valid_coordinates(latitude, longitude) {
            return Err(CoreError::InvalidCoordinates {
                latitude,
                longitude,
            });
        }
        Ok(Self {
            latitude,
            longitude,
            accuracy_meters,
            altitude: None,
            speed: None,
            heading: None,
            source,
            timestamp: Utc::now(),
        })
    }

    /// Returns a copy re-labelled as served from cache.
    #[must_use]
    pub fn as_cached(&self) -> Self {
        Self {
            source: PositionSource::Cached,
            ..self.clone()
        }
    }
}

/// Returns `true` for finite coordinates inside WGS84 bounds.
#[must_use]
pub fn valid_coordinates(latitude: f64, longitude: f64) -> bool {
    latitude.is_finite()
        && longitude.is_finite()
        && (-90.0..=90.0).contains(&latitude)
        && (-180.0..=180.0).contains(&longitude)
}

/// Stable identifier of a medical practice area, e.g. `cardiology`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SpecializationId(pub String);

impl SpecializationId {
    #[must_use]
    pub fn new(id: &str) -> Self {
        Self(id.to_owned())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SpecializationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SpecializationId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// A medical practice area with localized names and symptom keywords.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Specialization {
    pub id: SpecializationId,
    pub canonical_name: String,
    #[serde(default)]
    pub localized_names: BTreeMap<String, String>,
    /// Locale → lowercase keyword phrases.
    #[serde(default)]
    pub keyword_sets: BTreeMap<String, BTreeSet<String>>,
}

impl Specialization {
    /// Display name for `locale`, falling back to the canonical name.
    #[must_use]
    pub fn display_name(&self, locale: &str) -> &str {
        self.localized_names
            .get(locale)
            .map_or(self.canonical_name.as_str(), String::as_str)
    }
}

/// A healthcare provider location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Facility {
    /// Stable id, `osm:<type>/<id>` for live records.
    pub id: String,
    pub name: String,
    pub address: String,
    pub latitude: f64,
    pub longitude: f64,
    pub phone: Option<String>,
    pub specializations: BTreeSet<SpecializationId>,
    /// Average rating in `[0, 5]`.
    pub rating: f64,
    pub review_count: u32,
    pub opening_hours: OpeningHours,
    pub emergency_services: bool,
    /// Derived from the query origin; recomputed per origin, never reused.
    pub distance_meters: f64,
}

impl Facility {
    /// Recomputes `distance_meters` against a new origin.
    pub fn anchor_to(&mut self, origin_lat: f64, origin_lng: f64) {
        self.distance_meters = crate::geo::haversine_distance_meters(
            origin_lat,
            origin_lng,
            self.latitude,
            self.longitude,
        );
    }
}

/// Four-tier urgency classification. Ordering is `Low < Medium < High < Emergency`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UrgencyLevel {
    Low,
    Medium,
    High,
    Emergency,
}

impl std::fmt::Display for UrgencyLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UrgencyLevel::Low => write!(f, "low"),
            UrgencyLevel::Medium => write!(f, "medium"),
            UrgencyLevel::High => write!(f, "high"),
            UrgencyLevel::Emergency => write!(f, "emergency"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortBy {
    #[default]
    Distance,
    Rating,
    Name,
}

impl std::str::FromStr for SortBy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "distance" => Ok(SortBy::Distance),
            "rating" => Ok(SortBy::Rating),
            "name" => Ok(SortBy::Name),
            other => Err(format!("unknown sort key '{other}'")),
        }
    }
}

/// Caller-supplied constraints for a facility search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchFilters {
    pub max_distance_meters: f64,
    pub min_rating: f64,
    pub specialization_id: Option<SpecializationId>,
    pub emergency_only: bool,
    pub sort_by: SortBy,
    pub limit: usize,
}

impl Default for SearchFilters {
    fn default() -> Self {
        Self {
            max_distance_meters: 5_000.0,
            min_rating: 0.0,
            specialization_id: None,
            emergency_only: false,
            sort_by: SortBy::Distance,
            limit: 20,
        }
    }
}

/// Outcome of a discovery operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub facilities: Vec<Facility>,
    pub urgency_level: Option<UrgencyLevel>,
    pub specializations: Vec<Specialization>,
    pub recommendations: Vec<String>,
    /// `true` when the built-in fallback dataset replaced a failed live query.
    pub degraded: bool,
}

/// Output of the symptom classifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    pub urgency_level: UrgencyLevel,
    /// Ranked by keyword hits, most relevant first.
    pub specializations: Vec<SpecializationId>,
    pub recommendations: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn urgency_levels_are_totally_ordered() {
        assert!(UrgencyLevel::Emergency > UrgencyLevel::High);
        assert!(UrgencyLevel::High > UrgencyLevel::Medium);
        assert!(UrgencyLevel::Medium > UrgencyLevel::Low);
    }

    #[test]
    fn geo_position_rejects_non_positive_accuracy() {
        assert_eq!(
            GeoPosition::new(12.0, 77.0, 0.0, PositionSource::Gps),
            Err(CoreError::InvalidAccuracy(0.0))
        );
        assert!(GeoPosition::new(12.0, 77.0, -5.0, PositionSource::Gps).is_err());
        assert!(GeoPosition::new(12.0, 77.0, f64::NAN, PositionSource::Gps).is_err());
    }

    #[test]
    fn geo_position_rejects_out_of_range_coordinates() {
        let err = GeoPosition::new(91.0, 0.0, 10.0, PositionSource::Gps).unwrap_err();
        assert!(matches!(err, CoreError::InvalidCoordinates { .. }));
    }

    #[test]
    fn as_cached_only_changes_source() {
        let fix = GeoPosition::new(12.97, 77.59, 20.0, PositionSource::Gps).unwrap();
        let cached = fix.as_cached();
        assert_eq!(cached.source, PositionSource::Cached);
        assert_eq!(cached.timestamp, fix.timestamp);
        assert!((cached.latitude - fix.latitude).abs() < f64::EPSILON);
    }

    #[test]
    fn sort_by_parses_case_insensitively() {
        assert_eq!("Rating".parse::<SortBy>().unwrap(), SortBy::Rating);
        assert!("stars".parse::<SortBy>().is_err());
    }

    #[test]
    fn urgency_serializes_lowercase() {
        let json = serde_json::to_string(&UrgencyLevel::Emergency).unwrap();
        assert_eq!(json, "\"emergency\"");
    }

    #[test]
    fn display_name_falls_back_to_canonical() {
        let mut names = BTreeMap::new();
        names.insert("es".to_string(), "Cardiología".to_string());
        let spec = Specialization {
            id: SpecializationId::new("cardiology"),
            canonical_name: "Cardiology".to_string(),
            localized_names: names,
            keyword_sets: BTreeMap::new(),
        };
        assert_eq!(spec.display_name("es"), "Cardiología");
        assert_eq!(spec.display_name("fr"), "Cardiology");
    }
}
