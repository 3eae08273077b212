//! Strict mapping from raw OSM elements to [`Facility`].
//!
//! Elements without a usable name or position are skipped with a
//! [`SkipReason`]; nothing is coerced into a partial facility.

use std::collections::BTreeSet;

use carefind_core::{
    haversine_distance_meters, valid_coordinates, Facility, OpeningHours, SpecializationId,
};
use serde::Serialize;

use crate::hours::parse_opening_hours;
use crate::types::RawElement;

const NAME_KEYS: &[&str] = &["name", "name:en", "official_name", "brand"];
const PHONE_KEYS: &[&str] = &["phone", "contact:phone", "contact:mobile"];
const RATING_KEYS: &[&str] = &["rating", "stars"];
const REVIEW_KEYS: &[&str] = &["review_count", "reviews"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    MissingName,
    MissingCoordinates,
    InvalidCoordinates,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::MissingName => write!(f, "missing_name"),
            SkipReason::MissingCoordinates => write!(f, "missing_coordinates"),
            SkipReason::InvalidCoordinates => write!(f, "invalid_coordinates"),
        }
    }
}

/// An element dropped during normalization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedRecord {
    pub element_id: String,
    pub reason: SkipReason,
}

/// Normalizes every element, splitting accepted facilities from skipped ones.
#[must_use]
pub fn normalize_elements(
    elements: &[RawElement],
    origin_lat: f64,
    origin_lng: f64,
) -> (Vec<Facility>, Vec<SkippedRecord>) {
    let mut facilities = Vec::with_capacity(elements.len());
    let mut skipped = Vec::new();
    for element in elements {
        match normalize_element(element, origin_lat, origin_lng) {
            Ok(facility) => facilities.push(facility),
            Err(record) => {
                tracing::debug!(
                    element = %record.element_id,
                    reason = %record.reason,
                    "skipping unmappable Overpass element"
                );
                skipped.push(record);
            }
        }
    }
    (facilities, skipped)
}

/// Maps one element to a facility anchored at the query origin.
///
/// # Errors
///
/// Returns a [`SkippedRecord`] when the element has no name, no position, or
/// coordinates outside the valid range.
pub fn normalize_element(
    element: &RawElement,
    origin_lat: f64,
    origin_lng: f64,
) -> Result<Facility, SkippedRecord> {
    let skip = |reason| SkippedRecord {
        element_id: element.facility_id(),
        reason,
    };

    let name = element
        .tag(NAME_KEYS)
        .ok_or_else(|| skip(SkipReason::MissingName))?
        .to_owned();
    let (latitude, longitude) = element
        .coordinates()
        .ok_or_else(|| skip(SkipReason::MissingCoordinates))?;
    if !valid_coordinates(latitude, longitude) {
        return Err(skip(SkipReason::InvalidCoordinates));
    }

    let opening_hours = element
        .tag(&["opening_hours"])
        .map_or_else(OpeningHours::unknown, parse_opening_hours);

    Ok(Facility {
        id: element.facility_id(),
        name,
        address: format_address(element),
        latitude,
        longitude,
        phone: element.tag(PHONE_KEYS).map(str::to_owned),
        specializations: infer_specializations(element),
        rating: parse_rating(element),
        review_count: element
            .tag(REVIEW_KEYS)
            .and_then(|v| v.parse().ok())
            .unwrap_or(0),
        opening_hours,
        emergency_services: has_emergency_services(element),
        distance_meters: haversine_distance_meters(origin_lat, origin_lng, latitude, longitude),
    })
}

fn format_address(element: &RawElement) -> String {
    if let Some(full) = element.tag(&["addr:full"]) {
        return full.to_owned();
    }

    let street = match (
        element.tag(&["addr:housenumber"]),
        element.tag(&["addr:street"]),
    ) {
        (Some(number), Some(street)) => Some(format!("{number} {street}")),
        (None, Some(street)) => Some(street.to_owned()),
        _ => None,
    };
    let parts: Vec<String> = street
        .into_iter()
        .chain(
            [
                element.tag(&["addr:suburb", "addr:district"]),
                element.tag(&["addr:city"]),
                element.tag(&["addr:postcode"]),
            ]
            .into_iter()
            .flatten()
            .map(str::to_owned),
        )
        .collect();
    parts.join(", ")
}

fn parse_rating(element: &RawElement) -> f64 {
    element
        .tag(RATING_KEYS)
        .and_then(|v| v.parse::<f64>().ok())
        .filter(|r| r.is_finite())
        .map_or(0.0, |r| r.clamp(0.0, 5.0))
}

fn has_emergency_services(element: &RawElement) -> bool {
    let flagged = element
        .tag(&["emergency"])
        .is_some_and(|v| matches!(v.to_ascii_lowercase().as_str(), "yes" | "designated"));
    flagged || speciality_values(element).any(|v| v == "emergency")
}

fn speciality_values(element: &RawElement) -> impl Iterator<Item = String> + '_ {
    element
        .tag(&["healthcare:speciality"])
        .into_iter()
        .flat_map(|v| v.split([';', ',']))
        .map(|v| v.trim().to_ascii_lowercase())
        .filter(|v| !v.is_empty())
}

/// Maps an OSM `healthcare:speciality` value to a specialization id.
#[must_use]
pub fn map_speciality(value: &str) -> Option<&'static str> {
    let id = match value {
        "general" | "family_medicine" | "internal" | "general_practice" => "general_medicine",
        "emergency" => "emergency_medicine",
        "cardiology" | "cardiac_surgery" => "cardiology",
        "pulmonology" | "pneumology" => "pulmonology",
        "neurology" | "neurosurgery" => "neurology",
        "orthopaedics" | "orthopedics" | "trauma" => "orthopedics",
        "paediatrics" | "pediatrics" => "pediatrics",
        "dermatology" | "dermatovenereology" => "dermatology",
        "gastroenterology" => "gastroenterology",
        "otolaryngology" | "ent" => "ent",
        "ophthalmology" => "ophthalmology",
        "dentistry" | "dental_oral_maxillo_facial_surgery" | "orthodontics" => "dentistry",
        "gynaecology" | "gynecology" | "obstetrics" => "gynecology",
        "psychiatry" | "child_psychiatry" => "psychiatry",
        "urology" => "urology",
        _ => return None,
    };
    Some(id)
}

fn infer_specializations(element: &RawElement) -> BTreeSet<SpecializationId> {
    let mut ids: BTreeSet<SpecializationId> = speciality_values(element)
        .filter_map(|v| map_speciality(&v))
        .map(SpecializationId::new)
        .collect();

    let kind = element.tag(&["amenity", "healthcare"]).unwrap_or_default();
    match kind {
        "dentist" => {
            ids.insert(SpecializationId::new("dentistry"));
        }
        "hospital" | "clinic" | "doctors" | "doctor" if ids.is_empty() => {
            ids.insert(SpecializationId::new("general_medicine"));
        }
        _ => {}
    }
    if has_emergency_services(element) {
        ids.insert(SpecializationId::new("emergency_medicine"));
    }
    ids
}

#[cfg(test)]
mod tests {
    use chrono::Weekday;

    use super::*;

    fn element(json: serde_json::Value) -> RawElement {
        serde_json::from_value(json).unwrap()
    }

    const ORIGIN: (f64, f64) = (12.9716, 77.5946);

    #[test]
    fn maps_complete_hospital_node() {
        let el = element(serde_json::json!({
            "type": "node",
            "id": 101,
            "lat": 12.98,
            "lon": 77.60,
            "tags": {
                "amenity": "hospital",
                "name": "St. Martha's Hospital",
                "addr:housenumber": "5",
                "addr:street": "Nrupathunga Road",
                "addr:city": "Bengaluru",
                "phone": "+91 80 4012 2222",
                "emergency": "yes",
                "healthcare:speciality": "cardiology;general",
                "opening_hours": "24/7",
                "rating": "4.4",
                "reviews": "812"
            }
        }));
        let f = normalize_element(&el, ORIGIN.0, ORIGIN.1).unwrap();
        assert_eq!(f.id, "osm:node/101");
        assert_eq!(f.address, "5 Nrupathunga Road, Bengaluru");
        assert_eq!(f.phone.as_deref(), Some("+91 80 4012 2222"));
        assert!(f.emergency_services);
        assert!(f.specializations.contains(&SpecializationId::new("cardiology")));
        assert!(f.specializations.contains(&SpecializationId::new("general_medicine")));
        assert!(f.specializations.contains(&SpecializationId::new("emergency_medicine")));
        assert!((f.rating - 4.4).abs() < 1e-9);
        assert_eq!(f.review_count, 812);
        assert!(f.opening_hours.is_open_at(Weekday::Sun, 180));
        assert!(f.distance_meters > 900.0 && f.distance_meters < 1_200.0);
    }

    #[test]
    fn missing_name_is_skipped() {
        let el = element(serde_json::json!({
            "type": "node", "id": 7, "lat": 12.9, "lon": 77.6,
            "tags": {"amenity": "clinic"}
        }));
        let err = normalize_element(&el, ORIGIN.0, ORIGIN.1).unwrap_err();
        assert_eq!(err.reason, SkipReason::MissingName);
        assert_eq!(err.element_id, "osm:node/7");
    }

    #[test]
    fn missing_and_invalid_coordinates_are_skipped() {
        let no_coords = element(serde_json::json!({
            "type": "relation", "id": 8, "tags": {"name": "Clinic"}
        }));
        assert_eq!(
            normalize_element(&no_coords, ORIGIN.0, ORIGIN.1).unwrap_err().reason,
            SkipReason::MissingCoordinates
        );

        let bad = element(serde_json::json!({
            "type": "node", "id": 9, "lat": 95.0, "lon": 77.6, "tags": {"name": "Clinic"}
        }));
        assert_eq!(
            normalize_element(&bad, ORIGIN.0, ORIGIN.1).unwrap_err().reason,
            SkipReason::InvalidCoordinates
        );
    }

    #[test]
    fn rating_is_clamped_and_defaults_to_zero() {
        let high = element(serde_json::json!({
            "type": "node", "id": 1, "lat": 12.9, "lon": 77.6,
            "tags": {"name": "A", "stars": "7"}
        }));
        assert!((normalize_element(&high, 0.0, 0.0).unwrap().rating - 5.0).abs() < f64::EPSILON);

        let none = element(serde_json::json!({
            "type": "node", "id": 2, "lat": 12.9, "lon": 77.6,
            "tags": {"name": "B", "rating": "n/a"}
        }));
        let f = normalize_element(&none, 0.0, 0.0).unwrap();
        assert!(f.rating.abs() < f64::EPSILON);
        assert_eq!(f.review_count, 0);
    }

    #[test]
    fn dentist_and_plain_clinic_get_default_specializations() {
        let dentist = element(serde_json::json!({
            "type": "node", "id": 3, "lat": 12.9, "lon": 77.6,
            "tags": {"name": "Smile Studio", "amenity": "dentist"}
        }));
        let f = normalize_element(&dentist, 0.0, 0.0).unwrap();
        assert_eq!(
            f.specializations.into_iter().collect::<Vec<_>>(),
            vec![SpecializationId::new("dentistry")]
        );

        let clinic = element(serde_json::json!({
            "type": "way", "id": 4, "center": {"lat": 12.9, "lon": 77.6},
            "tags": {"name": "Ward Clinic", "amenity": "clinic"}
        }));
        let f = normalize_element(&clinic, 0.0, 0.0).unwrap();
        assert!(f.specializations.contains(&SpecializationId::new("general_medicine")));
        assert!(!f.emergency_services);
        assert!(!f.opening_hours.is_known());
    }

    #[test]
    fn normalize_elements_collects_skips() {
        let elements = vec![
            element(serde_json::json!({"type": "node", "id": 1, "lat": 1.0, "lon": 1.0, "tags": {"name": "A"}})),
            element(serde_json::json!({"type": "node", "id": 2, "lat": 1.0, "lon": 1.0, "tags": {}})),
        ];
        let (facilities, skipped) = normalize_elements(&elements, 0.0, 0.0);
        assert_eq!(facilities.len(), 1);
        assert_eq!(skipped.len(), 1);
        assert_eq!(skipped[0].reason, SkipReason::MissingName);
    }

    #[test]
    fn unknown_speciality_values_are_ignored() {
        assert_eq!(map_speciality("paediatrics"), Some("pediatrics"));
        assert_eq!(map_speciality("homeopathy"), None);
    }
}
