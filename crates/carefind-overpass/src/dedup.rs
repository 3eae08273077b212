//! Merging of duplicate facilities.
//!
//! OSM often maps one hospital as both a node and a building way. Two records
//! are duplicates when their ids match, or when their normalized names match
//! and they sit within [`DUPLICATE_RADIUS_METERS`] of each other.

use carefind_core::{haversine_distance_meters, Facility};

pub const DUPLICATE_RADIUS_METERS: f64 = 25.0;

/// Lower-case alphanumeric words joined by single spaces.
fn name_key(name: &str) -> String {
    name.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// How much optional information a record carries.
fn richness(facility: &Facility) -> usize {
    [
        facility.phone.is_some(),
        !facility.address.is_empty(),
        facility.opening_hours.is_known(),
        facility.rating > 0.0,
        facility.review_count > 0,
        facility.emergency_services,
    ]
    .into_iter()
    .filter(|present| *present)
    .count()
        + facility.specializations.len()
}

fn is_duplicate(a: &Facility, a_key: &str, b: &Facility) -> bool {
    if a.id == b.id {
        return true;
    }
    a_key == name_key(&b.name)
        && haversine_distance_meters(a.latitude, a.longitude, b.latitude, b.longitude)
            <= DUPLICATE_RADIUS_METERS
}

/// Drops duplicates, keeping the richer record of each pair in the position
/// of the first occurrence. Ties keep the earlier record.
#[must_use]
pub fn dedup_facilities(facilities: Vec<Facility>) -> Vec<Facility> {
    let mut kept: Vec<(String, Facility)> = Vec::with_capacity(facilities.len());
    for facility in facilities {
        let key = name_key(&facility.name);
        match kept
            .iter_mut()
            .find(|(kept_key, existing)| is_duplicate(existing, kept_key, &facility))
        {
            Some(slot) => {
                if richness(&facility) > richness(&slot.1) {
                    tracing::debug!(
                        replaced = %slot.1.id,
                        by = %facility.id,
                        "merged duplicate facility"
                    );
                    *slot = (key, facility);
                }
            }
            None => kept.push((key, facility)),
        }
    }
    kept.into_iter().map(|(_, f)| f).collect()
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use carefind_core::{offset_position, OpeningHours, SpecializationId};

    use super::*;

    fn facility(id: &str, name: &str, lat: f64, lon: f64) -> Facility {
        Facility {
            id: id.to_owned(),
            name: name.to_owned(),
            address: String::new(),
            latitude: lat,
            longitude: lon,
            phone: None,
            specializations: BTreeSet::new(),
            rating: 0.0,
            review_count: 0,
            opening_hours: OpeningHours::unknown(),
            emergency_services: false,
            distance_meters: 0.0,
        }
    }

    #[test]
    fn same_id_is_merged() {
        let a = facility("osm:node/1", "Clinic A", 12.0, 77.0);
        let b = facility("osm:node/1", "Clinic A (renamed)", 12.5, 77.5);
        assert_eq!(dedup_facilities(vec![a, b]).len(), 1);
    }

    #[test]
    fn nearby_same_name_keeps_richer_record() {
        let node = facility("osm:node/1", "City Hospital", 12.9716, 77.5946);
        let (lat, lon) = offset_position(12.9716, 77.5946, 90.0, 15.0);
        let mut way = facility("osm:way/2", "city  hospital", lat, lon);
        way.phone = Some("+91 80 1234".to_owned());
        way.specializations.insert(SpecializationId::new("cardiology"));

        let out = dedup_facilities(vec![node, way]);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].id, "osm:way/2");
    }

    #[test]
    fn same_name_far_apart_is_kept() {
        let a = facility("osm:node/1", "Apollo Clinic", 12.9716, 77.5946);
        let (lat, lon) = offset_position(12.9716, 77.5946, 0.0, 200.0);
        let b = facility("osm:node/2", "Apollo Clinic", lat, lon);
        assert_eq!(dedup_facilities(vec![a, b]).len(), 2);
    }

    #[test]
    fn tie_keeps_first_record_and_order() {
        let a = facility("osm:node/1", "A", 1.0, 1.0);
        let b = facility("osm:node/2", "B", 2.0, 2.0);
        let a_dup = facility("osm:node/1", "A", 1.0, 1.0);
        let out = dedup_facilities(vec![a, b, a_dup]);
        let ids: Vec<_> = out.iter().map(|f| f.id.as_str()).collect();
        assert_eq!(ids, ["osm:node/1", "osm:node/2"]);
    }
}
