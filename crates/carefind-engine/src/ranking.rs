//! Filtering and ordering of facilities for a search.

use std::cmp::Ordering;

use carefind_core::{Facility, SearchFilters, SortBy};

/// Applies `filters` to `facilities`. Pure; input order does not affect output.
///
/// Filters run in a fixed order: emergency capability, specialization,
/// minimum rating, maximum distance. The survivors are sorted by
/// `filters.sort_by`, ties broken by distance ascending, then rating
/// descending, then name ascending, then id, and truncated to `filters.limit`.
#[must_use]
pub fn rank_facilities(facilities: Vec<Facility>, filters: &SearchFilters) -> Vec<Facility> {
    let mut kept: Vec<Facility> = facilities
        .into_iter()
        .filter(|f| !filters.emergency_only || f.emergency_services)
        .filter(|f| {
            filters
                .specialization_id
                .as_ref()
                .is_none_or(|id| f.specializations.contains(id))
        })
        .filter(|f| f.rating >= filters.min_rating)
        .filter(|f| f.distance_meters <= filters.max_distance_meters)
        .collect();

    kept.sort_by(|a, b| {
        let primary = match filters.sort_by {
            SortBy::Distance => Ordering::Equal,
            SortBy::Rating => by_rating(a, b),
            SortBy::Name => by_name(a, b),
        };
        primary
            .then_with(|| by_distance(a, b))
            .then_with(|| by_rating(a, b))
            .then_with(|| by_name(a, b))
            .then_with(|| a.id.cmp(&b.id))
    });
    kept.truncate(filters.limit);
    kept
}

fn by_distance(a: &Facility, b: &Facility) -> Ordering {
    a.distance_meters.total_cmp(&b.distance_meters)
}

fn by_rating(a: &Facility, b: &Facility) -> Ordering {
    b.rating.total_cmp(&a.rating)
}

fn by_name(a: &Facility, b: &Facility) -> Ordering {
    a.name
        .to_lowercase()
        .cmp(&b.name.to_lowercase())
        .then_with(|| a.name.cmp(&b.name))
}
