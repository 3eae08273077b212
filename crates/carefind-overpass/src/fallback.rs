//! Built-in facilities served when every live endpoint failed.
//!
//! Positions are generated around the query origin so distance filtering and
//! ranking behave normally. The data is illustrative only; results built from
//! it are always marked degraded.

use std::collections::BTreeSet;

use carefind_core::{
    offset_position, DaySchedule, Facility, OpeningHours, SpecializationId, TimeRange,
};
use chrono::Weekday;

struct FallbackTemplate {
    name: &'static str,
    bearing_deg: f64,
    distance_m: f64,
    specializations: &'static [&'static str],
    rating: f64,
    review_count: u32,
    emergency: bool,
    around_the_clock: bool,
}

const TEMPLATES: &[FallbackTemplate] = &[
    FallbackTemplate {
        name: "City General Hospital",
        bearing_deg: 35.0,
        distance_m: 1_200.0,
        specializations: &["general_medicine", "emergency_medicine", "cardiology"],
        rating: 4.2,
        review_count: 540,
        emergency: true,
        around_the_clock: true,
    },
    FallbackTemplate {
        name: "Community Health Clinic",
        bearing_deg: 140.0,
        distance_m: 800.0,
        specializations: &["general_medicine", "pediatrics"],
        rating: 4.0,
        review_count: 126,
        emergency: false,
        around_the_clock: false,
    },
    FallbackTemplate {
        name: "Heart Care Centre",
        bearing_deg: 260.0,
        distance_m: 2_600.0,
        specializations: &["cardiology", "pulmonology"],
        rating: 4.5,
        review_count: 310,
        emergency: false,
        around_the_clock: false,
    },
    FallbackTemplate {
        name: "Children's Medical Clinic",
        bearing_deg: 310.0,
        distance_m: 1_900.0,
        specializations: &["pediatrics"],
        rating: 4.3,
        review_count: 98,
        emergency: false,
        around_the_clock: false,
    },
    FallbackTemplate {
        name: "Smile Dental Care",
        bearing_deg: 190.0,
        distance_m: 1_500.0,
        specializations: &["dentistry"],
        rating: 4.1,
        review_count: 77,
        emergency: false,
        around_the_clock: false,
    },
    FallbackTemplate {
        name: "Metro Emergency & Trauma Centre",
        bearing_deg: 95.0,
        distance_m: 3_400.0,
        specializations: &["emergency_medicine", "orthopedics", "neurology"],
        rating: 3.9,
        review_count: 402,
        emergency: true,
        around_the_clock: true,
    },
];

fn weekday_clinic_hours() -> OpeningHours {
    let mut hours = OpeningHours::unknown();
    for day in [
        Weekday::Mon,
        Weekday::Tue,
        Weekday::Wed,
        Weekday::Thu,
        Weekday::Fri,
        Weekday::Sat,
    ] {
        *hours.day_mut(day) = DaySchedule {
            intervals: TimeRange::new(9 * 60, 18 * 60).into_iter().collect(),
        };
    }
    *hours.day_mut(Weekday::Sun) = DaySchedule::closed();
    hours
}

fn compass_point(bearing_deg: f64) -> &'static str {
    const POINTS: [&str; 8] = ["N", "NE", "E", "SE", "S", "SW", "W", "NW"];
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let index = ((bearing_deg.rem_euclid(360.0) + 22.5) / 45.0) as usize % 8;
    POINTS[index]
}

/// Facilities laid out around `(origin_lat, origin_lng)`, ids `fallback:<n>`.
#[must_use]
pub fn fallback_facilities(origin_lat: f64, origin_lng: f64) -> Vec<Facility> {
    TEMPLATES
        .iter()
        .enumerate()
        .map(|(index, t)| {
            let (latitude, longitude) =
                offset_position(origin_lat, origin_lng, t.bearing_deg, t.distance_m);
            let mut facility = Facility {
                id: format!("fallback:{}", index + 1),
                name: t.name.to_owned(),
                address: format!(
                    "About {:.1} km {} of your location",
                    t.distance_m / 1_000.0,
                    compass_point(t.bearing_deg)
                ),
                latitude,
                longitude,
                phone: None,
                specializations: t
                    .specializations
                    .iter()
                    .map(|id| SpecializationId::new(id))
                    .collect::<BTreeSet<_>>(),
                rating: t.rating,
                review_count: t.review_count,
                opening_hours: if t.around_the_clock {
                    OpeningHours::always_open()
                } else {
                    weekday_clinic_hours()
                },
                emergency_services: t.emergency,
                distance_meters: 0.0,
            };
            facility.anchor_to(origin_lat, origin_lng);
            facility
        })
        .collect()
}
