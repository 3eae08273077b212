//! Great-circle distance and offset helpers.
//!
//! All distances are meters on a spherical Earth of radius [`EARTH_RADIUS_M`].

/// Mean Earth radius in meters.
pub const EARTH_RADIUS_M: f64 = 6_371_008.8;

/// Haversine great-circle distance between two WGS84 points, in meters.
///
/// Symmetric in its arguments and exactly `0.0` for identical points.
#[must_use]
pub fn haversine_distance_meters(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> f64 {
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let d_phi = (lat2 - lat1).to_radians();
    let d_lambda = (lng2 - lng1).to_radians();

    let a = (d_phi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);
    // Rounding can push `a` a hair outside [0, 1] for antipodal points.
    let c = 2.0 * a.clamp(0.0, 1.0).sqrt().asin();
    EARTH_RADIUS_M * c
}

/// Destination point reached by travelling `distance_m` from a start point on
/// an initial `bearing_deg` (0 = north, 90 = east). Returns `(lat, lng)`.
#[must_use]
pub fn offset_position(lat: f64, lng: f64, bearing_deg: f64, distance_m: f64) -> (f64, f64) {
    let delta = distance_m / EARTH_RADIUS_M;
    let theta = bearing_deg.to_radians();
    let phi1 = lat.to_radians();
    let lambda1 = lng.to_radians();

    let phi2 = (phi1.sin() * delta.cos() + phi1.cos() * delta.sin() * theta.cos()).asin();
    let lambda2 = lambda1
        + (theta.sin() * delta.sin() * phi1.cos()).atan2(delta.cos() - phi1.sin() * phi2.sin());

    // Normalise longitude into [-180, 180).
    let lng2 = (lambda2.to_degrees() + 540.0) % 360.0 - 180.0;
    (phi2.to_degrees(), lng2)
}

/// Fixed-point representation of a coordinate rounded to `places` decimals.
///
/// `round_coordinate(12.971_649, 4)` is `129_716`. Used for cache keys, where
/// float equality would be unreliable.
#[must_use]
pub fn round_coordinate(value: f64, places: u32) -> i64 {
    let scale = 10_f64.powi(i32::try_from(places).unwrap_or(i32::MAX));
    #[allow(clippy::cast_possible_truncation)]
    let scaled = (value * scale).round() as i64;
    scaled
}
