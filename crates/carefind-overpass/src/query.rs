//! Overpass QL for a radius search around the user.

use std::fmt::Write as _;
use std::time::Duration;

/// Facility kinds requested from the `amenity` key.
const AMENITY_KINDS: &str = "hospital|clinic|doctors|dentist";

/// Extra tag filter appended to every statement when only emergency-capable
/// facilities are wanted. Matches `emergency=yes|designated` as well as
/// `healthcare:speciality` values mentioning emergency.
const EMERGENCY_FILTER: &str =
    r#"[~"^(emergency|healthcare:speciality)$"~"^(yes|designated)$|emergency"]"#;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FacilityQuery {
    pub latitude: f64,
    pub longitude: f64,
    pub radius_meters: f64,
    pub emergency_only: bool,
    /// Server-side evaluation limit, reported in the `[timeout:…]` setting.
    pub server_timeout: Duration,
}

impl FacilityQuery {
    /// Renders the query text sent as the `data` form field.
    #[must_use]
    pub fn to_overpass_ql(&self) -> String {
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let radius = self.radius_meters.max(1.0).round() as u64;
        let around = format!(
            "(around:{radius},{lat:.6},{lon:.6})",
            lat = self.latitude,
            lon = self.longitude
        );
        let extra = if self.emergency_only {
            EMERGENCY_FILTER
        } else {
            ""
        };
        let timeout_secs = self.server_timeout.as_secs().max(1);

        let mut ql = format!("[out:json][timeout:{timeout_secs}];\n(\n");
        let _ = writeln!(
            ql,
            "  nwr[\"amenity\"~\"^({AMENITY_KINDS})$\"]{extra}{around};"
        );
        let _ = writeln!(ql, "  nwr[\"healthcare\"]{extra}{around};");
        ql.push_str(");\nout center tags;\n");
        ql
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(emergency_only: bool) -> FacilityQuery {
        FacilityQuery {
            latitude: 12.9716,
            longitude: 77.5946,
            radius_meters: 5_000.0,
            emergency_only,
            server_timeout: Duration::from_secs(8),
        }
    }

    #[test]
    fn renders_radius_search() {
        let ql = query(false).to_overpass_ql();
        assert!(ql.starts_with("[out:json][timeout:8];"));
        assert!(ql.contains(r#"nwr["amenity"~"^(hospital|clinic|doctors|dentist)$"](around:5000,12.971600,77.594600);"#));
        assert!(ql.contains(r#"nwr["healthcare"](around:5000,12.971600,77.594600);"#));
        assert!(ql.trim_end().ends_with("out center tags;"));
    }

    #[test]
    fn emergency_only_narrows_both_statements() {
        let ql = query(true).to_overpass_ql();
        assert_eq!(ql.matches(EMERGENCY_FILTER).count(), 2);
    }

    #[test]
    fn tiny_radius_and_timeout_are_clamped() {
        let mut q = query(false);
        q.radius_meters = 0.2;
        q.server_timeout = Duration::from_millis(300);
        let ql = q.to_overpass_ql();
        assert!(ql.contains("(around:1,"));
        assert!(ql.contains("[timeout:1]"));
    }
}
