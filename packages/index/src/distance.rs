//! Great-circle distance on a spherical Earth.

use parking_report_models::Coordinates;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

/// Unit shared by the search radius and every computed distance.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[strum(ascii_case_insensitive)]
pub enum DistanceUnit {
    /// Kilometers.
    #[serde(rename = "km")]
    #[strum(to_string = "km", serialize = "kilometers")]
    Kilometers,
    /// Statute miles.
    #[default]
    #[serde(rename = "mi")]
    #[strum(to_string = "mi", serialize = "miles")]
    Miles,
}

impl DistanceUnit {
    /// Mean Earth radius expressed in this unit.
    #[must_use]
    pub const fn earth_radius(self) -> f64 {
        match self {
            Self::Kilometers => 6371.0,
            Self::Miles => 3959.0,
        }
    }

    /// Search radius used when a query does not supply one.
    #[must_use]
    pub const fn default_radius(self) -> f64 {
        match self {
            Self::Kilometers => 5.0,
            Self::Miles => 0.5,
        }
    }

    /// Short label used in messages (`km` or `mi`).
    #[must_use]
    pub const fn abbreviation(self) -> &'static str {
        match self {
            Self::Kilometers => "km",
            Self::Miles => "mi",
        }
    }
}

/// Haversine distance between two points, in `unit`.
///
/// ```text
/// a = sin²(Δlat/2) + cos(lat1)·cos(lat2)·sin²(Δlon/2)
/// c = 2·atan2(√a, √(1−a))
/// d = R·c
/// ```
#[must_use]
pub fn haversine_distance(from: Coordinates, to: Coordinates, unit: DistanceUnit) -> f64 {
    let lat1 = from.lat.to_radians();
    let lat2 = to.lat.to_radians();
    let d_lat = (to.lat - from.lat).to_radians();
    let d_lng = (to.lng - from.lng).to_radians();

    // Rounding can push `a` just past 1 for near-antipodal points.
    let a = ((d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lng / 2.0).sin().powi(2))
        .min(1.0);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    unit.earth_radius() * c
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(lat: f64, lng: f64) -> Coordinates {
        Coordinates { lat, lng }
    }

    #[test]
    fn identical_points_are_zero_apart() {
        let p = point(40.7128, -74.0060);
        assert!(haversine_distance(p, p, DistanceUnit::Kilometers).abs() < 1e-12);
    }

    #[test]
    fn one_degree_of_latitude() {
        let d = haversine_distance(point(0.0, 0.0), point(1.0, 0.0), DistanceUnit::Kilometers);
        let expected = 6371.0 * std::f64::consts::PI / 180.0;
        assert!((d - expected).abs() < 1e-9, "got {d}");
    }

    #[test]
    fn new_york_to_los_angeles() {
        let nyc = point(40.7128, -74.0060);
        let la = point(34.0522, -118.2437);

        let km = haversine_distance(nyc, la, DistanceUnit::Kilometers);
        let mi = haversine_distance(nyc, la, DistanceUnit::Miles);

        assert!((km - 3935.7).abs() < 1.0, "got {km} km");
        assert!((mi - 2445.6).abs() < 1.0, "got {mi} mi");
    }

    #[test]
    fn distance_is_symmetric() {
        let a = point(51.5074, -0.1278);
        let b = point(48.8566, 2.3522);
        let ab = haversine_distance(a, b, DistanceUnit::Miles);
        let ba = haversine_distance(b, a, DistanceUnit::Miles);
        assert!((ab - ba).abs() < 1e-9);
    }

    #[test]
    fn antipodal_points_are_half_the_circumference() {
        let d = haversine_distance(point(0.0, 0.0), point(0.0, 180.0), DistanceUnit::Kilometers);
        assert!((d - 6371.0 * std::f64::consts::PI).abs() < 1e-6);
    }

    #[test]
    fn near_antipodal_points_have_a_finite_distance() {
        let half_circumference = 6371.0 * std::f64::consts::PI;

        for step in 0..=179_800 {
            let lat = -89.9 + f64::from(step) * 0.001;
            let d = haversine_distance(point(lat, 0.0), point(-lat, 180.0), DistanceUnit::Kilometers);
            assert!(d.is_finite(), "NaN distance at lat {lat}");
            assert!(d <= half_circumference + 1e-6, "{d} km at lat {lat}");
        }

        let d = haversine_distance(
            point(-89.895_954_5, 0.0),
            point(89.895_954_5, 180.0),
            DistanceUnit::Kilometers,
        );
        assert!((d - half_circumference).abs() < 1e-6);
    }

    #[test]
    fn unit_parses_from_short_and_long_names() {
        assert_eq!("km".parse::<DistanceUnit>().unwrap(), DistanceUnit::Kilometers);
        assert_eq!("Miles".parse::<DistanceUnit>().unwrap(), DistanceUnit::Miles);
        assert_eq!(DistanceUnit::Kilometers.to_string(), "km");
        assert_eq!(DistanceUnit::Miles.abbreviation(), DistanceUnit::Miles.to_string());
        assert!("furlongs".parse::<DistanceUnit>().is_err());
    }
}
