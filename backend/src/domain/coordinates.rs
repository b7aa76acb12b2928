//! Geographic coordinates and great-circle distance.
//!
//! Distances use the haversine formula on a spherical Earth of radius
//! [`EARTH_RADIUS_KM`]. The result is symmetric in its arguments and exactly
//! zero for identical points.

use serde::{Deserialize, Serialize};

/// Mean Earth radius used for the spherical approximation, in kilometres.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Latitude/longitude pair in signed decimal degrees.
///
/// Serialised with the short `lat`/`long` keys used on the notification wire.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    /// Degrees north of the equator.
    #[serde(rename = "lat")]
    pub latitude: f64,
    /// Degrees east of the prime meridian.
    #[serde(rename = "long")]
    pub longitude: f64,
}

impl Coordinates {
    /// Build a coordinate pair.
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Great-circle distance to `other` in kilometres.
    ///
    /// # Examples
    /// ```
    /// use backend::domain::Coordinates;
    ///
    /// let new_york = Coordinates::new(40.7128, -74.0060);
    /// let los_angeles = Coordinates::new(34.0522, -118.2437);
    /// let km = new_york.distance_km(&los_angeles);
    /// assert!((km - 3935.75).abs() < 0.1);
    /// ```
    pub fn distance_km(&self, other: &Self) -> f64 {
        haversine_km(*self, *other)
    }
}

/// Haversine distance between two points in kilometres.
///
/// Deltas are taken as absolute values so swapping the arguments yields a
/// bit-identical result.
pub fn haversine_km(from: Coordinates, to: Coordinates) -> f64 {
    let lat1 = from.latitude.to_radians();
    let lat2 = to.latitude.to_radians();
    let delta_lat = (to.latitude - from.latitude).abs().to_radians();
    let delta_lon = (to.longitude - from.longitude).abs().to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1.cos() * lat2.cos() * (delta_lon / 2.0).sin().powi(2);
    // Rounding can push `a` fractionally above one for antipodal points.
    let c = 2.0 * a.clamp(0.0, 1.0).sqrt().asin();

    EARTH_RADIUS_KM * c
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    const NEW_YORK: Coordinates = Coordinates::new(40.7128, -74.0060);
    const LOS_ANGELES: Coordinates = Coordinates::new(34.0522, -118.2437);

    #[rstest]
    fn new_york_to_los_angeles_matches_reference() {
        let km = haversine_km(NEW_YORK, LOS_ANGELES);
        assert!((km - 3935.75).abs() < 0.1, "got {km}");
    }

    #[rstest]
    #[case(NEW_YORK, LOS_ANGELES)]
    #[case(Coordinates::new(12.34, 56.78), Coordinates::new(-33.9, 151.2))]
    #[case(Coordinates::new(-89.9, 179.9), Coordinates::new(89.9, -179.9))]
    #[case(Coordinates::new(0.5, 0.5), Coordinates::new(-0.5, -0.5))]
    fn distance_is_symmetric(#[case] a: Coordinates, #[case] b: Coordinates) {
        assert_eq!(haversine_km(a, b), haversine_km(b, a));
    }

    #[rstest]
    #[case(NEW_YORK)]
    #[case(Coordinates::new(-12.5, 100.25))]
    #[case(Coordinates::new(90.0, 0.0))]
    fn distance_to_self_is_zero(#[case] point: Coordinates) {
        assert_eq!(point.distance_km(&point), 0.0);
    }

    #[rstest]
    fn distance_grows_with_separation() {
        let origin = Coordinates::new(10.0, 10.0);
        let distances: Vec<f64> = [0.01, 0.1, 1.0, 10.0, 90.0]
            .iter()
            .map(|offset| origin.distance_km(&Coordinates::new(10.0 + offset, 10.0)))
            .collect();
        assert!(distances.windows(2).all(|pair| pair[0] < pair[1]));
    }

    #[rstest]
    fn one_degree_of_latitude_is_about_111_km() {
        let km = haversine_km(Coordinates::new(0.0, 0.0), Coordinates::new(1.0, 0.0));
        assert!((km - 111.19).abs() < 0.01, "got {km}");
    }

    #[rstest]
    fn antipodal_points_stay_finite() {
        let km = haversine_km(Coordinates::new(0.0, 0.0), Coordinates::new(0.0, 180.0));
        assert!(km.is_finite());
        assert!((km - std::f64::consts::PI * EARTH_RADIUS_KM).abs() < 1e-6);
    }

    #[rstest]
    fn serialises_with_short_keys() {
        let json = serde_json::to_value(Coordinates::new(1.5, -2.5)).expect("serialise");
        assert_eq!(json, serde_json::json!({ "lat": 1.5, "long": -2.5 }));
    }
}
