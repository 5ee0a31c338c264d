//! Distance policies for the spatial hit test.
//!
//! Two interchangeable metrics: a local equirectangular approximation on
//! a spherical Earth (adequate at cyclone-impact scales, ≤ ~500 km, and
//! the default) and true geodesic distance on the WGS84 ellipsoid via
//! the `geo` crate.

use geo::{Distance, Geodesic, Point};
use storm_exposure_exposure_models::DistancePolicy;

/// Mean Earth radius in meters (spherical approximation).
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Meters per degree of latitude on the spherical Earth.
pub const METERS_PER_DEGREE: f64 = EARTH_RADIUS_M * std::f64::consts::PI / 180.0;

/// A distance metric between two WGS84 positions.
pub trait DistanceModel: Send + Sync {
    /// Distance in meters between `(a_lat, a_lon)` and `(b_lat, b_lon)`,
    /// both in degrees.
    fn distance_m(&self, a_lat: f64, a_lon: f64, b_lat: f64, b_lon: f64) -> f64;
}

/// Local planar approximation: project both endpoints equirectangularly
/// at the midpoint latitude, then take Euclidean distance.
pub struct PlanarDistance;

impl DistanceModel for PlanarDistance {
    fn distance_m(&self, a_lat: f64, a_lon: f64, b_lat: f64, b_lon: f64) -> f64 {
        let mid_lat = f64::midpoint(a_lat, b_lat).to_radians();
        // Longitude difference taken the short way around, so endpoints
        // straddling the antimeridian measure ~0.2 degrees, not ~359.8.
        let mut dlon = b_lon - a_lon;
        if dlon > 180.0 {
            dlon -= 360.0;
        } else if dlon < -180.0 {
            dlon += 360.0;
        }
        let dx = dlon * METERS_PER_DEGREE * mid_lat.cos();
        let dy = (b_lat - a_lat) * METERS_PER_DEGREE;
        dx.hypot(dy)
    }
}

/// True geodesic distance on the WGS84 ellipsoid.
pub struct GeodesicDistance;

impl DistanceModel for GeodesicDistance {
    fn distance_m(&self, a_lat: f64, a_lon: f64, b_lat: f64, b_lon: f64) -> f64 {
        Geodesic.distance(Point::new(a_lon, a_lat), Point::new(b_lon, b_lat))
    }
}

/// Returns the distance model for a configured policy.
#[must_use]
pub fn for_policy(policy: DistancePolicy) -> Box<dyn DistanceModel> {
    match policy {
        DistancePolicy::Planar => Box::new(PlanarDistance),
        DistancePolicy::Geodesic => Box::new(GeodesicDistance),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn planar_distance_of_coincident_points_is_zero() {
        let d = PlanarDistance.distance_m(28.0, -90.0, 28.0, -90.0);
        assert!(d.abs() < f64::EPSILON);
    }

    #[test]
    fn planar_one_degree_of_latitude_is_about_111_km() {
        let d = PlanarDistance.distance_m(28.0, -90.0, 29.0, -90.0);
        assert!((d - METERS_PER_DEGREE).abs() < 1.0);
    }

    #[test]
    fn planar_longitude_shrinks_with_latitude() {
        let equator = PlanarDistance.distance_m(0.0, 0.0, 0.0, 1.0);
        let high = PlanarDistance.distance_m(60.0, 0.0, 60.0, 1.0);
        assert!(high < equator * 0.55);
    }

    #[test]
    fn planar_distance_wraps_across_antimeridian() {
        // 0.2 degrees of longitude across the date line at 10° N is
        // ~22 km, not most of the way around the planet.
        let d = PlanarDistance.distance_m(10.0, 179.9, 10.0, -179.9);
        let same_side = PlanarDistance.distance_m(10.0, 0.0, 10.0, 0.2);
        assert!((d - same_side).abs() < 1.0);
        assert!(d < 30_000.0);
    }

    #[test]
    fn planar_and_geodesic_agree_at_impact_scales() {
        // ~300 km separation in the Gulf of Mexico; the approximation
        // must stay within 1% of the geodesic answer.
        let planar = PlanarDistance.distance_m(28.0, -90.0, 28.0, -87.0);
        let geodesic = GeodesicDistance.distance_m(28.0, -90.0, 28.0, -87.0);
        assert!((planar - geodesic).abs() / geodesic < 0.01);
    }
}
