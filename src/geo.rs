//! Geometry primitives
//!
//! Great-circle distance on a sphere and a median-based centroid. All inputs
//! are in degrees; the trigonometry runs in radians.

use crate::types::Location;

/// Sphere radius used for great-circle distance: WGS-84 equatorial, meters.
pub const EARTH_RADIUS_M: f64 = 6_378_137.0;

/// Great-circle distance between two coordinates in meters.
///
/// Symmetric, non-negative, and zero for identical inputs.
pub fn haversine(a: &Location, b: &Location) -> f64 {
    let dlat = (b.latitude - a.latitude).to_radians();
    let dlon = (b.longitude - a.longitude).to_radians();
    let h = (dlat / 2.0).sin().powi(2)
        + a.latitude.to_radians().cos() * b.latitude.to_radians().cos() * (dlon / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());
    EARTH_RADIUS_M * c
}

/// Cumulative great-circle length of a polyline in meters.
pub fn path_distance(points: &[Location]) -> f64 {
    points.windows(2).map(|w| haversine(&w[0], &w[1])).sum()
}

/// Median centroid of a non-empty point set.
///
/// Latitude and longitude medians are taken independently; for an even count
/// the element at index n/2 of the ascending sort is used. The median is
/// robust to isolated GPS outliers, which would drag a mean centroid.
///
/// # Panics
/// Panics on an empty slice. Callers never pass an empty set.
pub fn centroid(points: &[Location]) -> Location {
    assert!(!points.is_empty(), "centroid of empty point set");
    Location::new(
        median_by(points, |p| p.latitude),
        median_by(points, |p| p.longitude),
    )
}

fn median_by(points: &[Location], key: impl Fn(&Location) -> f64) -> f64 {
    let mut values: Vec<f64> = points.iter().map(key).collect();
    values.sort_by(|a, b| a.total_cmp(b));
    values[values.len() / 2]
}
