//! # Geographic Utilities
//!
//! Geodetic primitives shared by the decoders and the track helpers.
//!
//! | Function | Description |
//! |----------|-------------|
//! | [`semicircles_to_degrees`] | Convert a FIT semicircle value to degrees |
//! | [`is_valid_coordinate`] | Range check that also rejects the `(0, 0)` "no fix" pair |
//! | [`is_valid_fit_region_coordinate`] | [`is_valid_coordinate`] restricted to a [`RegionBounds`] |
//! | [`haversine_distance`] | Great-circle distance between two track points |
//! | [`polyline_length`] | Total length of a track in meters |
//! | [`compute_bounds`] | Bounding box of a track |
//! | [`compute_center`] | Centroid of a track |
//!
//! ## Example
//!
//! ```rust
//! use track_converter::{TrackPoint, geo_utils};
//!
//! let track = vec![
//!     TrackPoint::new(45.1885, 5.7245, 212.0),
//!     TrackPoint::new(45.1890, 5.7260, 215.0),
//!     TrackPoint::new(45.1900, 5.7270, 221.0),
//! ];
//!
//! let length = geo_utils::polyline_length(&track);
//! assert!(length > 100.0 && length < 300.0);
//!
//! assert!(geo_utils::is_valid_coordinate(45.1885, 5.7245));
//! assert!(!geo_utils::is_valid_coordinate(0.0, 0.0));
//! ```
//!
//! All functions expect WGS84 coordinates in degrees.

use geo::{Distance, Haversine, Point};

use crate::{Bounds, TrackPoint};

/// Degrees per FIT semicircle: `180 / 2^31`.
const DEGREES_PER_SEMICIRCLE: f64 = 180.0 / 2_147_483_648.0;

// =============================================================================
// Conversions and Validity
// =============================================================================

/// Convert a FIT semicircle value to degrees.
///
/// ```rust
/// use track_converter::geo_utils::semicircles_to_degrees;
///
/// assert_eq!(semicircles_to_degrees(i32::MIN), -180.0);
/// assert_eq!(semicircles_to_degrees(1 << 30), 90.0);
/// ```
#[inline]
pub fn semicircles_to_degrees(value: i32) -> f64 {
    value as f64 * DEGREES_PER_SEMICIRCLE
}

/// Check that a latitude/longitude pair is a usable fix.
///
/// Rejects NaN, `|lat| > 90`, `|lon| > 180` and the degenerate `(0, 0)` pair,
/// which receivers emit when they have no fix.
#[inline]
pub fn is_valid_coordinate(lat: f64, lon: f64) -> bool {
    is_in_range(lat, lon) && !(lat == 0.0 && lon == 0.0)
}

/// Plain WGS84 range check, without the `(0, 0)` rule.
#[inline]
pub(crate) fn is_in_range(lat: f64, lon: f64) -> bool {
    lat.is_finite() && lon.is_finite() && lat.abs() <= 90.0 && lon.abs() <= 180.0
}

/// Rectangular region used to suppress false positives in the FIT scanner.
///
/// The default covers metropolitan France and its borders (41–51.5°N,
/// 5°W–9.5°E). It is a deployment assumption; replace it for tracks
/// recorded elsewhere.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RegionBounds {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lon: f64,
    pub max_lon: f64,
}

impl RegionBounds {
    /// A region that accepts every valid coordinate.
    pub const WORLD: RegionBounds = RegionBounds {
        min_lat: -90.0,
        max_lat: 90.0,
        min_lon: -180.0,
        max_lon: 180.0,
    };

    pub fn contains(&self, lat: f64, lon: f64) -> bool {
        lat >= self.min_lat && lat <= self.max_lat && lon >= self.min_lon && lon <= self.max_lon
    }
}

impl Default for RegionBounds {
    fn default() -> Self {
        Self {
            min_lat: 41.0,
            max_lat: 51.5,
            min_lon: -5.0,
            max_lon: 9.5,
        }
    }
}

/// [`is_valid_coordinate`] further restricted to `region`.
#[inline]
pub fn is_valid_fit_region_coordinate(lat: f64, lon: f64, region: &RegionBounds) -> bool {
    is_valid_coordinate(lat, lon) && region.contains(lat, lon)
}

// =============================================================================
// Distance Functions
// =============================================================================

/// Great-circle distance between two track points, in meters.
///
/// Elevation is ignored.
#[inline]
pub fn haversine_distance(p1: &TrackPoint, p2: &TrackPoint) -> f64 {
    let point1 = Point::new(p1.longitude, p1.latitude);
    let point2 = Point::new(p2.longitude, p2.latitude);
    Haversine::distance(point1, point2)
}

/// Total length of a track in meters. Empty or single-point tracks return 0.0.
pub fn polyline_length(points: &[TrackPoint]) -> f64 {
    if points.len() < 2 {
        return 0.0;
    }

    points
        .windows(2)
        .map(|w| haversine_distance(&w[0], &w[1]))
        .sum()
}

// =============================================================================
// Bounding Box / Centroid
// =============================================================================

/// Bounding box of a track, or `None` for an empty slice.
pub fn compute_bounds(points: &[TrackPoint]) -> Option<Bounds> {
    if points.is_empty() {
        return None;
    }

    let mut min_lat = f64::MAX;
    let mut max_lat = f64::MIN;
    let mut min_lng = f64::MAX;
    let mut max_lng = f64::MIN;

    for p in points {
        min_lat = min_lat.min(p.latitude);
        max_lat = max_lat.max(p.latitude);
        min_lng = min_lng.min(p.longitude);
        max_lng = max_lng.max(p.longitude);
    }

    Some(Bounds { min_lat, max_lat, min_lng, max_lng })
}

/// Arithmetic mean of all latitudes and longitudes as `(lat, lon)`.
///
/// Returns `None` for empty input. Simple averaging is fine for the small
/// areas a single track covers; it misbehaves across the antimeridian.
pub fn compute_center(points: &[TrackPoint]) -> Option<(f64, f64)> {
    if points.is_empty() {
        return None;
    }

    let sum_lat: f64 = points.iter().map(|p| p.latitude).sum();
    let sum_lng: f64 = points.iter().map(|p| p.longitude).sum();
    let n = points.len() as f64;

    Some((sum_lat / n, sum_lng / n))
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(a: f64, b: f64, epsilon: f64) -> bool {
        (a - b).abs() < epsilon
    }

    #[test]
    fn test_semicircles_to_degrees() {
        assert_eq!(semicircles_to_degrees(0), 0.0);
        assert_eq!(semicircles_to_degrees(i32::MIN), -180.0);
        // 45 degrees
        assert!(approx_eq(semicircles_to_degrees(536_870_912), 45.0, 1e-12));
    }

    #[test]
    fn test_coordinate_validity() {
        assert!(is_valid_coordinate(45.0, 5.0));
        assert!(is_valid_coordinate(-90.0, 180.0));
        assert!(is_valid_coordinate(0.0, 12.0));
        assert!(!is_valid_coordinate(0.0, 0.0));
        assert!(!is_valid_coordinate(90.5, 0.0));
        assert!(!is_valid_coordinate(10.0, -180.5));
        assert!(!is_valid_coordinate(f64::NAN, 5.0));
    }

    #[test]
    fn test_fit_region() {
        let region = RegionBounds::default();
        assert!(is_valid_fit_region_coordinate(45.19, 5.72, &region)); // Grenoble
        assert!(!is_valid_fit_region_coordinate(51.51, -0.13, &region)); // London
        assert!(!is_valid_fit_region_coordinate(40.71, -74.0, &region));
        assert!(is_valid_fit_region_coordinate(40.71, -74.0, &RegionBounds::WORLD));
    }

    #[test]
    fn test_haversine_distance_known_value() {
        // Paris to Lyon is roughly 392 km
        let paris = TrackPoint::new(48.8566, 2.3522, 0.0);
        let lyon = TrackPoint::new(45.7640, 4.8357, 0.0);
        assert!(approx_eq(haversine_distance(&paris, &lyon), 392_000.0, 5_000.0));
    }

    #[test]
    fn test_polyline_length_short_tracks() {
        assert_eq!(polyline_length(&[]), 0.0);
        assert_eq!(polyline_length(&[TrackPoint::new(45.0, 5.0, 0.0)]), 0.0);
    }

    #[test]
    fn test_compute_bounds_and_center() {
        let track = vec![
            TrackPoint::new(45.10, 5.70, 0.0),
            TrackPoint::new(45.20, 5.80, 0.0),
            TrackPoint::new(45.15, 5.75, 0.0),
        ];
        let bounds = compute_bounds(&track).unwrap();
        assert_eq!(bounds.min_lat, 45.10);
        assert_eq!(bounds.max_lng, 5.80);

        let (lat, lon) = compute_center(&track).unwrap();
        assert!(approx_eq(lat, 45.15, 1e-9));
        assert!(approx_eq(lon, 5.75, 1e-9));

        assert!(compute_bounds(&[]).is_none());
        assert!(compute_center(&[]).is_none());
    }
}
