//! # Elevation Statistics
//!
//! [`analyze`] summarizes the altitude profile of a track and asks a
//! [`FlightClassifier`] whether it looks like a flight.
//!
//! Only points with an elevation above 0 count as altitude readings. A track
//! recorded at or below sea level therefore reports no altitude at all.
//!
//! ```rust
//! use track_converter::{analyze, TrackPoint};
//!
//! let points: Vec<_> = [100.0, 150.0, 0.0, 120.0]
//!     .iter()
//!     .map(|&ele| TrackPoint::new(45.0, 5.0, ele))
//!     .collect();
//!
//! let stats = analyze(&points);
//! assert_eq!(stats.count, 3);
//! assert_eq!(stats.total_gain, 50.0);
//! assert_eq!(stats.total_loss, 30.0);
//! assert!(!stats.is_flight);
//! ```

use log::debug;

use crate::TrackPoint;

/// Altitude summary of a track. Recomputed on demand, never stored.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AltitudeStats {
    /// False when no point has an elevation above 0. All other fields are 0 then.
    pub has_altitude: bool,
    /// Number of altitude readings
    pub count: usize,
    pub min: f64,
    pub max: f64,
    pub avg: f64,
    pub total_gain: f64,
    pub total_loss: f64,
    /// `max - min`
    pub amplitude: f64,
    pub is_flight: bool,
}

/// Decides whether a point sequence is a flight or ground travel.
pub trait FlightClassifier {
    fn is_flight(&self, points: &[TrackPoint]) -> bool;
}

/// Thresholds of the altitude-only flight heuristic.
///
/// Tuned to tell a paraglider or aircraft track from a walk, ride or drive.
/// Every comparison is strict.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FlightConfig {
    /// Minimum number of points in the track.
    /// Default: 10
    pub min_points: usize,

    /// Minimum number of altitude readings inside `(0, max_valid_altitude)`.
    /// Default: 5
    pub min_readings: usize,

    /// Readings at or above this are ignored.
    /// Default: 10000.0 meters
    pub max_valid_altitude: f64,

    /// A climb between consecutive readings larger than this counts as an
    /// ascending section.
    /// Default: 50.0 meters
    pub ascent_step: f64,

    /// Range (max - min) must exceed this.
    /// Default: 200.0 meters
    pub min_range: f64,

    /// Ascending sections must exceed this.
    /// Default: 3
    pub min_ascending_sections: usize,

    /// Sum of the ascending sections must exceed this.
    /// Default: 300.0 meters
    pub min_total_ascent: f64,

    /// Highest reading must exceed this.
    /// Default: 500.0 meters
    pub min_max_altitude: f64,
}

impl Default for FlightConfig {
    fn default() -> Self {
        Self {
            min_points: 10,
            min_readings: 5,
            max_valid_altitude: 10_000.0,
            ascent_step: 50.0,
            min_range: 200.0,
            min_ascending_sections: 3,
            min_total_ascent: 300.0,
            min_max_altitude: 500.0,
        }
    }
}

impl FlightClassifier for FlightConfig {
    fn is_flight(&self, points: &[TrackPoint]) -> bool {
        if points.len() < self.min_points {
            return false;
        }

        let readings: Vec<f64> = points
            .iter()
            .map(|p| p.elevation)
            .filter(|&e| e > 0.0 && e < self.max_valid_altitude)
            .collect();
        if readings.len() < self.min_readings {
            return false;
        }

        let (min, max) = min_max(&readings);

        let mut ascending_sections = 0;
        let mut total_ascent = 0.0;
        for w in readings.windows(2) {
            let diff = w[1] - w[0];
            if diff > self.ascent_step {
                ascending_sections += 1;
                total_ascent += diff;
            }
        }

        debug!(
            "[stats] range={:.0} ascending_sections={} total_ascent={:.0} max={:.0}",
            max - min,
            ascending_sections,
            total_ascent,
            max
        );

        max - min > self.min_range
            && ascending_sections > self.min_ascending_sections
            && total_ascent > self.min_total_ascent
            && max > self.min_max_altitude
    }
}

fn min_max(values: &[f64]) -> (f64, f64) {
    values
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)))
}

/// Summarize elevation with the default [`FlightConfig`].
pub fn analyze(points: &[TrackPoint]) -> AltitudeStats {
    analyze_with(points, &FlightConfig::default())
}

/// Summarize elevation, classifying with `classifier`.
///
/// The classifier is not consulted when the track has no altitude readings.
pub fn analyze_with(points: &[TrackPoint], classifier: &impl FlightClassifier) -> AltitudeStats {
    let altitudes: Vec<f64> = points
        .iter()
        .filter(|p| p.has_altitude())
        .map(|p| p.elevation)
        .collect();

    if altitudes.is_empty() {
        return AltitudeStats::default();
    }

    let (min, max) = min_max(&altitudes);
    let mut total_gain = 0.0;
    let mut total_loss = 0.0;
    for w in altitudes.windows(2) {
        let diff = w[1] - w[0];
        if diff > 0.0 {
            total_gain += diff;
        } else {
            total_loss -= diff;
        }
    }

    AltitudeStats {
        has_altitude: true,
        count: altitudes.len(),
        min,
        max,
        avg: altitudes.iter().sum::<f64>() / altitudes.len() as f64,
        total_gain,
        total_loss,
        amplitude: max - min,
        is_flight: classifier.is_flight(points),
    }
}

/// Default flight heuristic on its own.
pub fn detect_flight_pattern(points: &[TrackPoint]) -> bool {
    FlightConfig::default().is_flight(points)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(elevations: &[f64]) -> Vec<TrackPoint> {
        elevations
            .iter()
            .enumerate()
            .map(|(i, &e)| TrackPoint::new(45.0 + i as f64 * 0.001, 6.0, e))
            .collect()
    }

    #[test]
    fn test_gain_and_loss() {
        let stats = analyze(&profile(&[100.0, 150.0, 120.0]));
        assert!(stats.has_altitude);
        assert_eq!(stats.count, 3);
        assert_eq!(stats.total_gain, 50.0);
        assert_eq!(stats.total_loss, 30.0);
        assert_eq!(stats.min, 100.0);
        assert_eq!(stats.max, 150.0);
        assert_eq!(stats.amplitude, 50.0);
        assert!((stats.avg - 123.333).abs() < 1e-3);
    }

    #[test]
    fn test_zero_elevation_is_missing() {
        let stats = analyze(&profile(&[0.0, 0.0, 0.0]));
        assert!(!stats.has_altitude);
        assert_eq!(stats, AltitudeStats::default());

        // readings on either side of a gap are consecutive
        let stats = analyze(&profile(&[300.0, 0.0, 250.0]));
        assert_eq!(stats.count, 2);
        assert_eq!(stats.total_loss, 50.0);
    }

    #[test]
    fn test_thermal_climb_is_flight() {
        let climb = [800.0, 900.0, 1000.0, 1100.0, 1200.0, 1150.0, 1100.0, 1050.0, 1000.0, 950.0];
        let points = profile(&climb);
        assert!(detect_flight_pattern(&points));
        assert!(analyze(&points).is_flight);
    }

    #[test]
    fn test_small_range_is_never_flight() {
        // many steep steps but only 200m of range
        let points = profile(&[600.0, 700.0, 800.0, 700.0, 800.0, 700.0, 800.0, 700.0, 800.0, 700.0]);
        assert!(!detect_flight_pattern(&points));
    }

    #[test]
    fn test_each_threshold_blocks() {
        // fewer than 10 points
        assert!(!detect_flight_pattern(&profile(&[800.0, 900.0, 1000.0, 1100.0, 1200.0])));
        // fewer than 5 readings
        let points = profile(&[0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 800.0, 900.0, 1000.0, 1100.0]);
        assert!(!detect_flight_pattern(&points));
        // exactly 3 ascending sections
        let points = profile(&[800.0, 950.0, 1100.0, 1250.0, 1250.0, 1250.0, 1250.0, 1250.0, 1250.0, 1250.0]);
        assert!(!detect_flight_pattern(&points));
        // low altitude hills
        let points = profile(&[10.0, 70.0, 130.0, 190.0, 250.0, 310.0, 300.0, 290.0, 280.0, 270.0]);
        assert!(!detect_flight_pattern(&points));
    }

    #[test]
    fn test_custom_classifier() {
        struct Always;
        impl FlightClassifier for Always {
            fn is_flight(&self, _: &[TrackPoint]) -> bool {
                true
            }
        }
        assert!(analyze_with(&profile(&[1.0, 2.0]), &Always).is_flight);
        assert!(!analyze_with(&profile(&[0.0, 0.0]), &Always).is_flight);
    }
}
