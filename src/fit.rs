//! # Heuristic FIT Scanner
//!
//! FIT files are not decoded against their schema. Instead the byte stream is
//! scanned for anything that looks like a semicircle coordinate pair, in a
//! staged pipeline:
//!
//! | Stage | Function | Reads |
//! |-------|----------|-------|
//! | 1 | [`primary_scan`] | little-endian `i32` pairs after the header, region-filtered, with altitude |
//! | 2 | [`alternate_scan`] | big-endian `i32` pairs at 4-byte strides, generic validity only |
//! | 3 | [`cleanup`] | drops candidates far from the centroid |
//!
//! The alternate scan is used only when the primary scan finds
//! `min_points` or fewer candidates. A track that still has `min_points` or
//! fewer after cleanup is rejected.
//!
//! This is an approximate recovery. It can miss points, and it can accept
//! byte patterns that merely look like coordinates.

use log::{debug, info, warn};

use crate::geo_utils::{
    compute_center, is_valid_coordinate, is_valid_fit_region_coordinate, semicircles_to_degrees,
    RegionBounds,
};
use crate::{DecodeError, Track, TrackFormat, TrackPoint};

/// Smallest FIT header.
const MIN_HEADER_LEN: usize = 12;

/// Settings for the FIT salvage pipeline.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FitScanConfig {
    /// Region a primary-scan candidate must fall in.
    /// Default: 41–51.5°N, 5°W–9.5°E
    pub region: RegionBounds,

    /// Bytes skipped after an accepted candidate (one record guess).
    /// Default: 20
    pub record_stride: usize,

    /// Primary scan stops after this many accepted candidates.
    /// Default: 1000
    pub max_points: usize,

    /// A candidate set must be strictly larger than this.
    /// Default: 10
    pub min_points: usize,

    /// Maximum latitude or longitude distance from the centroid, in degrees.
    /// Default: 2.0
    pub cluster_radius_deg: f64,

    /// Altitudes must fall strictly between 0 and this, in meters.
    /// Default: 5000.0
    pub max_altitude: f64,
}

impl Default for FitScanConfig {
    fn default() -> Self {
        Self {
            region: RegionBounds::default(),
            record_stride: 20,
            max_points: 1000,
            min_points: 10,
            cluster_radius_deg: 2.0,
            max_altitude: 5000.0,
        }
    }
}

fn read_le_i32(bytes: &[u8], at: usize) -> Option<i32> {
    let raw: [u8; 4] = bytes.get(at..at + 4)?.try_into().ok()?;
    Some(i32::from_le_bytes(raw))
}

fn read_be_i32(bytes: &[u8], at: usize) -> Option<i32> {
    let raw: [u8; 4] = bytes.get(at..at + 4)?.try_into().ok()?;
    Some(i32::from_be_bytes(raw))
}

/// Altitude next to an accepted pair, tried as `u16` then `i16`.
fn nearby_altitude(bytes: &[u8], at: usize, max_altitude: f64) -> f64 {
    let Some(raw) = bytes.get(at..at + 2) else {
        return 0.0;
    };
    let raw = [raw[0], raw[1]];
    [u16::from_le_bytes(raw) as f64, i16::from_le_bytes(raw) as f64]
        .into_iter()
        .find(|alt| *alt > 0.0 && *alt < max_altitude)
        .unwrap_or(0.0)
}

/// Scan little-endian `(lat, lon)` semicircle pairs after the header.
///
/// The first byte of the file is taken as the header size. A pair is
/// accepted when it lies inside `config.region`; the scan then skips
/// `record_stride` bytes, otherwise it moves on by one byte.
pub fn primary_scan(bytes: &[u8], config: &FitScanConfig) -> Vec<TrackPoint> {
    let mut points = Vec::new();
    let Some(&header_len) = bytes.first() else {
        return points;
    };

    let mut pos = header_len as usize;
    while pos + 12 < bytes.len() && points.len() < config.max_points {
        let (Some(lat_raw), Some(lon_raw)) = (read_le_i32(bytes, pos), read_le_i32(bytes, pos + 4)) else {
            break;
        };
        let lat = semicircles_to_degrees(lat_raw);
        let lon = semicircles_to_degrees(lon_raw);

        if is_valid_fit_region_coordinate(lat, lon, &config.region) {
            let elevation = nearby_altitude(bytes, pos + 8, config.max_altitude);
            points.push(TrackPoint::new(lat, lon, elevation));
            pos += config.record_stride.max(1);
        } else {
            pos += 1;
        }
    }

    points
}

/// Scan big-endian `(lat, lon)` semicircle pairs at 4-byte strides.
///
/// No region filter and no altitude.
pub fn alternate_scan(bytes: &[u8]) -> Vec<TrackPoint> {
    let mut points = Vec::new();
    let mut pos = 0;

    while pos + 8 < bytes.len() {
        if let (Some(lat_raw), Some(lon_raw)) = (read_be_i32(bytes, pos), read_be_i32(bytes, pos + 4)) {
            let lat = semicircles_to_degrees(lat_raw);
            let lon = semicircles_to_degrees(lon_raw);
            if is_valid_coordinate(lat, lon) {
                points.push(TrackPoint::new(lat, lon, 0.0));
            }
        }
        pos += 4;
    }

    points
}

/// Keep the points within `radius_deg` of the centroid on both axes.
pub fn cleanup(points: &[TrackPoint], radius_deg: f64) -> Vec<TrackPoint> {
    let Some((center_lat, center_lon)) = compute_center(points) else {
        return Vec::new();
    };
    points
        .iter()
        .filter(|p| (p.latitude - center_lat).abs() < radius_deg && (p.longitude - center_lon).abs() < radius_deg)
        .copied()
        .collect()
}

/// Recover a track from a FIT buffer.
pub fn decode(bytes: &[u8], config: &FitScanConfig) -> Result<Track, DecodeError> {
    if bytes.len() < MIN_HEADER_LEN {
        return Err(DecodeError::TruncatedFit(bytes.len()));
    }

    let primary = primary_scan(bytes, config);
    debug!("[fit] primary scan: {} candidates", primary.len());

    let candidates = if primary.len() > config.min_points {
        primary
    } else {
        let alternate = alternate_scan(bytes);
        debug!("[fit] alternate scan: {} candidates", alternate.len());
        alternate
    };

    let points = cleanup(&candidates, config.cluster_radius_deg);
    if points.len() < candidates.len() {
        debug!("[fit] cleanup dropped {} stray candidates", candidates.len() - points.len());
    }

    if points.len() <= config.min_points {
        warn!("[fit] only {} points recovered", points.len());
        return Err(DecodeError::FitTooShort {
            found: points.len(),
            required: config.min_points,
        });
    }

    info!("[fit] recovered {} points from {} bytes", points.len(), bytes.len());
    Track::from_points(
        points,
        "FIT Track",
        "Approximate track recovered from a FIT file",
        TrackFormat::Fit,
    )
}
