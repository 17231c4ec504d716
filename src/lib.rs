//! # Track Converter
//!
//! Decoding, analysis and re-encoding of GPS tracks.
//!
//! This library provides:
//! - Decoders for GPX, KML, TCX (markup), IGC (fixed-width records) and a
//!   best-effort heuristic scanner for binary FIT files
//! - A canonical [`Track`] model shared by every format
//! - Elevation statistics and a flight / ground classifier ([`stats`])
//! - Encoders back to GPX, KML, IGC and TCX
//!
//! ## Features
//!
//! - **`parallel`** - Decode batches of files with rayon
//! - **`serde`** - Serialize the canonical model to the interchange JSON shape
//! - **`full`** - Enable all features
//!
//! ## Quick Start
//!
//! ```rust
//! use track_converter::{decode, encode, TrackFormat};
//!
//! let gpx = r#"<?xml version="1.0"?>
//! <gpx version="1.1"><trk><name>Morning walk</name><trkseg>
//!   <trkpt lat="45.1885" lon="5.7245"><ele>212.5</ele></trkpt>
//!   <trkpt lat="45.1890" lon="5.7260"><ele>215.0</ele></trkpt>
//! </trkseg></trk></gpx>"#;
//!
//! let track = decode("walk.gpx", gpx.as_bytes()).unwrap();
//! assert_eq!(track.points.len(), 2);
//! assert_eq!(track.name, "Morning walk");
//!
//! let stats = track.altitude_stats();
//! assert_eq!(stats.total_gain, 2.5);
//!
//! let kml = encode(&track, TrackFormat::Kml).unwrap();
//! assert!(kml.contains("5.7245,45.1885,212.5"));
//! ```

use std::borrow::Cow;
use std::fmt;
use std::path::Path;

use chrono::{DateTime, FixedOffset};
use log::{info, warn};

pub mod error;
pub use error::{DecodeError, EncodeError, TrackError};

pub mod geo_utils;
pub use geo_utils::{is_valid_coordinate, is_valid_fit_region_coordinate, semicircles_to_degrees, RegionBounds};

pub mod geometry;
mod markup;

pub mod fit;
pub mod gpx;
pub mod igc;
pub mod kml;
pub mod tcx;
pub use fit::FitScanConfig;

pub mod stats;
pub use stats::{analyze, detect_flight_pattern, AltitudeStats, FlightClassifier, FlightConfig};

pub mod session;
pub use session::{ExportPayload, LoadedTrack, TrackSession};

// ============================================================================
// Core Types
// ============================================================================

/// Timestamps are stored as read, offset included, and written back as-is.
pub type Timestamp = DateTime<FixedOffset>;

/// A single recorded position.
///
/// An elevation of exactly 0 means "no altitude reading" as far as the
/// statistics are concerned; decoders use 0 when the file has none.
///
/// # Example
/// ```
/// use track_converter::TrackPoint;
/// let point = TrackPoint::new(45.1885, 5.7245, 212.0); // Grenoble
/// assert!(point.is_valid());
/// assert!(point.has_altitude());
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TrackPoint {
    #[cfg_attr(feature = "serde", serde(rename = "lon"))]
    pub longitude: f64,
    #[cfg_attr(feature = "serde", serde(rename = "lat"))]
    pub latitude: f64,
    /// Meters; 0 when unknown
    pub elevation: f64,
    pub timestamp: Option<Timestamp>,
}

impl TrackPoint {
    /// Create a point without a timestamp.
    pub fn new(latitude: f64, longitude: f64, elevation: f64) -> Self {
        Self { longitude, latitude, elevation, timestamp: None }
    }

    pub fn with_timestamp(mut self, timestamp: Timestamp) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    /// Check that latitude and longitude are within the WGS84 range.
    pub fn is_valid(&self) -> bool {
        geo_utils::is_in_range(self.latitude, self.longitude)
    }

    /// Whether the elevation counts as a real altitude reading.
    pub fn has_altitude(&self) -> bool {
        self.elevation > 0.0
    }
}

/// Bounding box of a track.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Bounds {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lng: f64,
    pub max_lng: f64,
}

impl Bounds {
    /// Center of the box as `(lat, lon)`.
    pub fn center(&self) -> (f64, f64) {
        (
            (self.min_lat + self.max_lat) / 2.0,
            (self.min_lng + self.max_lng) / 2.0,
        )
    }
}

/// The supported file formats.
///
/// Every format carries its own decoder; all but FIT carry an encoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "UPPERCASE"))]
pub enum TrackFormat {
    Gpx,
    Kml,
    Igc,
    Tcx,
    Fit,
}

impl TrackFormat {
    pub const ALL: [TrackFormat; 5] = [
        TrackFormat::Gpx,
        TrackFormat::Kml,
        TrackFormat::Igc,
        TrackFormat::Tcx,
        TrackFormat::Fit,
    ];

    /// Look up a format by file extension, without the dot, ignoring case.
    ///
    /// ```
    /// use track_converter::TrackFormat;
    /// assert_eq!(TrackFormat::from_extension("IGC"), Some(TrackFormat::Igc));
    /// assert_eq!(TrackFormat::from_extension("csv"), None);
    /// ```
    pub fn from_extension(extension: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|f| f.extension().eq_ignore_ascii_case(extension))
    }

    /// Look up a format from a file name or path.
    pub fn from_path(path: impl AsRef<Path>) -> Option<Self> {
        let extension = path.as_ref().extension()?.to_str()?;
        Self::from_extension(extension)
    }

    pub fn extension(&self) -> &'static str {
        match self {
            TrackFormat::Gpx => "gpx",
            TrackFormat::Kml => "kml",
            TrackFormat::Igc => "igc",
            TrackFormat::Tcx => "tcx",
            TrackFormat::Fit => "fit",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            TrackFormat::Gpx => "application/gpx+xml",
            TrackFormat::Kml => "application/vnd.google-earth.kml+xml",
            TrackFormat::Igc => "application/igc",
            TrackFormat::Tcx => "application/vnd.garmin.tcx+xml",
            TrackFormat::Fit => "application/vnd.ant.fit",
        }
    }

    /// Decode `content` as this format.
    pub fn decode(&self, content: &[u8], config: &DecodeConfig) -> Result<Track, DecodeError> {
        match self {
            TrackFormat::Gpx => gpx::decode(&as_text(content)),
            TrackFormat::Kml => kml::decode(&as_text(content)),
            TrackFormat::Igc => igc::decode(&as_text(content)),
            TrackFormat::Tcx => tcx::decode(&as_text(content)),
            TrackFormat::Fit => fit::decode(content, &config.fit),
        }
    }

    /// Serialize `track` in this format.
    pub fn encode(&self, track: &Track) -> Result<String, EncodeError> {
        if track.points.is_empty() {
            return Err(EncodeError::EmptyTrack);
        }
        match self {
            TrackFormat::Gpx => Ok(gpx::encode(track)),
            TrackFormat::Kml => Ok(kml::encode(track)),
            TrackFormat::Igc => Ok(igc::encode(track)),
            TrackFormat::Tcx => Ok(tcx::encode(track)),
            TrackFormat::Fit => Err(EncodeError::UnsupportedTarget(TrackFormat::Fit)),
        }
    }
}

impl fmt::Display for TrackFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TrackFormat::Gpx => "GPX",
            TrackFormat::Kml => "KML",
            TrackFormat::Igc => "IGC",
            TrackFormat::Tcx => "TCX",
            TrackFormat::Fit => "FIT",
        })
    }
}

/// Text formats are read the way a browser would: invalid UTF-8 is replaced
/// rather than rejected, and a leading BOM is dropped.
fn as_text(content: &[u8]) -> Cow<'_, str> {
    let content = content.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(content);
    String::from_utf8_lossy(content)
}

/// A decoded track: one file, one ordered point sequence.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Track {
    #[cfg_attr(feature = "serde", serde(rename = "format"))]
    pub source_format: TrackFormat,
    /// Points in recording order
    pub points: Vec<TrackPoint>,
    pub name: String,
    pub description: String,
}

impl Track {
    /// Build a track, failing with [`DecodeError::NoPoints`] when `points` is empty.
    pub fn from_points(
        points: Vec<TrackPoint>,
        name: impl Into<String>,
        description: impl Into<String>,
        source_format: TrackFormat,
    ) -> Result<Self, DecodeError> {
        if points.is_empty() {
            return Err(DecodeError::NoPoints);
        }
        Ok(Self {
            source_format,
            points,
            name: name.into(),
            description: description.into(),
        })
    }

    pub fn altitude_stats(&self) -> AltitudeStats {
        stats::analyze(&self.points)
    }

    pub fn bounds(&self) -> Option<Bounds> {
        geo_utils::compute_bounds(&self.points)
    }

    /// Centroid as `(lat, lon)`.
    pub fn center(&self) -> Option<(f64, f64)> {
        geo_utils::compute_center(&self.points)
    }

    /// Horizontal length in meters.
    pub fn length_meters(&self) -> f64 {
        geo_utils::polyline_length(&self.points)
    }

    /// Serialize to the interchange JSON shape
    /// `{format, points: [{lat, lon, elevation, timestamp}], name, description}`.
    #[cfg(feature = "serde")]
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    #[cfg(feature = "serde")]
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// Decoder settings.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DecodeConfig {
    /// Heuristic FIT scanner settings
    pub fit: FitScanConfig,
}

// ============================================================================
// Core Functions
// ============================================================================

/// Decode a file, picking the format from its extension.
///
/// # Example
/// ```
/// use track_converter::{decode, TrackError};
///
/// let err = decode("notes.txt", b"hello").unwrap_err();
/// assert!(matches!(err, TrackError::UnsupportedFormat { .. }));
/// ```
pub fn decode(file_name: &str, content: &[u8]) -> Result<Track, TrackError> {
    decode_with_config(file_name, content, &DecodeConfig::default())
}

pub fn decode_with_config(
    file_name: &str,
    content: &[u8],
    config: &DecodeConfig,
) -> Result<Track, TrackError> {
    let format = TrackFormat::from_path(file_name).ok_or_else(|| TrackError::UnsupportedFormat {
        file_name: file_name.to_string(),
    })?;

    info!("[track] decoding {} as {} ({} bytes)", file_name, format, content.len());

    match format.decode(content, config) {
        Ok(track) => {
            info!("[track] {}: {} points", file_name, track.points.len());
            Ok(track)
        }
        Err(source) => {
            warn!("[track] {} rejected: {}", file_name, source);
            Err(TrackError::Decode {
                file_name: file_name.to_string(),
                format,
                source,
            })
        }
    }
}

/// Serialize a track to one of the text formats.
pub fn encode(track: &Track, format: TrackFormat) -> Result<String, TrackError> {
    format
        .encode(track)
        .map_err(|source| TrackError::Encode { format, source })
}

/// Read and decode a file from disk.
pub fn read_track_file(path: impl AsRef<Path>) -> Result<Track, TrackError> {
    let path = path.as_ref();
    let content = std::fs::read(path).map_err(|source| TrackError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    decode(&file_name, &content)
}

/// Decode many `(file_name, content)` pairs. Results keep the input order.
#[cfg(feature = "parallel")]
pub fn decode_batch(files: &[(String, Vec<u8>)], config: &DecodeConfig) -> Vec<Result<Track, TrackError>> {
    use rayon::prelude::*;

    files
        .par_iter()
        .map(|(name, content)| decode_with_config(name, content, config))
        .collect()
}

/// Decode many `(file_name, content)` pairs. Results keep the input order.
#[cfg(not(feature = "parallel"))]
pub fn decode_batch(files: &[(String, Vec<u8>)], config: &DecodeConfig) -> Vec<Result<Track, TrackError>> {
    files
        .iter()
        .map(|(name, content)| decode_with_config(name, content, config))
        .collect()
}

// ============================================================================
// Tests
// ============================================================================
