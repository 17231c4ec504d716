//! Error types for decoding and encoding tracks.
//!
//! Per-format decoders return [`DecodeError`], encoders return [`EncodeError`].
//! The top-level dispatch wraps both in [`TrackError`], which carries the file
//! name and format so the message can be shown to an end user as-is.

use std::path::PathBuf;

use thiserror::Error;

use crate::TrackFormat;

/// Why a single decode attempt failed.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DecodeError {
    /// The markup parser rejected the document.
    #[error("malformed markup: {0}")]
    Malformed(String),

    /// The file parsed but not a single usable point survived.
    #[error("no valid track points found")]
    NoPoints,

    /// The FIT salvage pipeline could not recover enough points.
    #[error("track too short or out of region ({found} points recovered, more than {required} needed)")]
    FitTooShort { found: usize, required: usize },

    /// The binary buffer is too small to hold even a FIT header.
    #[error("FIT buffer too short ({0} bytes)")]
    TruncatedFit(usize),
}

/// Why a track could not be serialized.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum EncodeError {
    #[error("cannot encode an empty track")]
    EmptyTrack,

    #[error("{0} export is not supported")]
    UnsupportedTarget(TrackFormat),
}

/// Caller-facing error, labelled with enough context to display.
#[derive(Debug, Error)]
pub enum TrackError {
    #[error("unsupported format for {file_name}: expected .gpx, .kml, .igc, .tcx or .fit")]
    UnsupportedFormat { file_name: String },

    #[error("failed to decode {file_name} as {format}: {source}")]
    Decode {
        file_name: String,
        format: TrackFormat,
        #[source]
        source: DecodeError,
    },

    #[error("failed to export {format}: {source}")]
    Encode {
        format: TrackFormat,
        #[source]
        source: EncodeError,
    },

    #[error("no track loaded")]
    NothingLoaded,

    #[error("cannot read {path}: {source}", path = .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
