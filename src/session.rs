//! Caller-owned holder for the last decoded track.
//!
//! A viewer loads one file at a time and may later export it. [`TrackSession`]
//! keeps that track together with its statistics. A failed load leaves the
//! previous track in place.

use log::info;

use crate::{decode_with_config, AltitudeStats, DecodeConfig, Track, TrackError, TrackFormat};

/// A successfully decoded file.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedTrack {
    pub file_name: String,
    pub track: Track,
    pub stats: AltitudeStats,
}

/// An encoded track ready to be saved or downloaded.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportPayload {
    /// `trace.<ext>`
    pub file_name: String,
    pub mime_type: &'static str,
    pub content: String,
}

#[derive(Debug, Default)]
pub struct TrackSession {
    config: DecodeConfig,
    current: Option<LoadedTrack>,
}

impl TrackSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: DecodeConfig) -> Self {
        Self { config, current: None }
    }

    /// Decode `content` and make it the current track.
    pub fn load(&mut self, file_name: &str, content: &[u8]) -> Result<&LoadedTrack, TrackError> {
        let track = decode_with_config(file_name, content, &self.config)?;
        let stats = track.altitude_stats();
        info!(
            "[session] loaded {} ({} points, flight: {})",
            file_name,
            track.points.len(),
            stats.is_flight
        );
        Ok(&*self.current.insert(LoadedTrack {
            file_name: file_name.to_string(),
            track,
            stats,
        }))
    }

    pub fn current(&self) -> Option<&LoadedTrack> {
        self.current.as_ref()
    }

    pub fn clear(&mut self) {
        self.current = None;
    }

    /// Encode the current track as `format`.
    pub fn export(&self, format: TrackFormat) -> Result<ExportPayload, TrackError> {
        let loaded = self.current.as_ref().ok_or(TrackError::NothingLoaded)?;
        let content = crate::encode(&loaded.track, format)?;
        Ok(ExportPayload {
            file_name: format!("trace.{}", format.extension()),
            mime_type: format.mime_type(),
            content,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const IGC: &str = "HFDTE010824\r\nHFPLTPILOTINCHARGE:Ana\r\n\
        B1000004510000N00600000EA0080000800\r\n\
        B1000054510100N00600100EA0090000900\r\n";

    #[test]
    fn test_load_then_export() {
        let mut session = TrackSession::new();
        let loaded = session.load("flight.igc", IGC.as_bytes()).unwrap();
        assert_eq!(loaded.track.points.len(), 2);
        assert_eq!(loaded.stats.total_gain, 100.0);

        let payload = session.export(TrackFormat::Kml).unwrap();
        assert_eq!(payload.file_name, "trace.kml");
        assert_eq!(payload.mime_type, "application/vnd.google-earth.kml+xml");
        assert!(payload.content.contains("<name>Ana</name>"));

        let payload = session.export(TrackFormat::Igc).unwrap();
        assert_eq!(payload.mime_type, "application/igc");
        assert!(payload.content.starts_with("AXXX"));
    }

    #[test]
    fn test_failed_load_keeps_previous_track() {
        let mut session = TrackSession::new();
        session.load("flight.igc", IGC.as_bytes()).unwrap();

        assert!(session.load("empty.gpx", b"<gpx></gpx>").is_err());
        assert!(session.load("notes.txt", b"hello").is_err());
        assert_eq!(session.current().unwrap().file_name, "flight.igc");
    }

    #[test]
    fn test_export_without_track() {
        let mut session = TrackSession::new();
        assert!(matches!(session.export(TrackFormat::Gpx), Err(TrackError::NothingLoaded)));

        session.load("flight.igc", IGC.as_bytes()).unwrap();
        session.clear();
        assert!(session.current().is_none());
        assert!(matches!(session.export(TrackFormat::Gpx), Err(TrackError::NothingLoaded)));
    }

    #[test]
    fn test_fit_export_rejected() {
        let mut session = TrackSession::new();
        session.load("flight.igc", IGC.as_bytes()).unwrap();
        assert!(matches!(session.export(TrackFormat::Fit), Err(TrackError::Encode { .. })));
    }
}
