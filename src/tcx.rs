//! Garmin Training Center (TCX) codec.
//!
//! Reads `Trackpoint` elements from both activities and courses. A trackpoint
//! without a `Position` (a pause, or a heart-rate-only sample) is skipped.

use chrono::{Duration, SecondsFormat, Utc};
use log::debug;

use crate::geometry::{extract_points, FeatureCollection, Geometry, Position};
use crate::markup::{escape, parse_document, parse_timestamp, Element};
use crate::{DecodeError, Timestamp, Track, TrackFormat};

const DEFAULT_NAME: &str = "TCX Track";

fn position(trackpoint: &Element) -> Position {
    let pos = trackpoint.child("Position");
    Position {
        longitude: pos.and_then(|p| p.child_f64("LongitudeDegrees")),
        latitude: pos.and_then(|p| p.child_f64("LatitudeDegrees")),
        elevation: trackpoint.child_f64("AltitudeMeters"),
        timestamp: trackpoint.child_text("Time").and_then(parse_timestamp),
    }
}

/// Decode a TCX document.
pub fn decode(content: &str) -> Result<Track, DecodeError> {
    let root = parse_document(content)?;

    let mut collection = FeatureCollection::default();
    for track in root.descendants("Track") {
        let line = track.descendants("Trackpoint").into_iter().map(position).collect();
        collection.push(None, Geometry::LineString(line));
    }
    let points = extract_points(&collection);
    debug!("[tcx] {} points from {} tracks", points.len(), collection.features.len());

    let activity = root.find("Activity");
    let name = root
        .find("Course")
        .and_then(|c| c.child_text("Name"))
        .or_else(|| activity.and_then(|a| a.child_text("Id")))
        .unwrap_or(DEFAULT_NAME);
    let description = activity.and_then(|a| a.child_text("Notes")).unwrap_or_default();

    Track::from_points(points, name, description, TrackFormat::Tcx)
}

/// Encode a track as a single TCX activity.
///
/// TCX requires a time on every trackpoint. Points without one get a
/// synthesized time one second after the previous index, counted from the
/// first timestamp in the track, or from now if the track has none. The
/// track name is not part of the activity schema and is not written.
pub fn encode(track: &Track) -> String {
    let start: Timestamp = track
        .points
        .iter()
        .find_map(|p| p.timestamp)
        .unwrap_or_else(|| Utc::now().into());
    let start_text = start.to_rfc3339_opts(SecondsFormat::AutoSi, true);

    let mut tcx = String::new();
    tcx.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    tcx.push_str(
        "<TrainingCenterDatabase xmlns=\"http://www.garmin.com/xmlschemas/TrainingCenterDatabase/v2\">\n",
    );
    tcx.push_str("  <Activities>\n");
    tcx.push_str("    <Activity Sport=\"Other\">\n");
    tcx.push_str(&format!("      <Id>{}</Id>\n", start_text));
    tcx.push_str(&format!("      <Lap StartTime=\"{}\">\n", start_text));
    tcx.push_str("        <Track>\n");

    for (idx, pt) in track.points.iter().enumerate() {
        let time = pt
            .timestamp
            .unwrap_or_else(|| start + Duration::seconds(idx as i64));
        tcx.push_str("          <Trackpoint>\n");
        tcx.push_str(&format!(
            "            <Time>{}</Time>\n",
            time.to_rfc3339_opts(SecondsFormat::AutoSi, true)
        ));
        tcx.push_str("            <Position>\n");
        tcx.push_str(&format!("              <LatitudeDegrees>{}</LatitudeDegrees>\n", pt.latitude));
        tcx.push_str(&format!("              <LongitudeDegrees>{}</LongitudeDegrees>\n", pt.longitude));
        tcx.push_str("            </Position>\n");
        if pt.elevation != 0.0 {
            tcx.push_str(&format!("            <AltitudeMeters>{}</AltitudeMeters>\n", pt.elevation));
        }
        tcx.push_str("          </Trackpoint>\n");
    }

    tcx.push_str("        </Track>\n");
    tcx.push_str("      </Lap>\n");
    if !track.description.is_empty() {
        tcx.push_str(&format!("      <Notes>{}</Notes>\n", escape(&track.description)));
    }
    tcx.push_str("    </Activity>\n");
    tcx.push_str("  </Activities>\n");
    tcx.push_str("</TrainingCenterDatabase>\n");
    tcx
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TrackPoint;

    const SAMPLE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<TrainingCenterDatabase xmlns="http://www.garmin.com/xmlschemas/TrainingCenterDatabase/v2">
  <Activities>
    <Activity Sport="Biking">
      <Id>2024-05-04T07:30:00Z</Id>
      <Lap StartTime="2024-05-04T07:30:00Z">
        <Track>
          <Trackpoint>
            <Time>2024-05-04T07:30:00Z</Time>
            <Position><LatitudeDegrees>45.20</LatitudeDegrees><LongitudeDegrees>5.70</LongitudeDegrees></Position>
            <AltitudeMeters>220.0</AltitudeMeters>
          </Trackpoint>
          <Trackpoint>
            <Time>2024-05-04T07:30:05Z</Time>
            <HeartRateBpm><Value>120</Value></HeartRateBpm>
          </Trackpoint>
          <Trackpoint>
            <Time>2024-05-04T07:30:10Z</Time>
            <Position><LatitudeDegrees>45.21</LatitudeDegrees><LongitudeDegrees>5.71</LongitudeDegrees></Position>
          </Trackpoint>
        </Track>
      </Lap>
      <Notes>Commute</Notes>
    </Activity>
  </Activities>
</TrainingCenterDatabase>"#;

    #[test]
    fn test_decode_skips_positionless_points() {
        let track = decode(SAMPLE).unwrap();
        assert_eq!(track.points.len(), 2);
        assert_eq!(track.name, "2024-05-04T07:30:00Z");
        assert_eq!(track.description, "Commute");
        assert_eq!(track.points[0].elevation, 220.0);
        assert_eq!(track.points[1].elevation, 0.0);
        assert!(track.points[1].timestamp.is_some());
    }

    #[test]
    fn test_course_name_preferred() {
        let tcx = r#"<TrainingCenterDatabase><Courses><Course><Name>Loop</Name><Track>
            <Trackpoint><Position><LatitudeDegrees>45</LatitudeDegrees><LongitudeDegrees>5</LongitudeDegrees></Position></Trackpoint>
        </Track></Course></Courses></TrainingCenterDatabase>"#;
        let track = decode(tcx).unwrap();
        assert_eq!(track.name, "Loop");
        assert_eq!(track.points.len(), 1);
    }

    #[test]
    fn test_encode_synthesizes_missing_times() {
        let start = parse_timestamp("2024-05-04T07:30:00Z").unwrap();
        let track = Track::from_points(
            vec![
                TrackPoint::new(45.0, 5.0, 100.0).with_timestamp(start),
                TrackPoint::new(45.1, 5.1, 0.0),
            ],
            "Ride",
            "Tom & Jerry",
            TrackFormat::Gpx,
        )
        .unwrap();
        let tcx = encode(&track);
        assert!(tcx.contains("<Time>2024-05-04T07:30:01Z</Time>"));
        assert!(tcx.contains("<Notes>Tom &amp; Jerry</Notes>"));
        assert_eq!(tcx.matches("<AltitudeMeters>").count(), 1);
    }
}
