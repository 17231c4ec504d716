//! GPX 1.0 / 1.1 codec.
//!
//! Decoding reads every `trkseg` of every `trk` (and `rte` routes) as a line
//! of positions; `trkpt` elements missing `lat` or `lon` are skipped.
//! Encoding writes a single track with a single segment.

use chrono::{SecondsFormat, Utc};
use log::debug;

use crate::geometry::{extract_points, FeatureCollection, Geometry, Position};
use crate::markup::{escape, parse_document, parse_f64, parse_timestamp, Element};
use crate::{DecodeError, Track, TrackFormat};

const DEFAULT_NAME: &str = "GPS Track";

fn position(point: &Element) -> Position {
    Position {
        longitude: point.attr("lon").and_then(parse_f64),
        latitude: point.attr("lat").and_then(parse_f64),
        elevation: point.child_f64("ele"),
        timestamp: point.child_text("time").and_then(parse_timestamp),
    }
}

fn collect_geometry(root: &Element) -> FeatureCollection {
    let mut collection = FeatureCollection::default();

    for trk in root.descendants("trk") {
        let name = trk.child_text("name").map(str::to_string);
        let segments = trk.descendants("trkseg");
        if segments.is_empty() {
            // Some writers put trkpt directly under trk
            let line = trk.descendants("trkpt").into_iter().map(position).collect();
            collection.push(name, Geometry::LineString(line));
            continue;
        }
        for seg in segments {
            let line = seg.descendants("trkpt").into_iter().map(position).collect();
            collection.push(name.clone(), Geometry::LineString(line));
        }
    }

    for rte in root.descendants("rte") {
        let name = rte.child_text("name").map(str::to_string);
        let line = rte.children_named("rtept").map(position).collect();
        collection.push(name, Geometry::LineString(line));
    }

    collection
}

/// Decode a GPX document.
pub fn decode(content: &str) -> Result<Track, DecodeError> {
    let root = parse_document(content)?;
    let collection = collect_geometry(&root);
    let points = extract_points(&collection);
    debug!("[gpx] {} points from {} lines", points.len(), collection.features.len());

    let trk = root.child("trk");
    let metadata = root.child("metadata");
    let name = collection
        .first_name()
        .or_else(|| metadata.and_then(|m| m.child_text("name")))
        .unwrap_or(DEFAULT_NAME);
    let description = trk
        .and_then(|t| t.child_text("desc"))
        .or_else(|| metadata.and_then(|m| m.child_text("desc")))
        .unwrap_or_default();

    Track::from_points(points, name, description, TrackFormat::Gpx)
}

/// Encode a track as GPX 1.1.
///
/// Elevation is omitted for points at 0; timestamps are written only when
/// present. Coordinates use the shortest representation that parses back to
/// the same value.
pub fn encode(track: &Track) -> String {
    let name = escape(&track.name);
    let desc = escape(&track.description);

    let mut gpx = String::new();
    gpx.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    gpx.push_str("<gpx version=\"1.1\" creator=\"track-converter\" xmlns=\"http://www.topografix.com/GPX/1/1\">\n");
    gpx.push_str("  <metadata>\n");
    gpx.push_str(&format!("    <name>{}</name>\n", name));
    gpx.push_str(&format!("    <desc>{}</desc>\n", desc));
    gpx.push_str(&format!(
        "    <time>{}</time>\n",
        Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
    ));
    gpx.push_str("  </metadata>\n");
    gpx.push_str("  <trk>\n");
    gpx.push_str(&format!("    <name>{}</name>\n", name));
    gpx.push_str(&format!("    <desc>{}</desc>\n", desc));
    gpx.push_str("    <trkseg>\n");

    for pt in &track.points {
        gpx.push_str(&format!("      <trkpt lat=\"{}\" lon=\"{}\">\n", pt.latitude, pt.longitude));
        if pt.elevation != 0.0 {
            gpx.push_str(&format!("        <ele>{}</ele>\n", pt.elevation));
        }
        if let Some(ts) = pt.timestamp {
            gpx.push_str(&format!(
                "        <time>{}</time>\n",
                ts.to_rfc3339_opts(SecondsFormat::AutoSi, true)
            ));
        }
        gpx.push_str("      </trkpt>\n");
    }

    gpx.push_str("    </trkseg>\n");
    gpx.push_str("  </trk>\n");
    gpx.push_str("</gpx>\n");
    gpx
}
