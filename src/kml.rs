//! KML codec.
//!
//! Every `Placemark` contributes its `LineString` coordinates as a line and
//! its `Point` coordinates as single positions, in document order.

use log::debug;

use crate::geometry::{extract_points, FeatureCollection, Geometry, Position};
use crate::markup::{escape, parse_document, parse_f64, Element};
use crate::{DecodeError, Track, TrackFormat};

const DEFAULT_NAME: &str = "GPS Track";

/// Parse a KML `coordinates` list.
///
/// Tuples are `lon,lat[,ele]` separated by any whitespace, newlines included.
pub fn parse_coordinates(text: &str) -> Vec<Position> {
    text.split_whitespace()
        .map(|tuple| {
            let mut parts = tuple.split(',').map(parse_f64);
            let longitude = parts.next().flatten();
            let latitude = parts.next().flatten();
            let elevation = parts.next().flatten();
            Position::new(longitude, latitude, elevation)
        })
        .collect()
}

fn coordinates_of(element: &Element) -> Vec<Position> {
    element
        .child("coordinates")
        .map(|c| parse_coordinates(c.text()))
        .unwrap_or_default()
}

fn collect_geometry(root: &Element) -> FeatureCollection {
    let mut collection = FeatureCollection::default();

    for placemark in root.descendants("Placemark") {
        let name = placemark.child_text("name").map(str::to_string);
        for line in placemark.descendants("LineString") {
            collection.push(name.clone(), Geometry::LineString(coordinates_of(line)));
        }
        for point in placemark.descendants("Point") {
            if let Some(pos) = coordinates_of(point).into_iter().next() {
                collection.push(name.clone(), Geometry::Point(pos));
            }
        }
    }

    collection
}

/// Decode a KML document.
pub fn decode(content: &str) -> Result<Track, DecodeError> {
    let root = parse_document(content)?;
    let collection = collect_geometry(&root);
    let points = extract_points(&collection);
    debug!("[kml] {} points from {} geometries", points.len(), collection.features.len());

    let placemark = root.find("Placemark");
    let name = collection
        .first_name()
        .or_else(|| root.find("Document").and_then(|d| d.child_text("name")))
        .unwrap_or(DEFAULT_NAME);
    let description = placemark
        .and_then(|p| p.child_text("description"))
        .unwrap_or_default();

    Track::from_points(points, name, description, TrackFormat::Kml)
}

/// Encode a track as a KML document with one LineString placemark.
///
/// Elevation is appended only when non-zero.
pub fn encode(track: &Track) -> String {
    let name = escape(&track.name);
    let coordinates: Vec<String> = track
        .points
        .iter()
        .map(|pt| {
            if pt.elevation != 0.0 {
                format!("{},{},{}", pt.longitude, pt.latitude, pt.elevation)
            } else {
                format!("{},{}", pt.longitude, pt.latitude)
            }
        })
        .collect();

    let mut kml = String::new();
    kml.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    kml.push_str("<kml xmlns=\"http://www.opengis.net/kml/2.2\">\n");
    kml.push_str("  <Document>\n");
    kml.push_str(&format!("    <name>{}</name>\n", name));
    kml.push_str("    <Placemark>\n");
    kml.push_str(&format!("      <name>{}</name>\n", name));
    kml.push_str(&format!("      <description>{}</description>\n", escape(&track.description)));
    kml.push_str("      <LineString>\n");
    kml.push_str("        <coordinates>\n          ");
    kml.push_str(&coordinates.join("\n          "));
    kml.push_str("\n        </coordinates>\n");
    kml.push_str("      </LineString>\n");
    kml.push_str("    </Placemark>\n");
    kml.push_str("  </Document>\n");
    kml.push_str("</kml>\n");
    kml
}
