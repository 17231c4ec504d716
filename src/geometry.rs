//! Intermediate geometry produced by the markup decoders.
//!
//! GPX and KML documents can hold several segments, routes and placemarks.
//! Their decoders first collect these into a [`FeatureCollection`], and
//! [`extract_points`] flattens that collection into the canonical point
//! sequence, in document order.

use log::debug;

use crate::geo_utils::is_in_range;
use crate::{Timestamp, TrackPoint};

/// A position as read from the markup. Any field may be missing or unparseable.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Position {
    pub longitude: Option<f64>,
    pub latitude: Option<f64>,
    pub elevation: Option<f64>,
    pub timestamp: Option<Timestamp>,
}

impl Position {
    pub fn new(longitude: Option<f64>, latitude: Option<f64>, elevation: Option<f64>) -> Self {
        Self { longitude, latitude, elevation, timestamp: None }
    }

    fn to_track_point(self) -> Option<TrackPoint> {
        let (lat, lon) = (self.latitude?, self.longitude?);
        if !is_in_range(lat, lon) {
            return None;
        }
        let elevation = self.elevation.filter(|e| e.is_finite()).unwrap_or(0.0);
        Some(TrackPoint { longitude: lon, latitude: lat, elevation, timestamp: self.timestamp })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Geometry {
    LineString(Vec<Position>),
    Point(Position),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Feature {
    pub name: Option<String>,
    pub geometry: Geometry,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct FeatureCollection {
    pub features: Vec<Feature>,
}

impl FeatureCollection {
    pub fn push(&mut self, name: Option<String>, geometry: Geometry) {
        self.features.push(Feature { name, geometry });
    }

    /// Name of the first feature that has one.
    pub fn first_name(&self) -> Option<&str> {
        self.features.iter().find_map(|f| f.name.as_deref())
    }
}

/// Flatten every LineString and Point of `collection` into track points.
///
/// Positions without a latitude or longitude, or outside the WGS84 range, are
/// dropped. A missing elevation becomes 0.
pub fn extract_points(collection: &FeatureCollection) -> Vec<TrackPoint> {
    let mut points = Vec::new();
    let mut skipped = 0usize;

    let mut take = |pos: &Position, points: &mut Vec<TrackPoint>| match pos.to_track_point() {
        Some(p) => points.push(p),
        None => skipped += 1,
    };

    for feature in &collection.features {
        match &feature.geometry {
            Geometry::LineString(positions) => {
                for pos in positions {
                    take(pos, &mut points);
                }
            }
            Geometry::Point(pos) => take(pos, &mut points),
        }
    }

    if skipped > 0 {
        debug!("[geometry] skipped {} positions without usable coordinates", skipped);
    }
    points
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flattens_in_document_order() {
        let mut fc = FeatureCollection::default();
        fc.push(
            Some("segment".into()),
            Geometry::LineString(vec![
                Position::new(Some(5.0), Some(45.0), Some(200.0)),
                Position::new(Some(5.1), Some(45.1), None),
            ]),
        );
        fc.push(None, Geometry::Point(Position::new(Some(5.2), Some(45.2), Some(230.0))));

        let points = extract_points(&fc);
        assert_eq!(points.len(), 3);
        assert_eq!(points[0].elevation, 200.0);
        assert_eq!(points[1].elevation, 0.0);
        assert_eq!(points[2].longitude, 5.2);
    }

    #[test]
    fn test_first_name_skips_unnamed() {
        let mut fc = FeatureCollection::default();
        assert_eq!(fc.first_name(), None);
        fc.push(None, Geometry::LineString(Vec::new()));
        fc.push(Some("Belledonne".into()), Geometry::LineString(Vec::new()));
        fc.push(Some("Chartreuse".into()), Geometry::LineString(Vec::new()));
        assert_eq!(fc.first_name(), Some("Belledonne"));
    }

    #[test]
    fn test_drops_incomplete_and_out_of_range() {
        let mut fc = FeatureCollection::default();
        fc.push(
            None,
            Geometry::LineString(vec![
                Position::new(None, Some(45.0), None),
                Position::new(Some(5.0), None, None),
                Position::new(Some(5.0), Some(95.0), None),
                Position::new(Some(f64::NAN), Some(45.0), None),
                Position::new(Some(5.0), Some(45.0), Some(f64::NAN)),
            ]),
        );

        let points = extract_points(&fc);
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].elevation, 0.0);
    }
}
