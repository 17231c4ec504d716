//! IGC flight recorder codec.
//!
//! IGC is line oriented. Fixes are `B` records with a fixed layout:
//!
//! | Offset | Width | Field |
//! |--------|-------|-------|
//! | 0 | 1 | `B` |
//! | 1 | 6 | UTC time `HHMMSS` |
//! | 7 | 7 | latitude `DDMMmmm` (degrees, minutes x 1000) |
//! | 14 | 1 | `N` / `S` |
//! | 15 | 8 | longitude `DDDMMmmm` |
//! | 23 | 1 | `E` / `W` |
//! | 24 | 1 | fix validity |
//! | 25 | 5 | pressure altitude, meters |
//! | 30 | 5 | GPS altitude, meters |
//!
//! Reference: https://xp-soaring.github.io/igc_file_format/igc_format_2008.html
//!
//! A bad record is dropped and logged; the rest of the file is still used.

use chrono::{Datelike, NaiveDate, Utc};
use log::{debug, warn};
use thiserror::Error;

use crate::geo_utils::is_in_range;
use crate::{DecodeError, Track, TrackFormat, TrackPoint};

const DEFAULT_NAME: &str = "IGC Track";

/// Minimum length of a usable `B` record.
pub const B_RECORD_LEN: usize = 35;

/// Altitudes outside this range (meters) are treated as missing.
pub const ALTITUDE_RANGE: std::ops::RangeInclusive<i32> = -500..=15_000;

/// Seconds between synthesized fixes on export.
pub const EXPORT_INTERVAL_SECS: usize = 5;

/// Longest pilot name the header field holds on export.
pub const MAX_NAME_LEN: usize = 20;

#[derive(Debug, Error, PartialEq)]
enum FixError {
    #[error("invalid latitude")]
    Latitude,
    #[error("invalid longitude")]
    Longitude,
    #[error("coordinates out of range ({0:.5}, {1:.5})")]
    OutOfRange(f64, f64),
}

fn digits(record: &[u8], start: usize, len: usize) -> Option<u32> {
    let field = record.get(start..start + len)?;
    if !field.iter().all(u8::is_ascii_digit) {
        return None;
    }
    std::str::from_utf8(field).ok()?.parse().ok()
}

fn altitude(record: &[u8], start: usize) -> Option<i32> {
    let field = record.get(start..start + 5)?;
    std::str::from_utf8(field).ok()?.trim().parse().ok()
}

/// Decode `DDMMmmm` + hemisphere into signed degrees.
fn angle(record: &[u8], start: usize, deg_len: usize, positive: u8, negative: u8) -> Option<f64> {
    let degrees = digits(record, start, deg_len)?;
    let thousandths = digits(record, start + deg_len, 5)?;
    let value = degrees as f64 + thousandths as f64 / 1000.0 / 60.0;
    match record.get(start + deg_len + 5)? {
        h if *h == positive => Some(value),
        h if *h == negative => Some(-value),
        _ => None,
    }
}

/// Prefer GPS altitude, then pressure altitude, when inside [`ALTITUDE_RANGE`].
fn select_altitude(record: &[u8]) -> f64 {
    [altitude(record, 30), altitude(record, 25)]
        .into_iter()
        .flatten()
        .find(|alt| ALTITUDE_RANGE.contains(alt))
        .map_or(0.0, f64::from)
}

fn parse_fix(record: &[u8]) -> Result<TrackPoint, FixError> {
    let latitude = angle(record, 7, 2, b'N', b'S').ok_or(FixError::Latitude)?;
    let longitude = angle(record, 15, 3, b'E', b'W').ok_or(FixError::Longitude)?;
    if !is_in_range(latitude, longitude) {
        return Err(FixError::OutOfRange(latitude, longitude));
    }
    Ok(TrackPoint::new(latitude, longitude, select_altitude(record)))
}

/// Value of an `H` record: the text after the first `:`, or after the
/// five-character record code when there is no colon.
fn header_value(line: &str) -> &str {
    match line.split_once(':') {
        Some((_, value)) => value.trim(),
        None => line.get(5..).unwrap_or_default().trim(),
    }
}

/// `HFDTE` carries `DDMMYY`, optionally behind `DATE:`.
fn parse_date(line: &str) -> Option<NaiveDate> {
    let value = header_value(line);
    let value = value.strip_prefix("DATE").unwrap_or(value);
    let day = value.get(0..2)?.parse().ok()?;
    let month = value.get(2..4)?.parse().ok()?;
    let year: i32 = value.get(4..6)?.parse().ok()?;
    NaiveDate::from_ymd_opt(2000 + year, month, day)
}

/// Decode an IGC file.
pub fn decode(content: &str) -> Result<Track, DecodeError> {
    let mut points = Vec::new();
    let mut pilot: Option<String> = None;
    let mut date: Option<NaiveDate> = None;
    let mut discarded = 0usize;

    for (index, line) in content.lines().enumerate() {
        let record = line.as_bytes();
        match record.first() {
            Some(b'B') if record.len() >= B_RECORD_LEN => match parse_fix(record) {
                Ok(point) => points.push(point),
                Err(reason) => {
                    warn!("[igc] discarding B record on line {}: {}", index + 1, reason);
                    discarded += 1;
                }
            },
            Some(b'H') => match line.get(2..5) {
                Some("PLT") => {
                    let value = header_value(line);
                    if !value.is_empty() {
                        pilot = Some(value.to_string());
                    }
                }
                Some("DTE") => date = parse_date(line),
                _ => {}
            },
            _ => {}
        }
    }

    debug!("[igc] {} fixes kept, {} discarded", points.len(), discarded);

    let description = match date {
        Some(d) => format!("Date: {}", d.format("%d/%m/%Y")),
        None => "Date: unknown".to_string(),
    };
    Track::from_points(
        points,
        pilot.unwrap_or_else(|| DEFAULT_NAME.to_string()),
        description,
        TrackFormat::Igc,
    )
}

/// Keep `[A-Za-z0-9 ]`, at most [`MAX_NAME_LEN`] characters.
pub fn sanitize_name(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == ' ')
        .take(MAX_NAME_LEN)
        .collect()
}

/// Encode degrees as degrees + minutes x 1000 + hemisphere, e.g. `5207000N`.
fn encode_angle(value: f64, deg_width: usize, positive: char, negative: char) -> String {
    let hemisphere = if value >= 0.0 { positive } else { negative };
    let thousandths = (value.abs() * 60_000.0).round() as u64;
    format!(
        "{:0width$}{:05}{}",
        thousandths / 60_000,
        thousandths % 60_000,
        hemisphere,
        width = deg_width
    )
}

/// `HHMMSS` for fix `index`, wrapping at midnight.
fn synthetic_time(index: usize) -> String {
    let secs = (index * EXPORT_INTERVAL_SECS) % 86_400;
    format!("{:02}{:02}{:02}", secs / 3600, (secs % 3600) / 60, secs % 60)
}

/// Encode a track as IGC with CRLF line endings.
///
/// This is lossy by construction: the name is reduced by [`sanitize_name`],
/// fix times are synthesized every [`EXPORT_INTERVAL_SECS`] seconds from
/// midnight (recorded timestamps are not written), and the same altitude
/// goes into both altitude fields.
pub fn encode(track: &Track) -> String {
    let date = track
        .points
        .iter()
        .find_map(|p| p.timestamp)
        .map(|ts| ts.date_naive())
        .unwrap_or_else(|| Utc::now().date_naive());

    let mut igc = String::new();
    igc.push_str("AXXX track-converter\r\n");
    igc.push_str(&format!(
        "HFDTE{:02}{:02}{:02}\r\n",
        date.day(),
        date.month(),
        date.year() % 100
    ));
    igc.push_str(&format!("HFPLTPILOTINCHARGE:{}\r\n", sanitize_name(&track.name)));

    for (idx, pt) in track.points.iter().enumerate() {
        let alt = (pt.elevation.round() as i64).clamp(-9_999, 99_999);
        igc.push_str(&format!(
            "B{}{}{}A{:05}{:05}\r\n",
            synthetic_time(idx),
            encode_angle(pt.latitude, 2, 'N', 'S'),
            encode_angle(pt.longitude, 3, 'E', 'W'),
            alt,
            alt
        ));
    }

    igc
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(a: f64, b: f64, epsilon: f64) -> bool {
        (a - b).abs() < epsilon
    }

    #[test]
    fn test_reference_b_record() {
        let track = decode("B1012345207000N00036000EA0050000500\n").unwrap();
        assert_eq!(track.points.len(), 1);
        let p = track.points[0];
        assert!(approx_eq(p.latitude, 52.1167, 1e-4));
        assert!(approx_eq(p.longitude, 0.6000, 1e-4));
        assert_eq!(p.elevation, 500.0);
        assert!(p.timestamp.is_none());
    }

    #[test]
    fn test_southern_western_hemispheres() {
        let track = decode("B0000003330000S07030000WA0012000150").unwrap();
        let p = track.points[0];
        assert!(approx_eq(p.latitude, -33.5, 1e-9));
        assert!(approx_eq(p.longitude, -70.5, 1e-9));
        assert_eq!(p.elevation, 150.0);
    }

    #[test]
    fn test_altitude_selection() {
        // GPS altitude out of range: fall back to pressure
        let track = decode("B1012345207000N00036000EA0123099999").unwrap();
        assert_eq!(track.points[0].elevation, 1230.0);
        // both out of range
        let track = decode("B1012345207000N00036000EA9999999999").unwrap();
        assert_eq!(track.points[0].elevation, 0.0);
        // negative GPS altitude is in range
        let track = decode("B1012345207000N00036000EA00100-0050").unwrap();
        assert_eq!(track.points[0].elevation, -50.0);
    }

    #[test]
    fn test_bad_hemispheres_are_discarded() {
        let mut igc = String::from("AXXX logger\nHFDTE150723\n");
        for i in 0..10 {
            let hemisphere = if i % 3 == 0 && i > 0 { 'X' } else { 'N' };
            igc.push_str(&format!("B10{:02}004512000{}00543000EA0100001000\n", i, hemisphere));
        }
        let track = decode(&igc).unwrap();
        assert_eq!(track.points.len(), 7);
        assert_eq!(track.description, "Date: 15/07/2023");
    }

    #[test]
    fn test_short_and_foreign_lines_ignored() {
        let igc = "B101234\nLXXXcomment\nI013638FXA\nB1012345207000N00036000EA0050000500\nGREC\n";
        assert_eq!(decode(igc).unwrap().points.len(), 1);
    }

    #[test]
    fn test_bad_digits_and_range() {
        let igc = "B10123452O7000N00036000EA0050000500\nB1012349507000N00036000EA0050000500\n";
        assert_eq!(decode(igc), Err(DecodeError::NoPoints));
    }

    #[test]
    fn test_headers() {
        let igc = "HFDTEDATE:010824,01\r\nHFPLTPILOTINCHARGE: Marie Curie\r\nB1012345207000N00036000EA0050000500\r\n";
        let track = decode(igc).unwrap();
        assert_eq!(track.name, "Marie Curie");
        assert_eq!(track.description, "Date: 01/08/2024");

        let track = decode("B1012345207000N00036000EA0050000500").unwrap();
        assert_eq!(track.name, DEFAULT_NAME);
        assert_eq!(track.description, "Date: unknown");
    }

    #[test]
    fn test_encode_angle_fields() {
        assert_eq!(encode_angle(52.116666666, 2, 'N', 'S'), "5207000N");
        assert_eq!(encode_angle(-0.6, 3, 'E', 'W'), "00036000W");
        // rounding up to a full degree carries over
        assert_eq!(encode_angle(44.9999999, 2, 'N', 'S'), "4500000N");
    }

    #[test]
    fn test_encode_record_layout() {
        let track = Track::from_points(
            vec![TrackPoint::new(52.1166666, 0.6, 500.0); 3],
            "Flight #1 / Zoë's longest name ever",
            "",
            TrackFormat::Gpx,
        )
        .unwrap();
        let igc = encode(&track);
        let lines: Vec<&str> = igc.lines().collect();
        assert_eq!(lines[2], "HFPLTPILOTINCHARGE:Flight 1  Zos longes");
        assert_eq!(lines[3], "B0000005207000N00036000EA0050000500");
        assert_eq!(lines[5], "B0000105207000N00036000EA0050000500");
        assert!(lines[3..].iter().all(|l| l.len() == B_RECORD_LEN));
    }

    #[test]
    fn test_synthetic_time_wraps() {
        assert_eq!(synthetic_time(0), "000000");
        assert_eq!(synthetic_time(12), "000100");
        assert_eq!(synthetic_time(720), "010000");
        assert_eq!(synthetic_time(17_280), "000000");
    }

    #[test]
    fn test_sanitize_name() {
        assert_eq!(sanitize_name("Vol du 14/07 à Annecy!"), "Vol du 1407  Annecy");
        assert_eq!(sanitize_name("abcdefghijklmnopqrstuvwxyz").len(), MAX_NAME_LEN);
    }
}
