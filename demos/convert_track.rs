//! Convert a track file to another format and print its elevation summary.
//!
//! Run with: cargo run --example convert_track -- flight.igc gpx

use std::process::ExitCode;

use track_converter::{TrackFormat, TrackSession};

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().collect();
    if args.len() != 3 {
        eprintln!("usage: {} <input file> <gpx|kml|igc|tcx>", args[0]);
        return ExitCode::FAILURE;
    }

    let Some(target) = TrackFormat::from_extension(&args[2]) else {
        eprintln!("unknown target format: {}", args[2]);
        return ExitCode::FAILURE;
    };

    let bytes = match std::fs::read(&args[1]) {
        Ok(bytes) => bytes,
        Err(err) => {
            eprintln!("cannot read {}: {}", args[1], err);
            return ExitCode::FAILURE;
        }
    };

    let mut session = TrackSession::new();
    let loaded = match session.load(&args[1], &bytes) {
        Ok(loaded) => loaded,
        Err(err) => {
            eprintln!("{}", err);
            return ExitCode::FAILURE;
        }
    };
    let track = &loaded.track;

    println!("Track: {} ({})", track.name, track.source_format);
    println!("  Points: {}", track.points.len());
    println!("  Length: {:.2} km", track.length_meters() / 1000.0);
    if let Some(bounds) = track.bounds() {
        println!(
            "  Bounds: {:.5},{:.5} .. {:.5},{:.5}",
            bounds.min_lat, bounds.min_lng, bounds.max_lat, bounds.max_lng
        );
    }

    let stats = &loaded.stats;
    if stats.has_altitude {
        println!("  Altitude: {:.0}m - {:.0}m (avg {:.0}m)", stats.min, stats.max, stats.avg);
        println!("  Gain/loss: +{:.0}m / -{:.0}m", stats.total_gain, stats.total_loss);
        println!("  Flight: {}", if stats.is_flight { "yes" } else { "no" });
    } else {
        println!("  No altitude data");
    }

    match session.export(target) {
        Ok(payload) => match std::fs::write(&payload.file_name, &payload.content) {
            Ok(()) => {
                println!("\nWrote {} ({}, {} bytes)", payload.file_name, payload.mime_type, payload.content.len());
                ExitCode::SUCCESS
            }
            Err(err) => {
                eprintln!("cannot write {}: {}", payload.file_name, err);
                ExitCode::FAILURE
            }
        },
        Err(err) => {
            eprintln!("{}", err);
            ExitCode::FAILURE
        }
    }
}
