//! Decode every track file in a directory in parallel.
//!
//! Run with: cargo run --example batch_decode --features parallel -- ./tracks

use std::time::Instant;

use track_converter::{decode_batch, DecodeConfig, TrackFormat};

fn main() {
    let dir = std::env::args().nth(1).unwrap_or_else(|| ".".to_string());

    let entries = match std::fs::read_dir(&dir) {
        Ok(entries) => entries,
        Err(err) => {
            eprintln!("cannot read {}: {}", dir, err);
            return;
        }
    };

    let files: Vec<(String, Vec<u8>)> = entries
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| TrackFormat::from_path(p).is_some())
        .filter_map(|p| {
            let bytes = std::fs::read(&p).ok()?;
            Some((p.file_name()?.to_string_lossy().into_owned(), bytes))
        })
        .collect();

    println!("Decoding {} files from {}\n", files.len(), dir);

    let start = Instant::now();
    let results = decode_batch(&files, &DecodeConfig::default());
    let elapsed = start.elapsed();

    let mut flights = 0;
    for ((name, _), result) in files.iter().zip(&results) {
        match result {
            Ok(track) => {
                let stats = track.altitude_stats();
                if stats.is_flight {
                    flights += 1;
                }
                println!(
                    "  {:<32} {:>6} points  {:>8.2} km  {}",
                    name,
                    track.points.len(),
                    track.length_meters() / 1000.0,
                    if stats.is_flight { "flight" } else { "ground" }
                );
            }
            Err(err) => println!("  {:<32} {}", name, err),
        }
    }

    let ok = results.iter().filter(|r| r.is_ok()).count();
    println!("\n{} decoded, {} failed, {} flights in {:?}", ok, results.len() - ok, flights, elapsed);
}
