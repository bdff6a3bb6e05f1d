//! Ride a synthetic track past a couple of trails and print the status
//! a rider would see.
//!
//! Run with: cargo run --example simulate_ride

use std::sync::mpsc;
use std::time::Duration;

use trail_matcher::{
    Area, GeoPoint, LocationSample, MemoryBackend, SessionConfig, TrackingSession, Trail,
    TrailStore,
};

const LEGACY_TRAILS: &str = r#"[
    {"id": 1, "name": "Road Apple", "difficulty": "1",
     "nodes": [{"lat": 36.8800, "lon": -107.8550}, {"lat": 36.8810, "lon": -107.8550},
               {"lat": 36.8820, "lon": -107.8550}]}
]"#;

fn main() {
    // A store seeded with a pre-area trails.json, as an old install would have
    let store = TrailStore::new(MemoryBackend::new().with_legacy(LEGACY_TRAILS));
    let migrated = store.migrate_old_trails();
    println!("Migrated {} legacy trails", migrated.len());

    store
        .save_area(&Area::new(
            "Farmington, NM",
            GeoPoint::new(36.7281, -108.2187),
            vec![Trail::new(
                2,
                "Lucky Stone",
                vec![GeoPoint::new(36.8800, -107.8530), GeoPoint::new(36.8810, -107.8530)],
            )
            .with_difficulty("2")],
        ))
        .unwrap();

    for summary in store.summaries().unwrap() {
        println!(
            "  {}: {} trails, {:.0}m total ({})",
            summary.name,
            summary.trail_count,
            summary.total_length_meters,
            summary.preview_names.join(", ")
        );
    }

    let trails = store.load_all_trails().unwrap();

    // Ride south toward Road Apple, along it, then east away from both trails
    let mut samples = Vec::new();
    for i in 0..8 {
        let lat = 36.8800 - 0.0025 + i as f64 * 0.0004;
        samples.push(LocationSample::new(GeoPoint::new(lat, -107.8552), Some(0.1)));
    }
    for i in 0..6 {
        let lon = -107.8552 + i as f64 * 0.0012;
        samples.push(LocationSample::new(GeoPoint::new(36.8805, lon), Some(90.0)));
    }

    let (tx, rx) = mpsc::channel();
    let mut session = TrackingSession::start(trails, SessionConfig::default(), move |update| {
        let _ = tx.send(update.clone());
    })
    .unwrap();

    println!("\nRide:");
    let total = samples.len();
    for sample in samples {
        session.push(sample);
    }

    for _ in 0..total {
        let Ok(update) = rx.recv_timeout(Duration::from_secs(5)) else {
            break;
        };
        let distance = update.matched.as_ref().map_or(f64::INFINITY, |m| m.distance);
        let alert = if update.arrived { "  <beep>" } else { "" };
        println!(
            "  {:>7.1}m | {}{}",
            distance,
            update.status.replace('\n', " / "),
            alert
        );
    }

    session.stop();
    println!("\nFinal status: {}", session.latest_status().replace('\n', " / "));
}
