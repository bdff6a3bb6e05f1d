//! Download trails around a point from the Overpass API and save them as an
//! area under a temporary directory.
//!
//! Run with: cargo run --example overpass_download --features http -- 36.88 -107.855

use std::env;

use trail_matcher::{
    area_label, Area, DirectoryBackend, GeoPoint, OverpassClient, OverpassConfig, StoreConfig,
    TrailStore,
};

fn main() {
    let args: Vec<f64> = env::args().skip(1).filter_map(|a| a.parse().ok()).collect();
    let center = match args.as_slice() {
        [lat, lon, ..] => GeoPoint::new(*lat, *lon),
        _ => GeoPoint::new(36.88, -107.855),
    };

    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .unwrap();

    let config = OverpassConfig::default();
    println!(
        "Downloading trails within {} miles of ({}, {})...",
        config.radius_miles, center.lat, center.lon
    );

    let client = OverpassClient::new(config).unwrap();
    let trails = rt.block_on(client.download_trails_near(center));

    if trails.is_empty() {
        println!("No trails found nearby. Check the connection.");
        return;
    }

    let base = env::temp_dir().join("trail-matcher-demo");
    let store = TrailStore::new(DirectoryBackend::open(&base, &StoreConfig::default()).unwrap());
    let name = area_label(None, None, None, &center);
    store
        .save_area(&Area::new(name.clone(), center, trails))
        .unwrap();

    for summary in store.summaries().unwrap() {
        println!(
            "{}: {} trails, {:.1} km",
            summary.name,
            summary.trail_count,
            summary.total_length_meters / 1000.0
        );
        for preview in &summary.preview_names {
            println!("  - {}", preview);
        }
    }
    println!("Saved '{}' under {}", name, base.display());
}
