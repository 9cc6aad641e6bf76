//! Example of running an analysis off the caller's task and discarding
//! stale results.
//!
//! Run with: cargo run --example async_analysis --features async

use region_visits::{
    analyze_region_visits_async, input_signature, AnalysisConfig, ProgressCallback, Region,
    RegionGeometry, Track, TrackPoint,
};
use std::sync::Arc;

#[tokio::main]
async fn main() {
    let regions = vec![Region::new(
        "lake",
        "Lake District",
        RegionGeometry::polygon_from_coords(&[vec![
            [-3.3, 54.3], [-2.8, 54.3], [-2.8, 54.7], [-3.3, 54.7], [-3.3, 54.3],
        ]]),
    )];

    let tracks = vec![Track::new(
        "hike-1",
        (0..200)
            .map(|i| TrackPoint::new(54.45 + i as f64 * 0.0005, -3.05).with_elevation(150.0 + i as f64))
            .collect(),
    )];

    // The host remembers which inputs it is currently showing
    let showing = input_signature(&tracks, &regions);

    let on_progress: ProgressCallback = Arc::new(|percent: u32, message: &str| {
        println!("  [{:>3}%] {}", percent, message);
    });

    let submitted = input_signature(&tracks, &regions);
    let result = analyze_region_visits_async(
        tracks,
        regions,
        AnalysisConfig::default(),
        Some(on_progress),
        None,
    )
    .await;

    if submitted != showing {
        println!("Inputs changed while analyzing, discarding result");
        return;
    }

    match result {
        Ok(visits) => {
            for record in visits.values() {
                println!("{}: visited={} by {:?}", record.region_name, record.visited, record.track_ids);
            }
        }
        Err(e) => eprintln!("Analysis failed: {}", e),
    }
}
