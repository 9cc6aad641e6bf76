//! Example of analyzing many tracks against a dense region grid.
//!
//! Run with: cargo run --example large_dataset --features parallel

use region_visits::{AnalysisConfig, Region, RegionGeometry, RegionVisitAnalyzer, Track, TrackPoint};
use std::time::Instant;

fn main() {
    println!("Large Dataset Region Visit Example\n");

    // 40 x 40 grid of 0.05° regions
    let mut regions = Vec::new();
    for row in 0..40 {
        for col in 0..40 {
            let min_lat = 46.0 + row as f64 * 0.05;
            let min_lng = 6.0 + col as f64 * 0.05;
            regions.push(Region::new(
                format!("cell-{}-{}", row, col),
                format!("Cell {}/{}", row, col),
                RegionGeometry::polygon_from_coords(&[vec![
                    [min_lng, min_lat],
                    [min_lng + 0.05, min_lat],
                    [min_lng + 0.05, min_lat + 0.05],
                    [min_lng, min_lat + 0.05],
                    [min_lng, min_lat],
                ]]),
            ));
        }
    }

    // 500 tracks of 2000 points each, spiralling out from different centers
    let tracks: Vec<Track> = (0..500)
        .map(|t| {
            let center_lat = 46.2 + (t % 20) as f64 * 0.08;
            let center_lng = 6.2 + (t / 20) as f64 * 0.06;
            let points = (0..2000)
                .map(|i| {
                    let angle = i as f64 * 0.01;
                    let radius = 0.0001 * i as f64;
                    TrackPoint::new(center_lat + radius * angle.sin(), center_lng + radius * angle.cos())
                })
                .collect();
            Track::new(format!("activity-{}", t), points)
        })
        .collect();

    println!("{} regions, {} tracks\n", regions.len(), tracks.len());

    for (label, config) in [
        ("default", AnalysisConfig::default()),
        ("fine grid", AnalysisConfig { grid_size: 0.02, ..AnalysisConfig::default() }),
        ("full sampling", AnalysisConfig { sample_budget: 2000, ..AnalysisConfig::default() }),
    ] {
        let mut analyzer = match RegionVisitAnalyzer::new(config) {
            Ok(a) => a,
            Err(e) => {
                eprintln!("{}: {}", label, e);
                continue;
            }
        };

        let start = Instant::now();
        let visits = match analyzer.analyze(&tracks, &regions, None) {
            Ok(v) => v,
            Err(e) => {
                eprintln!("{}: {}", label, e);
                continue;
            }
        };
        let elapsed = start.elapsed();

        let visited = visits.values().filter(|v| v.visited).count();
        let total_visits: u32 = visits.values().map(|v| v.visit_count).sum();
        println!(
            "{:>14}: {} regions visited, {} region visits in {:?}",
            label, visited, total_visits, elapsed
        );
    }
}
