//! Basic example of finding which regions a few GPS tracks passed through.
//!
//! Run with: cargo run --example basic_analysis

use region_visits::{
    analyze_region_visits, visited_regions, AnalysisConfig, Region, RegionGeometry, Track,
    TrackPoint,
};

fn rectangle(min_lng: f64, min_lat: f64, max_lng: f64, max_lat: f64) -> Vec<[f64; 2]> {
    vec![
        [min_lng, min_lat],
        [max_lng, min_lat],
        [max_lng, max_lat],
        [min_lng, max_lat],
        [min_lng, min_lat],
    ]
}

fn main() {
    // Rough boxes around three Swiss cities, one with a lake-shaped hole
    let regions = vec![
        Region::new(
            "zurich",
            "Zürich",
            RegionGeometry::polygon_from_coords(&[
                rectangle(8.45, 47.32, 8.62, 47.43),
                rectangle(8.54, 47.33, 8.58, 47.36), // lake
            ]),
        ),
        Region::new(
            "bern",
            "Bern",
            RegionGeometry::polygon_from_coords(&[rectangle(7.38, 46.92, 7.50, 46.99)]),
        ),
        Region::new(
            "geneva",
            "Geneva",
            RegionGeometry::multi_polygon_from_coords(&[
                vec![rectangle(6.10, 46.18, 6.17, 46.23)],
                vec![rectangle(6.17, 46.15, 6.25, 46.22)],
            ]),
        ),
    ];

    // Zürich city run
    let run = Track::new(
        "run-1",
        (0..50)
            .map(|i| TrackPoint::new(47.37 + i as f64 * 0.001, 8.50 + i as f64 * 0.001))
            .collect(),
    );

    // Train ride Bern -> Zürich, crossing both regions
    let train = Track::new(
        "train-1",
        (0..=100)
            .map(|i| {
                let f = i as f64 / 100.0;
                TrackPoint::new(46.95 + f * 0.43, 7.44 + f * 1.10).with_timestamp(1_700_000_000 + i * 30)
            })
            .collect(),
    );

    // A boat trip that stays on the lake
    let boat = Track::new(
        "boat-1",
        vec![TrackPoint::new(47.34, 8.55), TrackPoint::new(47.35, 8.56)],
    );

    let tracks = vec![run, train, boat];
    let config = AnalysisConfig::default();

    println!("Region Visit Analysis Example\n");
    println!(
        "Config: grid_size={}°, sample_budget={}\n",
        config.grid_size, config.sample_budget
    );

    let on_progress = |percent: u32, message: &str| println!("  [{:>3}%] {}", percent, message);

    let visits = match analyze_region_visits(&tracks, &regions, Some(&on_progress), Some(&config)) {
        Ok(visits) => visits,
        Err(e) => {
            eprintln!("Analysis failed: {}", e);
            return;
        }
    };

    println!("\nVisited regions:");
    for record in visited_regions(&visits) {
        println!(
            "  {} ({}): {} tracks {:?}",
            record.region_name, record.region_id, record.visit_count, record.track_ids
        );
    }

    let unvisited: Vec<&str> = regions
        .iter()
        .filter(|r| !visits[&r.id].visited)
        .map(|r| r.name.as_str())
        .collect();
    println!("\nNot visited: {:?}", unvisited);
}
