//! Per-track region visit detection.
//!
//! For one track, sampled points are looked up in the spatial grid to get
//! candidate regions. Each candidate is rejected cheaply by bounding box
//! before the exact containment test runs. A region confirmed for the track
//! is never tested again for later points of the same track, so a track that
//! wanders in and out of a region is counted once.
//!
//! ## Sampling
//!
//! Only every `skip`-th point is examined, with
//! `skip = max(1, point_count / sample_budget)`. A track that clips a small
//! region between two sampled points is missed. This trades accuracy for a
//! bounded cost per track.

use std::collections::HashSet;

use log::debug;

use crate::analysis::{AnalysisConfig, VisitMap};
use crate::{contains, BoundingBoxCache, GeometryCache, Region, SpatialGrid, Track};

/// Distance between sampled point indices for a track of `point_count` points.
///
/// # Example
/// ```
/// use region_visits::sample_stride;
/// assert_eq!(sample_stride(100, 500), 1);
/// assert_eq!(sample_stride(5000, 500), 10);
/// assert_eq!(sample_stride(1499, 500), 2);
/// ```
#[inline]
pub fn sample_stride(point_count: usize, sample_budget: u32) -> usize {
    (point_count / (sample_budget.max(1) as usize)).max(1)
}

/// Record which regions `track` passes through.
///
/// Each region entered gets the track id added to its `track_ids` and its
/// `visit_count` bumped by one. Candidates with no cached bounding box, no
/// geometry in `regions`, or no entry in `visits` are skipped silently, as
/// are sampled points with non-finite or out-of-range coordinates.
///
/// Returns the number of regions newly confirmed for this track.
pub fn process_track(
    track: &Track,
    grid: &SpatialGrid,
    boxes: &BoundingBoxCache,
    geometries: &mut GeometryCache,
    visits: &mut VisitMap,
    regions: &[Region],
    config: &AnalysisConfig,
) -> usize {
    if track.points.is_empty() {
        return 0;
    }

    let skip = sample_stride(track.points.len(), config.sample_budget);
    let mut confirmed: HashSet<&str> = HashSet::new();
    let mut sampled = 0usize;

    for point in track.points.iter().step_by(skip) {
        if !point.is_valid() {
            continue;
        }
        sampled += 1;
        let (lat, lng) = (point.latitude, point.longitude);

        for cell in crate::adjacent_cells(lat, lng, grid.grid_size()) {
            for region_id in grid.regions_in(&cell) {
                if confirmed.contains(region_id.as_str()) {
                    continue;
                }

                let Some(bbox) = boxes.get(region_id) else {
                    continue;
                };
                if !bbox.contains(lat, lng) {
                    continue;
                }

                let Some(geometry) = geometries.get(region_id, regions) else {
                    continue;
                };
                if !contains(lat, lng, geometry) {
                    continue;
                }

                confirmed.insert(region_id.as_str());

                if let Some(record) = visits.get_mut(region_id.as_str()) {
                    // Tracks are identified by id; a repeated id counts once
                    if record.track_ids.insert(track.id.clone()) {
                        record.visit_count += 1;
                    }
                }
            }
        }
    }

    debug!(
        "[RegionVisits] Track {}: {} regions from {} sampled points (stride {})",
        track.id,
        confirmed.len(),
        sampled,
        skip
    );

    confirmed.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::VisitRecord;
    use crate::{RegionGeometry, TrackPoint};

    fn square_region(id: &str, min: f64, max: f64) -> Region {
        Region::new(
            id,
            format!("Region {}", id),
            RegionGeometry::polygon_from_coords(&[vec![
                [min, min], [max, min], [max, max], [min, max], [min, min],
            ]]),
        )
    }

    struct Fixture {
        regions: Vec<Region>,
        grid: SpatialGrid,
        boxes: BoundingBoxCache,
        geometries: GeometryCache,
        visits: VisitMap,
        config: AnalysisConfig,
    }

    impl Fixture {
        fn new(regions: Vec<Region>, config: AnalysisConfig) -> Self {
            let mut boxes = BoundingBoxCache::new();
            let grid = SpatialGrid::build(&regions, config.grid_size, &mut boxes);
            let visits = regions
                .iter()
                .map(|r| (r.id.clone(), VisitRecord::new(r)))
                .collect();
            Self {
                regions,
                grid,
                boxes,
                geometries: GeometryCache::new(),
                visits,
                config,
            }
        }

        fn process(&mut self, track: &Track) -> usize {
            process_track(
                track,
                &self.grid,
                &self.boxes,
                &mut self.geometries,
                &mut self.visits,
                &self.regions,
                &self.config,
            )
        }
    }

    fn config(grid_size: f64, sample_budget: u32) -> AnalysisConfig {
        AnalysisConfig { grid_size, sample_budget }
    }

    #[test]
    fn test_reentry_counts_once() {
        let mut fx = Fixture::new(vec![square_region("a", 0.0, 1.0)], config(1.0, 500));
        // in, out, in, out, in
        let track = Track::new("t1", vec![
            TrackPoint::new(0.5, 0.5),
            TrackPoint::new(1.5, 1.5),
            TrackPoint::new(0.4, 0.4),
            TrackPoint::new(1.6, 1.6),
            TrackPoint::new(0.3, 0.3),
        ]);

        assert_eq!(fx.process(&track), 1);
        let record = &fx.visits["a"];
        assert_eq!(record.visit_count, 1);
        assert_eq!(record.track_ids.len(), 1);
        assert!(record.track_ids.contains("t1"));
    }

    #[test]
    fn test_two_tracks_two_visits() {
        let mut fx = Fixture::new(vec![square_region("a", 0.0, 1.0)], config(1.0, 500));
        fx.process(&Track::new("t1", vec![TrackPoint::new(0.5, 0.5)]));
        fx.process(&Track::new("t2", vec![TrackPoint::new(0.6, 0.6)]));
        assert_eq!(fx.visits["a"].visit_count, 2);
    }

    #[test]
    fn test_same_track_id_counts_once() {
        let mut fx = Fixture::new(vec![square_region("a", 0.0, 1.0)], config(1.0, 500));
        fx.process(&Track::new("t1", vec![TrackPoint::new(0.5, 0.5)]));
        fx.process(&Track::new("t1", vec![TrackPoint::new(0.6, 0.6)]));
        let record = &fx.visits["a"];
        assert_eq!(record.visit_count, 1);
        assert_eq!(record.visit_count as usize, record.track_ids.len());
    }

    #[test]
    fn test_point_in_bbox_but_outside_polygon() {
        // Right triangle below the lng + lat = 1 diagonal
        let triangle = Region::new(
            "tri",
            "Triangle",
            RegionGeometry::polygon_from_coords(&[vec![
                [0.0, 0.0], [1.0, 0.0], [0.0, 1.0], [0.0, 0.0],
            ]]),
        );
        let mut fx = Fixture::new(vec![triangle], config(1.0, 500));
        // lat 0.9, lng 0.9 is in the bbox, outside the triangle
        assert_eq!(fx.process(&Track::new("t", vec![TrackPoint::new(0.9, 0.9)])), 0);
        assert_eq!(fx.visits["tri"].visit_count, 0);
    }

    #[test]
    fn test_empty_track_is_skipped() {
        let mut fx = Fixture::new(vec![square_region("a", 0.0, 1.0)], config(1.0, 500));
        assert_eq!(fx.process(&Track::new("empty", vec![])), 0);
        assert_eq!(fx.visits["a"].visit_count, 0);
    }

    #[test]
    fn test_missing_metadata_is_skipped() {
        let mut fx = Fixture::new(
            vec![square_region("a", 0.0, 1.0), square_region("b", 2.0, 3.0)],
            config(1.0, 500),
        );
        // "a" loses its visit record, "b" its geometry
        fx.visits.remove("a");
        fx.regions.retain(|r| r.id != "b");

        let track = Track::new("t", vec![TrackPoint::new(0.5, 0.5), TrackPoint::new(2.5, 2.5)]);
        // "a" is still confirmed by geometry, just not recorded
        assert_eq!(fx.process(&track), 1);
        assert_eq!(fx.visits["b"].visit_count, 0);
        assert!(!fx.visits.contains_key("a"));
    }

    #[test]
    fn test_missing_bounding_box_is_skipped() {
        let mut fx = Fixture::new(vec![square_region("a", 0.0, 1.0)], config(1.0, 500));
        fx.boxes.clear();
        assert_eq!(fx.process(&Track::new("t", vec![TrackPoint::new(0.5, 0.5)])), 0);
        assert_eq!(fx.visits["a"].visit_count, 0);
    }

    #[test]
    fn test_sampling_can_miss_brief_clip() {
        // 10 points with budget 2 -> stride 5, samples indices 0 and 5
        let mut points: Vec<TrackPoint> = (0..10).map(|_| TrackPoint::new(5.0, 5.0)).collect();
        points[3] = TrackPoint::new(0.5, 0.5);
        let track = Track::new("t", points);

        let mut sparse = Fixture::new(vec![square_region("a", 0.0, 1.0)], config(1.0, 2));
        assert_eq!(sparse.process(&track), 0);

        let mut dense = Fixture::new(vec![square_region("a", 0.0, 1.0)], config(1.0, 500));
        assert_eq!(dense.process(&track), 1);
    }

    #[test]
    fn test_neighbour_candidate_rejected_by_bbox() {
        // Region sits entirely in cell (1, 1); point is in cell (0, 0) but
        // the bbox check still rejects it, so nothing is recorded
        let mut fx = Fixture::new(vec![square_region("a", 1.2, 1.8)], config(1.0, 500));
        assert_eq!(fx.process(&Track::new("t", vec![TrackPoint::new(0.9, 0.9)])), 0);
        // A point inside the region is found from its own cell
        assert_eq!(fx.process(&Track::new("t", vec![TrackPoint::new(1.5, 1.5)])), 1);
    }

    #[test]
    fn test_invalid_points_are_skipped() {
        // Region spans past the valid longitude range
        let wide = Region::new(
            "wide",
            "Wide",
            RegionGeometry::polygon_from_coords(&[vec![
                [170.0, 0.0], [190.0, 0.0], [190.0, 1.0], [170.0, 1.0], [170.0, 0.0],
            ]]),
        );
        let mut fx = Fixture::new(vec![wide], config(1.0, 500));
        let track = Track::new("t", vec![
            TrackPoint::new(0.5, 185.0),
            TrackPoint::new(f64::NAN, 175.0),
            TrackPoint::new(0.5, f64::INFINITY),
        ]);
        assert_eq!(fx.process(&track), 0);
        assert_eq!(fx.visits["wide"].visit_count, 0);

        // A valid point in the same region still counts
        let track = Track::new("t2", vec![TrackPoint::new(f64::NAN, 0.0), TrackPoint::new(0.5, 175.0)]);
        assert_eq!(fx.process(&track), 1);
    }

    #[test]
    fn test_stride() {
        assert_eq!(sample_stride(0, 500), 1);
        assert_eq!(sample_stride(499, 500), 1);
        assert_eq!(sample_stride(1000, 500), 2);
        assert_eq!(sample_stride(10, 0), 10);
    }
}
