//! # Region Visits
//!
//! High-performance region visit analysis for recorded GPS activity tracks.
//!
//! Given a set of tracks and a set of administrative region polygons, this
//! library determines for every region whether any track passed through it,
//! how many distinct tracks did, and which track ids are responsible.
//!
//! This library provides:
//! - A fixed-size spatial grid over region bounding boxes (candidate filter)
//! - Exact even-odd ray casting with holes and multi-part regions
//! - Per-session bounding box and geometry caches
//! - Progress reporting and an optional background runner
//!
//! ## Features
//!
//! - **`parallel`** - Precompute region bounding boxes with rayon
//! - **`async`** - Run analyses on a tokio blocking worker
//! - **`serialize`** - Serde derives on public data types
//! - **`ffi`** - Enable FFI bindings for mobile platforms (iOS/Android)
//! - **`full`** - Enable all features
//!
//! ## Quick Start
//!
//! ```rust
//! use region_visits::{analyze_region_visits, Region, RegionGeometry, Track, TrackPoint};
//!
//! let square = RegionGeometry::polygon_from_coords(&[vec![
//!     [0.0, 0.0], [10.0, 0.0], [10.0, 10.0], [0.0, 10.0], [0.0, 0.0],
//! ]]);
//! let regions = vec![Region::new("r1", "Square", square)];
//!
//! let tracks = vec![Track::new("ride-1", vec![
//!     TrackPoint::new(5.0, 5.0),
//!     TrackPoint::new(5.5, 5.5),
//! ])];
//!
//! let visits = analyze_region_visits(&tracks, &regions, None, None).unwrap();
//! assert!(visits["r1"].visited);
//! assert_eq!(visits["r1"].visit_count, 1);
//! ```

use geo::{Coord, LineString, MultiPolygon, Polygon};

pub mod error;
pub use error::AnalysisError;

// Bounding boxes and their per-session cache
pub mod bounds;
pub use bounds::{compute_bounding_box, BoundingBox, BoundingBoxCache};

// Fixed-size grid of region candidates
pub mod grid;
pub use grid::{adjacent_cells, cell_key, CellKey, SpatialGrid};

// Exact point-in-polygon tests
pub mod containment;
pub use containment::{contains, polygon_contains, ring_contains};

pub mod geometry_cache;
pub use geometry_cache::GeometryCache;

// Per-track visit detection
pub mod track;
pub use track::{process_track, sample_stride};

// Orchestration, configuration and progress reporting
pub mod analysis;
pub use analysis::{
    analyze_region_visits, input_signature, visited_regions, AnalysisConfig,
    RegionVisitAnalyzer, VisitMap, VisitRecord,
};

#[cfg(feature = "async")]
pub use analysis::{analyze_region_visits_async, ProgressCallback};

#[cfg(feature = "ffi")]
uniffi::setup_scaffolding!();

/// Initialize logging for Android (only used in FFI)
#[cfg(all(feature = "ffi", target_os = "android"))]
fn init_logging() {
    use android_logger::Config;
    use log::LevelFilter;

    android_logger::init_once(
        Config::default()
            .with_max_level(LevelFilter::Debug)
            .with_tag("RegionVisitsRust")
    );
}

#[cfg(all(feature = "ffi", not(target_os = "android")))]
fn init_logging() {
    // No-op on non-Android platforms
}

// ============================================================================
// Core Types
// ============================================================================

/// A single GPS sample of a track.
///
/// # Example
/// ```
/// use region_visits::TrackPoint;
/// let point = TrackPoint::new(46.9480, 7.4474).with_elevation(540.0); // Bern
/// assert_eq!(point.elevation, Some(540.0));
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "ffi", derive(uniffi::Record))]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct TrackPoint {
    pub latitude: f64,
    pub longitude: f64,
    /// Elevation in meters, if the recording device provided one
    pub elevation: Option<f64>,
    /// Unix timestamp in seconds, if known
    pub timestamp: Option<i64>,
}

impl TrackPoint {
    /// Create a new track point without elevation or timestamp.
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            elevation: None,
            timestamp: None,
        }
    }

    pub fn with_elevation(mut self, elevation: f64) -> Self {
        self.elevation = Some(elevation);
        self
    }

    pub fn with_timestamp(mut self, timestamp: i64) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    /// Check if the point has valid coordinates.
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && self.latitude >= -90.0
            && self.latitude <= 90.0
            && self.longitude >= -180.0
            && self.longitude <= 180.0
    }
}

/// One recorded activity route.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct Track {
    /// Unique identifier for the activity
    pub id: String,
    /// Ordered GPS samples
    pub points: Vec<TrackPoint>,
}

impl Track {
    pub fn new(id: impl Into<String>, points: Vec<TrackPoint>) -> Self {
        Self {
            id: id.into(),
            points,
        }
    }

    /// Tracks without points contribute nothing to an analysis.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Boundary geometry of a region.
///
/// Coordinates follow GeoJSON order: `x` is longitude, `y` is latitude.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub enum RegionGeometry {
    Polygon(Polygon<f64>),
    MultiPolygon(MultiPolygon<f64>),
}

impl RegionGeometry {
    /// Build a polygon from GeoJSON-shaped rings: the first ring is the outer
    /// boundary, any further rings are holes. Each ring is `[lon, lat]` pairs.
    ///
    /// # Example
    /// ```
    /// use region_visits::RegionGeometry;
    ///
    /// let donut = RegionGeometry::polygon_from_coords(&[
    ///     vec![[0.0, 0.0], [10.0, 0.0], [10.0, 10.0], [0.0, 10.0], [0.0, 0.0]],
    ///     vec![[3.0, 3.0], [7.0, 3.0], [7.0, 7.0], [3.0, 7.0], [3.0, 3.0]],
    /// ]);
    /// assert_eq!(donut.parts()[0].interiors().len(), 1);
    /// ```
    pub fn polygon_from_coords(rings: &[Vec<[f64; 2]>]) -> Self {
        RegionGeometry::Polygon(polygon_from_rings(rings))
    }

    /// Build a multi-polygon from GeoJSON-shaped parts, each a list of rings.
    pub fn multi_polygon_from_coords(polygons: &[Vec<Vec<[f64; 2]>>]) -> Self {
        RegionGeometry::MultiPolygon(MultiPolygon::new(
            polygons.iter().map(|rings| polygon_from_rings(rings)).collect(),
        ))
    }

    /// The independent polygon parts of this geometry.
    ///
    /// A plain polygon is a single part.
    pub fn parts(&self) -> &[Polygon<f64>] {
        match self {
            RegionGeometry::Polygon(p) => std::slice::from_ref(p),
            RegionGeometry::MultiPolygon(mp) => &mp.0,
        }
    }
}

fn polygon_from_rings(rings: &[Vec<[f64; 2]>]) -> Polygon<f64> {
    let to_line = |ring: &Vec<[f64; 2]>| {
        LineString::new(ring.iter().map(|&[x, y]| Coord { x, y }).collect())
    };

    let exterior = rings.first().map(to_line).unwrap_or_else(|| LineString::new(vec![]));
    let interiors = rings.iter().skip(1).map(to_line).collect();
    Polygon::new(exterior, interiors)
}

/// A named geographic area to test track overlap against.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct Region {
    /// Unique region identifier
    pub id: String,
    /// Display name
    pub name: String,
    pub geometry: RegionGeometry,
}

impl Region {
    pub fn new(id: impl Into<String>, name: impl Into<String>, geometry: RegionGeometry) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            geometry,
        }
    }
}

// ============================================================================
// FFI Exports (only when feature enabled)
// ============================================================================

#[cfg(feature = "ffi")]
mod ffi {
    use super::*;
    use log::{info, warn};

    /// Callback interface for receiving progress updates during an analysis.
    /// Implement this in Kotlin/Swift to drive a progress indicator.
    #[uniffi::export(callback_interface)]
    pub trait AnalysisProgressCallback: Send + Sync {
        /// Called at each progress checkpoint.
        /// - percent: 0-100, non-decreasing within one run
        /// - message: human-readable status
        fn on_progress(&self, percent: u32, message: String);
    }

    /// Input track as a flat coordinate buffer (zero-copy from JS TypedArray)
    #[derive(Debug, Clone, uniffi::Record)]
    pub struct FlatTrack {
        pub track_id: String,
        /// Flat array of coordinates: [lat1, lng1, lat2, lng2, ...]
        pub coords: Vec<f64>,
    }

    /// One polygon part of a region
    #[derive(Debug, Clone, uniffi::Record)]
    pub struct FfiPolygon {
        /// Flat outer ring in GeoJSON order: [lng1, lat1, lng2, lat2, ...]
        pub exterior: Vec<f64>,
        /// Flat hole rings, same layout as `exterior`
        pub holes: Vec<Vec<f64>>,
    }

    /// Region input. One part becomes a Polygon, more become a MultiPolygon.
    #[derive(Debug, Clone, uniffi::Record)]
    pub struct FfiRegion {
        pub id: String,
        pub name: String,
        pub polygons: Vec<FfiPolygon>,
    }

    /// Visit record without geometry (the host already has it)
    #[derive(Debug, Clone, uniffi::Record)]
    pub struct FfiVisitRecord {
        pub region_id: String,
        pub region_name: String,
        pub visit_count: u32,
        pub visited: bool,
        pub track_ids: Vec<String>,
    }

    fn flat_ring(coords: &[f64]) -> Vec<[f64; 2]> {
        coords.chunks_exact(2).map(|c| [c[0], c[1]]).collect()
    }

    fn to_region(region: FfiRegion) -> Region {
        let parts: Vec<Vec<Vec<[f64; 2]>>> = region
            .polygons
            .iter()
            .map(|p| {
                std::iter::once(flat_ring(&p.exterior))
                    .chain(p.holes.iter().map(|h| flat_ring(h)))
                    .collect()
            })
            .collect();

        let geometry = if parts.len() == 1 {
            RegionGeometry::polygon_from_coords(&parts[0])
        } else {
            RegionGeometry::multi_polygon_from_coords(&parts)
        };

        Region::new(region.id, region.name, geometry)
    }

    fn to_track(track: FlatTrack) -> Track {
        let points = track
            .coords
            .chunks_exact(2)
            .map(|c| TrackPoint::new(c[0], c[1]))
            .collect();
        Track::new(track.track_id, points)
    }

    fn to_records(visits: VisitMap, regions: &[Region]) -> Vec<FfiVisitRecord> {
        // Keep the host's region order
        regions
            .iter()
            .filter_map(|r| visits.get(&r.id))
            .map(|v| FfiVisitRecord {
                region_id: v.region_id.clone(),
                region_name: v.region_name.clone(),
                visit_count: v.visit_count,
                visited: v.visited,
                track_ids: v.track_ids.iter().cloned().collect(),
            })
            .collect()
    }

    fn run(
        tracks: Vec<FlatTrack>,
        regions: Vec<FfiRegion>,
        config: AnalysisConfig,
        on_progress: Option<&dyn Fn(u32, &str)>,
    ) -> Vec<FfiVisitRecord> {
        init_logging();
        info!(
            "[RegionVisitsRust] analyze called with {} tracks, {} regions",
            tracks.len(),
            regions.len()
        );

        let start = std::time::Instant::now();
        let tracks: Vec<Track> = tracks.into_iter().map(to_track).collect();
        let regions: Vec<Region> = regions.into_iter().map(to_region).collect();

        match analyze_region_visits(&tracks, &regions, on_progress, Some(&config)) {
            Ok(visits) => {
                let records = to_records(visits, &regions);
                info!(
                    "[RegionVisitsRust] {} of {} regions visited in {:?}",
                    records.iter().filter(|r| r.visited).count(),
                    records.len(),
                    start.elapsed()
                );
                records
            }
            Err(e) => {
                warn!("[RegionVisitsRust] Analysis failed: {}", e);
                vec![]
            }
        }
    }

    /// Analyze which regions were visited by the given tracks.
    /// Returns one record per region in input order, or an empty list on
    /// invalid input (duplicate region ids, bad config).
    #[uniffi::export]
    pub fn ffi_analyze_region_visits(
        tracks: Vec<FlatTrack>,
        regions: Vec<FfiRegion>,
        config: AnalysisConfig,
    ) -> Vec<FfiVisitRecord> {
        run(tracks, regions, config, None)
    }

    /// Same as ffi_analyze_region_visits but reports progress through the
    /// callback, allowing the UI to show a progress indicator.
    #[uniffi::export]
    pub fn ffi_analyze_region_visits_with_progress(
        tracks: Vec<FlatTrack>,
        regions: Vec<FfiRegion>,
        config: AnalysisConfig,
        callback: Box<dyn AnalysisProgressCallback>,
    ) -> Vec<FfiVisitRecord> {
        let progress = move |percent: u32, message: &str| {
            callback.on_progress(percent, message.to_string());
        };
        run(tracks, regions, config, Some(&progress))
    }

    /// Get default analysis configuration.
    #[uniffi::export]
    pub fn default_analysis_config() -> AnalysisConfig {
        init_logging();
        AnalysisConfig::default()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_track_point_validation() {
        assert!(TrackPoint::new(46.9480, 7.4474).is_valid());
        assert!(!TrackPoint::new(91.0, 0.0).is_valid());
        assert!(!TrackPoint::new(0.0, 181.0).is_valid());
        assert!(!TrackPoint::new(f64::NAN, 0.0).is_valid());
    }

    #[test]
    fn test_track_point_builders() {
        let p = TrackPoint::new(1.0, 2.0).with_elevation(300.0).with_timestamp(1_700_000_000);
        assert_eq!(p.elevation, Some(300.0));
        assert_eq!(p.timestamp, Some(1_700_000_000));
    }

    #[test]
    fn test_polygon_from_coords_keeps_holes() {
        let geometry = RegionGeometry::polygon_from_coords(&[
            vec![[0.0, 0.0], [10.0, 0.0], [10.0, 10.0], [0.0, 10.0], [0.0, 0.0]],
            vec![[3.0, 3.0], [7.0, 3.0], [7.0, 7.0], [3.0, 7.0], [3.0, 3.0]],
        ]);
        let parts = geometry.parts();
        assert_eq!(parts.len(), 1);
        assert_eq!(parts[0].exterior().0.len(), 5);
        assert_eq!(parts[0].interiors().len(), 1);
        // GeoJSON order: x is longitude
        assert_eq!(parts[0].exterior().0[1], Coord { x: 10.0, y: 0.0 });
    }

    #[test]
    fn test_multi_polygon_parts() {
        let geometry = RegionGeometry::multi_polygon_from_coords(&[
            vec![vec![[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 0.0]]],
            vec![vec![[5.0, 5.0], [6.0, 5.0], [6.0, 6.0], [5.0, 5.0]]],
        ]);
        assert_eq!(geometry.parts().len(), 2);
    }

    #[test]
    fn test_empty_rings_give_empty_polygon() {
        let geometry = RegionGeometry::polygon_from_coords(&[]);
        assert!(geometry.parts()[0].exterior().0.is_empty());
    }

    #[test]
    fn test_empty_track() {
        assert!(Track::new("t", vec![]).is_empty());
        assert!(!Track::new("t", vec![TrackPoint::new(0.0, 0.0)]).is_empty());
    }
}
