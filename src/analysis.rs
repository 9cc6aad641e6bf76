//! # Region Visit Analysis
//!
//! Orchestrates a full run: one empty [`VisitRecord`] per region, a spatial
//! grid built once, every non-empty track pushed through
//! [`process_track`](crate::process_track) in input order, and a final sweep
//! that sets the `visited` flags.
//!
//! ## Algorithm
//! 1. Validate config, create visit records (duplicate region ids are an error)
//! 2. Compute bounding boxes and the grid once (progress 10%)
//! 3. Drop tracks without points
//! 4. Process tracks sequentially (progress 20% → 80%, ~10 checkpoints)
//! 5. Set `visited = visit_count > 0`
//! 6. Report 100% with a summary
//!
//! ## Sessions
//! A [`RegionVisitAnalyzer`] owns the bounding box and geometry caches for a
//! dataset session. Reuse it while the region set is stable; call
//! [`RegionVisitAnalyzer::clear_caches`] when region ids may be recycled for
//! different geometry.
//!
//! ## Stale results
//! Runs cannot be interrupted unless a cancellation flag is passed. A host
//! that starts a new run before the previous one finished should compare
//! [`input_signature`] values and discard results for inputs it no longer
//! shows.

use std::collections::hash_map::DefaultHasher;
use std::collections::{BTreeSet, HashMap};
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use geo::CoordsIter;
use log::info;

use crate::{
    process_track, AnalysisError, BoundingBoxCache, GeometryCache, Region, RegionGeometry,
    SpatialGrid, Track,
};

/// Progress at which the grid is built.
const GRID_PROGRESS: u32 = 10;
/// Track processing spans this progress range.
const TRACKS_PROGRESS_START: u32 = 20;
const TRACKS_PROGRESS_END: u32 = 80;
/// Number of progress reports while processing tracks.
const TRACK_CHECKPOINTS: usize = 10;

/// Configuration for region visit analysis.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "ffi", derive(uniffi::Record))]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct AnalysisConfig {
    /// Grid cell size in degrees. Smaller cells mean fewer candidate regions
    /// per point but more cells in memory; results are unaffected.
    /// Default: 0.1 (~11 km of latitude)
    pub grid_size: f64,

    /// Maximum number of points examined per track (uniform stride).
    /// Default: 500
    pub sample_budget: u32,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            grid_size: 0.1,
            sample_budget: 500,
        }
    }
}

impl AnalysisConfig {
    /// Check both tunables are positive.
    pub fn validate(&self) -> Result<(), AnalysisError> {
        if !(self.grid_size.is_finite() && self.grid_size > 0.0) {
            return Err(AnalysisError::InvalidGridSize(self.grid_size));
        }
        if self.sample_budget == 0 {
            return Err(AnalysisError::InvalidSampleBudget(self.sample_budget));
        }
        Ok(())
    }
}

/// Per-region outcome of one analysis run.
///
/// `visited == (visit_count > 0)` and `visit_count == track_ids.len()` hold
/// for every record returned by an analysis.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct VisitRecord {
    pub region_id: String,
    pub region_name: String,
    /// Number of distinct tracks that entered the region
    pub visit_count: u32,
    pub visited: bool,
    /// Ids of the tracks that entered the region
    pub track_ids: BTreeSet<String>,
    pub geometry: RegionGeometry,
}

impl VisitRecord {
    /// An unvisited record for `region`.
    pub fn new(region: &Region) -> Self {
        Self {
            region_id: region.id.clone(),
            region_name: region.name.clone(),
            visit_count: 0,
            visited: false,
            track_ids: BTreeSet::new(),
            geometry: region.geometry.clone(),
        }
    }
}

/// Region id → visit record.
pub type VisitMap = HashMap<String, VisitRecord>;

fn report(on_progress: Option<&dyn Fn(u32, &str)>, percent: u32, message: &str) {
    if let Some(callback) = on_progress {
        callback(percent, message);
    }
}

/// Runs analyses for one dataset session, keeping its caches warm between runs.
#[derive(Debug, Clone)]
pub struct RegionVisitAnalyzer {
    config: AnalysisConfig,
    bounding_boxes: BoundingBoxCache,
    geometries: GeometryCache,
}

impl RegionVisitAnalyzer {
    /// Create an analyzer, rejecting a non-positive grid size or sample budget.
    pub fn new(config: AnalysisConfig) -> Result<Self, AnalysisError> {
        config.validate()?;
        Ok(Self {
            config,
            bounding_boxes: BoundingBoxCache::new(),
            geometries: GeometryCache::new(),
        })
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    pub fn bounding_boxes(&self) -> &BoundingBoxCache {
        &self.bounding_boxes
    }

    /// Forget every cached bounding box and geometry location.
    pub fn clear_caches(&mut self) {
        self.bounding_boxes.clear();
        self.geometries.clear();
    }

    /// Determine which regions the tracks passed through.
    ///
    /// Progress is reported through `on_progress` as `(percent, message)`,
    /// with non-decreasing percentages ending at exactly 100.
    ///
    /// # Example
    /// ```
    /// use region_visits::{AnalysisConfig, Region, RegionGeometry, RegionVisitAnalyzer, Track, TrackPoint};
    ///
    /// let regions = vec![Region::new("zh", "Zürich", RegionGeometry::polygon_from_coords(&[vec![
    ///     [8.4, 47.3], [8.7, 47.3], [8.7, 47.5], [8.4, 47.5], [8.4, 47.3],
    /// ]]))];
    /// let tracks = vec![Track::new("run", vec![TrackPoint::new(47.37, 8.54)])];
    ///
    /// let mut analyzer = RegionVisitAnalyzer::new(AnalysisConfig::default()).unwrap();
    /// let visits = analyzer
    ///     .analyze(&tracks, &regions, Some(&|percent: u32, message: &str| println!("{percent}% {message}")))
    ///     .unwrap();
    /// assert!(visits["zh"].track_ids.contains("run"));
    /// ```
    pub fn analyze(
        &mut self,
        tracks: &[Track],
        regions: &[Region],
        on_progress: Option<&dyn Fn(u32, &str)>,
    ) -> Result<VisitMap, AnalysisError> {
        self.analyze_with_cancel(tracks, regions, on_progress, None)
    }

    /// Same as [`analyze`](Self::analyze), checking `cancel` before each
    /// track. A raised flag ends the run with [`AnalysisError::Cancelled`].
    pub fn analyze_with_cancel(
        &mut self,
        tracks: &[Track],
        regions: &[Region],
        on_progress: Option<&dyn Fn(u32, &str)>,
        cancel: Option<&AtomicBool>,
    ) -> Result<VisitMap, AnalysisError> {
        let start = Instant::now();
        info!(
            "[RegionVisits] Analyzing {} tracks against {} regions (grid {}°, budget {})",
            tracks.len(),
            regions.len(),
            self.config.grid_size,
            self.config.sample_budget
        );

        let mut visits: VisitMap = HashMap::with_capacity(regions.len());
        for region in regions {
            if visits.contains_key(&region.id) {
                return Err(AnalysisError::DuplicateRegionId(region.id.clone()));
            }
            visits.insert(region.id.clone(), VisitRecord::new(region));
        }

        report(on_progress, GRID_PROGRESS, "Building spatial index...");
        #[cfg(feature = "parallel")]
        self.bounding_boxes.precompute(regions);
        let grid = SpatialGrid::build(regions, self.config.grid_size, &mut self.bounding_boxes);
        info!(
            "[RegionVisits] Built grid with {} cells in {}ms",
            grid.cell_count(),
            start.elapsed().as_millis()
        );

        let active: Vec<&Track> = tracks.iter().filter(|t| !t.is_empty()).collect();
        report(
            on_progress,
            TRACKS_PROGRESS_START,
            &format!("Processing {} tracks...", active.len()),
        );

        let checkpoint_every = active.len().div_ceil(TRACK_CHECKPOINTS).max(1);
        let progress_span = (TRACKS_PROGRESS_END - TRACKS_PROGRESS_START) as usize;

        for (i, track) in active.iter().enumerate() {
            if cancel.is_some_and(|flag| flag.load(Ordering::Relaxed)) {
                info!("[RegionVisits] Cancelled after {} of {} tracks", i, active.len());
                return Err(AnalysisError::Cancelled);
            }

            if i > 0 && i % checkpoint_every == 0 {
                let percent = TRACKS_PROGRESS_START + (i * progress_span / active.len()) as u32;
                report(
                    on_progress,
                    percent,
                    &format!("Processed {} of {} tracks", i, active.len()),
                );
            }

            process_track(
                track,
                &grid,
                &self.bounding_boxes,
                &mut self.geometries,
                &mut visits,
                regions,
                &self.config,
            );
        }

        report(on_progress, TRACKS_PROGRESS_END, "Finalizing visited regions...");

        let mut visited_count = 0usize;
        for record in visits.values_mut() {
            record.visited = record.visit_count > 0;
            if record.visited {
                visited_count += 1;
            }
        }

        let elapsed = start.elapsed();
        info!(
            "[RegionVisits] {} of {} regions visited by {} tracks in {:?}",
            visited_count,
            regions.len(),
            active.len(),
            elapsed
        );
        report(
            on_progress,
            100,
            &format!(
                "Analysis complete: {} of {} regions visited in {}ms",
                visited_count,
                regions.len(),
                elapsed.as_millis()
            ),
        );

        Ok(visits)
    }
}

/// Analyze region visits with a fresh analyzer.
///
/// Uses [`AnalysisConfig::default`] when `config` is `None`.
pub fn analyze_region_visits(
    tracks: &[Track],
    regions: &[Region],
    on_progress: Option<&dyn Fn(u32, &str)>,
    config: Option<&AnalysisConfig>,
) -> Result<VisitMap, AnalysisError> {
    let config = config.cloned().unwrap_or_default();
    RegionVisitAnalyzer::new(config)?.analyze(tracks, regions, on_progress)
}

/// Progress callback usable from a background worker
#[cfg(feature = "async")]
pub type ProgressCallback = std::sync::Arc<dyn Fn(u32, &str) + Send + Sync>;

/// Run an analysis on a tokio blocking worker and await its result.
///
/// The computation is the same sequential run as [`analyze_region_visits`];
/// it only moves off the caller's task so the caller is not blocked. Must be
/// called from within a tokio runtime. Raising `cancel` ends the run early
/// with [`AnalysisError::Cancelled`]; without it a run always completes, and
/// the caller decides whether the result is still wanted.
///
/// # Example
/// ```
/// # #[tokio::main]
/// # async fn main() {
/// use region_visits::{analyze_region_visits_async, AnalysisConfig, Region, RegionGeometry, Track, TrackPoint};
///
/// let regions = vec![Region::new("a", "A", RegionGeometry::polygon_from_coords(&[vec![
///     [0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0], [0.0, 0.0],
/// ]]))];
/// let tracks = vec![Track::new("t", vec![TrackPoint::new(0.5, 0.5)])];
///
/// let visits = analyze_region_visits_async(tracks, regions, AnalysisConfig::default(), None, None)
///     .await
///     .unwrap();
/// assert!(visits["a"].visited);
/// # }
/// ```
#[cfg(feature = "async")]
pub async fn analyze_region_visits_async(
    tracks: Vec<Track>,
    regions: Vec<Region>,
    config: AnalysisConfig,
    on_progress: Option<ProgressCallback>,
    cancel: Option<std::sync::Arc<AtomicBool>>,
) -> Result<VisitMap, AnalysisError> {
    tokio::task::spawn_blocking(move || {
        let mut analyzer = RegionVisitAnalyzer::new(config)?;
        let progress = on_progress.as_deref().map(|f| f as &dyn Fn(u32, &str));
        analyzer.analyze_with_cancel(&tracks, &regions, progress, cancel.as_deref())
    })
    .await
    .map_err(|e| AnalysisError::TaskFailed(e.to_string()))?
}

/// Fingerprint of an analysis input.
///
/// Covers track ids, point counts and end points, and region ids, names and
/// coordinate counts. Two calls with the same inputs return the same value
/// within a process, so a host can tell whether a finished result still
/// matches what it is showing.
pub fn input_signature(tracks: &[Track], regions: &[Region]) -> u64 {
    let mut hasher = DefaultHasher::new();

    tracks.len().hash(&mut hasher);
    for track in tracks {
        track.id.hash(&mut hasher);
        track.points.len().hash(&mut hasher);
        for p in track.points.first().iter().chain(track.points.last().iter()) {
            p.latitude.to_bits().hash(&mut hasher);
            p.longitude.to_bits().hash(&mut hasher);
        }
    }

    regions.len().hash(&mut hasher);
    for region in regions {
        region.id.hash(&mut hasher);
        region.name.hash(&mut hasher);
        let coord_count: usize = region.geometry.parts().iter().map(|p| p.coords_count()).sum();
        coord_count.hash(&mut hasher);
    }

    hasher.finish()
}

/// Visited regions, most visited first (ties by name).
pub fn visited_regions(visits: &VisitMap) -> Vec<&VisitRecord> {
    let mut visited: Vec<&VisitRecord> = visits.values().filter(|v| v.visited).collect();
    visited.sort_by(|a, b| {
        b.visit_count
            .cmp(&a.visit_count)
            .then_with(|| a.region_name.cmp(&b.region_name))
            .then_with(|| a.region_id.cmp(&b.region_id))
    });
    visited
}
