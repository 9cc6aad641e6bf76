//! # Region Bounding Boxes
//!
//! Axis-aligned bounding boxes of region geometries, and the per-session
//! cache that memoizes them by region id.
//!
//! ## Overview
//!
//! | Item | Description |
//! |------|-------------|
//! | [`compute_bounding_box`] | Scan every ring of every part of a geometry |
//! | [`BoundingBox::contains`] | Inclusive point test, used as a cheap rejection filter |
//! | [`BoundingBoxCache`] | Region id → box, computed once per id |
//!
//! ## Example
//!
//! ```rust
//! use region_visits::{BoundingBoxCache, RegionGeometry};
//!
//! let geometry = RegionGeometry::polygon_from_coords(&[vec![
//!     [20.0, 50.0], [21.0, 50.0], [21.0, 51.0], [20.0, 51.0], [20.0, 50.0],
//! ]]);
//!
//! let mut cache = BoundingBoxCache::new();
//! let bbox = cache.get_bounding_box("PL-KR", &geometry);
//! assert_eq!((bbox.min_lat, bbox.max_lat), (50.0, 51.0));
//! assert_eq!((bbox.min_lng, bbox.max_lng), (20.0, 21.0));
//! ```
//!
//! ## Cache Semantics
//!
//! The cache trusts that a region id always maps to the same geometry for its
//! lifetime. There is no change detection: a region whose geometry changes
//! under a recycled id keeps its old box until [`BoundingBoxCache::clear`].

use std::collections::HashMap;

use geo::CoordsIter;

use crate::RegionGeometry;

// =============================================================================
// Bounding Box
// =============================================================================

/// Smallest axis-aligned rectangle enclosing a region's geometry.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct BoundingBox {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lng: f64,
    pub max_lng: f64,
}

impl BoundingBox {
    /// A box enclosing nothing. Extending it with any point yields a
    /// zero-area box at that point.
    pub fn empty() -> Self {
        Self {
            min_lat: f64::INFINITY,
            max_lat: f64::NEG_INFINITY,
            min_lng: f64::INFINITY,
            max_lng: f64::NEG_INFINITY,
        }
    }

    /// True if no coordinate has been added.
    pub fn is_empty(&self) -> bool {
        self.min_lat > self.max_lat || self.min_lng > self.max_lng
    }

    /// Grow the box to include a point.
    #[inline]
    pub fn extend(&mut self, lat: f64, lng: f64) {
        self.min_lat = self.min_lat.min(lat);
        self.max_lat = self.max_lat.max(lat);
        self.min_lng = self.min_lng.min(lng);
        self.max_lng = self.max_lng.max(lng);
    }

    /// Inclusive containment test on all four edges.
    ///
    /// An empty box contains nothing, and NaN coordinates are never inside.
    #[inline]
    pub fn contains(&self, lat: f64, lng: f64) -> bool {
        lat >= self.min_lat && lat <= self.max_lat && lng >= self.min_lng && lng <= self.max_lng
    }
}

/// Compute the bounding box of a region geometry.
///
/// Every coordinate of every ring is scanned, holes included. Holes never
/// shrink the box since they lie inside the outer ring, but scanning them
/// keeps the result correct for malformed input too.
///
/// A geometry without coordinates returns [`BoundingBox::empty`].
pub fn compute_bounding_box(geometry: &RegionGeometry) -> BoundingBox {
    let mut bbox = BoundingBox::empty();
    for polygon in geometry.parts() {
        for coord in polygon.coords_iter() {
            bbox.extend(coord.y, coord.x);
        }
    }
    bbox
}

// =============================================================================
// Cache
// =============================================================================

/// Memoizes bounding boxes by region id.
#[derive(Debug, Default, Clone)]
pub struct BoundingBoxCache {
    boxes: HashMap<String, BoundingBox>,
}

impl BoundingBoxCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the bounding box for a region, computing it on the first call.
    ///
    /// Later calls for the same id return the cached box in O(1) without
    /// looking at `geometry`.
    pub fn get_bounding_box(&mut self, region_id: &str, geometry: &RegionGeometry) -> BoundingBox {
        if let Some(bbox) = self.boxes.get(region_id) {
            return *bbox;
        }
        let bbox = compute_bounding_box(geometry);
        self.boxes.insert(region_id.to_string(), bbox);
        bbox
    }

    /// Look up a cached box without computing anything.
    pub fn get(&self, region_id: &str) -> Option<BoundingBox> {
        self.boxes.get(region_id).copied()
    }

    /// Make sure every region has a cached box.
    ///
    /// Missing boxes are computed with rayon and then inserted in input order.
    #[cfg(feature = "parallel")]
    pub fn precompute(&mut self, regions: &[crate::Region]) {
        use rayon::prelude::*;

        let missing: Vec<(&str, BoundingBox)> = regions
            .par_iter()
            .filter(|r| !self.boxes.contains_key(&r.id))
            .map(|r| (r.id.as_str(), compute_bounding_box(&r.geometry)))
            .collect();

        for (id, bbox) in missing {
            self.boxes.entry(id.to_string()).or_insert(bbox);
        }
    }

    pub fn len(&self) -> usize {
        self.boxes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.boxes.is_empty()
    }

    /// Drop every cached box.
    pub fn clear(&mut self) {
        self.boxes.clear();
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
