//! Memoized region id → geometry lookup.
//!
//! Avoids a linear scan of the region list every time a track point needs a
//! region's geometry. The cache remembers where in the region slice an id was
//! found and re-checks the id on every hit, so handing it a different region
//! list falls back to a fresh scan instead of returning the wrong geometry.

use std::collections::HashMap;

use crate::{Region, RegionGeometry};

#[derive(Debug, Default, Clone)]
pub struct GeometryCache {
    positions: HashMap<String, usize>,
}

impl GeometryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Find the geometry of `region_id` in `regions`.
    ///
    /// Returns `None` when no region has that id.
    pub fn get<'r>(&mut self, region_id: &str, regions: &'r [Region]) -> Option<&'r RegionGeometry> {
        if let Some(&idx) = self.positions.get(region_id) {
            if let Some(region) = regions.get(idx).filter(|r| r.id == region_id) {
                return Some(&region.geometry);
            }
        }

        let idx = regions.iter().position(|r| r.id == region_id)?;
        self.positions.insert(region_id.to_string(), idx);
        Some(&regions[idx].geometry)
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn clear(&mut self) {
        self.positions.clear();
    }
}
