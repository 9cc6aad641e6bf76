//! Fixed-size spatial grid over region bounding boxes.
//!
//! Partitions the lat/lng plane into square cells of `grid_size` degrees and
//! records, per cell, which regions have a bounding box overlapping it. The
//! grid is only a candidate filter: a region listed in a cell may still not
//! contain a point in that cell, and the authoritative answer always comes
//! from [`crate::containment`].
//!
//! Smaller cells mean fewer candidates per lookup but more cells in memory.

use std::collections::HashMap;

use crate::{BoundingBox, BoundingBoxCache, Region};

/// Grid coordinate: (row, col) = (floor(lat / size), floor(lng / size))
pub type CellKey = (i32, i32);

/// Convert lat/lng to grid coordinates.
#[inline]
pub fn cell_key(lat: f64, lng: f64, grid_size: f64) -> CellKey {
    ((lat / grid_size).floor() as i32, (lng / grid_size).floor() as i32)
}

/// Candidate cells for a point: the containing cell plus one step forward on
/// the latitude axis, the longitude axis, and both.
///
/// Only forward neighbours are returned. A point close to the lower edge of
/// its cell will not see regions registered solely in the cell below or to
/// the left of it.
pub fn adjacent_cells(lat: f64, lng: f64, grid_size: f64) -> [CellKey; 4] {
    let (row, col) = cell_key(lat, lng, grid_size);
    [
        (row, col),
        (row.saturating_add(1), col),
        (row, col.saturating_add(1)),
        (row.saturating_add(1), col.saturating_add(1)),
    ]
}

/// Region ids per grid cell.
#[derive(Debug, Clone)]
pub struct SpatialGrid {
    grid_size: f64,
    cells: HashMap<CellKey, Vec<String>>,
}

impl SpatialGrid {
    /// Build the grid for a set of regions.
    ///
    /// Bounding boxes are taken from (and stored into) `boxes`, so building
    /// also leaves every region's box cached. Each region is inserted into
    /// every cell of its projected box, inclusive on both ends. Regions with
    /// an empty box are not registered anywhere.
    pub fn build(regions: &[Region], grid_size: f64, boxes: &mut BoundingBoxCache) -> Self {
        let mut grid = Self {
            grid_size,
            cells: HashMap::new(),
        };

        for region in regions {
            let bbox = boxes.get_bounding_box(&region.id, &region.geometry);
            grid.insert(&region.id, &bbox);
        }

        grid
    }

    fn insert(&mut self, region_id: &str, bbox: &BoundingBox) {
        if bbox.is_empty() {
            return;
        }

        let (min_row, min_col) = cell_key(bbox.min_lat, bbox.min_lng, self.grid_size);
        let (max_row, max_col) = cell_key(bbox.max_lat, bbox.max_lng, self.grid_size);

        for row in min_row..=max_row {
            for col in min_col..=max_col {
                self.cells
                    .entry((row, col))
                    .or_default()
                    .push(region_id.to_string());
            }
        }
    }

    /// Region ids registered in a cell (empty for unknown cells).
    pub fn regions_in(&self, cell: &CellKey) -> &[String] {
        self.cells.get(cell).map_or(&[], |ids| ids.as_slice())
    }

    /// Number of non-empty cells.
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    pub fn grid_size(&self) -> f64 {
        self.grid_size
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RegionGeometry;

    fn square_region(id: &str, min_lng: f64, min_lat: f64, max_lng: f64, max_lat: f64) -> Region {
        Region::new(
            id,
            id,
            RegionGeometry::polygon_from_coords(&[vec![
                [min_lng, min_lat],
                [max_lng, min_lat],
                [max_lng, max_lat],
                [min_lng, max_lat],
                [min_lng, min_lat],
            ]]),
        )
    }

    #[test]
    fn test_cell_key_floors_negative_coordinates() {
        assert_eq!(cell_key(0.05, 0.05, 0.1), (0, 0));
        assert_eq!(cell_key(-0.05, -0.15, 0.1), (-1, -2));
        assert_eq!(cell_key(47.37, 8.54, 1.0), (47, 8));
    }

    #[test]
    fn test_adjacent_cells_look_forward_only() {
        let cells = adjacent_cells(5.5, 7.5, 1.0);
        assert_eq!(cells, [(5, 7), (6, 7), (5, 8), (6, 8)]);
        assert!(!cells.contains(&(4, 7)));
        assert!(!cells.contains(&(5, 6)));
    }

    #[test]
    fn test_region_registered_in_every_overlapped_cell() {
        let regions = vec![square_region("a", 0.5, 0.5, 2.5, 1.5)];
        let mut boxes = BoundingBoxCache::new();
        let grid = SpatialGrid::build(&regions, 1.0, &mut boxes);

        // rows 0..=1, cols 0..=2
        assert_eq!(grid.cell_count(), 6);
        for row in 0..=1 {
            for col in 0..=2 {
                assert_eq!(grid.regions_in(&(row, col)), &["a".to_string()]);
            }
        }
        assert!(grid.regions_in(&(2, 0)).is_empty());
        assert_eq!(boxes.len(), 1);
    }

    #[test]
    fn test_cell_lists_multiple_regions() {
        let regions = vec![
            square_region("a", 0.1, 0.1, 0.4, 0.4),
            square_region("b", 0.6, 0.6, 0.9, 0.9),
        ];
        let mut boxes = BoundingBoxCache::new();
        let grid = SpatialGrid::build(&regions, 1.0, &mut boxes);

        assert_eq!(grid.cell_count(), 1);
        assert_eq!(grid.regions_in(&(0, 0)), &["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn test_empty_geometry_not_registered() {
        let regions = vec![Region::new("empty", "Empty", RegionGeometry::polygon_from_coords(&[]))];
        let mut boxes = BoundingBoxCache::new();
        let grid = SpatialGrid::build(&regions, 0.1, &mut boxes);
        assert_eq!(grid.cell_count(), 0);
    }

    #[test]
    fn test_smaller_cells_produce_more_cells() {
        let regions = vec![square_region("a", 0.0, 0.0, 1.0, 1.0)];
        let coarse = SpatialGrid::build(&regions, 1.0, &mut BoundingBoxCache::new());
        let fine = SpatialGrid::build(&regions, 0.25, &mut BoundingBoxCache::new());
        assert!(fine.cell_count() > coarse.cell_count());
        assert_eq!(fine.grid_size(), 0.25);
    }
}
