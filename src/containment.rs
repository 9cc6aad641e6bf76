//! Exact point-in-polygon tests by even-odd ray casting.
//!
//! A ray is cast from the point in the +longitude direction and edge
//! crossings are counted with the half-open rule `(yi > y) != (yj > y)`, so a
//! vertex sitting exactly at the point's latitude is counted once, not twice.
//!
//! Points lying exactly on an edge get whatever answer the floating-point
//! comparison order produces. Callers must not rely on either outcome.

use geo::{LineString, Polygon};

use crate::RegionGeometry;

/// Even-odd ray casting against a single ring.
///
/// The ring may be closed (first == last) or open; the closing edge is
/// implied either way. An empty ring contains nothing.
pub fn ring_contains(lat: f64, lng: f64, ring: &LineString<f64>) -> bool {
    let coords = &ring.0;
    let n = coords.len();
    if n == 0 {
        return false;
    }

    let (x, y) = (lng, lat);
    let mut inside = false;
    let mut j = n - 1;

    for i in 0..n {
        let (xi, yi) = (coords[i].x, coords[i].y);
        let (xj, yj) = (coords[j].x, coords[j].y);

        // yi != yj whenever the first clause holds, so the division is safe
        if (yi > y) != (yj > y) && x < (xj - xi) * (y - yi) / (yj - yi) + xi {
            inside = !inside;
        }
        j = i;
    }

    inside
}

/// Inside the outer ring and inside none of the holes.
pub fn polygon_contains(lat: f64, lng: f64, polygon: &Polygon<f64>) -> bool {
    if !ring_contains(lat, lng, polygon.exterior()) {
        return false;
    }
    !polygon
        .interiors()
        .iter()
        .any(|hole| ring_contains(lat, lng, hole))
}

/// Test whether a point lies inside a region geometry.
///
/// Multi-polygon parts are tested independently: the point is contained if
/// any single part contains it, and one part's holes never affect another.
///
/// # Example
///
/// ```rust
/// use region_visits::{contains, RegionGeometry};
///
/// let square = RegionGeometry::polygon_from_coords(&[vec![
///     [0.0, 0.0], [10.0, 0.0], [10.0, 10.0], [0.0, 10.0], [0.0, 0.0],
/// ]]);
/// assert!(contains(5.0, 5.0, &square));
/// assert!(!contains(15.0, 15.0, &square));
/// ```
pub fn contains(lat: f64, lng: f64, geometry: &RegionGeometry) -> bool {
    geometry
        .parts()
        .iter()
        .any(|polygon| polygon_contains(lat, lng, polygon))
}
