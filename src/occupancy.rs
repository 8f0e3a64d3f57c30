use crate::geometry;
use crate::types::{Detection, Point};

/// Derives one camera's occupancy vector: spot index `i` is occupied iff
/// any vehicle's box center falls inside polygon `i`.
///
/// No vehicles anywhere means every spot is free, so an empty detection
/// list short-circuits to an all-false vector without per-polygon work.
pub fn resolve_occupancy(vehicles: &[Detection], polygons: &[Vec<Point>]) -> Vec<bool> {
    if vehicles.is_empty() {
        return vec![false; polygons.len()];
    }
    polygons
        .iter()
        .map(|polygon| {
            vehicles
                .iter()
                .any(|vehicle| geometry::contains(vehicle.bbox.center(), polygon))
        })
        .collect()
}
