use crate::types::Point;

/// Ray-casting point-in-polygon test. The polygon is closed implicitly;
/// a horizontal ray from the point crosses an odd number of edges iff the
/// point is inside.
///
/// Tie-breaks are deliberate and must stay stable:
/// - an edge's y-range is half-open (`min < y <= max`), so a vertex shared
///   by two edges is counted once and exactly-horizontal edges never
///   produce an x-intersection (no division by zero);
/// - a vertical edge (`p1.x == p2.x`) always passes the x-test, which is
///   what makes axis-aligned rectangular spots behave.
pub fn contains(point: Point, polygon: &[Point]) -> bool {
    if polygon.len() < 3 {
        return false;
    }
    let mut inside = false;
    let mut p1 = polygon[0];
    for i in 1..=polygon.len() {
        let p2 = polygon[i % polygon.len()];
        if point.y > p1.y.min(p2.y) && point.y <= p1.y.max(p2.y) && point.x <= p1.x.max(p2.x) {
            // p1.y != p2.y here: the half-open range test already rejected
            // horizontal edges.
            if p1.x == p2.x {
                inside = !inside;
            } else {
                let x_cross = (point.y - p1.y) * (p2.x - p1.x) / (p2.y - p1.y) + p1.x;
                if point.x <= x_cross {
                    inside = !inside;
                }
            }
        }
        p1 = p2;
    }
    inside
}
