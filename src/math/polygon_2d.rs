use crate::config::Tolerances;

use super::intersect_2d::segment_intersection_2d;
use super::{cross_2d, points_equal_2d, Point2};

/// Where a point lies relative to a polygon.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PointInPolygon {
    /// Strictly inside the polygon.
    pub inside: bool,
    /// On a vertex or an edge of the polygon.
    pub overlaps: bool,
}

/// How one polygon relates to another.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PolygonRelation {
    /// The boundaries cross.
    pub overlapping: bool,
    /// Every contained vertex is strictly inside.
    pub fully_contained: bool,
    /// Inside, but touching the containing boundary.
    pub partially_contained: bool,
}

impl PolygonRelation {
    /// Contained without crossing, whether or not the boundaries touch.
    #[must_use]
    pub fn is_contained(&self) -> bool {
        !self.overlapping && (self.fully_contained || self.partially_contained)
    }
}

/// Computes the signed area of a polygon (shoelace formula).
///
/// Positive for counter-clockwise, negative for clockwise.
#[must_use]
pub fn signed_area_2d(points: &[Point2]) -> f64 {
    let n = points.len();
    if n < 3 {
        return 0.0;
    }
    let mut sum = 0.0;
    for i in 0..n {
        let j = (i + 1) % n;
        sum += points[i].x * points[j].y - points[j].x * points[i].y;
    }
    sum * 0.5
}

/// Winding number of `point` with respect to `polygon`. Non-zero means inside.
fn winding_number(point: &Point2, polygon: &[Point2]) -> i32 {
    let n = polygon.len();
    let mut winding = 0i32;
    for i in 0..n {
        let a = polygon[i];
        let b = polygon[(i + 1) % n];
        let side = cross_2d(&(b - a), &(point - a));
        if a.y <= point.y {
            if b.y > point.y && side > 0.0 {
                winding += 1;
            }
        } else if b.y <= point.y && side < 0.0 {
            winding -= 1;
        }
    }
    winding
}

/// Classifies `point` against `polygon`.
///
/// Points within `tolerance` of a vertex or edge are reported as
/// overlapping and never as inside.
#[must_use]
pub fn point_in_polygon(point: &Point2, polygon: &[Point2], tolerance: f64) -> PointInPolygon {
    let n = polygon.len();
    if n < 3 {
        return PointInPolygon::default();
    }

    for i in 0..n {
        let start = polygon[i];
        let end = polygon[(i + 1) % n];
        if points_equal_2d(point, &start, tolerance) {
            return PointInPolygon {
                inside: false,
                overlaps: true,
            };
        }

        let edge = end - start;
        let len = edge.norm();
        if len <= tolerance {
            continue;
        }
        let dir = edge / len;
        let along = (point - start).dot(&dir);
        let projected = start + dir * along;
        if points_equal_2d(point, &projected, tolerance) && (-tolerance..=len + tolerance).contains(&along) {
            return PointInPolygon {
                inside: false,
                overlaps: true,
            };
        }
    }

    PointInPolygon {
        inside: winding_number(point, polygon) != 0,
        overlaps: false,
    }
}

/// Containment of `contained` by `containing`, assuming their boundaries don't cross.
///
/// Returns `(fully, partially)`.
fn polygon_containment(containing: &[Point2], contained: &[Point2], tolerance: f64) -> (bool, bool) {
    let mut fully = true;
    let mut any_strictly_inside = false;

    for vertex in contained {
        let result = point_in_polygon(vertex, containing, tolerance);
        any_strictly_inside |= result.inside;
        if !result.inside {
            fully = false;
            if !result.overlaps {
                return (false, false);
            }
        }
    }

    if fully {
        return (true, false);
    }
    if any_strictly_inside {
        return (false, true);
    }

    // Every vertex touches the boundary; the shape is inside only if some edge runs through the interior.
    let n = contained.len();
    let partially = (0..n).any(|i| {
        let midpoint = Point2::from((contained[i].coords + contained[(i + 1) % n].coords) * 0.5);
        point_in_polygon(&midpoint, containing, tolerance).inside
    });
    (false, partially)
}

/// Relates two polygons: crossing boundaries first, then containment.
///
/// Edges only count as crossing when they intersect farther than
/// `tolerance` from their ends, so shared vertices and touching edges fall
/// through to the containment test.
#[must_use]
pub fn polygon_intersection(containing: &[Point2], contained: &[Point2], tolerances: &Tolerances) -> PolygonRelation {
    let tolerance = tolerances.ray_intersect;
    let n = containing.len();
    let m = contained.len();
    if n < 3 || m < 3 {
        return PolygonRelation::default();
    }

    for i in 0..n {
        let (a0, a1) = (containing[i], containing[(i + 1) % n]);
        for j in 0..m {
            let (b0, b1) = (contained[j], contained[(j + 1) % m]);
            if segment_intersection_2d(&a0, &a1, &b0, &b1, -tolerance, tolerances.normals_parallel).is_some() {
                return PolygonRelation {
                    overlapping: true,
                    ..PolygonRelation::default()
                };
            }
        }
    }

    let (fully_contained, partially_contained) = polygon_containment(containing, contained, tolerance);
    PolygonRelation {
        overlapping: false,
        fully_contained,
        partially_contained,
    }
}

/// Whether the points form a simple polygon.
///
/// Rejects edges shorter than `kinda_small`, repeated vertices, and edges
/// that come within `planar_dot` of any non-adjacent edge.
#[must_use]
pub fn is_polygon_valid(points: &[Point2], tolerances: &Tolerances) -> bool {
    let (dist_epsilon, dot_epsilon) = (tolerances.kinda_small, tolerances.planar_dot);
    let n = points.len();
    if n < 3 {
        return false;
    }

    for i in 0..n {
        let (a0, a1) = (points[i], points[(i + 1) % n]);
        if points_equal_2d(&a0, &a1, dist_epsilon) {
            tracing::trace!(index = i, "zero-length polygon edge");
            return false;
        }

        for j in (0..n).filter(|&j| j != i) {
            let (b0, b1) = (points[j], points[(j + 1) % n]);
            if points_equal_2d(&a0, &b0, dist_epsilon) {
                tracing::trace!(first = i, second = j, "non-consecutive repeated polygon vertex");
                return false;
            }

            let adjacent = points_equal_2d(&a0, &b1, dist_epsilon)
                || points_equal_2d(&a1, &b0, dist_epsilon)
                || points_equal_2d(&a1, &b1, dist_epsilon);
            if !adjacent && segment_intersection_2d(&a0, &a1, &b0, &b1, dot_epsilon, tolerances.normals_parallel).is_some() {
                tracing::trace!(first = i, second = j, "polygon edges intersect");
                return false;
            }
        }
    }
    true
}
