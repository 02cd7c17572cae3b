use super::plane::Plane;
use crate::config::Tolerances;

use super::{is_normalized, Point3, Vector3, TOLERANCE};

/// Result of intersecting two 3D rays.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit3D {
    /// Intersection point.
    pub point: Point3,
    /// Signed distance along the first ray.
    pub dist_a: f64,
    /// Signed distance along the second ray.
    pub dist_b: f64,
}

/// Intersects two rays given by origin and unit direction.
///
/// The rays must share a plane within `ray_intersect`. Parallel rays follow the
/// same colinear rules as
/// [`ray_intersection_2d`](super::intersect_2d::ray_intersection_2d).
#[must_use]
pub fn ray_intersection_3d(
    origin_a: &Point3,
    dir_a: &Vector3,
    origin_b: &Point3,
    dir_b: &Vector3,
    require_positive: bool,
    tolerances: &Tolerances,
) -> Option<RayHit3D> {
    let tolerance = tolerances.ray_intersect;
    if !is_normalized(dir_a, 1e-4) || !is_normalized(dir_b, 1e-4) {
        return None;
    }

    let origin_delta = origin_b - origin_a;
    if origin_delta.norm() <= tolerance {
        return Some(RayHit3D {
            point: *origin_a,
            dist_a: 0.0,
            dist_b: 0.0,
        });
    }

    let a_dot_b = dir_a.dot(dir_b);
    if a_dot_b.abs() > tolerances.normals_parallel {
        let b_on_a = origin_delta.dot(dir_a);
        let a_on_b = -origin_delta.dot(dir_b);
        let b_projected = origin_a + dir_a * b_on_a;
        if (origin_b - b_projected).norm() > tolerance {
            return None;
        }

        if a_dot_b > 0.0 {
            let point = if b_on_a > -tolerance { *origin_b } else { *origin_a };
            return Some(RayHit3D {
                point,
                dist_a: b_on_a.max(0.0),
                dist_b: a_on_b.max(0.0),
            });
        }

        if b_on_a <= -tolerance && require_positive {
            return None;
        }
        return Some(RayHit3D {
            point: Point3::from((origin_a.coords + origin_b.coords) * 0.5),
            dist_a: 0.5 * b_on_a,
            dist_b: 0.5 * a_on_b,
        });
    }

    let plane_normal = dir_a.cross(dir_b).try_normalize(TOLERANCE)?;
    if (origin_delta.dot(&plane_normal)).abs() > tolerance {
        return None;
    }

    let normal_a = dir_a.cross(&plane_normal);
    let normal_b = dir_b.cross(&plane_normal);
    let dist_a = origin_delta.dot(&normal_b) / dir_a.dot(&normal_b);
    let dist_b = -origin_delta.dot(&normal_a) / dir_b.dot(&normal_a);

    if require_positive && (dist_a < -tolerance || dist_b < -tolerance) {
        return None;
    }

    let point_a = origin_a + dir_a * dist_a;
    let point_b = origin_b + dir_b * dist_b;
    if (point_a - point_b).norm() > tolerance {
        return None;
    }

    Some(RayHit3D {
        point: point_a,
        dist_a,
        dist_b,
    })
}

/// Intersection of the segment `start..end` with a plane, if it crosses within the segment.
#[must_use]
pub fn segment_plane_intersection(start: &Point3, end: &Point3, plane: &Plane) -> Option<Point3> {
    let delta = end - start;
    let denom = plane.normal().dot(&delta);
    if denom.abs() < TOLERANCE {
        return None;
    }
    let t = -plane.signed_distance(start) / denom;
    (-1e-8..=1.0 + 1e-8)
        .contains(&t)
        .then(|| start + delta * t)
}

/// Points where the edges of a closed loop, shifted by `offset`, cross `plane`.
#[must_use]
pub fn plane_intersections(points: &[Point3], plane: &Plane, offset: &Vector3) -> Vec<Point3> {
    let n = points.len();
    (0..n)
        .filter_map(|i| {
            let start = points[i] + offset;
            let end = points[(i + 1) % n] + offset;
            if start == end {
                return None;
            }
            segment_plane_intersection(&start, &end, plane)
        })
        .collect()
}
