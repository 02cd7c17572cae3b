use crate::config::Tolerances;

use super::{perp, points_equal_2d, Point2, Vector2};

/// Result of intersecting two 2D rays.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit2D {
    /// Intersection point.
    pub point: Point2,
    /// Signed distance along the first ray.
    pub dist_a: f64,
    /// Signed distance along the second ray.
    pub dist_b: f64,
}

/// Result of intersecting two 2D segments.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegmentHit2D {
    /// Intersection point, or the middle of the shared span for overlapping segments.
    pub point: Point2,
    /// Whether the segments are colinear and share a span.
    pub overlapping: bool,
}

/// Intersects two rays given by origin and unit direction.
///
/// Parallel rays only hit when they are colinear. Coincident colinear rays
/// report the origin that lies ahead of the other; anti-parallel colinear
/// rays meet half way. With `require_positive`, hits behind either origin
/// are rejected. Distances are compared against `ray_intersect` and
/// directions against `normals_parallel`.
#[must_use]
pub fn ray_intersection_2d(
    origin_a: &Point2,
    dir_a: &Vector2,
    origin_b: &Point2,
    dir_b: &Vector2,
    require_positive: bool,
    tolerances: &Tolerances,
) -> Option<RayHit2D> {
    let tolerance = tolerances.ray_intersect;
    let origin_delta = origin_b - origin_a;
    if origin_delta.norm() <= tolerance {
        return Some(RayHit2D {
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
            return Some(RayHit2D {
                point,
                dist_a: b_on_a.max(0.0),
                dist_b: a_on_b.max(0.0),
            });
        }

        if b_on_a <= -tolerance && require_positive {
            return None;
        }
        return Some(RayHit2D {
            point: Point2::from((origin_a.coords + origin_b.coords) * 0.5),
            dist_a: 0.5 * b_on_a,
            dist_b: 0.5 * a_on_b,
        });
    }

    let normal_a = perp(dir_a);
    let normal_b = perp(dir_b);
    let dist_a = origin_delta.dot(&normal_b) / dir_a.dot(&normal_b);
    let dist_b = -origin_delta.dot(&normal_a) / dir_b.dot(&normal_a);

    if require_positive && (dist_a < -tolerance || dist_b < -tolerance) {
        return None;
    }

    let point_a = origin_a + dir_a * dist_a;
    let point_b = origin_b + dir_b * dist_b;
    if !points_equal_2d(&point_a, &point_b, tolerance) {
        return None;
    }

    Some(RayHit2D {
        point: point_a,
        dist_a,
        dist_b,
    })
}

/// Closest point to `point` on the segment `start..end`.
fn nearest_on_segment(start: &Point2, end: &Point2, point: &Point2) -> Point2 {
    let delta = end - start;
    let len_sq = delta.norm_squared();
    if len_sq <= f64::EPSILON {
        return *start;
    }
    let t = ((point - start).dot(&delta) / len_sq).clamp(0.0, 1.0);
    start + delta * t
}

/// Intersects two segments.
///
/// `signed_tolerance` widens the segments when positive and shrinks them when
/// negative, so a negative value only reports crossings strictly inside both
/// segments. Zero-length segments are treated as points. Segments whose
/// directions dot above `parallel_dot` are tested for colinear overlap.
#[must_use]
pub fn segment_intersection_2d(
    start_a: &Point2,
    end_a: &Point2,
    start_b: &Point2,
    end_b: &Point2,
    signed_tolerance: f64,
    parallel_dot: f64,
) -> Option<SegmentHit2D> {
    let tolerance = signed_tolerance.abs();
    let point_hit = |point: Point2| {
        Some(SegmentHit2D {
            point,
            overlapping: false,
        })
    };

    let delta_a = end_a - start_a;
    let len_a = delta_a.norm();
    let delta_b = end_b - start_b;
    let len_b = delta_b.norm();
    let degenerate_a = len_a <= tolerance;
    let degenerate_b = len_b <= tolerance;

    match (degenerate_a, degenerate_b) {
        (true, true) => {
            return points_equal_2d(start_a, start_b, tolerance)
                .then_some(*start_a)
                .and_then(point_hit);
        }
        (true, false) => {
            let nearest = nearest_on_segment(start_b, end_b, start_a);
            return points_equal_2d(&nearest, start_a, tolerance)
                .then_some(*start_a)
                .and_then(point_hit);
        }
        (false, true) => {
            let nearest = nearest_on_segment(start_a, end_a, start_b);
            return points_equal_2d(&nearest, start_b, tolerance)
                .then_some(*start_b)
                .and_then(point_hit);
        }
        (false, false) => {}
    }

    let dir_a = delta_a / len_a;
    let dir_b = delta_b / len_b;
    let starts_delta = start_b - start_a;

    if dir_a.dot(&dir_b).abs() >= parallel_dot {
        let b_start_on_a = starts_delta.dot(&dir_a);
        let b_end_on_a = (end_b - start_a).dot(&dir_a);
        let b_min = b_start_on_a.min(b_end_on_a);
        let b_max = b_start_on_a.max(b_end_on_a);

        let b_start_projected = start_a + dir_a * b_start_on_a;
        if !points_equal_2d(start_b, &b_start_projected, tolerance) {
            return None;
        }
        if b_min >= len_a + signed_tolerance || b_max <= -signed_tolerance {
            return None;
        }

        let overlap_center = 0.5 * (b_min.max(0.0) + b_max.min(len_a));
        return Some(SegmentHit2D {
            point: start_a + dir_a * overlap_center,
            overlapping: true,
        });
    }

    let normal_a = perp(&dir_a);
    let normal_b = perp(&dir_b);
    let dist_a = starts_delta.dot(&normal_b) / dir_a.dot(&normal_b);
    let dist_b = -starts_delta.dot(&normal_a) / dir_b.dot(&normal_a);

    let within = |dist: f64, len: f64| dist >= -signed_tolerance && dist <= len + signed_tolerance;
    if within(dist_a, len_a) && within(dist_b, len_b) {
        point_hit(start_a + dir_a * dist_a)
    } else {
        None
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn p(x: f64, y: f64) -> Point2 {
        Point2::new(x, y)
    }

    fn v(x: f64, y: f64) -> Vector2 {
        Vector2::new(x, y).normalize()
    }

    fn tight() -> Tolerances {
        Tolerances {
            ray_intersect: 1e-6,
            ..Tolerances::default()
        }
    }

    const PARALLEL: f64 = crate::math::NORMALS_PARALLEL;

    // ── ray_intersection_2d ──

    #[test]
    fn crossing_rays() {
        let hit = ray_intersection_2d(&p(0.0, 0.0), &v(1.0, 0.0), &p(5.0, -3.0), &v(0.0, 1.0), true, &tight())
            .unwrap();
        assert_relative_eq!(hit.point, p(5.0, 0.0), epsilon = 1e-9);
        assert_relative_eq!(hit.dist_a, 5.0, epsilon = 1e-9);
        assert_relative_eq!(hit.dist_b, 3.0, epsilon = 1e-9);
    }

    #[test]
    fn hit_behind_origin_needs_signed_mode() {
        let a = p(0.0, 0.0);
        let b = p(-5.0, -3.0);
        assert!(ray_intersection_2d(&a, &v(1.0, 0.0), &b, &v(0.0, 1.0), true, &tight()).is_none());
        let hit = ray_intersection_2d(&a, &v(1.0, 0.0), &b, &v(0.0, 1.0), false, &tight()).unwrap();
        assert_relative_eq!(hit.dist_a, -5.0, epsilon = 1e-9);
    }

    #[test]
    fn parallel_offset_rays_miss() {
        assert!(ray_intersection_2d(&p(0.0, 0.0), &v(1.0, 0.0), &p(0.0, 1.0), &v(1.0, 0.0), false, &tight()).is_none());
    }

    #[test]
    fn anti_parallel_colinear_rays_meet_half_way() {
        let hit = ray_intersection_2d(&p(0.0, 0.0), &v(1.0, 0.0), &p(4.0, 0.0), &v(-1.0, 0.0), true, &tight())
            .unwrap();
        assert_relative_eq!(hit.point, p(2.0, 0.0), epsilon = 1e-9);
        assert_relative_eq!(hit.dist_a, 2.0, epsilon = 1e-9);
        assert_relative_eq!(hit.dist_b, 2.0, epsilon = 1e-9);
    }

    #[test]
    fn shared_origin() {
        let hit = ray_intersection_2d(&p(1.0, 1.0), &v(1.0, 0.0), &p(1.0, 1.0), &v(0.0, 1.0), true, &tight())
            .unwrap();
        assert_relative_eq!(hit.dist_a, 0.0);
        assert_relative_eq!(hit.point, p(1.0, 1.0));
    }

    #[test]
    fn parallel_threshold_comes_from_tolerances() {
        let (a, b) = (p(0.0, 0.0), p(0.0, 1.0));
        let shallow = v(1.0, -0.1);
        let hit = ray_intersection_2d(&a, &v(1.0, 0.0), &b, &shallow, true, &tight()).unwrap();
        assert_relative_eq!(hit.dist_a, 10.0, epsilon = 1e-9);

        let loose = Tolerances {
            normals_parallel: 0.99,
            ..tight()
        };
        assert!(ray_intersection_2d(&a, &v(1.0, 0.0), &b, &shallow, true, &loose).is_none());
    }

    // ── segment_intersection_2d ──

    #[test]
    fn crossing_segments() {
        let hit = segment_intersection_2d(&p(0.0, 0.0), &p(2.0, 2.0), &p(0.0, 2.0), &p(2.0, 0.0), 1e-6, PARALLEL).unwrap();
        assert!(!hit.overlapping);
        assert_relative_eq!(hit.point, p(1.0, 1.0), epsilon = 1e-9);
    }

    #[test]
    fn negative_tolerance_ignores_touching_ends() {
        let a0 = p(0.0, 0.0);
        let a1 = p(2.0, 0.0);
        let b0 = p(2.0, 0.0);
        let b1 = p(2.0, 2.0);
        assert!(segment_intersection_2d(&a0, &a1, &b0, &b1, 1e-6, PARALLEL).is_some());
        assert!(segment_intersection_2d(&a0, &a1, &b0, &b1, -0.2, PARALLEL).is_none());
    }

    #[test]
    fn colinear_overlap() {
        let hit = segment_intersection_2d(&p(0.0, 0.0), &p(4.0, 0.0), &p(2.0, 0.0), &p(6.0, 0.0), 1e-6, PARALLEL).unwrap();
        assert!(hit.overlapping);
        assert_relative_eq!(hit.point, p(3.0, 0.0), epsilon = 1e-9);
    }

    #[test]
    fn degenerate_segment_on_other() {
        let hit = segment_intersection_2d(&p(1.0, 0.0), &p(1.0, 0.0), &p(0.0, 0.0), &p(2.0, 0.0), 1e-6, PARALLEL).unwrap();
        assert_relative_eq!(hit.point, p(1.0, 0.0));
        assert!(segment_intersection_2d(&p(1.0, 1.0), &p(1.0, 1.0), &p(0.0, 0.0), &p(2.0, 0.0), 1e-6, PARALLEL).is_none());
    }
}
