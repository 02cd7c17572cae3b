use crate::math::{Point3, Vector2, Vector3, NORMALS_ORTHOGONAL, NORMALS_PARALLEL};

/// Distance and angle thresholds shared by every layer and miter computation.
///
/// Distances are in centimeters. The values are threaded explicitly through
/// the calls that need them; there is no process-wide default table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tolerances {
    /// Snapping distance for projected points that should coincide.
    pub kinda_small: f64,
    /// Thickness below which a layer is treated as a zero-thickness membrane.
    pub small: f64,
    /// Planarity distance, and the thickness below which side walls are skipped.
    pub planar_dot: f64,
    /// Tolerance for ray/segment intersections and duplicate point merging.
    pub ray_intersect: f64,
    /// Edges shorter than this produce no side wall.
    pub points_are_near: f64,
    /// Minimum `|dot|` for two unit vectors to count as parallel.
    pub normals_parallel: f64,
    /// Maximum `|dot|` for two unit vectors to count as orthogonal.
    pub normals_orthogonal: f64,
}

impl Default for Tolerances {
    fn default() -> Self {
        Self {
            kinda_small: 1e-4,
            small: 1e-8,
            planar_dot: 0.1,
            ray_intersect: 0.2,
            points_are_near: 0.015,
            normals_parallel: NORMALS_PARALLEL,
            normals_orthogonal: NORMALS_ORTHOGONAL,
        }
    }
}

impl Tolerances {
    /// Whether two unit vectors point along the same line.
    #[must_use]
    pub fn parallel(&self, a: &Vector3, b: &Vector3) -> bool {
        a.dot(b).abs() >= self.normals_parallel
    }

    /// Whether two unit vectors point along the same line in the same direction.
    #[must_use]
    pub fn coincident(&self, a: &Vector3, b: &Vector3) -> bool {
        a.dot(b) >= self.normals_parallel
    }

    /// Whether two unit vectors are perpendicular.
    #[must_use]
    pub fn orthogonal(&self, a: &Vector3, b: &Vector3) -> bool {
        a.dot(b).abs() <= self.normals_orthogonal
    }
}

/// Parameters controlling the mesh buffers emitted for a layer.
#[derive(Debug, Clone, Copy)]
pub struct TriangulationParams {
    /// Scale applied to projected texture coordinates (centimeters to meters by default).
    pub uv_scale: Vector2,
    /// World-space anchor that texture coordinates are measured from.
    pub uv_anchor: Point3,
    /// Geometric thresholds.
    pub tolerances: Tolerances,
}

impl Default for TriangulationParams {
    fn default() -> Self {
        Self {
            uv_scale: Vector2::new(0.01, 0.01),
            uv_anchor: Point3::origin(),
            tolerances: Tolerances::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vector_relations() {
        let tol = Tolerances::default();
        let x = Vector3::x();
        let y = Vector3::y();
        assert!(tol.parallel(&x, &-x));
        assert!(!tol.coincident(&x, &-x));
        assert!(tol.coincident(&x, &x));
        assert!(tol.orthogonal(&x, &y));
        assert!(!tol.parallel(&x, &y));
    }

    #[test]
    fn default_uv_scale_is_centimeters_to_meters() {
        let params = TriangulationParams::default();
        assert!((params.uv_scale.x - 0.01).abs() < 1e-12);
        assert!((params.uv_scale.y - 0.01).abs() < 1e-12);
    }
}
