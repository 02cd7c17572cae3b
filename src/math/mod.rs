pub mod intersect_2d;
pub mod intersect_3d;
pub mod plane;
pub mod polygon_2d;
pub mod polygon_3d;
pub mod projection;

pub use plane::Plane;

/// 2D point type.
pub type Point2 = nalgebra::Point2<f64>;

/// 3D point type.
pub type Point3 = nalgebra::Point3<f64>;

/// 2D vector type.
pub type Vector2 = nalgebra::Vector2<f64>;

/// 3D vector type.
pub type Vector3 = nalgebra::Vector3<f64>;

/// Global tolerance for exact-zero floating-point comparisons.
pub const TOLERANCE: f64 = 1e-10;

/// Minimum `|dot|` for two unit vectors to count as parallel.
pub const NORMALS_PARALLEL: f64 = 0.999_845;

/// Maximum `|dot|` for two unit vectors to count as orthogonal.
pub const NORMALS_ORTHOGONAL: f64 = 0.017_455;

/// World up axis.
#[must_use]
pub fn up() -> Vector3 {
    Vector3::z()
}

/// 2D cross product (`a.x * b.y - a.y * b.x`).
#[inline]
#[must_use]
pub fn cross_2d(a: &Vector2, b: &Vector2) -> f64 {
    a.x * b.y - a.y * b.x
}

/// Left-pointing perpendicular of a 2D vector.
#[inline]
#[must_use]
pub fn perp(v: &Vector2) -> Vector2 {
    Vector2::new(-v.y, v.x)
}

/// Returns the normalized vector, or zero if it is shorter than [`TOLERANCE`].
#[must_use]
pub fn safe_normal(v: &Vector3) -> Vector3 {
    v.try_normalize(TOLERANCE).unwrap_or_else(Vector3::zeros)
}

/// Whether a vector has unit length within `tolerance`.
#[must_use]
pub fn is_normalized(v: &Vector3, tolerance: f64) -> bool {
    (v.norm_squared() - 1.0).abs() < tolerance
}

/// Whether two points are within `tolerance` of each other on every axis.
#[must_use]
pub fn points_equal(a: &Point3, b: &Point3, tolerance: f64) -> bool {
    (a.x - b.x).abs() <= tolerance && (a.y - b.y).abs() <= tolerance && (a.z - b.z).abs() <= tolerance
}

/// 2D counterpart of [`points_equal`].
#[must_use]
pub fn points_equal_2d(a: &Point2, b: &Point2, tolerance: f64) -> bool {
    (a.x - b.x).abs() <= tolerance && (a.y - b.y).abs() <= tolerance
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cross_and_perp() {
        let a = Vector2::new(1.0, 0.0);
        let b = Vector2::new(0.0, 1.0);
        assert!((cross_2d(&a, &b) - 1.0).abs() < TOLERANCE);
        let p = perp(&a);
        assert!((p - b).norm() < TOLERANCE);
    }

    #[test]
    fn safe_normal_of_zero_is_zero() {
        assert_eq!(safe_normal(&Vector3::zeros()), Vector3::zeros());
        let n = safe_normal(&Vector3::new(0.0, 3.0, 4.0));
        assert!((n.norm() - 1.0).abs() < TOLERANCE);
    }

    #[test]
    fn point_equality_is_per_axis() {
        let a = Point3::new(1.0, 2.0, 3.0);
        assert!(points_equal(&a, &Point3::new(1.05, 2.0, 3.0), 0.1));
        assert!(!points_equal(&a, &Point3::new(1.2, 2.0, 3.0), 0.1));
        assert!(points_equal_2d(&Point2::new(0.0, 0.0), &Point2::new(0.0, 1e-5), 1e-4));
    }
}
