use crate::config::Tolerances;

use super::{up, Point2, Point3, Vector2, Vector3};

/// Projects a 3D point into the 2D basis `(axis_x, axis_y)` anchored at `origin`.
#[must_use]
pub fn project_point_2d(point: &Point3, axis_x: &Vector3, axis_y: &Vector3, origin: &Point3) -> Point2 {
    let delta = point - origin;
    Point2::new(delta.dot(axis_x), delta.dot(axis_y))
}

/// Inverse of [`project_point_2d`] for points on the basis plane.
#[must_use]
pub fn deproject_2d_point(point: &Point2, axis_x: &Vector3, axis_y: &Vector3, origin: &Point3) -> Point3 {
    origin + axis_x * point.x + axis_y * point.y
}

/// Projects a 3D direction into the 2D basis `(axis_x, axis_y)`.
#[must_use]
pub fn project_vector_2d(vector: &Vector3, axis_x: &Vector3, axis_y: &Vector3) -> Vector2 {
    Vector2::new(vector.dot(axis_x), vector.dot(axis_y))
}

/// Derives an orthonormal `(axis_x, axis_y)` pair for the plane with unit normal `axis_z`.
///
/// The result is right-handed (`axis_x × axis_y == axis_z`). For tilted and
/// vertical planes `axis_x` is horizontal, so `axis_y` runs along the slope.
/// Normals within `normals_parallel` of vertical use the world X axis.
#[must_use]
pub fn find_basis_vectors(axis_z: &Vector3, tolerances: &Tolerances) -> (Vector3, Vector3) {
    if tolerances.parallel(axis_z, &up()) {
        let axis_y = if axis_z.z > 0.0 {
            Vector3::y()
        } else {
            -Vector3::y()
        };
        (Vector3::x(), axis_y)
    } else {
        let axis_x = axis_z.cross(&up()).normalize();
        let axis_y = axis_z.cross(&axis_x);
        (axis_x, axis_y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn round_trip_on_plane() {
        let normal = Vector3::new(1.0, 1.0, 0.5).normalize();
        let (axis_x, axis_y) = find_basis_vectors(&normal, &Tolerances::default());
        let origin = Point3::new(3.0, -2.0, 7.0);
        let point = origin + axis_x * 12.5 - axis_y * 4.25;

        let projected = project_point_2d(&point, &axis_x, &axis_y, &origin);
        assert_relative_eq!(projected, Point2::new(12.5, -4.25), epsilon = 1e-9);
        let back = deproject_2d_point(&projected, &axis_x, &axis_y, &origin);
        assert_relative_eq!(back, point, epsilon = 1e-9);
    }

    #[test]
    fn basis_is_right_handed() {
        for normal in [
            Vector3::z(),
            -Vector3::z(),
            Vector3::x(),
            Vector3::new(0.0, -1.0, 1.0).normalize(),
        ] {
            let (axis_x, axis_y) = find_basis_vectors(&normal, &Tolerances::default());
            assert_relative_eq!(axis_x.norm(), 1.0, epsilon = 1e-12);
            assert_relative_eq!(axis_y.norm(), 1.0, epsilon = 1e-12);
            assert_relative_eq!(axis_x.cross(&axis_y), normal, epsilon = 1e-12);
        }
    }

    #[test]
    fn wall_basis_is_horizontal() {
        let (axis_x, _) = find_basis_vectors(&Vector3::y(), &Tolerances::default());
        assert_relative_eq!(axis_x.z, 0.0);
    }

    #[test]
    fn near_vertical_threshold_comes_from_tolerances() {
        let tilted = Vector3::new(0.0, 0.1, 1.0).normalize();
        let (axis_x, axis_y) = find_basis_vectors(&tilted, &Tolerances::default());
        assert_relative_eq!(axis_x, Vector3::x(), epsilon = 1e-12);
        assert!(axis_y.z < -0.09);

        let loose = Tolerances {
            normals_parallel: 0.99,
            ..Tolerances::default()
        };
        let (axis_x, axis_y) = find_basis_vectors(&tilted, &loose);
        assert_relative_eq!(axis_x, Vector3::x());
        assert_relative_eq!(axis_y, Vector3::y());
    }

    #[test]
    fn vector_projection_ignores_offset() {
        let v = project_vector_2d(&Vector3::new(2.0, 3.0, 9.0), &Vector3::x(), &Vector3::y());
        assert_relative_eq!(v, Vector2::new(2.0, 3.0));
    }
}
