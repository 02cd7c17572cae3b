use super::{points_equal, Point3, Vector3};

/// Unnormalized polygon normal by Newell's method.
///
/// Its length is twice the polygon area; the direction follows the loop's
/// counter-clockwise winding.
#[must_use]
pub fn newell_normal(points: &[Point3]) -> Vector3 {
    let n = points.len();
    let mut normal = Vector3::zeros();
    for i in 0..n {
        let curr = &points[i];
        let next = &points[(i + 1) % n];
        normal.x += (curr.y - next.y) * (curr.z + next.z);
        normal.y += (curr.z - next.z) * (curr.x + next.x);
        normal.z += (curr.x - next.x) * (curr.y + next.y);
    }
    normal
}

/// Average of the loop's vertices.
#[must_use]
pub fn vertex_centroid(points: &[Point3]) -> Option<Point3> {
    if points.is_empty() {
        return None;
    }
    #[allow(clippy::cast_precision_loss)]
    let count = points.len() as f64;
    let sum = points.iter().fold(Vector3::zeros(), |acc, p| acc + p.coords);
    Some(Point3::from(sum / count))
}

/// Returns the points in order, skipping any within `tolerance` of an earlier one.
#[must_use]
pub fn unique_points(points: &[Point3], tolerance: f64) -> Vec<Point3> {
    let mut unique: Vec<Point3> = Vec::with_capacity(points.len());
    for point in points {
        if !unique.iter().any(|u| points_equal(u, point, tolerance)) {
            unique.push(*point);
        }
    }
    unique
}

/// Index of the first point equal to its successor (wrapping), if any.
#[must_use]
pub fn first_repeated_point(points: &[Point3], tolerance: f64) -> Option<usize> {
    let n = points.len();
    (0..n).find(|&i| points_equal(&points[i], &points[(i + 1) % n], tolerance))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn p(x: f64, y: f64, z: f64) -> Point3 {
        Point3::new(x, y, z)
    }

    fn unit_square() -> Vec<Point3> {
        vec![p(0.0, 0.0, 0.0), p(1.0, 0.0, 0.0), p(1.0, 1.0, 0.0), p(0.0, 1.0, 0.0)]
    }

    #[test]
    fn newell_of_ccw_square_points_up() {
        let normal = newell_normal(&unit_square());
        assert_relative_eq!(normal, Vector3::new(0.0, 0.0, 2.0), epsilon = 1e-12);
    }

    #[test]
    fn centroid_of_square() {
        let c = vertex_centroid(&unit_square()).unwrap();
        assert_relative_eq!(c, p(0.5, 0.5, 0.0));
        assert!(vertex_centroid(&[]).is_none());
    }

    #[test]
    fn duplicates_are_dropped() {
        let mut pts = unit_square();
        pts.insert(2, p(1.0, 0.05, 0.0));
        assert_eq!(unique_points(&pts, 0.1).len(), 4);
        assert_eq!(first_repeated_point(&pts, 0.1), Some(1));
        assert_eq!(first_repeated_point(&unit_square(), 0.1), None);
    }
}
