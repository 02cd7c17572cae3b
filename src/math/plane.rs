use crate::error::{GeometryError, Result};

use super::polygon_3d::newell_normal;
use super::{Point3, Vector3, TOLERANCE};

/// An infinite oriented plane in 3D space.
///
/// Stored as an origin point and a unit normal. The signed distance of a
/// point is positive on the side the normal points to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane {
    origin: Point3,
    normal: Vector3,
}

impl Plane {
    /// Creates a plane from an origin and a normal vector.
    ///
    /// # Errors
    ///
    /// Returns an error if the normal vector is zero-length.
    pub fn new(origin: Point3, normal: Vector3) -> Result<Self> {
        let normal = normal
            .try_normalize(TOLERANCE)
            .ok_or(GeometryError::ZeroVector)?;
        Ok(Self { origin, normal })
    }

    /// Fits a plane through a closed point loop.
    ///
    /// The normal follows the loop's winding (counter-clockwise when seen
    /// from the side it points to). Every point must lie within `tolerance`
    /// of the plane.
    ///
    /// # Errors
    ///
    /// Returns an error if fewer than 3 points are given, if the first two
    /// points coincide, if all points are colinear, or if any point is
    /// farther than `tolerance` from the fitted plane.
    pub fn from_points(points: &[Point3], tolerance: f64) -> Result<Self> {
        if points.len() < 3 {
            return Err(GeometryError::TooFewPoints(points.len()).into());
        }
        if (points[1] - points[0]).norm() < TOLERANCE {
            return Err(GeometryError::RepeatedPoints(0).into());
        }

        let normal = newell_normal(points)
            .try_normalize(TOLERANCE)
            .ok_or(GeometryError::NonPlanar("points are colinear"))?;
        let plane = Self {
            origin: points[0],
            normal,
        };

        if points
            .iter()
            .any(|p| plane.signed_distance(p).abs() > tolerance)
        {
            return Err(GeometryError::NonPlanar("point off the fitted plane").into());
        }
        Ok(plane)
    }

    /// Returns the origin point of the plane.
    #[must_use]
    pub fn origin(&self) -> &Point3 {
        &self.origin
    }

    /// Returns the unit normal of the plane.
    #[must_use]
    pub fn normal(&self) -> &Vector3 {
        &self.normal
    }

    /// Distance of the plane from the world origin along its normal.
    #[must_use]
    pub fn w(&self) -> f64 {
        self.normal.dot(&self.origin.coords)
    }

    /// Signed distance from the plane to `point`.
    #[must_use]
    pub fn signed_distance(&self, point: &Point3) -> f64 {
        self.normal.dot(&(point - self.origin))
    }

    /// Orthogonal projection of `point` onto the plane.
    #[must_use]
    pub fn project(&self, point: &Point3) -> Point3 {
        point - self.normal * self.signed_distance(point)
    }

    /// The same plane with its normal reversed.
    #[must_use]
    pub fn flipped(&self) -> Self {
        Self {
            origin: self.origin,
            normal: -self.normal,
        }
    }

    /// Whether two planes describe the same surface, in either orientation.
    #[must_use]
    pub fn is_coplanar(&self, other: &Self, parallel_dot: f64, distance: f64) -> bool {
        let dot = self.normal.dot(&other.normal);
        (dot >= parallel_dot && (self.w() - other.w()).abs() <= distance)
            || (dot <= -parallel_dot && (self.w() + other.w()).abs() <= distance)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn p(x: f64, y: f64, z: f64) -> Point3 {
        Point3::new(x, y, z)
    }

    fn square(z: f64) -> Vec<Point3> {
        vec![p(0.0, 0.0, z), p(1.0, 0.0, z), p(1.0, 1.0, z), p(0.0, 1.0, z)]
    }

    #[test]
    fn normal_follows_winding() {
        let plane = Plane::from_points(&square(2.0), 1e-3).unwrap();
        assert_relative_eq!(*plane.normal(), Vector3::z(), epsilon = 1e-12);
        assert_relative_eq!(plane.w(), 2.0, epsilon = 1e-12);

        let mut reversed = square(2.0);
        reversed.reverse();
        let plane = Plane::from_points(&reversed, 1e-3).unwrap();
        assert_relative_eq!(*plane.normal(), -Vector3::z(), epsilon = 1e-12);
    }

    #[test]
    fn rejects_degenerate_loops() {
        assert!(Plane::from_points(&[p(0.0, 0.0, 0.0), p(1.0, 0.0, 0.0)], 1e-3).is_err());
        let colinear = [p(0.0, 0.0, 0.0), p(1.0, 0.0, 0.0), p(2.0, 0.0, 0.0)];
        assert!(Plane::from_points(&colinear, 1e-3).is_err());
        let mut bent = square(0.0);
        bent[2].z = 0.5;
        assert!(Plane::from_points(&bent, 1e-3).is_err());
    }

    #[test]
    fn signed_distance_and_projection() {
        let plane = Plane::new(p(0.0, 0.0, 1.0), Vector3::new(0.0, 0.0, 2.0)).unwrap();
        assert_relative_eq!(plane.signed_distance(&p(3.0, 4.0, 5.0)), 4.0);
        assert_relative_eq!(plane.project(&p(3.0, 4.0, 5.0)), p(3.0, 4.0, 1.0));
    }

    #[test]
    fn coplanar_in_either_orientation() {
        let a = Plane::new(p(0.0, 0.0, 1.0), Vector3::z()).unwrap();
        let b = Plane::new(p(5.0, 5.0, 1.0), -Vector3::z()).unwrap();
        let c = Plane::new(p(0.0, 0.0, 2.0), Vector3::z()).unwrap();
        assert!(a.is_coplanar(&b, 0.999, 1e-6));
        assert!(!a.is_coplanar(&c, 0.999, 1e-6));
        assert!(a.is_coplanar(&a.flipped(), 0.999, 1e-6));
    }
}
