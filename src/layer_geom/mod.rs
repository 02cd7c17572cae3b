mod hole_ranges;
mod project;
mod triangulate;

pub use project::{HoleValidity, LayerProjection};

use tracing::warn;

use crate::config::Tolerances;
use crate::error::{GeometryError, Result};
use crate::math::polygon_3d::{first_repeated_point, unique_points};
use crate::math::projection::{self, find_basis_vectors};
use crate::math::{is_normalized, Plane, Point2, Point3, Vector3};

/// A closed void loop cut through a layer, in world space.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PolyHole3D {
    pub points: Vec<Point3>,
}

impl PolyHole3D {
    #[must_use]
    pub fn new(points: Vec<Point3>) -> Self {
        Self { points }
    }
}

/// A hole projected into a layer's 2D basis.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PolyHole2D {
    pub points: Vec<Point2>,
}

/// Which of the two parallel faces of a layer a point refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayerSide {
    /// The face through `points_a`.
    A,
    /// The face through `points_b`, offset by the thickness along the normal.
    B,
}

/// Everything needed to build a [`LayerGeomDef`] from two explicit loops.
#[derive(Debug, Clone, Default)]
pub struct LayerGeomInput {
    pub points_a: Vec<Point3>,
    pub points_b: Vec<Point3>,
    pub normal: Vector3,
    /// Texture X axis hint; ignored unless unit length and orthogonal to `normal`.
    pub axis_x: Option<Vector3>,
    pub holes: Vec<PolyHole3D>,
    /// Merge near-duplicate loop points instead of rejecting them.
    pub handle_duplicates: bool,
}

/// Validated geometry of one layer: two parallel planar loops plus holes.
///
/// A `LayerGeomDef` only exists for valid input; every constructor reports
/// the first failed check as an error.
#[derive(Debug, Clone)]
pub struct LayerGeomDef {
    original_points_a: Vec<Point3>,
    original_points_b: Vec<Point3>,
    unique_points_a: Vec<Point3>,
    unique_points_b: Vec<Point3>,
    holes: Vec<PolyHole3D>,
    /// One entry per hole, set whenever the holes change.
    hole_validity: Vec<HoleValidity>,
    normal: Vector3,
    origin: Point3,
    axis_x: Vector3,
    axis_y: Vector3,
    thickness: f64,
    coincident: bool,
    initial_points_unique: bool,
    tolerances: Tolerances,
}

impl LayerGeomDef {
    /// Builds a layer by extruding `points` along `normal` by `thickness`.
    ///
    /// The texture X axis follows the first edge of the loop.
    ///
    /// # Errors
    ///
    /// Returns an error if the loop has fewer than 3 points, repeats a point,
    /// is not planar, or is not perpendicular to `normal`.
    pub fn from_extrusion(points: &[Point3], thickness: f64, normal: &Vector3, tolerances: &Tolerances) -> Result<Self> {
        if points.len() < 3 {
            return Err(GeometryError::TooFewPoints(points.len()).into());
        }
        if let Some(index) = first_repeated_point(points, tolerances.kinda_small) {
            return Err(GeometryError::RepeatedPoints(index).into());
        }
        let normal = normal
            .try_normalize(tolerances.small)
            .ok_or(GeometryError::ZeroVector)?;

        let plane = Plane::from_points(points, tolerances.planar_dot)?;
        if !tolerances.parallel(plane.normal(), &normal) {
            return Err(GeometryError::NotParallel.into());
        }

        let delta = normal * thickness;
        let points_b: Vec<Point3> = points.iter().map(|p| p + delta).collect();
        let axis_x = (points[1] - points[0]).normalize();
        let axis_y = normal.cross(&axis_x).normalize();

        Ok(Self {
            original_points_a: points.to_vec(),
            unique_points_a: points.to_vec(),
            original_points_b: points_b.clone(),
            unique_points_b: points_b,
            holes: Vec::new(),
            hole_validity: Vec::new(),
            normal,
            origin: points[0],
            axis_x,
            axis_y,
            thickness,
            coincident: plane.normal().dot(&normal) > 0.0,
            initial_points_unique: true,
            tolerances: *tolerances,
        })
    }

    /// Builds a layer from explicit start and end loops.
    ///
    /// # Errors
    ///
    /// Returns the first failed check: mismatched or short loops, a zero
    /// normal, repeated points (or fewer than 3 unique points when
    /// `handle_duplicates` is set), non-planar loops, or loop planes that are
    /// not parallel to each other and to the normal.
    pub fn new(input: LayerGeomInput, tolerances: &Tolerances) -> Result<Self> {
        let LayerGeomInput {
            points_a,
            points_b,
            normal,
            axis_x,
            holes,
            handle_duplicates,
        } = input;

        let num_points = points_a.len();
        if num_points != points_b.len() {
            return Err(GeometryError::MismatchedLoops {
                a: num_points,
                b: points_b.len(),
            }
            .into());
        }
        if num_points < 3 {
            return Err(GeometryError::TooFewPoints(num_points).into());
        }
        if normal.norm() <= tolerances.planar_dot {
            return Err(GeometryError::ZeroVector.into());
        }
        let normal = normal.normalize();

        let thickness = (points_b[0] - points_a[0]).dot(&normal);
        if cfg!(debug_assertions) {
            for (i, (a, b)) in points_a.iter().zip(&points_b).enumerate().skip(1) {
                let separation = (b - a).dot(&normal);
                if (separation - thickness).abs() > tolerances.planar_dot {
                    warn!(index = i, separation, thickness, "layer loops are not uniformly separated");
                }
            }
        }

        let (unique_points_a, unique_points_b, initial_points_unique) = if handle_duplicates {
            let unique_a = unique_points(&points_a, tolerances.ray_intersect);
            let unique_b = unique_points(&points_b, tolerances.ray_intersect);
            let smallest = unique_a.len().min(unique_b.len());
            if smallest < 3 {
                return Err(GeometryError::TooFewPoints(smallest).into());
            }
            let all_unique = unique_a.len() == num_points && unique_b.len() == num_points;
            (unique_a, unique_b, all_unique)
        } else {
            for points in [&points_a, &points_b] {
                if let Some(index) = first_repeated_point(points, tolerances.kinda_small) {
                    return Err(GeometryError::RepeatedPoints(index).into());
                }
            }
            (points_a.clone(), points_b.clone(), true)
        };

        let plane_a = Plane::from_points(&unique_points_a, tolerances.planar_dot)?;
        let plane_b = Plane::from_points(&unique_points_b, tolerances.planar_dot)?;
        if !tolerances.parallel(plane_a.normal(), plane_b.normal()) || !tolerances.parallel(plane_a.normal(), &normal)
        {
            return Err(GeometryError::NotParallel.into());
        }

        let (axis_x, axis_y) = match axis_x {
            Some(x) if is_normalized(&x, 1e-4) && tolerances.orthogonal(&x, &normal) => (x, normal.cross(&x)),
            _ => find_basis_vectors(&normal, tolerances),
        };

        let mut def = Self {
            origin: points_a[0],
            original_points_a: points_a,
            original_points_b: points_b,
            unique_points_a,
            unique_points_b,
            holes,
            hole_validity: Vec::new(),
            normal,
            axis_x,
            axis_y,
            thickness,
            coincident: plane_a.normal().dot(&normal) > 0.0,
            initial_points_unique,
            tolerances: *tolerances,
        };
        def.hole_validity = def.classify_holes();
        Ok(def)
    }

    /// Replaces the layer's holes.
    #[must_use]
    pub fn with_holes(mut self, holes: Vec<PolyHole3D>) -> Self {
        self.holes = holes;
        self.hole_validity = self.classify_holes();
        self
    }

    /// Projects a world point into the layer's 2D basis.
    #[must_use]
    pub fn project_point_2d(&self, point: &Point3) -> Point2 {
        projection::project_point_2d(point, &self.axis_x, &self.axis_y, &self.origin)
    }

    /// Maps a 2D layer point back onto face `side`.
    #[must_use]
    pub fn deproject_2d_point(&self, point: &Point2, side: LayerSide) -> Point3 {
        let on_a = projection::deproject_2d_point(point, &self.axis_x, &self.axis_y, &self.origin);
        match side {
            LayerSide::A => on_a,
            LayerSide::B => on_a + self.normal * self.thickness,
        }
    }

    /// Moves `point` along the normal onto the plane of face `side`.
    #[must_use]
    pub fn project_to_plane(&self, point: &Point3, side: LayerSide) -> Point3 {
        let on_plane = match side {
            LayerSide::A => &self.original_points_a[0],
            LayerSide::B => &self.original_points_b[0],
        };
        point + self.normal * (on_plane - point).dot(&self.normal)
    }

    #[must_use]
    pub fn original_points_a(&self) -> &[Point3] {
        &self.original_points_a
    }

    #[must_use]
    pub fn original_points_b(&self) -> &[Point3] {
        &self.original_points_b
    }

    #[must_use]
    pub fn unique_points_a(&self) -> &[Point3] {
        &self.unique_points_a
    }

    #[must_use]
    pub fn unique_points_b(&self) -> &[Point3] {
        &self.unique_points_b
    }

    #[must_use]
    pub fn holes(&self) -> &[PolyHole3D] {
        &self.holes
    }

    /// Classification of each hole, in the order of [`holes`](Self::holes).
    #[must_use]
    pub fn hole_validity(&self) -> &[HoleValidity] {
        &self.hole_validity
    }

    /// Unit layer normal.
    #[must_use]
    pub fn normal(&self) -> &Vector3 {
        &self.normal
    }

    #[must_use]
    pub fn origin(&self) -> &Point3 {
        &self.origin
    }

    #[must_use]
    pub fn axis_x(&self) -> &Vector3 {
        &self.axis_x
    }

    #[must_use]
    pub fn axis_y(&self) -> &Vector3 {
        &self.axis_y
    }

    /// Signed separation of face B from face A along the normal.
    #[must_use]
    pub fn thickness(&self) -> f64 {
        self.thickness
    }

    /// Whether the loops wind counter-clockwise around the normal.
    #[must_use]
    pub fn coincident(&self) -> bool {
        self.coincident
    }

    /// False when duplicate merging dropped any loop point.
    #[must_use]
    pub fn initial_points_unique(&self) -> bool {
        self.initial_points_unique
    }

    #[must_use]
    pub fn tolerances(&self) -> &Tolerances {
        &self.tolerances
    }
}
