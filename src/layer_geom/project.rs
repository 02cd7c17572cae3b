use tracing::warn;

use crate::config::Tolerances;
use crate::math::points_equal_2d;
use crate::math::polygon_2d::{is_polygon_valid, polygon_intersection};
use crate::math::{Point2, Point3};

use super::{LayerGeomDef, PolyHole2D, PolyHole3D};

/// Why a hole was kept or dropped during projection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HoleValidity {
    Valid,
    /// Crosses the A or B perimeter.
    OverlapsBoundary,
    /// Not inside the A or B perimeter.
    OutsideLayer,
    /// Crosses, contains or sits inside an earlier accepted hole.
    OverlapsHole,
    /// Fewer than 3 points.
    Degenerate,
}

/// A layer's loops and holes in its own 2D basis.
///
/// B points and hole points that land within `kinda_small` of a unique A
/// point are snapped onto it, so both faces triangulate the same outline.
#[derive(Debug, Clone, Default)]
pub struct LayerProjection {
    pub original_a: Vec<Point2>,
    pub original_b: Vec<Point2>,
    pub unique_a: Vec<Point2>,
    pub unique_b: Vec<Point2>,
    /// Every hole, in input order.
    pub holes: Vec<PolyHole2D>,
    /// Classification of each entry of `holes`.
    pub hole_validity: Vec<HoleValidity>,
    /// Accepted holes, in input order.
    pub valid_holes: Vec<PolyHole2D>,
}

impl LayerGeomDef {
    /// Projects loops and holes into the layer basis.
    ///
    /// Hole validity comes from the classification done when the holes were
    /// set, see [`hole_validity`](Self::hole_validity).
    #[must_use]
    pub fn project_2d(&self) -> LayerProjection {
        let (unique_a, unique_b) = self.projected_outlines();
        let snap = |p: &Point3| snap_to(self.project_point_2d(p), &unique_a, self.tolerances().kinda_small);

        let original_a = self
            .original_points_a()
            .iter()
            .map(|p| self.project_point_2d(p))
            .collect();
        let original_b = self.original_points_b().iter().map(snap).collect();
        let holes: Vec<PolyHole2D> = self.holes().iter().map(|hole| self.project_hole(hole, &unique_a)).collect();
        let valid_holes = holes
            .iter()
            .zip(self.hole_validity())
            .filter(|(_, validity)| **validity == HoleValidity::Valid)
            .map(|(hole, _)| hole.clone())
            .collect();

        LayerProjection {
            original_a,
            original_b,
            unique_a,
            unique_b,
            holes,
            hole_validity: self.hole_validity().to_vec(),
            valid_holes,
        }
    }

    /// Unique A and B points in the layer basis, B snapped onto A.
    fn projected_outlines(&self) -> (Vec<Point2>, Vec<Point2>) {
        let unique_a: Vec<Point2> = self
            .unique_points_a()
            .iter()
            .map(|p| self.project_point_2d(p))
            .collect();
        let unique_b = self
            .unique_points_b()
            .iter()
            .map(|p| snap_to(self.project_point_2d(p), &unique_a, self.tolerances().kinda_small))
            .collect();
        (unique_a, unique_b)
    }

    fn project_hole(&self, hole: &PolyHole3D, unique_a: &[Point2]) -> PolyHole2D {
        PolyHole2D {
            points: hole
                .points
                .iter()
                .map(|p| snap_to(self.project_point_2d(p), unique_a, self.tolerances().kinda_small))
                .collect(),
        }
    }

    /// Classifies every hole against the outlines and the holes accepted
    /// before it.
    pub(super) fn classify_holes(&self) -> Vec<HoleValidity> {
        let tol = self.tolerances();
        let (unique_a, unique_b) = self.projected_outlines();
        if !is_polygon_valid(&unique_a, tol) || !is_polygon_valid(&unique_b, tol) {
            warn!("layer outline is not a simple polygon, triangulation may fail");
        }

        let mut accepted: Vec<PolyHole2D> = Vec::new();
        self.holes()
            .iter()
            .enumerate()
            .map(|(index, hole)| {
                let hole_2d = self.project_hole(hole, &unique_a);
                let validity = classify_hole(&hole_2d.points, &unique_a, &unique_b, &accepted, tol);
                if validity == HoleValidity::Valid {
                    accepted.push(hole_2d);
                } else {
                    warn!(index, ?validity, "skipping layer hole");
                }
                validity
            })
            .collect()
    }
}

fn snap_to(point: Point2, targets: &[Point2], tolerance: f64) -> Point2 {
    targets
        .iter()
        .find(|t| points_equal_2d(t, &point, tolerance))
        .copied()
        .unwrap_or(point)
}

fn classify_hole(
    hole: &[Point2],
    unique_a: &[Point2],
    unique_b: &[Point2],
    accepted: &[PolyHole2D],
    tolerances: &Tolerances,
) -> HoleValidity {
    if hole.len() < 3 {
        return HoleValidity::Degenerate;
    }

    for outline in [unique_a, unique_b] {
        let relation = polygon_intersection(outline, hole, tolerances);
        if relation.overlapping {
            return HoleValidity::OverlapsBoundary;
        }
        if !relation.is_contained() {
            return HoleValidity::OutsideLayer;
        }
    }

    let conflicts = accepted.iter().any(|other| {
        let inside_other = polygon_intersection(&other.points, hole, tolerances);
        let around_other = polygon_intersection(hole, &other.points, tolerances);
        inside_other.overlapping || inside_other.is_contained() || around_other.is_contained()
    });
    if conflicts {
        return HoleValidity::OverlapsHole;
    }

    HoleValidity::Valid
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::math::Vector3;

    fn rect(x0: f64, y0: f64, x1: f64, y1: f64) -> PolyHole3D {
        PolyHole3D::new(vec![
            Point3::new(x0, y0, 0.0),
            Point3::new(x1, y0, 0.0),
            Point3::new(x1, y1, 0.0),
            Point3::new(x0, y1, 0.0),
        ])
    }

    fn wall(holes: Vec<PolyHole3D>) -> LayerGeomDef {
        let outline = rect(0.0, 0.0, 100.0, 50.0).points;
        LayerGeomDef::from_extrusion(&outline, 10.0, &Vector3::z(), &Tolerances::default())
            .unwrap()
            .with_holes(holes)
    }

    #[test]
    fn loops_share_a_frame() {
        let projection = wall(Vec::new()).project_2d();
        assert_eq!(projection.unique_a, projection.unique_b);
        assert_eq!(projection.original_a, projection.original_b);
        assert_eq!(projection.unique_a[2], Point2::new(100.0, 50.0));
    }

    #[test]
    fn holes_are_classified() {
        let projection = wall(vec![
            rect(10.0, 10.0, 20.0, 20.0),
            rect(200.0, 10.0, 220.0, 20.0),
            rect(90.0, 10.0, 110.0, 20.0),
            rect(12.0, 12.0, 18.0, 18.0),
            rect(30.0, 10.0, 40.0, 20.0),
            PolyHole3D::new(vec![Point3::new(50.0, 10.0, 0.0), Point3::new(60.0, 10.0, 0.0)]),
        ])
        .project_2d();

        assert_eq!(
            projection.hole_validity,
            vec![
                HoleValidity::Valid,
                HoleValidity::OutsideLayer,
                HoleValidity::OverlapsBoundary,
                HoleValidity::OverlapsHole,
                HoleValidity::Valid,
                HoleValidity::Degenerate,
            ]
        );
        assert_eq!(projection.holes.len(), 6);
        assert_eq!(projection.valid_holes.len(), 2);
    }

    #[test]
    fn validity_is_cached_when_holes_are_set() {
        let def = wall(vec![rect(10.0, 10.0, 20.0, 20.0), rect(200.0, 10.0, 220.0, 20.0)]);
        assert_eq!(def.hole_validity(), &[HoleValidity::Valid, HoleValidity::OutsideLayer]);
        assert_eq!(def.project_2d().hole_validity, def.hole_validity());

        let def = def.with_holes(Vec::new());
        assert!(def.hole_validity().is_empty());
    }

    #[test]
    fn hole_enclosing_an_earlier_hole_is_rejected() {
        let projection = wall(vec![rect(12.0, 12.0, 18.0, 18.0), rect(10.0, 10.0, 20.0, 20.0)]).project_2d();
        assert_eq!(projection.hole_validity[1], HoleValidity::OverlapsHole);
    }
}
