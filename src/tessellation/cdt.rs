use spade::handles::FixedVertexHandle;
use spade::{ConstrainedDelaunayTriangulation, Point2 as SpadePoint2, Triangulation};

use crate::error::{Result, TriangulationError};
use crate::math::polygon_2d::point_in_polygon;
use crate::math::{Point2, TOLERANCE};

type Cdt = ConstrainedDelaunayTriangulation<SpadePoint2<f64>>;

/// Output of a 2D constrained triangulation.
#[derive(Debug, Clone, Default)]
pub struct PlanarTriangulation {
    /// Every inserted point once, coincident inputs merged.
    pub vertices: Vec<Point2>,
    /// Counter-clockwise triangles indexing `vertices`.
    pub triangles: Vec<[u32; 3]>,
}

/// Triangulates a simple polygon with holes.
///
/// The outline and every hole become constraint loops. A triangle is kept
/// when its centroid lies inside the outline and outside every hole, so
/// loop winding doesn't matter.
///
/// # Errors
///
/// Returns [`TriangulationError::Failed`] if a loop has fewer than 3 points,
/// a point cannot be inserted, or a loop edge would cross an existing
/// constraint.
#[allow(clippy::cast_possible_truncation)]
pub fn triangulate_polygon(outer: &[Point2], holes: &[Vec<Point2>]) -> Result<PlanarTriangulation> {
    let mut cdt = Cdt::new();
    let outline = insert_loop_vertices(&mut cdt, outer)?;
    let hole_loops = holes
        .iter()
        .map(|hole| insert_loop_vertices(&mut cdt, hole))
        .collect::<Result<Vec<_>>>()?;

    constrain_loop(&mut cdt, &outline, "outline")?;
    for hole in &hole_loops {
        constrain_loop(&mut cdt, hole, "hole")?;
    }

    let vertices = cdt
        .vertices()
        .map(|v| {
            let pos = v.position();
            Point2::new(pos.x, pos.y)
        })
        .collect();

    let triangles = cdt
        .inner_faces()
        .filter(|face| {
            let [a, b, c] = face.positions();
            let centroid = Point2::new((a.x + b.x + c.x) / 3.0, (a.y + b.y + c.y) / 3.0);
            inside_region(&centroid, outer, holes)
        })
        .map(|face| face.vertices().map(|v| v.fix().index() as u32))
        .collect::<Vec<_>>();

    tracing::trace!(
        holes = holes.len(),
        triangles = triangles.len(),
        "triangulated polygon"
    );

    Ok(PlanarTriangulation { vertices, triangles })
}

/// Inserts a loop's points. Coincident points share a handle.
fn insert_loop_vertices(cdt: &mut Cdt, points: &[Point2]) -> Result<Vec<FixedVertexHandle>> {
    if points.len() < 3 {
        return Err(TriangulationError::Failed("constraint loop needs at least 3 points".into()).into());
    }
    points
        .iter()
        .map(|p| -> Result<FixedVertexHandle> {
            let handle = cdt
                .insert(SpadePoint2::new(p.x, p.y))
                .map_err(|e| TriangulationError::Failed(format!("CDT insert: {e}")))?;
            Ok(handle)
        })
        .collect()
}

/// Closes `handles` into a ring of constraint edges.
fn constrain_loop(cdt: &mut Cdt, handles: &[FixedVertexHandle], name: &str) -> Result<()> {
    let next = handles.iter().cycle().skip(1);
    for (i, (&from, &to)) in handles.iter().zip(next).enumerate() {
        if from == to {
            continue;
        }
        if !cdt.can_add_constraint(from, to) {
            return Err(TriangulationError::Failed(format!("{name} edge {i} crosses an existing constraint")).into());
        }
        cdt.add_constraint(from, to);
    }
    Ok(())
}

/// Whether `point` lies inside `outer` and outside every hole.
fn inside_region(point: &Point2, outer: &[Point2], holes: &[Vec<Point2>]) -> bool {
    point_in_polygon(point, outer, TOLERANCE).inside
        && holes.iter().all(|hole| {
            let hit = point_in_polygon(point, hole, TOLERANCE);
            !hit.inside && !hit.overlaps
        })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::math::{cross_2d, polygon_2d::signed_area_2d};
    use approx::assert_relative_eq;

    fn p(x: f64, y: f64) -> Point2 {
        Point2::new(x, y)
    }

    fn square(min: f64, max: f64) -> Vec<Point2> {
        vec![p(min, min), p(max, min), p(max, max), p(min, max)]
    }

    fn covered_area(tri: &PlanarTriangulation) -> f64 {
        tri.triangles
            .iter()
            .map(|t| {
                let pts: Vec<Point2> = t.iter().map(|&i| tri.vertices[i as usize]).collect();
                signed_area_2d(&pts)
            })
            .sum()
    }

    #[test]
    fn square_makes_two_ccw_triangles() {
        let tri = triangulate_polygon(&square(0.0, 1.0), &[]).unwrap();
        assert_eq!(tri.vertices.len(), 4);
        assert_eq!(tri.triangles.len(), 2);
        for t in &tri.triangles {
            let [a, b, c] = t.map(|i| tri.vertices[i as usize]);
            assert!(cross_2d(&(b - a), &(c - a)) > 0.0);
        }
        assert_relative_eq!(covered_area(&tri), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn concave_outline_keeps_notch_empty() {
        let l_shape = vec![p(0.0, 0.0), p(2.0, 0.0), p(2.0, 1.0), p(1.0, 1.0), p(1.0, 2.0), p(0.0, 2.0)];
        let tri = triangulate_polygon(&l_shape, &[]).unwrap();
        assert_eq!(tri.triangles.len(), 4);
        assert_relative_eq!(covered_area(&tri), 3.0, epsilon = 1e-12);
    }

    #[test]
    fn hole_is_excluded() {
        let tri = triangulate_polygon(&square(0.0, 10.0), &[square(4.0, 6.0)]).unwrap();
        assert_eq!(tri.vertices.len(), 8);
        assert_eq!(tri.triangles.len(), 8);
        assert_relative_eq!(covered_area(&tri), 96.0, epsilon = 1e-9);
    }

    #[test]
    fn loop_winding_does_not_matter() {
        let mut outer = square(0.0, 10.0);
        outer.reverse();
        let hole = vec![p(4.0, 4.0), p(4.0, 6.0), p(6.0, 6.0), p(6.0, 4.0)];
        let tri = triangulate_polygon(&outer, &[hole]).unwrap();
        assert_eq!(tri.triangles.len(), 8);
        assert_relative_eq!(covered_area(&tri), 96.0, epsilon = 1e-9);
    }

    #[test]
    fn separate_holes_are_each_excluded() {
        let tri = triangulate_polygon(&square(0.0, 10.0), &[square(1.0, 2.0), square(7.0, 9.0)]).unwrap();
        assert_relative_eq!(covered_area(&tri), 100.0 - 1.0 - 4.0, epsilon = 1e-9);
    }

    #[test]
    fn short_loop_fails() {
        let err = triangulate_polygon(&[p(0.0, 0.0), p(1.0, 0.0)], &[]);
        assert!(err.is_err());
    }

    #[test]
    fn crossing_hole_fails() {
        let crossing = vec![p(-1.0, 4.0), p(5.0, 4.0), p(5.0, 6.0), p(-1.0, 6.0)];
        assert!(triangulate_polygon(&square(0.0, 10.0), &[crossing]).is_err());
    }
}
