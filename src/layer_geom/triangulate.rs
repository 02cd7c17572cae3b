use tracing::{trace, warn};

use crate::config::TriangulationParams;
use crate::error::{Result, TriangulationError};
use crate::math::polygon_2d::signed_area_2d;
use crate::math::projection::project_point_2d;
use crate::math::{safe_normal, up, Point2, Point3, Vector3};
use crate::tessellation::{triangulate_polygon, LayerMesh, PlanarTriangulation, Tangent};

use super::{LayerGeomDef, LayerSide};

impl LayerGeomDef {
    /// Triangulates the layer into a closed mesh.
    ///
    /// Emits the A face, then (unless the layer is a membrane) the B face,
    /// the perimeter side walls and the hole walls. Faces point away from
    /// the layer's material; for a negative thickness A and B swap roles.
    ///
    /// # Errors
    ///
    /// Returns [`TriangulationError`] when a face cannot be triangulated or
    /// the A and B outlines have different point counts.
    pub fn triangulate_mesh(&self, params: &TriangulationParams) -> Result<LayerMesh> {
        let tol = &params.tolerances;
        let projection = self.project_2d();
        let holes: Vec<Vec<Point2>> = projection.valid_holes.iter().map(|h| h.points.clone()).collect();

        let tri_a = triangulate_polygon(&projection.unique_a, &holes)?;

        let thickness = self.thickness();
        let membrane = thickness.abs() < tol.small;
        let tri_b = if membrane {
            None
        } else {
            if projection.unique_a.len() != projection.unique_b.len() {
                return Err(TriangulationError::PerimeterMismatch {
                    a: projection.unique_a.len(),
                    b: projection.unique_b.len(),
                }
                .into());
            }
            Some(triangulate_polygon(&projection.unique_b, &holes)?)
        };

        let sign = if thickness < 0.0 { -1.0 } else { 1.0 };
        let normal = *self.normal();
        let axis_x = *self.axis_x();
        let axis_y = *self.axis_y();
        let uv_of = |axis_x: Vector3| {
            move |p: &Point3| {
                let uv = project_point_2d(p, &axis_x, &axis_y, &params.uv_anchor);
                Point2::from(uv.coords.component_mul(&params.uv_scale))
            }
        };

        let mut mesh = LayerMesh::default();
        self.append_face(
            &mut mesh,
            &tri_a,
            LayerSide::A,
            sign > 0.0,
            -normal * sign,
            Tangent::new(-axis_x, false),
            uv_of(-axis_x),
        );

        let Some(tri_b) = tri_b else {
            trace!(triangles = mesh.triangle_count(), "triangulated membrane layer");
            return Ok(mesh);
        };
        self.append_face(
            &mut mesh,
            &tri_b,
            LayerSide::B,
            sign < 0.0,
            normal * sign,
            Tangent::new(axis_x, false),
            uv_of(axis_x),
        );

        if thickness.abs() <= tol.planar_dot {
            return Ok(mesh);
        }

        let reverse_perimeter = self.coincident() != (thickness > 0.0);
        let n = projection.original_a.len();
        for i in 0..n {
            let j = (i + 1) % n;
            self.triangulate_side_face(
                &mut mesh,
                [
                    &projection.original_a[i],
                    &projection.original_a[j],
                    &projection.original_b[i],
                    &projection.original_b[j],
                ],
                reverse_perimeter,
                params,
            );
        }

        for hole in &projection.valid_holes {
            let reverse = (signed_area_2d(&hole.points) > 0.0) == (thickness > 0.0);
            let m = hole.points.len();
            for i in 0..m {
                let (p1, p2) = (&hole.points[i], &hole.points[(i + 1) % m]);
                self.triangulate_side_face(&mut mesh, [p1, p2, p1, p2], reverse, params);
            }
        }

        trace!(
            triangles = mesh.triangle_count(),
            holes = projection.valid_holes.len(),
            "triangulated layer"
        );
        Ok(mesh)
    }

    #[allow(clippy::too_many_arguments)]
    fn append_face(
        &self,
        mesh: &mut LayerMesh,
        triangulation: &PlanarTriangulation,
        side: LayerSide,
        reverse: bool,
        normal: Vector3,
        tangent: Tangent,
        uv_of: impl Fn(&Point3) -> Point2,
    ) {
        let vertices: Vec<Point3> = triangulation
            .vertices
            .iter()
            .map(|v| self.deproject_2d_point(v, side))
            .collect();
        let triangles = triangulation
            .triangles
            .iter()
            .map(|&[a, b, c]| if reverse { [a, c, b] } else { [a, b, c] });
        mesh.append_flat(&vertices, triangles, normal, tangent, uv_of);
    }

    /// Appends the wall between two consecutive outline points.
    ///
    /// `corners` are the 2D points `[a1, a2, b1, b2]`: the edge on face A and
    /// the matching edge on face B. The wall faces along `edge × (b1 - a1)`,
    /// or the opposite way when `reverse` is set. A wall whose edges are both
    /// shorter than `points_are_near` is skipped; one short edge collapses
    /// the wall to a triangle. Returns whether anything was emitted.
    pub fn triangulate_side_face(
        &self,
        mesh: &mut LayerMesh,
        corners: [&Point2; 4],
        reverse: bool,
        params: &TriangulationParams,
    ) -> bool {
        let tol = &params.tolerances;
        let [a1, a2, b1, b2] = corners;
        let mut points = vec![
            self.deproject_2d_point(a1, LayerSide::A),
            self.deproject_2d_point(a2, LayerSide::A),
            self.deproject_2d_point(b1, LayerSide::B),
            self.deproject_2d_point(b2, LayerSide::B),
        ];

        let edge_a = points[1] - points[0];
        let edge_b = points[3] - points[2];
        let (len_a, len_b) = (edge_a.norm(), edge_b.norm());
        let a_valid = len_a > tol.points_are_near;
        let b_valid = len_b > tol.points_are_near;
        if !a_valid && !b_valid {
            return false;
        }

        let side_start = safe_normal(&(points[2] - points[0]));
        let side_end = safe_normal(&(points[3] - points[1]));

        let (edge_dir, side_normal, triangles): (Vector3, Vector3, Vec<[u32; 3]>) = if a_valid && b_valid {
            let (dir_a, dir_b) = (edge_a / len_a, edge_b / len_b);
            let edge_dir = if tol.coincident(&dir_a, &dir_b) {
                safe_normal(&(dir_a + dir_b))
            } else {
                warn!("layer side edges are not coincident");
                dir_a
            };

            let start_normal = safe_normal(&edge_dir.cross(&side_start));
            let end_normal = safe_normal(&edge_dir.cross(&side_end));
            let side_normal = if tol.coincident(&start_normal, &end_normal) {
                safe_normal(&(start_normal + end_normal))
            } else {
                warn!("layer side is not planar");
                start_normal
            };
            (edge_dir, side_normal, vec![[0, 1, 2], [1, 3, 2]])
        } else if a_valid {
            // b1 and b2 coincide
            points.remove(2);
            let edge_dir = edge_a / len_a;
            (edge_dir, safe_normal(&edge_dir.cross(&side_start)), vec![[0, 1, 2]])
        } else {
            // a1 and a2 coincide
            points.remove(0);
            let edge_dir = edge_b / len_b;
            (edge_dir, safe_normal(&edge_dir.cross(&side_start)), vec![[0, 2, 1]])
        };

        let (side_normal, triangles) = if reverse {
            (-side_normal, triangles.into_iter().map(|[a, b, c]| [a, c, b]).collect::<Vec<_>>())
        } else {
            (side_normal, triangles)
        };

        let flat = tol.orthogonal(&edge_dir, &up());
        let uv_axis_y = if flat {
            -*self.normal()
        } else if edge_dir.dot(&up()) > 0.0 {
            -edge_dir
        } else {
            edge_dir
        };
        let uv_axis_x = safe_normal(&(-side_normal).cross(&uv_axis_y));

        mesh.append_flat(
            &points,
            triangles,
            side_normal,
            Tangent::new(*self.normal(), false),
            |p| {
                let uv = project_point_2d(p, &uv_axis_x, &uv_axis_y, &params.uv_anchor);
                Point2::from(uv.coords.component_mul(&params.uv_scale))
            },
        );
        true
    }
}
