use crate::config::Tolerances;
use crate::error::{GeometryError, MiterError, Result};
use crate::layer_geom::{LayerGeomDef, LayerGeomInput, PolyHole3D};
use crate::layers::CachedLayerDims;
use crate::math::intersect_3d::ray_intersection_3d;
use crate::math::polygon_3d::newell_normal;
use crate::math::{safe_normal, Point3, Vector3, TOLERANCE};

use super::{LayerExtension, MiterData, MiterHost};

/// A host polygon plus the miter result of each of its edges.
#[derive(Debug, Clone, Default)]
pub struct MiteredLayerInput {
    pub points: Vec<Point3>,
    pub normal: Vector3,
    pub axis_x: Option<Vector3>,
    /// Cumulative layer offsets, one more than the layer count.
    pub layer_offsets: Vec<f64>,
    pub layer_start_offset: f64,
    /// Indexed `[edge][layer]`; edge `i` runs from point `i` to point `i + 1`.
    pub edge_extensions: Vec<Vec<LayerExtension>>,
    pub holes: Vec<PolyHole3D>,
}

impl MiteredLayerInput {
    /// Collects `host`'s extensions from the resolved miter of each of its
    /// edges, in polygon order.
    ///
    /// # Errors
    ///
    /// Fails when `miters` doesn't have one entry per polygon edge, when
    /// the host's layers can't be dimensioned, or when a miter has no
    /// result for the host.
    pub fn from_host(host: &dyn MiterHost, miters: &[MiterData]) -> Result<Self> {
        let points = host.control_points();
        if points.len() != miters.len() {
            return Err(MiterError::EdgeCountMismatch {
                edges: points.len(),
                miters: miters.len(),
            }
            .into());
        }

        let dims = CachedLayerDims::from_layers(host.layers())?;
        let edge_extensions = miters
            .iter()
            .map(|miter| miter.layer_extensions(host.host_id()).map(<[LayerExtension]>::to_vec))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            points: points.to_vec(),
            normal: host.normal(),
            axis_x: None,
            layer_offsets: dims.layer_offsets().to_vec(),
            layer_start_offset: host.layer_start_offset(),
            edge_extensions,
            holes: Vec::new(),
        })
    }

    #[must_use]
    pub fn with_holes(mut self, holes: Vec<PolyHole3D>) -> Self {
        self.holes = holes;
        self
    }

    fn num_layers(&self) -> usize {
        self.layer_offsets.len().saturating_sub(1)
    }

    fn extension(&self, edge: usize, layer: usize) -> LayerExtension {
        self.edge_extensions
            .get(edge)
            .and_then(|layers| layers.get(layer))
            .copied()
            .unwrap_or_default()
    }
}

/// Builds one [`LayerGeomDef`] per layer with each polygon edge moved by its
/// miter extension.
///
/// Every polygon vertex contributes three points per face: two for the
/// corner and one for the far end of its edge. Where adjacent edges are
/// parallel the corner splits, producing a stitch wall between an extended
/// and an unextended edge. Otherwise the extended edges are intersected.
/// The resulting loops contain repeated points and are built with duplicate
/// handling enabled.
#[must_use]
pub fn build_mitered_layer_geoms(input: &MiteredLayerInput, tolerances: &Tolerances) -> Vec<Result<LayerGeomDef>> {
    let normal = safe_normal(&input.normal);
    let points = &input.points;
    let n = points.len();
    let face_normal = newell_normal(points).try_normalize(TOLERANCE);

    (0..input.num_layers())
        .map(|layer| -> Result<LayerGeomDef> {
            let Some(face_normal) = face_normal else {
                return Err(GeometryError::Degenerate("host polygon has no area".into()).into());
            };
            if n < 3 {
                return Err(GeometryError::TooFewPoints(n).into());
            }

            let delta_a = normal * (input.layer_start_offset + input.layer_offsets[layer]);
            let delta_b = normal * (input.layer_start_offset + input.layer_offsets[layer + 1]);
            let mut loop_a = Vec::with_capacity(n * 3);
            let mut loop_b = Vec::with_capacity(n * 3);

            for i in 0..n {
                let corner = Corner::new(points, &face_normal, i, tolerances);
                let (prev_ext, cur_ext, next_ext) = (
                    input.extension(corner.prev, layer),
                    input.extension(i, layer),
                    input.extension(corner.next, layer),
                );
                corner.stitch(&mut loop_a, &delta_a, [prev_ext.start, cur_ext.start, next_ext.start], tolerances);
                corner.stitch(&mut loop_b, &delta_b, [prev_ext.end, cur_ext.end, next_ext.end], tolerances);
            }

            LayerGeomDef::new(
                LayerGeomInput {
                    points_a: loop_a,
                    points_b: loop_b,
                    normal,
                    axis_x: input.axis_x,
                    holes: input.holes.clone(),
                    handle_duplicates: true,
                },
                tolerances,
            )
        })
        .collect()
}

/// The previous, current and next edges around polygon vertex `index`.
struct Corner {
    prev: usize,
    next: usize,
    points: [Point3; 4],
    dirs: [Vector3; 3],
    /// Inward edge normals, previous/current/next.
    edge_normals: [Vector3; 3],
    split_cur: bool,
    split_next: bool,
}

impl Corner {
    fn new(points: &[Point3], face_normal: &Vector3, index: usize, tolerances: &Tolerances) -> Self {
        let n = points.len();
        let prev = (index + n - 1) % n;
        let next = (index + 1) % n;
        let next_next = (index + 2) % n;
        let corner = [points[prev], points[index], points[next], points[next_next]];
        let dirs = [
            safe_normal(&(corner[1] - corner[0])),
            safe_normal(&(corner[2] - corner[1])),
            safe_normal(&(corner[3] - corner[2])),
        ];
        let edge_normals = dirs.map(|dir| safe_normal(&face_normal.cross(&dir)));
        Self {
            prev,
            next,
            points: corner,
            split_cur: tolerances.parallel(&dirs[0], &dirs[1]),
            split_next: tolerances.parallel(&dirs[1], &dirs[2]),
            dirs,
            edge_normals,
        }
    }

    /// Pushes this vertex's three points for one face, offset by `delta`,
    /// given the previous/current/next edge extensions on that face.
    fn stitch(&self, out: &mut Vec<Point3>, delta: &Vector3, extensions: [f64; 3], tolerances: &Tolerances) {
        let [prev_dir, cur_dir, next_dir] = self.dirs;
        let [prev_normal, cur_normal, next_normal] = self.edge_normals;
        let [prev_e, cur_e, next_e] = extensions;
        let [prev_side, cur_side, next_side, next_next_side] = self.points.map(|p| p + delta);

        let prev_ext = prev_side - prev_normal * prev_e;
        let cur_ext = cur_side - cur_normal * cur_e;
        let next_ext = next_side - cur_normal * cur_e;
        let next_next_ext = next_next_side - next_normal * next_e;

        let hit = |origin_a: &Point3, dir_a: &Vector3, origin_b: &Point3, dir_b: &Vector3| {
            ray_intersection_3d(origin_a, dir_a, origin_b, dir_b, true, tolerances).map(|h| h.point)
        };
        let near_zero = |e: f64| e.abs() <= tolerances.small;

        if near_zero(prev_e) && near_zero(cur_e) {
            out.extend([cur_side, cur_side]);
        } else if self.split_cur {
            match hit(&cur_ext, &cur_dir, &prev_ext, &prev_dir) {
                Some(point) => out.extend([point, point]),
                None => out.extend([cur_side, cur_ext]),
            }
        } else {
            let point = hit(&prev_ext, &prev_dir, &next_ext, &-cur_dir).unwrap_or(cur_side);
            out.extend([point, point]);
        }

        let far = if near_zero(cur_e) && near_zero(next_e) {
            next_side
        } else if self.split_next {
            hit(&next_ext, &-cur_dir, &next_next_ext, &-next_dir).unwrap_or(next_ext)
        } else {
            hit(&cur_ext, &cur_dir, &next_next_ext, &-next_dir).unwrap_or(next_side)
        };
        out.push(far);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::config::TriangulationParams;
    use crate::error::LayerMiterError;
    use crate::layers::{LayerPriority, LayerSpec, PriorityGroup};
    use crate::miter::{HostedPlane, MiterEdge};
    use approx::assert_relative_eq;

    fn p(x: f64, y: f64, z: f64) -> Point3 {
        Point3::new(x, y, z)
    }

    /// A 100 x 300 wall in the XZ plane, one 20 cm layer centered on it.
    fn wall_input(edge_extensions: Vec<Vec<LayerExtension>>) -> MiteredLayerInput {
        MiteredLayerInput {
            points: vec![p(0.0, 0.0, 0.0), p(100.0, 0.0, 0.0), p(100.0, 0.0, 300.0), p(0.0, 0.0, 300.0)],
            normal: -Vector3::y(),
            axis_x: None,
            layer_offsets: vec![0.0, 20.0],
            layer_start_offset: -10.0,
            edge_extensions,
            holes: Vec::new(),
        }
    }

    fn min_x(points: &[Point3]) -> f64 {
        points.iter().map(|p| p.x).fold(f64::INFINITY, f64::min)
    }

    #[test]
    fn unextended_edges_keep_the_outline() {
        let input = wall_input(vec![vec![LayerExtension::default()]; 4]);
        let geoms = build_mitered_layer_geoms(&input, &Tolerances::default());
        assert_eq!(geoms.len(), 1);
        let def = geoms.into_iter().next().unwrap().unwrap();

        assert_eq!(def.original_points_a().len(), 12);
        assert_eq!(def.unique_points_a().len(), 4);
        assert_eq!(def.unique_points_b().len(), 4);
        assert_relative_eq!(def.thickness(), 20.0, epsilon = 1e-9);
        assert_relative_eq!(def.unique_points_a()[0].y, 10.0, epsilon = 1e-9);

        let mesh = def.triangulate_mesh(&TriangulationParams::default()).unwrap();
        assert_eq!(mesh.triangle_count(), 12);
    }

    #[test]
    fn mitered_edge_moves_each_face() {
        let mut extensions = vec![vec![LayerExtension::default()]; 4];
        extensions[3] = vec![LayerExtension::new(10.0, -10.0)];
        let geoms = build_mitered_layer_geoms(&wall_input(extensions), &Tolerances::default());
        let def = geoms.into_iter().next().unwrap().unwrap();

        assert_eq!(def.unique_points_a().len(), 4);
        assert_eq!(def.unique_points_b().len(), 4);
        assert_relative_eq!(min_x(def.unique_points_a()), -10.0, epsilon = 1e-9);
        assert_relative_eq!(min_x(def.unique_points_b()), 10.0, epsilon = 1e-9);
        assert_relative_eq!(def.thickness(), 20.0, epsilon = 1e-9);

        let mesh = def.triangulate_mesh(&TriangulationParams::default()).unwrap();
        assert_eq!(mesh.triangle_count(), 12);
        assert!(mesh.is_consistent());
    }

    #[test]
    fn one_result_per_layer() {
        let mut input = wall_input(vec![vec![LayerExtension::default(); 2]; 4]);
        input.layer_offsets = vec![0.0, 5.0, 20.0];
        let geoms = build_mitered_layer_geoms(&input, &Tolerances::default());
        assert_eq!(geoms.len(), 2);
        let thicknesses: Vec<f64> = geoms.into_iter().map(|g| g.unwrap().thickness()).collect();
        assert_relative_eq!(thicknesses[0], 5.0, epsilon = 1e-9);
        assert_relative_eq!(thicknesses[1], 15.0, epsilon = 1e-9);
    }

    #[test]
    fn from_host_reads_each_edge() {
        let layers = vec![LayerSpec::new(20.0, LayerPriority::new(PriorityGroup::Structure, 0))];
        let host = HostedPlane::new(1, wall_input(Vec::new()).points, -Vector3::y(), layers);
        let points = host.control_points().to_vec();

        let miters: Vec<MiterData> = (0..points.len())
            .map(|i| {
                let edge = MiterEdge::new(points[i], points[(i + 1) % points.len()]);
                let mut miter = MiterData::default();
                miter.gather_details(&edge, &[&host]).unwrap();
                miter.calculate_mitering().unwrap();
                miter
            })
            .collect();

        let input = MiteredLayerInput::from_host(&host, &miters).unwrap();
        assert_eq!(input.edge_extensions.len(), 4);
        assert_eq!(input.layer_offsets, vec![0.0, 20.0]);
        assert_relative_eq!(input.layer_start_offset, -10.0);

        let result = MiteredLayerInput::from_host(&host, &miters[..2]);
        assert!(matches!(
            result,
            Err(LayerMiterError::Miter(MiterError::EdgeCountMismatch { edges: 4, miters: 2 }))
        ));
    }
}
