use crate::config::Tolerances;
use crate::error::{GeometryError, Result};
use crate::layers::{CachedLayerDims, LayerPriority, PreferredNeighbor};
use crate::math::intersect_2d::ray_intersection_2d;
use crate::math::polygon_3d::{newell_normal, vertex_centroid};
use crate::math::projection::project_vector_2d;
use crate::math::{points_equal, Point2, Point3, Vector2, Vector3, TOLERANCE};

use super::{LayerExtension, MiterEdge, MiterHitResult, MiterHost};

/// One hosted object as seen from a miter edge.
///
/// Positions and directions are expressed in the edge's 2D basis, with the
/// edge itself at the origin.
#[derive(Debug, Clone)]
pub struct MiterParticipant {
    host_id: u64,
    mirrored: bool,
    angle: f64,
    world_miter_dir: Vector3,
    world_normal: Vector3,
    miter_dir_2d: Vector2,
    normal_2d: Vector2,
    plane_normal_cw: bool,
    layer_start_offset: f64,
    layer_dims: CachedLayerDims,
    /// Pre-structure origin, one `(start, end)` pair per layer group, then
    /// the post-structure origin.
    group_origins_2d: Vec<(Point2, Point2)>,
    group_extensions: Vec<LayerExtension>,
    layer_extensions: Vec<LayerExtension>,
    surface_extensions: LayerExtension,
}

impl MiterParticipant {
    /// Captures everything the miter needs from `host`.
    ///
    /// # Errors
    ///
    /// Fails when the host's layers can't be dimensioned, its normal is
    /// zero or runs along the edge, or its polygon gives no direction away
    /// from the edge.
    pub(crate) fn from_host(
        host: &dyn MiterHost,
        edge: &MiterEdge,
        edge_dir: &Vector3,
        basis: (&Vector3, &Vector3),
        tolerances: &Tolerances,
    ) -> Result<Self> {
        let (axis_x, axis_y) = basis;
        let layer_dims = CachedLayerDims::from_layers(host.layers())?;

        let world_normal = host
            .normal()
            .try_normalize(TOLERANCE)
            .ok_or(GeometryError::ZeroVector)?;
        if tolerances.parallel(&world_normal, edge_dir) {
            return Err(GeometryError::Degenerate("host normal runs along the miter edge".into()).into());
        }

        let face_dir = inward_face_dir(host.control_points(), edge, edge_dir, tolerances)
            .ok_or_else(|| GeometryError::Degenerate("host polygon has no direction away from the edge".into()))?;

        // Measured around the edge from axis_y, which is edge × axis_x.
        let abs_angle = face_dir.dot(axis_y).clamp(-1.0, 1.0).acos().to_degrees();
        let angle = if face_dir.cross(axis_y).dot(edge_dir) >= 0.0 {
            abs_angle
        } else {
            360.0 - abs_angle
        };

        let world_miter_dir = -face_dir;
        let miter_dir_2d = project_vector_2d(&world_miter_dir, axis_x, axis_y);
        let normal_2d = project_vector_2d(&world_normal, axis_x, axis_y);
        let plane_normal_cw = world_normal.cross(&world_miter_dir).dot(edge_dir) > 0.0;

        let layer_start_offset = host.layer_start_offset();
        let offsets = layer_dims.layer_offsets();
        let at = |offset: f64| Point2::from(normal_2d * (layer_start_offset + offset));
        let first = offsets.first().copied().unwrap_or_default();
        let last = offsets.last().copied().unwrap_or_default();

        let mut group_origins_2d = Vec::with_capacity(layer_dims.layer_groups().len() + 2);
        group_origins_2d.push((at(first), at(first)));
        for group in layer_dims.layer_groups() {
            group_origins_2d.push((at(offsets[group.start_index]), at(offsets[group.end_index + 1])));
        }
        group_origins_2d.push((at(last), at(last)));

        Ok(Self {
            host_id: host.host_id(),
            mirrored: false,
            angle: angle.rem_euclid(360.0),
            world_miter_dir,
            world_normal,
            miter_dir_2d,
            normal_2d,
            plane_normal_cw,
            layer_start_offset,
            group_extensions: vec![LayerExtension::default(); layer_dims.layer_groups().len()],
            layer_extensions: vec![LayerExtension::default(); layer_dims.num_layers()],
            surface_extensions: LayerExtension::default(),
            layer_dims,
            group_origins_2d,
        })
    }

    /// A virtual copy on the far side of the edge, so neighbors on both
    /// sides see a lone top-priority participant as a target.
    pub(crate) fn mirrored(&self) -> Self {
        let mut twin = self.clone();
        twin.mirrored = true;
        twin.angle = (self.angle + 180.0).rem_euclid(360.0);
        twin.plane_normal_cw = !self.plane_normal_cw;
        twin
    }

    /// Replaces any earlier lone top-priority flags with `priority`.
    pub(crate) fn mark_lone_top_priority(&mut self, priority: LayerPriority) {
        self.layer_dims.clear_lone_top_priority();
        self.layer_dims.mark_lone_top_priority(priority);
    }

    pub(crate) fn reset_extensions(&mut self) {
        self.group_extensions.fill(LayerExtension::default());
        self.layer_extensions.fill(LayerExtension::default());
        self.surface_extensions = LayerExtension::default();
    }

    /// Offsets to the next and previous participant in sorted order.
    pub(crate) fn neighbor_deltas(&self) -> (isize, isize) {
        let next = if self.plane_normal_cw { -1 } else { 1 };
        (next, -next)
    }

    /// Casts the start or end face of group `group_index` at `other`.
    ///
    /// An exact priority match wins; otherwise the first higher-priority
    /// group on the targeted side is used. A lone top-priority group instead
    /// reaches to the far face of the other participant's best group.
    pub(crate) fn intersect_structure_group(
        &self,
        group_index: usize,
        other: &Self,
        use_this_start: bool,
        mut use_other_start: bool,
        tolerances: &Tolerances,
    ) -> MiterHitResult {
        let mut result = MiterHitResult::default();
        let groups = self.layer_dims.layer_groups();
        let other_groups = other.layer_dims.layer_groups();
        let Some(group) = groups.get(group_index) else {
            return result;
        };

        let (this_start, this_end) = self.group_origins_2d[group_index + 1];
        let this_origin = if use_this_start { this_start } else { this_end };
        let target = if use_this_start == use_other_start {
            group.preferred_neighbor
        } else {
            group.preferred_neighbor.opposite()
        };

        let mut best: Option<usize> = None;
        if group.lone_top_priority {
            best = other_groups
                .iter()
                .enumerate()
                .min_by_key(|(_, g)| g.priority)
                .map(|(i, _)| i);
            use_other_start = !use_other_start;
        } else {
            let n = other_groups.len();
            for i in 0..n {
                let other_index = if target == PreferredNeighbor::Previous { i } else { n - i - 1 };
                let candidate = &other_groups[other_index];
                let can_miter = target == PreferredNeighbor::Both
                    || target == candidate.preferred_neighbor
                    || candidate.preferred_neighbor == PreferredNeighbor::Both;
                if !can_miter {
                    continue;
                }
                if candidate.priority == group.priority {
                    best = Some(other_index);
                    result.priority_match_hit = true;
                    break;
                }
                if best.is_none() && candidate.priority.outranks(&group.priority) {
                    best = Some(other_index);
                }
            }
        }

        let Some(other_index) = best else {
            return result;
        };

        let (other_start, other_end) = other.group_origins_2d[other_index + 1];
        let other_origin = if result.priority_match_hit || target == PreferredNeighbor::Both {
            if use_other_start {
                other_start
            } else {
                other_end
            }
        } else if target == PreferredNeighbor::Previous {
            other_start
        } else {
            other_end
        };

        if let Some(hit) = ray_intersection_2d(
            &this_origin,
            &self.miter_dir_2d,
            &other_origin,
            &other.miter_dir_2d,
            false,
            tolerances,
        ) {
            result.dist = hit.dist_a;
            result.ray_hit = true;
        }
        result
    }

    /// Casts one of this participant's group origins at one of `other`'s.
    pub(crate) fn intersect_surface_group(
        &self,
        this_origin_index: usize,
        other_origin_index: usize,
        other: &Self,
        use_this_start: bool,
        use_other_start: bool,
        tolerances: &Tolerances,
    ) -> MiterHitResult {
        let (this_start, this_end) = self.group_origins_2d[this_origin_index];
        let (other_start, other_end) = other.group_origins_2d[other_origin_index];
        let this_origin = if use_this_start { this_start } else { this_end };
        let other_origin = if use_other_start { other_start } else { other_end };

        ray_intersection_2d(
            &this_origin,
            &self.miter_dir_2d,
            &other_origin,
            &other.miter_dir_2d,
            false,
            tolerances,
        )
        .map_or_else(MiterHitResult::default, |hit| MiterHitResult {
            dist: hit.dist_a,
            ray_hit: true,
            priority_match_hit: false,
        })
    }

    /// Stores a group's extension and spreads it over the group's layers by
    /// thickness. `None` clears the group.
    pub(crate) fn apply_group_extension(&mut self, group_index: usize, extension: Option<LayerExtension>) {
        let Some(extension) = extension else {
            self.group_extensions[group_index] = LayerExtension::default();
            return;
        };
        self.group_extensions[group_index] = extension;

        let group = &self.layer_dims.layer_groups()[group_index];
        let offsets = self.layer_dims.layer_offsets();
        let group_start = offsets[group.start_index];
        let group_thickness = offsets[group.end_index + 1] - group_start;
        for layer in group.layers() {
            let (start_alpha, end_alpha) = if group_thickness > 0.0 {
                (
                    (offsets[layer] - group_start) / group_thickness,
                    (offsets[layer + 1] - group_start) / group_thickness,
                )
            } else {
                (0.0, 1.0)
            };
            self.layer_extensions[layer] = LayerExtension::new(extension.lerp(start_alpha), extension.lerp(end_alpha));
        }
    }

    pub(crate) fn set_surface_extensions(&mut self, extensions: LayerExtension) {
        self.surface_extensions = extensions;
    }

    #[must_use]
    pub fn host_id(&self) -> u64 {
        self.host_id
    }

    /// Whether this is the virtual twin of a lone top-priority participant.
    #[must_use]
    pub fn is_mirrored(&self) -> bool {
        self.mirrored
    }

    /// Angle of the host's face around the edge, in degrees in `[0, 360)`.
    #[must_use]
    pub fn angle(&self) -> f64 {
        self.angle
    }

    /// Direction from the host's face toward and past the edge.
    #[must_use]
    pub fn world_miter_dir(&self) -> &Vector3 {
        &self.world_miter_dir
    }

    #[must_use]
    pub fn world_normal(&self) -> &Vector3 {
        &self.world_normal
    }

    #[must_use]
    pub fn miter_dir_2d(&self) -> &Vector2 {
        &self.miter_dir_2d
    }

    #[must_use]
    pub fn normal_2d(&self) -> &Vector2 {
        &self.normal_2d
    }

    /// Whether the layer normal turns clockwise around the edge, seen down
    /// the edge direction.
    #[must_use]
    pub fn plane_normal_cw(&self) -> bool {
        self.plane_normal_cw
    }

    #[must_use]
    pub fn layer_start_offset(&self) -> f64 {
        self.layer_start_offset
    }

    #[must_use]
    pub fn layer_dims(&self) -> &CachedLayerDims {
        &self.layer_dims
    }

    #[must_use]
    pub fn group_origins_2d(&self) -> &[(Point2, Point2)] {
        &self.group_origins_2d
    }

    #[must_use]
    pub fn group_extensions(&self) -> &[LayerExtension] {
        &self.group_extensions
    }

    #[must_use]
    pub fn layer_extensions(&self) -> &[LayerExtension] {
        &self.layer_extensions
    }

    /// Extensions of the assembly's outer start and end faces.
    #[must_use]
    pub fn surface_extensions(&self) -> LayerExtension {
        self.surface_extensions
    }
}

/// Unit direction in the host's plane, perpendicular to the edge and
/// pointing into the host polygon.
fn inward_face_dir(
    points: &[Point3],
    edge: &MiterEdge,
    edge_dir: &Vector3,
    tolerances: &Tolerances,
) -> Option<Vector3> {
    let face_normal = newell_normal(points).try_normalize(TOLERANCE)?;
    let across = face_normal.cross(edge_dir).try_normalize(TOLERANCE)?;

    // The polygon interior lies left of each counter-clockwise edge.
    let n = points.len();
    let tol = tolerances.ray_intersect;
    let along_edge = (0..n).find_map(|i| {
        let (a, b) = (&points[i], &points[(i + 1) % n]);
        if points_equal(a, &edge.start, tol) && points_equal(b, &edge.end, tol) {
            Some(1.0)
        } else if points_equal(a, &edge.end, tol) && points_equal(b, &edge.start, tol) {
            Some(-1.0)
        } else {
            None
        }
    });
    if let Some(sign) = along_edge {
        return Some(across * sign);
    }

    let side = (vertex_centroid(points)? - edge.center()).dot(&across);
    (side.abs() > tolerances.kinda_small).then(|| across * side.signum())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::layers::{LayerSpec, PriorityGroup};
    use crate::math::projection::find_basis_vectors;
    use crate::miter::HostedPlane;
    use approx::assert_relative_eq;

    fn p(x: f64, y: f64, z: f64) -> Point3 {
        Point3::new(x, y, z)
    }

    fn vertical_edge() -> MiterEdge {
        MiterEdge::new(p(0.0, 0.0, 0.0), p(0.0, 0.0, 300.0))
    }

    fn structure(thickness: f64) -> Vec<LayerSpec> {
        vec![LayerSpec::new(thickness, LayerPriority::new(PriorityGroup::Structure, 0))]
    }

    fn gather(host: &HostedPlane) -> MiterParticipant {
        let edge = vertical_edge();
        let dir = Vector3::z();
        let (x, y) = find_basis_vectors(&dir, &Tolerances::default());
        MiterParticipant::from_host(host, &edge, &dir, (&x, &y), &Tolerances::default()).unwrap()
    }

    #[test]
    fn wall_along_x_faces_ninety_degrees() {
        let host = HostedPlane::new(
            1,
            vec![p(0.0, 0.0, 0.0), p(100.0, 0.0, 0.0), p(100.0, 0.0, 300.0), p(0.0, 0.0, 300.0)],
            Vector3::y(),
            structure(20.0),
        );
        let participant = gather(&host);
        assert_relative_eq!(participant.angle(), 90.0, epsilon = 1e-9);
        assert_relative_eq!(*participant.miter_dir_2d(), Vector2::new(-1.0, 0.0), epsilon = 1e-12);
        assert_relative_eq!(*participant.normal_2d(), Vector2::new(0.0, 1.0), epsilon = 1e-12);
        assert!(participant.plane_normal_cw());

        let origins = participant.group_origins_2d();
        assert_eq!(origins.len(), 3);
        assert_relative_eq!(origins[1].0, Point2::new(0.0, -10.0), epsilon = 1e-12);
        assert_relative_eq!(origins[1].1, Point2::new(0.0, 10.0), epsilon = 1e-12);
        assert_eq!(origins[0].0, origins[0].1);
    }

    #[test]
    fn edge_order_in_polygon_does_not_matter() {
        // Same wall, wound the other way around.
        let host = HostedPlane::new(
            1,
            vec![p(0.0, 0.0, 300.0), p(100.0, 0.0, 300.0), p(100.0, 0.0, 0.0), p(0.0, 0.0, 0.0)],
            Vector3::y(),
            structure(20.0),
        );
        assert_relative_eq!(gather(&host).angle(), 90.0, epsilon = 1e-9);
    }

    #[test]
    fn mirrored_twin_flips_winding() {
        let host = HostedPlane::new(
            2,
            vec![p(0.0, 0.0, 0.0), p(0.0, 0.0, 300.0), p(0.0, 100.0, 300.0), p(0.0, 100.0, 0.0)],
            Vector3::x(),
            structure(20.0),
        );
        let participant = gather(&host);
        assert_relative_eq!(participant.angle(), 0.0, epsilon = 1e-9);
        let twin = participant.mirrored();
        assert!(twin.is_mirrored());
        assert_relative_eq!(twin.angle(), 180.0, epsilon = 1e-9);
        assert_ne!(twin.plane_normal_cw(), participant.plane_normal_cw());
    }

    #[test]
    fn marking_a_new_lone_priority_clears_the_old_one() {
        let finish = LayerPriority::new(PriorityGroup::Finish, 0);
        let core = LayerPriority::new(PriorityGroup::Structure, 0);
        let host = HostedPlane::new(
            5,
            vec![p(0.0, 0.0, 0.0), p(100.0, 0.0, 0.0), p(100.0, 0.0, 300.0), p(0.0, 0.0, 300.0)],
            Vector3::y(),
            vec![LayerSpec::new(2.0, finish), LayerSpec::new(16.0, core), LayerSpec::new(2.0, finish)],
        );
        let mut participant = gather(&host);
        let flagged = |participant: &MiterParticipant| -> Vec<LayerPriority> {
            participant
                .layer_dims()
                .layer_groups()
                .iter()
                .filter(|g| g.lone_top_priority)
                .map(|g| g.priority)
                .collect()
        };

        participant.mark_lone_top_priority(core);
        assert_eq!(flagged(&participant), vec![core]);

        participant.mark_lone_top_priority(finish);
        assert_eq!(flagged(&participant), vec![finish, finish]);
    }

    #[test]
    fn normal_along_edge_is_rejected() {
        let host = HostedPlane::new(
            3,
            vec![p(0.0, 0.0, 0.0), p(100.0, 0.0, 0.0), p(100.0, 0.0, 300.0), p(0.0, 0.0, 300.0)],
            Vector3::z(),
            structure(20.0),
        );
        let edge = vertical_edge();
        let (x, y) = find_basis_vectors(&Vector3::z(), &Tolerances::default());
        let result = MiterParticipant::from_host(&host, &edge, &Vector3::z(), (&x, &y), &Tolerances::default());
        assert!(result.is_err());
    }

    #[test]
    fn group_extension_spreads_by_thickness() {
        let layers = vec![
            LayerSpec::new(5.0, LayerPriority::new(PriorityGroup::Structure, 0)),
            LayerSpec::new(15.0, LayerPriority::new(PriorityGroup::Structure, 0)),
        ];
        let host = HostedPlane::new(
            4,
            vec![p(0.0, 0.0, 0.0), p(100.0, 0.0, 0.0), p(100.0, 0.0, 300.0), p(0.0, 0.0, 300.0)],
            Vector3::y(),
            layers,
        );
        let mut participant = gather(&host);
        participant.apply_group_extension(0, Some(LayerExtension::new(10.0, -10.0)));
        let layers = participant.layer_extensions();
        assert_relative_eq!(layers[0].start, 10.0);
        assert_relative_eq!(layers[0].end, 5.0);
        assert_relative_eq!(layers[1].start, 5.0);
        assert_relative_eq!(layers[1].end, -10.0);

        participant.reset_extensions();
        assert!(participant.layer_extensions().iter().all(LayerExtension::is_zero));
    }
}
