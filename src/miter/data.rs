use tracing::{debug, trace, warn};

use crate::config::Tolerances;
use crate::error::{MiterError, Result};
use crate::layers::PreferredNeighbor;
use crate::math::projection::find_basis_vectors;
use crate::math::{Point3, Vector3, TOLERANCE};

use super::{LayerExtension, MiterEdge, MiterHost, MiterParticipant, MiterState};

/// Miter resolution for every hosted object meeting at one edge.
///
/// Call [`gather_details`](Self::gather_details) with the hosts around the
/// edge, then [`calculate_mitering`](Self::calculate_mitering), then read
/// each host's extensions back by id.
#[derive(Debug, Clone)]
pub struct MiterData {
    edge_center: Point3,
    edge_dir: Vector3,
    axis_x: Vector3,
    axis_y: Vector3,
    /// Sorted by angle around the edge.
    participants: Vec<MiterParticipant>,
    state: MiterState,
    tolerances: Tolerances,
}

impl Default for MiterData {
    fn default() -> Self {
        Self::new(Tolerances::default())
    }
}

impl MiterData {
    #[must_use]
    pub fn new(tolerances: Tolerances) -> Self {
        Self {
            edge_center: Point3::origin(),
            edge_dir: Vector3::zeros(),
            axis_x: Vector3::zeros(),
            axis_y: Vector3::zeros(),
            participants: Vec::new(),
            state: MiterState::Empty,
            tolerances,
        }
    }

    fn reset(&mut self) {
        self.edge_center = Point3::origin();
        self.edge_dir = Vector3::zeros();
        self.axis_x = Vector3::zeros();
        self.axis_y = Vector3::zeros();
        self.participants.clear();
        self.state = MiterState::Empty;
    }

    /// Captures the edge basis and one participant per usable host.
    ///
    /// Hosts that can't take part (bad assembly, normal along the edge, no
    /// face direction) are skipped with a warning. When a single host owns
    /// the best priority on the edge, its top groups are flagged and a
    /// mirrored twin is added so neighbors on both sides can reach it.
    ///
    /// # Errors
    ///
    /// Returns [`MiterError::DegenerateEdge`] for a zero-length edge; the
    /// data is left empty.
    pub fn gather_details(&mut self, edge: &MiterEdge, hosts: &[&dyn MiterHost]) -> Result<()> {
        self.reset();

        let edge_dir = (edge.end - edge.start)
            .try_normalize(TOLERANCE)
            .ok_or(MiterError::DegenerateEdge)?;
        let (axis_x, axis_y) = find_basis_vectors(&edge_dir, &self.tolerances);
        self.edge_center = edge.center();
        self.edge_dir = edge_dir;
        self.axis_x = axis_x;
        self.axis_y = axis_y;

        for host in hosts {
            match MiterParticipant::from_host(*host, edge, &edge_dir, (&axis_x, &axis_y), &self.tolerances) {
                Ok(participant) => self.participants.push(participant),
                Err(error) => warn!(host = host.host_id(), %error, "skipping miter participant"),
            }
        }

        let top_priority = self
            .participants
            .iter()
            .map(|p| p.layer_dims().highest_priority())
            .min();
        if let Some(top_priority) = top_priority {
            let mut owners = self
                .participants
                .iter()
                .enumerate()
                .filter(|(_, p)| p.layer_dims().highest_priority() == top_priority)
                .map(|(i, _)| i);
            if let (Some(lone), None) = (owners.next(), owners.next()) {
                if self.participants.len() > 1 {
                    let participant = &mut self.participants[lone];
                    participant.mark_lone_top_priority(top_priority);
                    let twin = participant.mirrored();
                    debug!(host = twin.host_id(), %top_priority, "lone top priority participant");
                    self.participants.push(twin);
                }
            }
        }

        self.participants.sort_by(|a, b| {
            a.angle()
                .total_cmp(&b.angle())
                .then(a.host_id().cmp(&b.host_id()))
                .then(a.is_mirrored().cmp(&b.is_mirrored()))
        });

        debug!(
            participants = self.participants.len(),
            edge_center = ?self.edge_center,
            "gathered miter details"
        );
        self.state = MiterState::Gathered;
        Ok(())
    }

    /// Resolves layer and surface extensions for every participant.
    ///
    /// Groups are processed from highest to lowest priority. Running this
    /// again on the same gathered data gives the same result.
    ///
    /// # Errors
    ///
    /// Returns [`MiterError::NotGathered`] before a successful
    /// [`gather_details`](Self::gather_details).
    pub fn calculate_mitering(&mut self) -> Result<()> {
        if self.state == MiterState::Empty {
            return Err(MiterError::NotGathered.into());
        }

        for participant in &mut self.participants {
            participant.reset_extensions();
        }

        if self.participants.len() < 2 {
            self.state = MiterState::Resolved;
            return Ok(());
        }

        let mut groups: Vec<(usize, usize)> = self
            .participants
            .iter()
            .enumerate()
            .flat_map(|(pi, p)| (0..p.layer_dims().layer_groups().len()).map(move |gi| (pi, gi)))
            .collect();
        groups.sort_by_key(|&(pi, gi)| self.participants[pi].layer_dims().layer_groups()[gi].priority);

        let mut extended = 0_usize;
        for (pi, gi) in groups {
            if self.extend_layer_group(pi, gi) {
                extended += 1;
            }
        }

        let mut surfaces = 0_usize;
        for pi in 0..self.participants.len() {
            if self.extend_surface_groups(pi) {
                surfaces += 1;
            }
        }

        debug!(extended, surfaces, "resolved miter");
        self.state = MiterState::Resolved;
        Ok(())
    }

    /// Extends one group against its start and end neighbors. Returns
    /// whether both sides hit.
    fn extend_layer_group(&mut self, pi: usize, gi: usize) -> bool {
        let n = self.participants.len();
        let participant = &self.participants[pi];
        let group = &participant.layer_dims().layer_groups()[gi];

        let (mut next, mut prev) = participant.neighbor_deltas();
        match group.preferred_neighbor {
            PreferredNeighbor::Previous => next = prev,
            PreferredNeighbor::Next => prev = next,
            PreferredNeighbor::Both => {}
        }

        let start_participant = &self.participants[wrap_index(pi, prev, n)];
        let end_participant = &self.participants[wrap_index(pi, next, n)];
        let same_winding_start = participant.plane_normal_cw() == start_participant.plane_normal_cw();
        let same_winding_end = participant.plane_normal_cw() == end_participant.plane_normal_cw();

        let tol = &self.tolerances;
        let mut start_hit = participant.intersect_structure_group(gi, start_participant, true, !same_winding_start, tol);
        let mut end_hit = participant.intersect_structure_group(gi, end_participant, false, same_winding_end, tol);

        if group.lone_top_priority {
            if start_hit.dist > end_hit.dist {
                end_hit = start_hit;
            } else {
                start_hit = end_hit;
            }
        }

        let extension = (start_hit.ray_hit && end_hit.ray_hit).then(|| LayerExtension::new(start_hit.dist, end_hit.dist));
        trace!(
            host = participant.host_id(),
            group = gi,
            priority = %group.priority,
            start = start_hit.dist,
            end = end_hit.dist,
            hit = extension.is_some(),
            "extended layer group"
        );
        let hit = extension.is_some();
        self.participants[pi].apply_group_extension(gi, extension);
        hit
    }

    /// Extends a participant's outer faces against its neighbors' outer
    /// faces. Returns whether both sides hit.
    fn extend_surface_groups(&mut self, pi: usize) -> bool {
        let n = self.participants.len();
        let participant = &self.participants[pi];
        let (next, prev) = participant.neighbor_deltas();
        let next_neighbor = &self.participants[wrap_index(pi, next, n)];
        let prev_neighbor = &self.participants[wrap_index(pi, prev, n)];

        let same_next = next_neighbor.plane_normal_cw() == participant.plane_normal_cw();
        let same_prev = prev_neighbor.plane_normal_cw() == participant.plane_normal_cw();

        let last = participant.group_origins_2d().len() - 1;
        let prev_origin = if same_prev { prev_neighbor.group_origins_2d().len() - 1 } else { 0 };
        let next_origin = if same_next { 0 } else { next_neighbor.group_origins_2d().len() - 1 };

        let tol = &self.tolerances;
        let prev_hit = participant.intersect_surface_group(0, prev_origin, prev_neighbor, true, !same_prev, tol);
        let next_hit = participant.intersect_surface_group(last, next_origin, next_neighbor, false, same_next, tol);

        if prev_hit.ray_hit && next_hit.ray_hit {
            self.participants[pi].set_surface_extensions(LayerExtension::new(prev_hit.dist, next_hit.dist));
            true
        } else {
            false
        }
    }

    fn find_participant(&self, host_id: u64) -> Result<&MiterParticipant> {
        if self.state == MiterState::Empty {
            return Err(MiterError::NotGathered.into());
        }
        self.participants
            .iter()
            .find(|p| p.host_id() == host_id && !p.is_mirrored())
            .ok_or_else(|| MiterError::UnknownParticipant(host_id).into())
    }

    /// Per-layer extensions of `host_id` along this edge.
    ///
    /// # Errors
    ///
    /// Fails before gathering, or when the host isn't a participant.
    pub fn layer_extensions(&self, host_id: u64) -> Result<&[LayerExtension]> {
        Ok(self.find_participant(host_id)?.layer_extensions())
    }

    /// Outer face extensions of `host_id` along this edge.
    ///
    /// # Errors
    ///
    /// Fails before gathering, or when the host isn't a participant.
    pub fn surface_extensions(&self, host_id: u64) -> Result<LayerExtension> {
        Ok(self.find_participant(host_id)?.surface_extensions())
    }

    /// Participants sorted by angle, mirrored twins included.
    #[must_use]
    pub fn participants(&self) -> &[MiterParticipant] {
        &self.participants
    }

    #[must_use]
    pub fn state(&self) -> MiterState {
        self.state
    }

    #[must_use]
    pub fn edge_center(&self) -> &Point3 {
        &self.edge_center
    }

    #[must_use]
    pub fn edge_dir(&self) -> &Vector3 {
        &self.edge_dir
    }

    /// The edge's 2D basis.
    #[must_use]
    pub fn axes(&self) -> (&Vector3, &Vector3) {
        (&self.axis_x, &self.axis_y)
    }

    #[must_use]
    pub fn tolerances(&self) -> &Tolerances {
        &self.tolerances
    }
}

fn wrap_index(index: usize, delta: isize, n: usize) -> usize {
    (index as isize + delta).rem_euclid(n as isize) as usize
}
