mod data;
mod layer_loops;
mod participant;

pub use data::MiterData;
pub use layer_loops::{build_mitered_layer_geoms, MiteredLayerInput};
pub use participant::MiterParticipant;

use crate::layers::LayerSpec;
use crate::math::{Point3, Vector3};

/// The shared 3D edge several hosted objects meet at.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MiterEdge {
    pub start: Point3,
    pub end: Point3,
}

impl MiterEdge {
    #[must_use]
    pub fn new(start: Point3, end: Point3) -> Self {
        Self { start, end }
    }

    #[must_use]
    pub fn center(&self) -> Point3 {
        Point3::from((self.start.coords + self.end.coords) * 0.5)
    }
}

/// A layered object hosted on a planar polygon that can take part in a miter.
pub trait MiterHost {
    /// Stable identifier, used to order participants and look up results.
    fn host_id(&self) -> u64;

    /// The host polygon, one of whose edges is the miter edge.
    fn control_points(&self) -> &[Point3];

    /// Direction the layers stack along.
    fn normal(&self) -> Vector3;

    /// The host's layers in stacking order.
    fn layers(&self) -> &[LayerSpec];

    /// Offset along [`normal`](Self::normal) from the polygon to the first
    /// layer's start face.
    fn layer_start_offset(&self) -> f64;
}

/// A layered assembly on a planar polygon.
#[derive(Debug, Clone)]
pub struct HostedPlane {
    id: u64,
    points: Vec<Point3>,
    normal: Vector3,
    layers: Vec<LayerSpec>,
    justification: f64,
}

impl HostedPlane {
    /// Creates a host centered on its polygon.
    #[must_use]
    pub fn new(id: u64, points: Vec<Point3>, normal: Vector3, layers: Vec<LayerSpec>) -> Self {
        Self {
            id,
            points,
            normal,
            layers,
            justification: 0.5,
        }
    }

    /// Sets how far through the assembly the polygon sits: 0 puts it on the
    /// first layer's start face, 1 on the last layer's end face.
    #[must_use]
    pub fn with_justification(mut self, justification: f64) -> Self {
        self.justification = justification;
        self
    }

    #[must_use]
    pub fn total_thickness(&self) -> f64 {
        self.layers.iter().map(|l| l.thickness).sum()
    }
}

impl MiterHost for HostedPlane {
    fn host_id(&self) -> u64 {
        self.id
    }

    fn control_points(&self) -> &[Point3] {
        &self.points
    }

    fn normal(&self) -> Vector3 {
        self.normal
    }

    fn layers(&self) -> &[LayerSpec] {
        &self.layers
    }

    fn layer_start_offset(&self) -> f64 {
        -self.justification * self.total_thickness()
    }
}

/// How far a layer reaches past the miter edge on each of its faces.
///
/// Positive values extend past the edge, negative values retract.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LayerExtension {
    /// At the layer's start face.
    pub start: f64,
    /// At the layer's end face.
    pub end: f64,
}

impl LayerExtension {
    #[must_use]
    pub fn new(start: f64, end: f64) -> Self {
        Self { start, end }
    }

    /// Linear interpolation from `start` (t = 0) to `end` (t = 1).
    #[must_use]
    pub fn lerp(&self, t: f64) -> f64 {
        self.start + (self.end - self.start) * t
    }

    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.start == 0.0 && self.end == 0.0
    }
}

/// Result of casting one group face toward a neighbor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MiterHitResult {
    /// Signed distance along this participant's miter direction.
    pub dist: f64,
    pub ray_hit: bool,
    /// The hit group has exactly the same priority.
    pub priority_match_hit: bool,
}

impl Default for MiterHitResult {
    fn default() -> Self {
        Self {
            dist: f64::NEG_INFINITY,
            ray_hit: false,
            priority_match_hit: false,
        }
    }
}

/// Progress of a [`MiterData`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MiterState {
    #[default]
    Empty,
    Gathered,
    Resolved,
}
