use tracing::debug;

use crate::error::{AssemblyError, Result};

use super::{LayerFunction, LayerPriority, LayerSpec};

/// Which neighboring miter participant a layer group extends toward.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum PreferredNeighbor {
    /// Groups on the start side of the top-priority core.
    Previous,
    /// Groups on the end side of the top-priority core.
    Next,
    /// The top-priority core itself.
    #[default]
    Both,
}

impl PreferredNeighbor {
    /// The neighbor on the other side (`Both` stays `Both`).
    #[must_use]
    pub fn opposite(self) -> Self {
        match self {
            Self::Previous => Self::Next,
            Self::Next => Self::Previous,
            Self::Both => Self::Both,
        }
    }
}

/// A contiguous run of layers sharing one normalized miter priority.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerGroup {
    /// First layer of the group.
    pub start_index: usize,
    /// Last layer of the group (inclusive).
    pub end_index: usize,
    pub priority: LayerPriority,
    /// Cumulative thickness before the group's first layer.
    pub group_offset: f64,
    pub thickness: f64,
    pub preferred_neighbor: PreferredNeighbor,
    /// Set while gathering a miter when this is the only participant owning
    /// the edge's best priority.
    pub lone_top_priority: bool,
}

impl LayerGroup {
    /// Layer indices covered by the group.
    #[must_use]
    pub fn layers(&self) -> std::ops::RangeInclusive<usize> {
        self.start_index..=self.end_index
    }
}

/// Where the structural core of an assembly sits.
///
/// Assemblies without a (non-empty) structure layer are treated as entirely
/// structural.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StructuralExtent {
    pub start_index: usize,
    pub end_index: usize,
    pub width_start: f64,
    pub width_end: f64,
}

/// A membrane layer found outside the structural core.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MembraneExtent {
    pub index: usize,
    pub start: f64,
    pub end: f64,
}

/// Offsets, groups and widths derived from an ordered layer list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CachedLayerDims {
    layer_offsets: Vec<f64>,
    layer_thicknesses: Vec<f64>,
    normalized_priorities: Vec<LayerPriority>,
    layer_groups: Vec<LayerGroup>,
    highest_priority: LayerPriority,
    structure: StructuralExtent,
    start_membrane: Option<MembraneExtent>,
    end_membrane: Option<MembraneExtent>,
    total_unfinished_width: f64,
    start_finish: f64,
    end_finish: f64,
    total_finished_width: f64,
}

impl CachedLayerDims {
    /// Dimensions a layer list.
    ///
    /// # Errors
    ///
    /// See [`update_layers_from_assembly`](Self::update_layers_from_assembly).
    pub fn from_layers(layers: &[LayerSpec]) -> Result<Self> {
        let mut dims = Self::default();
        dims.update_layers_from_assembly(layers)?;
        Ok(dims)
    }

    /// Recomputes every derived value from `layers`.
    ///
    /// Each layer's priority is normalized by the sandwich rule: it becomes
    /// the lower of the best priority at or before it and the best priority
    /// at or after it, so low-priority islands enclosed by higher-priority
    /// layers are raised while the end layers keep their own priority.
    /// Groups then split wherever the normalized priority changes.
    ///
    /// # Errors
    ///
    /// Returns [`AssemblyError::Empty`] for an empty list and
    /// [`AssemblyError::NegativeThickness`] for a negative layer thickness.
    /// The dims are left empty on failure.
    pub fn update_layers_from_assembly(&mut self, layers: &[LayerSpec]) -> Result<()> {
        *self = Self::default();

        if layers.is_empty() {
            return Err(AssemblyError::Empty.into());
        }
        if let Some((index, layer)) = layers
            .iter()
            .enumerate()
            .find(|(_, l)| l.thickness < 0.0 || l.thickness.is_nan())
        {
            return Err(AssemblyError::NegativeThickness {
                index,
                thickness: layer.thickness,
            }
            .into());
        }

        let n = layers.len();
        let mut offset = 0.0;
        self.layer_offsets.reserve(n + 1);
        for layer in layers {
            self.layer_offsets.push(offset);
            self.layer_thicknesses.push(layer.thickness);
            offset += layer.thickness;
        }
        self.layer_offsets.push(offset);
        self.total_unfinished_width = offset;
        self.total_finished_width = offset;

        self.normalized_priorities = normalize_priorities(layers);
        self.highest_priority = self
            .normalized_priorities
            .iter()
            .copied()
            .min()
            .unwrap_or_default();
        self.build_groups();
        self.find_structure_and_membranes(layers);

        debug!(
            layers = n,
            groups = self.layer_groups.len(),
            width = self.total_unfinished_width,
            "dimensioned layer assembly"
        );
        Ok(())
    }

    fn build_groups(&mut self) {
        let mut groups: Vec<LayerGroup> = Vec::new();
        for (index, &priority) in self.normalized_priorities.iter().enumerate() {
            match groups.last_mut() {
                Some(group) if group.priority == priority => {
                    group.end_index = index;
                    group.thickness += self.layer_thicknesses[index];
                }
                _ => groups.push(LayerGroup {
                    start_index: index,
                    end_index: index,
                    priority,
                    group_offset: self.layer_offsets[index],
                    thickness: self.layer_thicknesses[index],
                    preferred_neighbor: PreferredNeighbor::Both,
                    lone_top_priority: false,
                }),
            }
        }

        let mut seen_top = false;
        for group in &mut groups {
            group.preferred_neighbor = if group.priority == self.highest_priority {
                seen_top = true;
                PreferredNeighbor::Both
            } else if seen_top {
                PreferredNeighbor::Next
            } else {
                PreferredNeighbor::Previous
            };
        }
        self.layer_groups = groups;
    }

    fn find_structure_and_membranes(&mut self, layers: &[LayerSpec]) {
        let mut structure_start: Option<(usize, f64)> = None;
        let mut offset = 0.0;
        for (index, layer) in layers.iter().enumerate() {
            match layer.function {
                LayerFunction::Membrane if structure_start.is_none() => {
                    self.start_membrane = Some(MembraneExtent {
                        index,
                        start: offset,
                        end: offset + layer.thickness,
                    });
                }
                LayerFunction::Structure if structure_start.is_none() => {
                    structure_start = Some((index, offset));
                }
                _ => {}
            }
            offset += layer.thickness;
        }

        let mut structure_end: Option<(usize, f64)> = None;
        for (index, layer) in layers.iter().enumerate().rev() {
            match layer.function {
                LayerFunction::Membrane if structure_end.is_none() => {
                    self.end_membrane = Some(MembraneExtent {
                        index,
                        start: offset - layer.thickness,
                        end: offset,
                    });
                }
                LayerFunction::Structure if structure_end.is_none() => {
                    structure_end = Some((index, offset));
                }
                _ => {}
            }
            offset -= layer.thickness;
        }

        self.structure = match (structure_start, structure_end) {
            (Some((start_index, width_start)), Some((end_index, width_end))) if width_end > 0.0 => {
                StructuralExtent {
                    start_index,
                    end_index,
                    width_start,
                    width_end,
                }
            }
            _ => StructuralExtent {
                start_index: 0,
                end_index: layers.len() - 1,
                width_start: 0.0,
                width_end: self.total_unfinished_width,
            },
        };
    }

    /// Records finish thicknesses applied outside the unfinished assembly.
    pub fn update_finish(&mut self, start_finish: f64, end_finish: f64) {
        self.start_finish = start_finish;
        self.end_finish = end_finish;
        self.total_finished_width = self.total_unfinished_width + start_finish + end_finish;
    }

    /// Flags every group at `priority` as the edge's lone top-priority group.
    pub(crate) fn mark_lone_top_priority(&mut self, priority: LayerPriority) {
        for group in &mut self.layer_groups {
            if group.priority == priority {
                group.lone_top_priority = true;
            }
        }
    }

    /// Clears all lone top-priority flags.
    pub(crate) fn clear_lone_top_priority(&mut self) {
        for group in &mut self.layer_groups {
            group.lone_top_priority = false;
        }
    }

    #[must_use]
    pub fn num_layers(&self) -> usize {
        self.layer_thicknesses.len()
    }

    /// Cumulative offsets from the start face, one more than the layer count.
    #[must_use]
    pub fn layer_offsets(&self) -> &[f64] {
        &self.layer_offsets
    }

    #[must_use]
    pub fn layer_thicknesses(&self) -> &[f64] {
        &self.layer_thicknesses
    }

    #[must_use]
    pub fn normalized_priorities(&self) -> &[LayerPriority] {
        &self.normalized_priorities
    }

    #[must_use]
    pub fn layer_groups(&self) -> &[LayerGroup] {
        &self.layer_groups
    }

    /// Best normalized priority of the assembly.
    #[must_use]
    pub fn highest_priority(&self) -> LayerPriority {
        self.highest_priority
    }

    #[must_use]
    pub fn structure(&self) -> &StructuralExtent {
        &self.structure
    }

    #[must_use]
    pub fn start_membrane(&self) -> Option<&MembraneExtent> {
        self.start_membrane.as_ref()
    }

    #[must_use]
    pub fn end_membrane(&self) -> Option<&MembraneExtent> {
        self.end_membrane.as_ref()
    }

    #[must_use]
    pub fn total_unfinished_width(&self) -> f64 {
        self.total_unfinished_width
    }

    /// Unfinished width plus both finish thicknesses.
    #[must_use]
    pub fn total_finished_width(&self) -> f64 {
        self.total_finished_width
    }

    #[must_use]
    pub fn has_start_finish(&self) -> bool {
        self.start_finish > 0.0
    }

    #[must_use]
    pub fn has_end_finish(&self) -> bool {
        self.end_finish > 0.0
    }
}

/// Sandwich-rule normalization of layer priorities.
fn normalize_priorities(layers: &[LayerSpec]) -> Vec<LayerPriority> {
    let n = layers.len();
    let mut best_before = Vec::with_capacity(n);
    let mut best: Option<LayerPriority> = None;
    for layer in layers {
        let b = best.map_or(layer.priority, |b| b.min(layer.priority));
        best_before.push(b);
        best = Some(b);
    }

    let mut best_after = vec![LayerPriority::default(); n];
    let mut best: Option<LayerPriority> = None;
    for (i, layer) in layers.iter().enumerate().rev() {
        let b = best.map_or(layer.priority, |b| b.min(layer.priority));
        best_after[i] = b;
        best = Some(b);
    }

    best_before
        .into_iter()
        .zip(best_after)
        .map(|(before, after)| before.max(after))
        .collect()
}
