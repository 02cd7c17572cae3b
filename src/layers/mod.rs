mod dims;
mod priority;

pub use dims::{CachedLayerDims, LayerGroup, MembraneExtent, PreferredNeighbor, StructuralExtent};
pub use priority::{LayerFunction, LayerPriority, PriorityGroup};

/// Opaque material reference carried through from the assembly definition.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MaterialId(pub String);

/// One material course of a layered assembly.
///
/// Thickness is in centimeters. A zero thickness is legal and describes a
/// logical-only layer that still takes part in offset bookkeeping.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerSpec {
    pub thickness: f64,
    pub priority: LayerPriority,
    pub function: LayerFunction,
    pub material: Option<MaterialId>,
}

impl LayerSpec {
    /// Creates a layer with no function or material.
    #[must_use]
    pub fn new(thickness: f64, priority: LayerPriority) -> Self {
        Self {
            thickness,
            priority,
            function: LayerFunction::None,
            material: None,
        }
    }

    /// Sets the layer's construction role.
    #[must_use]
    pub fn with_function(mut self, function: LayerFunction) -> Self {
        self.function = function;
        self
    }

    /// Sets the layer's material.
    #[must_use]
    pub fn with_material(mut self, material: MaterialId) -> Self {
        self.material = Some(material);
        self
    }
}
