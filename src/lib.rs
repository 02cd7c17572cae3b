pub mod config;
pub mod error;
pub mod layer_geom;
pub mod layers;
pub mod math;
pub mod miter;
pub mod tessellation;

pub use config::{Tolerances, TriangulationParams};
pub use error::{LayerMiterError, Result};
pub use layer_geom::{LayerGeomDef, LayerGeomInput, LayerSide, PolyHole3D};
pub use layers::{CachedLayerDims, LayerPriority, LayerSpec, PriorityGroup};
pub use miter::{HostedPlane, LayerExtension, MiterData, MiterEdge, MiterHost};
pub use tessellation::LayerMesh;
