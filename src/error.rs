use thiserror::Error;

/// Top-level error type for the layer mitering kernel.
#[derive(Debug, Error)]
pub enum LayerMiterError {
    #[error(transparent)]
    Geometry(#[from] GeometryError),

    #[error(transparent)]
    Assembly(#[from] AssemblyError),

    #[error(transparent)]
    Triangulation(#[from] TriangulationError),

    #[error(transparent)]
    Miter(#[from] MiterError),
}

/// Errors raised while validating layer point loops.
#[derive(Debug, Error, PartialEq)]
pub enum GeometryError {
    #[error("at least 3 points required, got {0}")]
    TooFewPoints(usize),

    #[error("point loops have different lengths ({a} vs {b})")]
    MismatchedLoops { a: usize, b: usize },

    #[error("zero-length vector")]
    ZeroVector,

    #[error("loop has consecutive repeated points at index {0}")]
    RepeatedPoints(usize),

    #[error("points are not planar: {0}")]
    NonPlanar(&'static str),

    #[error("loop plane is not parallel to the layer normal")]
    NotParallel,

    #[error("degenerate geometry: {0}")]
    Degenerate(String),
}

/// Errors raised while dimensioning an assembly's layers.
#[derive(Debug, Error, PartialEq)]
pub enum AssemblyError {
    #[error("assembly has no layers")]
    Empty,

    #[error("layer {index} has negative thickness {thickness}")]
    NegativeThickness { index: usize, thickness: f64 },
}

/// Errors raised while triangulating a layer.
#[derive(Debug, Error)]
pub enum TriangulationError {
    #[error("front and back perimeters differ ({a} vs {b} points)")]
    PerimeterMismatch { a: usize, b: usize },

    #[error("triangulation failed: {0}")]
    Failed(String),
}

/// Errors raised while gathering or resolving a miter.
#[derive(Debug, Error, PartialEq)]
pub enum MiterError {
    #[error("miter edge has zero length")]
    DegenerateEdge,

    #[error("miter details have not been gathered")]
    NotGathered,

    #[error("participant {0} is not part of this miter")]
    UnknownParticipant(u64),

    #[error("host has {edges} edges but {miters} miters were given")]
    EdgeCountMismatch { edges: usize, miters: usize },
}

/// Convenience type alias for results using [`LayerMiterError`].
pub type Result<T> = std::result::Result<T, LayerMiterError>;
