use crate::geom::{IntersectorError, SparseError, TriangulationError};

/// Result type for engine and provider calls.
pub type MeshResult<T> = Result<T, MeshQueryError>;

/// Failures raised by the query engine and mesh providers.
///
/// A UV query outside the triangulated region is not an error; it returns
/// `Ok(None)`. Degenerate geometry is not an error either and shows up as NaN
/// in triangle-derived values.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MeshQueryError {
    /// An accessor ran before the state it depends on was populated.
    #[error("{accessor} requires {requires} to be fetched first")]
    MissingPrerequisiteState {
        accessor: &'static str,
        requires: &'static str,
    },
    /// The provider cannot resolve the mesh it stands for.
    #[error("mesh provider unavailable: {0}")]
    ProviderUnavailable(String),
    #[error("uv set `{0}` does not exist on this mesh")]
    UvSetNotFound(String),
    #[error("vertex {vertex} is out of range for a mesh with {count} vertices")]
    VertexOutOfRange { vertex: usize, count: usize },
    #[error("face {face} triangle {triangle} is out of range")]
    FaceOutOfRange { face: usize, triangle: usize },
    #[error("query point {index} is not finite")]
    NonFinitePoint { index: usize },
    #[error("no surface point found for query point {index}")]
    NoSurfacePoint { index: usize },
    #[error("invalid topology: {0}")]
    InvalidTopology(String),
    #[error("mesh has no vertices")]
    EmptyMesh,
    #[error(transparent)]
    Sparse(#[from] SparseError),
    #[error(transparent)]
    Triangulation(#[from] TriangulationError),
    #[error(transparent)]
    Intersector(#[from] IntersectorError),
}
