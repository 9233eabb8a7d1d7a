//! Error types for mesh construction.

use thiserror::Error;

/// Errors raised when finalizing a [`MeshBuilder`](crate::MeshBuilder).
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MeshError {
    /// A triangle references a vertex that does not exist.
    #[error("triangle {triangle} references vertex {index} but the mesh has {vertex_count} vertices")]
    IndexOutOfRange {
        /// Triangle containing the bad index.
        triangle: usize,
        /// Offending vertex index.
        index: u32,
        /// Number of vertices in the mesh.
        vertex_count: usize,
    },

    /// The index buffer length is not a multiple of three.
    #[error("index count {0} is not a multiple of 3")]
    IncompleteTriangle(usize),

    /// Normals were supplied but do not match the vertex count.
    #[error("normal count {normals} does not match vertex count {vertices}")]
    NormalCountMismatch {
        /// Number of normals supplied.
        normals: usize,
        /// Number of vertices.
        vertices: usize,
    },

    /// UVs were supplied but do not match the vertex count.
    #[error("uv count {uvs} does not match vertex count {vertices}")]
    UvCountMismatch {
        /// Number of UVs supplied.
        uvs: usize,
        /// Number of vertices.
        vertices: usize,
    },

    /// A vertex coordinate is NaN or infinite.
    #[error("vertex {0} has a non-finite coordinate")]
    NonFiniteVertex(usize),

    /// Analysis options failed validation.
    #[error("invalid analysis options: {0}")]
    InvalidOptions(String),
}

/// Result type for mesh operations.
pub type Result<T> = std::result::Result<T, MeshError>;
