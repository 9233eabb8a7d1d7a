#![warn(missing_docs)]

//! Indexed triangle meshes and their topology for the tessera kernel.
//!
//! [`MeshData`] is the immutable mesh that every analysis borrows. On top of
//! it this crate provides:
//! - [`EdgeAdjacency`]: canonical edge → triangle and vertex → triangle maps
//! - [`analyze`]: edge classification, winding check, hole tracing and
//!   quality statistics in one pass with progress reporting
//! - [`compute_curvature`]: cotangent mean curvature and angle-deficit
//!   Gaussian curvature per vertex
//! - [`unit_cube`] and [`uv_sphere`] reference meshes

mod adjacency;
mod analysis;
mod curvature;
mod error;
mod holes;
mod mesh;
mod primitives;

pub use adjacency::{has_directed_edge, Edge, EdgeAdjacency};
pub use analysis::{
    analyze, analyze_with, aspect_ratio, find_boundary_edges, find_non_manifold_edges,
    inconsistent_edges, is_manifold, is_watertight, AnalysisOptions, MeshAnalysisStats,
};
pub use curvature::{compute_curvature, compute_curvature_with, CurvatureKind};
pub use error::{MeshError, Result};
pub use holes::{find_holes, trace_holes, HoleInfo};
pub use mesh::{MeshBuilder, MeshData};
pub use primitives::{unit_cube, uv_sphere};
