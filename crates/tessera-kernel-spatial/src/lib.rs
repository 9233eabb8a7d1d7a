#![warn(missing_docs)]

//! Spatial queries over triangle meshes for the tessera kernel.
//!
//! [`KdTree`] borrows a [`MeshData`](tessera_kernel_mesh::MeshData) and
//! answers nearest-surface-point and ray crossing queries; the per-triangle
//! primitives it is built from are exported for callers that need them
//! directly.

mod kdtree;
mod ray;
mod triangle;

pub use kdtree::{
    closest_point_brute_force, count_ray_crossings_brute_force, ClosestHit, KdTree,
};
pub use ray::Ray;
pub use triangle::{
    closest_point_on_segment, closest_point_on_triangle, ray_triangle_intersect, RAY_EPSILON,
};
