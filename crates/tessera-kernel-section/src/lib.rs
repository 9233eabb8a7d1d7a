#![warn(missing_docs)]

//! Planar cross-sections of triangle meshes for the tessera kernel.
//!
//! A section classifies every vertex against the cutting plane, emits one
//! [`EdgeSegment`] per crossing triangle and chains the segments into
//! [`Polyline`]s, closed wherever the cut surface is closed.

mod error;
mod section;
mod types;

pub use error::{Result, SectionError};
pub use section::{
    chain_segments, intersect_triangle, section_mesh, section_parallel, simplify_polyline,
};
pub use types::{EdgeSegment, Polyline, SectionOptions, SectionPlane, SectionResult};
