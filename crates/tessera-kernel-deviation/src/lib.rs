#![warn(missing_docs)]

//! Mesh-to-mesh deviation analysis for the tessera kernel.
//!
//! [`compute_deviation`] measures, for every vertex of a source mesh, the
//! distance to the nearest point on a target surface, optionally signed by
//! a ray-parity inside test. The resulting field feeds [`compute_stats`],
//! [`create_histogram`] and the colormap crate.

mod engine;
mod error;
mod histogram;
mod stats;

pub use engine::{
    compute_deviation, hausdorff_distance, sign_ray_directions, DeviationConfig, DeviationResult,
    NUM_SIGN_RAYS, SIGN_RAY_SEED,
};
pub use error::{DeviationError, Result};
pub use histogram::{create_histogram, Histogram};
pub use stats::{compute_stats, DeviationStats};
