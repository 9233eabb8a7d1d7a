#![warn(missing_docs)]

//! 2D sketch model for the tessera kernel.
//!
//! A [`Sketch`] holds ordered [`SketchEntity`] values on a [`SketchPlane`].
//! Every entity geometry (point, line, arc, circle, B-spline) implements the
//! [`Curve2d`] contract over `t ∈ [0, 1]`. The sketch also packs entity
//! parameters into the flat variable vector the constraint solver works on,
//! and finds closed profile loops.
//!
//! # Example
//!
//! ```
//! use tessera_kernel_math::Point2;
//! use tessera_kernel_sketch::{Sketch, SketchPlane};
//!
//! let mut sketch = Sketch::new("base", SketchPlane::xy());
//! sketch.add_rectangle(Point2::new(0.0, 0.0), Point2::new(10.0, 5.0));
//! let loops = sketch.find_closed_loops();
//! assert_eq!(loops.len(), 1);
//! assert_eq!(loops[0].len(), 4);
//! ```

mod arc;
mod bspline;
mod curve;
mod entity;
mod error;
mod id;
mod loops;
mod plane;
mod sketch;

pub use arc::Arc;
pub use bspline::BSpline;
pub use curve::{Circle, Curve2d, Line};
pub use entity::{
    EntityGeometry, EntityKind, SketchEntity, POINT_CENTER, POINT_END, POINT_START, WHOLE_ENTITY,
};
pub use error::{Result, SketchError};
pub use id::{next_id, EntityId};
pub use loops::LOOP_CLUSTER_TOLERANCE;
pub use plane::SketchPlane;
pub use sketch::Sketch;
