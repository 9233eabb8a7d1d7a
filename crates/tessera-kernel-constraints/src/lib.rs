#![warn(missing_docs)]

//! Geometric constraints and the sketch solver for the tessera kernel.
//!
//! A [`Constraint`] ties one or more sketch entities together (coincidence,
//! tangency, dimensions and so on). [`solve`] packs the sketch into a flat
//! variable vector, linearizes every residual row by forward differences and
//! takes damped Gauss-Newton steps with backtracking until the rows vanish.
//!
//! # Example
//!
//! ```
//! use tessera_kernel_constraints::{solve, Constraint, SolveStatus, SolverConfig};
//! use tessera_kernel_math::Point2;
//! use tessera_kernel_sketch::{Line, Sketch, SketchPlane};
//!
//! let mut sketch = Sketch::new("s", SketchPlane::xy());
//! let line = sketch.add(Line::new(Point2::new(0.0, 0.0), Point2::new(3.0, 1.0)));
//! let result = solve(
//!     &mut sketch,
//!     &[Constraint::horizontal(line)],
//!     &SolverConfig::default(),
//!     None,
//! )
//! .unwrap();
//! assert_eq!(result.status, SolveStatus::UnderConstrained);
//! ```

mod constraint;
mod error;
mod residual;
mod solver;

pub use constraint::{Constraint, ConstraintKind, ConstraintRef};
pub use error::{ConstraintError, Result};
pub use solver::{solve, SolveResult, SolveStatus, SolverConfig};
