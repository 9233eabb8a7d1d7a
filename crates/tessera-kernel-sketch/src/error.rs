//! Error types for sketch construction and editing.

use thiserror::Error;

use crate::EntityId;

/// Errors from sketch entity construction and sketch editing.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SketchError {
    /// Arc or circle radius is not a finite positive number.
    #[error("radius must be finite and positive, got {0}")]
    NonPositiveRadius(f64),

    /// A B-spline needs at least two control points.
    #[error("B-spline needs at least 2 control points, got {0}")]
    TooFewControlPoints(usize),

    /// Three points that should define a circle are collinear.
    #[error("points are collinear; no circle passes through them")]
    CollinearPoints,

    /// A control point index is out of range.
    #[error("control point index {index} out of range for {len} control points")]
    ControlPointOutOfRange {
        /// Requested index.
        index: usize,
        /// Number of control points.
        len: usize,
    },

    /// A regular polygon needs at least three sides.
    #[error("polygon needs at least 3 sides, got {0}")]
    TooFewSides(usize),

    /// The sketch plane normal has zero length or is not finite.
    #[error("sketch plane normal must be a finite non-zero vector")]
    DegenerateNormal,

    /// No entity with this id exists in the sketch.
    #[error("entity {0} not found")]
    EntityNotFound(EntityId),

    /// An entity with this id is already in the sketch.
    #[error("entity {0} already exists in the sketch")]
    DuplicateEntity(EntityId),

    /// The variable vector length does not match the sketch layout.
    #[error("expected {expected} variables, got {actual}")]
    VariableCountMismatch {
        /// Variables required by the sketch.
        expected: usize,
        /// Variables supplied.
        actual: usize,
    },
}

/// Result type for sketch operations.
pub type Result<T> = std::result::Result<T, SketchError>;
