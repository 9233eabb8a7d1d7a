//! Error types for constraint validation and solving.

use tessera_kernel_sketch::{EntityId, SketchError};
use thiserror::Error;

use crate::ConstraintKind;

/// Errors from constraint validation and from writing a solution back.
///
/// Failing to converge is not an error; it is reported through
/// [`SolveStatus`](crate::SolveStatus).
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConstraintError {
    /// A constraint references an entity missing from the sketch.
    #[error("constraint {constraint} references unknown entity {entity}")]
    UnknownEntity {
        /// The offending constraint.
        constraint: EntityId,
        /// The missing entity.
        entity: EntityId,
    },

    /// A constraint's references do not fit its kind.
    #[error("constraint {constraint} ({kind:?}): {reason}")]
    InvalidReference {
        /// The offending constraint.
        constraint: EntityId,
        /// Its kind.
        kind: ConstraintKind,
        /// What is wrong.
        reason: String,
    },

    /// A dimensional constraint has no value or target.
    #[error("constraint {constraint} ({kind:?}) needs a {what}")]
    MissingValue {
        /// The offending constraint.
        constraint: EntityId,
        /// Its kind.
        kind: ConstraintKind,
        /// The missing field.
        what: &'static str,
    },

    /// A dimensional value is outside its kind's range: radii must be
    /// positive and distances non-negative.
    #[error("constraint {constraint} ({kind:?}) value {value} is out of range")]
    ValueOutOfRange {
        /// The offending constraint.
        constraint: EntityId,
        /// Its kind.
        kind: ConstraintKind,
        /// The rejected value.
        value: f64,
    },

    /// A solver setting is out of range.
    #[error("invalid solver config: {0}")]
    InvalidConfig(String),

    /// Writing the solution back into the sketch failed, e.g. a solved
    /// radius is not positive. The sketch is left untouched.
    #[error(transparent)]
    Sketch(#[from] SketchError),
}

/// Result type for constraint operations.
pub type Result<T> = std::result::Result<T, ConstraintError>;
