//! Error types for sectioning.

use thiserror::Error;

/// Errors from section plane construction and option validation.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SectionError {
    /// The plane normal has zero length or is not finite.
    #[error("section plane normal must be a finite non-zero vector")]
    DegenerateNormal,

    /// An option value is out of range.
    #[error("invalid section options: {0}")]
    InvalidOptions(String),
}

/// Result type for section operations.
pub type Result<T> = std::result::Result<T, SectionError>;
