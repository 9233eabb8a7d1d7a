//! Error types for colormap lookup and scales.

use thiserror::Error;

/// Errors from colormap names and value ranges.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ColormapError {
    /// The name matches no [`ColormapKind`](crate::ColormapKind).
    #[error("unknown colormap: {0}")]
    UnknownColormap(String),

    /// A scale range is inverted or not finite.
    #[error("invalid color scale range [{min}, {max}]")]
    InvalidRange {
        /// Requested lower bound.
        min: f32,
        /// Requested upper bound.
        max: f32,
    },
}

/// Result type for colormap operations.
pub type Result<T> = std::result::Result<T, ColormapError>;
