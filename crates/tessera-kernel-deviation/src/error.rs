//! Error types for deviation analysis.

use thiserror::Error;

/// Errors from deviation configuration and histogram construction.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DeviationError {
    /// A configuration value is out of range.
    #[error("invalid deviation config: {0}")]
    InvalidConfig(String),

    /// A histogram needs at least one bin.
    #[error("histogram needs at least one bin")]
    NoBins,

    /// An explicit histogram range is empty, inverted or not finite.
    #[error("invalid histogram range [{min}, {max}]")]
    InvalidRange {
        /// Requested lower bound.
        min: f64,
        /// Requested upper bound.
        max: f64,
    },
}

/// Result type for deviation operations.
pub type Result<T> = std::result::Result<T, DeviationError>;
