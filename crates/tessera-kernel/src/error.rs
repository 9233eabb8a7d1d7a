//! Error types for kernel configuration.

use tessera_kernel_constraints::ConstraintError;
use tessera_kernel_deviation::DeviationError;
use tessera_kernel_mesh::MeshError;
use tessera_kernel_section::SectionError;
use thiserror::Error;

/// Errors from loading or validating a [`KernelConfig`](crate::KernelConfig).
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// The TOML text could not be parsed.
    #[error("failed to parse kernel config: {0}")]
    Parse(String),

    /// The config could not be written as TOML.
    #[error("failed to serialize kernel config: {0}")]
    Serialize(String),

    /// The `[analysis]` section is invalid.
    #[error("analysis: {0}")]
    Analysis(#[from] MeshError),

    /// The `[deviation]` section is invalid.
    #[error("deviation: {0}")]
    Deviation(#[from] DeviationError),

    /// The `[section]` section is invalid.
    #[error("section: {0}")]
    Section(#[from] SectionError),

    /// The `[solver]` section is invalid.
    #[error("solver: {0}")]
    Solver(#[from] ConstraintError),
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        ConfigError::Parse(err.to_string())
    }
}

impl From<toml::ser::Error> for ConfigError {
    fn from(err: toml::ser::Error) -> Self {
        ConfigError::Serialize(err.to_string())
    }
}
