//! Aggregate kernel settings, loadable from TOML.

use serde::{Deserialize, Serialize};
use tessera_kernel_colormap::ColormapKind;
use tessera_kernel_constraints::SolverConfig;
use tessera_kernel_deviation::DeviationConfig;
use tessera_kernel_mesh::AnalysisOptions;
use tessera_kernel_section::SectionOptions;

use crate::error::ConfigError;

/// Settings for every kernel subsystem.
///
/// Missing tables and keys fall back to their defaults, so an empty
/// document is a valid config:
///
/// ```
/// use tessera_kernel::KernelConfig;
///
/// let config = KernelConfig::from_toml_str("[solver]\nmax_iterations = 25\n").unwrap();
/// assert_eq!(config.solver.max_iterations, 25);
/// assert_eq!(config.solver.tolerance, 1e-6);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KernelConfig {
    /// Colormap for deviation and curvature views.
    pub colormap: ColormapKind,
    /// Topology and quality analysis.
    pub analysis: AnalysisOptions,
    /// Mesh-to-mesh deviation.
    pub deviation: DeviationConfig,
    /// Plane sections.
    pub section: SectionOptions,
    /// Sketch constraint solver.
    pub solver: SolverConfig,
}

impl KernelConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: KernelConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Render as TOML.
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string(self)?)
    }

    /// Validate every section.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.analysis.validate()?;
        self.deviation.validate()?;
        self.section.validate()?;
        self.solver.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessera_kernel_mesh::CurvatureKind;

    #[test]
    fn test_empty_document_is_default() {
        assert_eq!(KernelConfig::from_toml_str("").unwrap(), KernelConfig::default());
    }

    #[test]
    fn test_partial_tables() {
        let text = r#"
colormap = "cool_warm"

[analysis]
curvature = "gaussian"

[deviation]
compute_signed = true
tolerance = 0.05

[section]
simplify = true
"#;
        let config = KernelConfig::from_toml_str(text).unwrap();
        assert_eq!(config.colormap, ColormapKind::CoolWarm);
        assert_eq!(config.analysis.curvature, CurvatureKind::Gaussian);
        assert!(config.deviation.compute_signed);
        assert_eq!(config.deviation.tolerance, 0.05);
        assert!(config.deviation.use_kd_tree);
        assert!(config.section.simplify);
        assert_eq!(config.solver, SolverConfig::default());
    }

    #[test]
    fn test_round_trip() {
        let mut config = KernelConfig::default();
        config.solver.max_iterations = 40;
        config.section.tolerance = 1e-4;
        config.colormap = ColormapKind::Magma;
        let text = config.to_toml_string().unwrap();
        assert_eq!(KernelConfig::from_toml_str(&text).unwrap(), config);
    }

    #[test]
    fn test_invalid_sections_are_reported() {
        let err = KernelConfig::from_toml_str("[solver]\ntolerance = -1.0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Solver(_)));
        let err = KernelConfig::from_toml_str("[section]\ntolerance = 0.0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Section(_)));
        let err = KernelConfig::from_toml_str("[deviation]\nhistogram_bins = 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Deviation(_)));
        let err = KernelConfig::from_toml_str("[analysis]\nmax_aspect_ratio = 0.5\n").unwrap_err();
        assert!(matches!(err, ConfigError::Analysis(_)));
        let err = KernelConfig::from_toml_str("colormap = \"plasma\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
