//! Mapping scalar fields onto a colormap.

use serde::{Deserialize, Serialize};

use crate::error::{ColormapError, Result};
use crate::kind::{sample, sample_u8, ColormapKind};

/// A colormap stretched over a value range.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ColorScale {
    /// Map to sample.
    pub kind: ColormapKind,
    /// Value mapped to `t = 0`.
    pub min: f32,
    /// Value mapped to `t = 1`.
    pub max: f32,
}

impl Default for ColorScale {
    fn default() -> Self {
        Self {
            kind: ColormapKind::default(),
            min: 0.0,
            max: 1.0,
        }
    }
}

impl ColorScale {
    /// Scale over `[min, max]`. The bounds must be finite with `min <= max`.
    pub fn new(kind: ColormapKind, min: f32, max: f32) -> Result<Self> {
        if !min.is_finite() || !max.is_finite() || min > max {
            return Err(ColormapError::InvalidRange { min, max });
        }
        Ok(Self { kind, min, max })
    }

    /// Diverging scale over `[-tolerance, tolerance]`, so zero lands on the
    /// middle of the map.
    pub fn symmetric(kind: ColormapKind, tolerance: f32) -> Result<Self> {
        let tol = tolerance.abs();
        Self::new(kind, -tol, tol)
    }

    /// Scale spanning the finite values in `values`, or `[0, 1]` if none.
    pub fn fit(kind: ColormapKind, values: &[f32]) -> Self {
        let (min, max) = values
            .iter()
            .filter(|v| v.is_finite())
            .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &v| {
                (lo.min(v), hi.max(v))
            });
        if min > max {
            Self {
                kind,
                ..Self::default()
            }
        } else {
            Self { kind, min, max }
        }
    }

    /// Position of `value` in `[0, 1]`.
    ///
    /// An empty range maps everything to 0.5; NaN maps to 0.
    pub fn normalize(&self, value: f32) -> f32 {
        if value.is_nan() {
            return 0.0;
        }
        let span = self.max - self.min;
        if span <= 0.0 {
            return 0.5;
        }
        ((value - self.min) / span).clamp(0.0, 1.0)
    }

    /// Color for `value`.
    pub fn color(&self, value: f32) -> [f32; 3] {
        sample(self.kind, self.normalize(value))
    }

    /// 8-bit color for `value`.
    pub fn color_u8(&self, value: f32) -> [u8; 3] {
        sample_u8(self.kind, self.normalize(value))
    }
}

/// One color per value.
pub fn colorize(values: &[f32], scale: &ColorScale) -> Vec<[f32; 3]> {
    values.iter().map(|&v| scale.color(v)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_normalize() {
        let scale = ColorScale::new(ColormapKind::Grayscale, 2.0, 6.0).unwrap();
        assert_relative_eq!(scale.normalize(4.0), 0.5);
        assert_eq!(scale.normalize(-10.0), 0.0);
        assert_eq!(scale.normalize(10.0), 1.0);
        assert_eq!(scale.normalize(f32::NAN), 0.0);
        let flat = ColorScale::new(ColormapKind::Grayscale, 3.0, 3.0).unwrap();
        assert_eq!(flat.normalize(3.0), 0.5);
    }

    #[test]
    fn test_symmetric_centers_zero() {
        let scale = ColorScale::symmetric(ColormapKind::CoolWarm, 0.1).unwrap();
        assert_eq!(scale.min, -0.1);
        assert_relative_eq!(scale.normalize(0.0), 0.5);
        assert_eq!(scale.color(0.0), sample(ColormapKind::CoolWarm, 0.5));
    }

    #[test]
    fn test_invalid_range() {
        assert!(ColorScale::new(ColormapKind::Viridis, 1.0, 0.0).is_err());
        assert!(matches!(
            ColorScale::new(ColormapKind::Viridis, f32::NAN, 1.0),
            Err(ColormapError::InvalidRange { .. })
        ));
    }

    #[test]
    fn test_fit_and_colorize() {
        let values = [0.5, f32::NAN, -1.0, 3.0];
        let scale = ColorScale::fit(ColormapKind::Grayscale, &values);
        assert_eq!((scale.min, scale.max), (-1.0, 3.0));
        let colors = colorize(&values, &scale);
        assert_eq!(colors.len(), 4);
        assert_eq!(colors[2], [0.0, 0.0, 0.0]);
        assert_eq!(colors[3], [1.0, 1.0, 1.0]);
        assert_eq!(scale.color_u8(1.0), [128, 128, 128]);
        let empty = ColorScale::fit(ColormapKind::Magma, &[]);
        assert_eq!((empty.kind, empty.min, empty.max), (ColormapKind::Magma, 0.0, 1.0));
    }
}
