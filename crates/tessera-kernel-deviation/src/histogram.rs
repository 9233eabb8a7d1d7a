//! Fixed-width histograms of deviation values.

use serde::{Deserialize, Serialize};

use crate::error::{DeviationError, Result};

/// Equal-width histogram over `[min, max]`.
///
/// Bins are half-open `[min + i·w, min + (i+1)·w)` except the last, which
/// also includes `max`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Histogram {
    /// Count per bin.
    pub bins: Vec<usize>,
    /// Lower bound of the first bin.
    pub min: f64,
    /// Upper bound of the last bin.
    pub max: f64,
    /// Width of each bin (0 when all values are equal).
    pub bin_width: f64,
}

impl Histogram {
    /// Total number of binned values.
    pub fn total(&self) -> usize {
        self.bins.iter().sum()
    }

    /// Value range covered by bin `i`.
    pub fn bin_range(&self, i: usize) -> (f64, f64) {
        let lo = self.min + i as f64 * self.bin_width;
        (lo, lo + self.bin_width)
    }

    /// Center value of bin `i`.
    pub fn bin_center(&self, i: usize) -> f64 {
        let (lo, hi) = self.bin_range(i);
        0.5 * (lo + hi)
    }

    /// Index of the fullest bin, if any value was binned.
    pub fn mode_bin(&self) -> Option<usize> {
        if self.total() == 0 {
            return None;
        }
        self.bins
            .iter()
            .enumerate()
            .max_by_key(|&(i, &c)| (c, std::cmp::Reverse(i)))
            .map(|(i, _)| i)
    }
}

/// Bin `values` into `num_bins` equal-width bins.
///
/// With `range = None` the range is the finite data extent and nothing is
/// dropped. With an explicit range, values outside it are discarded.
/// Non-finite values are always skipped.
pub fn create_histogram(
    values: &[f32],
    num_bins: usize,
    range: Option<(f64, f64)>,
) -> Result<Histogram> {
    if num_bins == 0 {
        return Err(DeviationError::NoBins);
    }
    let finite = values.iter().map(|&v| v as f64).filter(|v| v.is_finite());

    let (min, max, explicit) = match range {
        Some((min, max)) => {
            if !min.is_finite() || !max.is_finite() || min > max {
                return Err(DeviationError::InvalidRange { min, max });
            }
            (min, max, true)
        }
        None => {
            let (lo, hi) = finite
                .clone()
                .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
                    (lo.min(v), hi.max(v))
                });
            if lo > hi {
                (0.0, 0.0, false)
            } else {
                (lo, hi, false)
            }
        }
    };

    let bin_width = (max - min) / num_bins as f64;
    let mut bins = vec![0usize; num_bins];
    for v in finite {
        if explicit && (v < min || v > max) {
            continue;
        }
        let index = if bin_width > 0.0 {
            let raw = ((v - min) / bin_width).floor();
            if raw < 0.0 {
                0
            } else {
                (raw as usize).min(num_bins - 1)
            }
        } else {
            0
        };
        bins[index] += 1;
    }

    Ok(Histogram {
        bins,
        min,
        max,
        bin_width,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auto_range() {
        let values = [0.0f32, 0.5, 1.0, 1.5, 2.0];
        let h = create_histogram(&values, 4, None).unwrap();
        assert_eq!(h.min, 0.0);
        assert_eq!(h.max, 2.0);
        assert_eq!(h.bin_width, 0.5);
        // The maximum lands in the closed last bin
        assert_eq!(h.bins, vec![1, 1, 1, 2]);
        assert_eq!(h.total(), 5);
        assert_eq!(h.bin_range(1), (0.5, 1.0));
    }

    #[test]
    fn test_explicit_range_discards_outliers() {
        let values = [-5.0f32, 0.1, 0.2, 0.9, 1.0, 7.0];
        let h = create_histogram(&values, 2, Some((0.0, 1.0))).unwrap();
        assert_eq!(h.bins, vec![2, 2]);
        assert_eq!(h.mode_bin(), Some(0));
    }

    #[test]
    fn test_constant_values_single_bin() {
        let h = create_histogram(&[3.0, 3.0, f32::NAN], 5, None).unwrap();
        assert_eq!(h.bin_width, 0.0);
        assert_eq!(h.bins[0], 2);
        assert_eq!(h.total(), 2);
    }

    #[test]
    fn test_errors() {
        assert_eq!(create_histogram(&[1.0], 0, None), Err(DeviationError::NoBins));
        assert!(matches!(
            create_histogram(&[1.0], 3, Some((2.0, 1.0))),
            Err(DeviationError::InvalidRange { .. })
        ));
        let empty = create_histogram(&[], 3, None).unwrap();
        assert_eq!(empty.total(), 0);
        assert_eq!(empty.mode_bin(), None);
    }
}
