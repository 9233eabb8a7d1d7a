//! Summary statistics over deviation values.

use serde::{Deserialize, Serialize};

/// Summary of a deviation field.
///
/// Unsigned figures use `|d|`; the signed figures keep the sign. Non-finite
/// inputs are ignored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DeviationStats {
    /// Number of finite values summarized.
    pub count: usize,
    /// Smallest `|d|`.
    pub min: f64,
    /// Largest `|d|`.
    pub max: f64,
    /// Mean of `|d|`.
    pub avg: f64,
    /// Population standard deviation of `|d|`.
    pub std_dev: f64,
    /// Root mean square of `d`.
    pub rms: f64,
    /// Smallest signed value.
    pub signed_min: f64,
    /// Largest signed value.
    pub signed_max: f64,
    /// Mean signed value.
    pub signed_avg: f64,
    /// 50th percentile of `|d|`.
    pub median: f64,
    /// 90th percentile of `|d|`.
    pub p90: f64,
    /// 95th percentile of `|d|`.
    pub p95: f64,
    /// 99th percentile of `|d|`.
    pub p99: f64,
    /// Tolerance used for the in/out counts.
    pub tolerance: f64,
    /// Values with `|d| ≤ tolerance`.
    pub within_tolerance: usize,
    /// Values with `|d| > tolerance`.
    pub above_tolerance: usize,
}

impl DeviationStats {
    /// Fraction of values within tolerance (0 when empty).
    pub fn within_fraction(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.within_tolerance as f64 / self.count as f64
        }
    }
}

/// Value at index `⌊p·n⌋` (clamped to `n − 1`) of the sorted order.
fn quantile(values: &mut [f64], p: f64) -> f64 {
    let n = values.len();
    let k = ((p * n as f64).floor() as usize).min(n - 1);
    let (_, v, _) = values.select_nth_unstable_by(k, f64::total_cmp);
    *v
}

/// Summarize `deviations` against `tolerance`.
pub fn compute_stats(deviations: &[f32], tolerance: f64) -> DeviationStats {
    let signed: Vec<f64> = deviations
        .iter()
        .map(|&d| d as f64)
        .filter(|d| d.is_finite())
        .collect();
    let mut stats = DeviationStats {
        tolerance,
        ..DeviationStats::default()
    };
    if signed.is_empty() {
        return stats;
    }

    let n = signed.len() as f64;
    let mut unsigned: Vec<f64> = signed.iter().map(|d| d.abs()).collect();

    stats.count = signed.len();
    stats.min = unsigned.iter().copied().fold(f64::INFINITY, f64::min);
    stats.max = unsigned.iter().copied().fold(0.0, f64::max);
    stats.avg = unsigned.iter().sum::<f64>() / n;
    stats.std_dev = (unsigned
        .iter()
        .map(|d| (d - stats.avg).powi(2))
        .sum::<f64>()
        / n)
        .sqrt();
    stats.rms = (signed.iter().map(|d| d * d).sum::<f64>() / n).sqrt();
    stats.signed_min = signed.iter().copied().fold(f64::INFINITY, f64::min);
    stats.signed_max = signed.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    stats.signed_avg = signed.iter().sum::<f64>() / n;
    stats.within_tolerance = unsigned.iter().filter(|&&d| d <= tolerance).count();
    stats.above_tolerance = stats.count - stats.within_tolerance;

    stats.median = quantile(&mut unsigned, 0.50);
    stats.p90 = quantile(&mut unsigned, 0.90);
    stats.p95 = quantile(&mut unsigned, 0.95);
    stats.p99 = quantile(&mut unsigned, 0.99);
    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_basic_stats() {
        let values: Vec<f32> = vec![-2.0, -1.0, 0.0, 1.0, 2.0];
        let s = compute_stats(&values, 1.0);
        assert_eq!(s.count, 5);
        assert_relative_eq!(s.min, 0.0);
        assert_relative_eq!(s.max, 2.0);
        assert_relative_eq!(s.avg, 1.2);
        assert_relative_eq!(s.signed_min, -2.0);
        assert_relative_eq!(s.signed_max, 2.0);
        assert_relative_eq!(s.signed_avg, 0.0);
        assert_relative_eq!(s.rms, 2f64.sqrt(), epsilon = 1e-12);
        assert_eq!(s.within_tolerance, 3);
        assert_eq!(s.above_tolerance, 2);
        // Sorted |d|: 0 1 1 2 2, median at index 2
        assert_relative_eq!(s.median, 1.0);
        assert_relative_eq!(s.p99, 2.0);
    }

    #[test]
    fn test_quantile_indices() {
        let values: Vec<f32> = (0..100).map(|i| i as f32).rev().collect();
        let s = compute_stats(&values, 0.0);
        assert_relative_eq!(s.median, 50.0);
        assert_relative_eq!(s.p90, 90.0);
        assert_relative_eq!(s.p95, 95.0);
        assert_relative_eq!(s.p99, 99.0);
        assert_eq!(s.within_tolerance, 1);
    }

    #[test]
    fn test_empty_and_non_finite() {
        let s = compute_stats(&[], 0.5);
        assert_eq!(s.count, 0);
        assert_eq!(s.max, 0.0);
        assert_eq!(s.tolerance, 0.5);

        let s = compute_stats(&[f32::NAN, 1.0, f32::INFINITY], 0.5);
        assert_eq!(s.count, 1);
        assert_relative_eq!(s.max, 1.0);
        assert!(s.std_dev.is_finite());
    }
}
