//! Summary statistics for datasets
//!
//! Provides common statistical summaries:
//! - Mean, variance, standard deviation
//! - Min, max, range
//! - Robust statistics (median, MAD)
//! - Linear-interpolated percentiles

use serde::{Deserialize, Serialize};

/// Summary statistics for a numeric dataset
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryStats {
    /// Number of finite values
    pub count: usize,
    /// Number of missing/NaN values
    pub missing: usize,
    /// Minimum value
    pub min: f64,
    /// Maximum value
    pub max: f64,
    /// Mean (average)
    pub mean: f64,
    /// Population variance
    pub variance: f64,
    /// Standard deviation
    pub std_dev: f64,
    /// Median (50th percentile)
    pub median: f64,
    /// Median Absolute Deviation
    pub mad: f64,
}

impl SummaryStats {
    /// Compute summary statistics from data, ignoring non-finite values
    pub fn from_data(data: &[f64]) -> Self {
        let mut sorted = finite_sorted(data);
        let missing = data.len() - sorted.len();

        if sorted.is_empty() {
            return Self::empty(missing);
        }

        let count = sorted.len();
        let mean = sorted.iter().sum::<f64>() / count as f64;
        let variance = sorted.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / count as f64;

        let min = sorted[0];
        let max = sorted[count - 1];
        let median = median_of_sorted(&sorted);

        for x in sorted.iter_mut() {
            *x = (*x - median).abs();
        }
        sorted.sort_by(f64::total_cmp);
        let mad = median_of_sorted(&sorted);

        Self {
            count,
            missing,
            min,
            max,
            mean,
            variance,
            std_dev: variance.sqrt(),
            median,
            mad,
        }
    }

    /// Create empty statistics (all NaN)
    fn empty(missing: usize) -> Self {
        Self {
            count: 0,
            missing,
            min: f64::NAN,
            max: f64::NAN,
            mean: f64::NAN,
            variance: f64::NAN,
            std_dev: f64::NAN,
            median: f64::NAN,
            mad: f64::NAN,
        }
    }

    /// Get the range (max - min)
    pub fn range(&self) -> f64 {
        self.max - self.min
    }

    /// Compute z-score for a value
    pub fn zscore(&self, x: f64) -> f64 {
        if self.std_dev == 0.0 {
            return 0.0;
        }
        (x - self.mean) / self.std_dev
    }

    /// Compute robust z-score using median and MAD
    ///
    /// Uses the formula: (x - median) / (1.4826 * MAD)
    /// The constant 1.4826 makes it comparable to standard z-score for normal data.
    pub fn robust_zscore(&self, x: f64) -> f64 {
        if self.mad == 0.0 {
            return 0.0;
        }
        (x - self.median) / (1.4826 * self.mad)
    }
}

/// Percentile (0-100) of the finite values, linearly interpolated
///
/// Returns `None` when there are no finite values.
pub fn percentile(data: &[f64], p: f64) -> Option<f64> {
    let sorted = finite_sorted(data);
    percentile_of_sorted(&sorted, p)
}

/// Percentiles 0, 1, ..., 100 of the finite values
pub fn percentile_table(data: &[f64]) -> Option<[f64; 101]> {
    let sorted = finite_sorted(data);
    if sorted.is_empty() {
        return None;
    }
    let mut table = [0.0; 101];
    for (p, slot) in table.iter_mut().enumerate() {
        *slot = percentile_of_sorted(&sorted, p as f64)?;
    }
    Some(table)
}

fn finite_sorted(data: &[f64]) -> Vec<f64> {
    let mut sorted: Vec<f64> = data.iter().copied().filter(|x| x.is_finite()).collect();
    sorted.sort_by(f64::total_cmp);
    sorted
}

fn median_of_sorted(sorted: &[f64]) -> f64 {
    let n = sorted.len();
    if n % 2 == 0 {
        (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
    } else {
        sorted[n / 2]
    }
}

fn percentile_of_sorted(sorted: &[f64], p: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let rank = (p.clamp(0.0, 100.0) / 100.0) * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    let frac = rank - lo as f64;
    Some(sorted[lo] * (1.0 - frac) + sorted[hi] * frac)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_stats_basic() {
        let data: Vec<f64> = (1..=10).map(|x| x as f64).collect();
        let stats = SummaryStats::from_data(&data);

        assert_eq!(stats.count, 10);
        assert_eq!(stats.min, 1.0);
        assert_eq!(stats.max, 10.0);
        assert!((stats.mean - 5.5).abs() < 1e-10);
        assert!((stats.median - 5.5).abs() < 1e-10);
        assert!((stats.range() - 9.0).abs() < 1e-10);
    }

    #[test]
    fn test_summary_stats_with_nan() {
        let data = vec![1.0, 2.0, f64::NAN, 4.0, 5.0];
        let stats = SummaryStats::from_data(&data);

        assert_eq!(stats.count, 4);
        assert_eq!(stats.missing, 1);
        assert_eq!(stats.min, 1.0);
        assert_eq!(stats.max, 5.0);
    }

    #[test]
    fn test_summary_stats_empty() {
        let stats = SummaryStats::from_data(&[f64::NAN]);
        assert_eq!(stats.count, 0);
        assert_eq!(stats.missing, 1);
        assert!(stats.mean.is_nan());
    }

    #[test]
    fn test_mad() {
        // deviations from median 3: [2, 1, 0, 1, 97] -> median 1
        let stats = SummaryStats::from_data(&[1.0, 2.0, 3.0, 4.0, 100.0]);
        assert!((stats.mad - 1.0).abs() < 1e-10);
    }

    #[test]
    fn test_robust_zscore() {
        let data = vec![1.0, 2.0, 3.0, 4.0, 5.0, 100.0];
        let stats = SummaryStats::from_data(&data);
        assert!(stats.robust_zscore(100.0) > 3.0);
    }

    #[test]
    fn test_zscore_constant_data() {
        let stats = SummaryStats::from_data(&[0.5, 0.5, 0.5]);
        assert_eq!(stats.zscore(0.9), 0.0);
    }

    #[test]
    fn test_percentile_interpolation() {
        let data = vec![0.0, 10.0, 20.0, 30.0, 40.0];
        assert_eq!(percentile(&data, 0.0), Some(0.0));
        assert_eq!(percentile(&data, 50.0), Some(20.0));
        assert_eq!(percentile(&data, 100.0), Some(40.0));
        assert!((percentile(&data, 12.5).unwrap() - 5.0).abs() < 1e-10);
        assert_eq!(percentile(&[], 50.0), None);
    }

    #[test]
    fn test_percentile_table() {
        let data: Vec<f64> = (0..=100).map(|x| x as f64).collect();
        let table = percentile_table(&data).unwrap();
        assert_eq!(table[0], 0.0);
        assert_eq!(table[37], 37.0);
        assert_eq!(table[100], 100.0);
    }
}
