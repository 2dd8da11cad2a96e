//! Kernel bandwidth estimation for mean-shift
//!
//! The estimate is the mean, over the sampled points, of the distance from
//! each point to its k-th nearest neighbour, with `k = n * quantile`.
//! Smaller quantiles give smaller bandwidths and therefore more clusters.

use crate::error::{StatsError, StatsResult};
use crate::neighbors::{kth_distances_brute, kth_distances_sorted};
use ndarray::ArrayView2;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Default neighbourhood quantile
pub const DEFAULT_QUANTILE: f64 = 0.3;

/// Options for bandwidth estimation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BandwidthOptions {
    /// Fraction of the sample used as the neighbourhood size, in [0, 1]
    pub quantile: f64,
    /// Only use this many rows (evenly strided) for the estimate
    pub n_samples: Option<usize>,
}

impl Default for BandwidthOptions {
    fn default() -> Self {
        Self {
            quantile: DEFAULT_QUANTILE,
            n_samples: None,
        }
    }
}

/// Estimate the mean-shift bandwidth for the rows of `x`
///
/// Neighbours are counted including the point itself, so with `k = 1` every
/// distance is zero. The result can be zero for degenerate input (e.g. all
/// values equal); callers that need a usable bandwidth must check for that.
pub fn estimate_bandwidth(x: ArrayView2<f64>, options: &BandwidthOptions) -> StatsResult<f64> {
    if !(0.0..=1.0).contains(&options.quantile) {
        return Err(StatsError::InvalidQuantile(options.quantile));
    }
    if x.nrows() == 0 {
        return Err(StatsError::EmptyInput);
    }

    let rows = sample_rows(x.nrows(), options.n_samples);
    let mut points = Vec::with_capacity(rows.len());
    for &row in &rows {
        let point = x.row(row).to_vec();
        if point.iter().any(|v| !v.is_finite()) {
            return Err(StatsError::NonFinite { row });
        }
        points.push(point);
    }
    if points.is_empty() {
        return Err(StatsError::EmptyInput);
    }

    let n = points.len();
    let k = ((n as f64 * options.quantile) as usize).max(1);

    let distances = if x.ncols() == 1 {
        let mut sorted: Vec<f64> = points.iter().map(|p| p[0]).collect();
        sorted.sort_by(f64::total_cmp);
        kth_distances_sorted(&sorted, k)
    } else {
        kth_distances_brute(&points, k)
    };

    let bandwidth = distances.iter().sum::<f64>() / n as f64;
    debug!(samples = n, k, bandwidth, "estimated bandwidth");
    Ok(bandwidth)
}

/// Evenly strided row indices, at most `limit` of them
///
/// No random draw: the same input always samples the same rows.
fn sample_rows(n: usize, limit: Option<usize>) -> Vec<usize> {
    match limit {
        Some(m) if m < n => (0..m).map(|i| i * n / m).collect(),
        _ => (0..n).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;

    fn column(values: &[f64]) -> Array2<f64> {
        Array2::from_shape_vec((values.len(), 1), values.to_vec()).unwrap()
    }

    #[test]
    fn test_evenly_spaced() {
        // 10 points spaced 0.1 apart, k = 3: interior points reach 0.1,
        // the two end points reach 0.2
        let values: Vec<f64> = (0..10).map(|i| i as f64 * 0.1).collect();
        let bw = estimate_bandwidth(column(&values).view(), &BandwidthOptions::default()).unwrap();
        let expected = (8.0 * 0.1 + 2.0 * 0.2) / 10.0;
        assert!((bw - expected).abs() < 1e-9, "bw = {}", bw);
    }

    #[test]
    fn test_constant_input_gives_zero() {
        let bw =
            estimate_bandwidth(column(&[0.5; 20]).view(), &BandwidthOptions::default()).unwrap();
        assert_eq!(bw, 0.0);
    }

    #[test]
    fn test_empty_input() {
        let x = Array2::<f64>::zeros((0, 1));
        assert_eq!(
            estimate_bandwidth(x.view(), &BandwidthOptions::default()),
            Err(StatsError::EmptyInput)
        );
    }

    #[test]
    fn test_invalid_quantile() {
        let options = BandwidthOptions {
            quantile: 1.5,
            ..Default::default()
        };
        assert_eq!(
            estimate_bandwidth(column(&[0.1, 0.2]).view(), &options),
            Err(StatsError::InvalidQuantile(1.5))
        );
    }

    #[test]
    fn test_nan_rejected() {
        assert_eq!(
            estimate_bandwidth(column(&[0.1, f64::NAN]).view(), &BandwidthOptions::default()),
            Err(StatsError::NonFinite { row: 1 })
        );
    }

    #[test]
    fn test_two_dimensional() {
        let x = Array2::from_shape_vec((4, 2), vec![0.0, 0.0, 0.0, 1.0, 1.0, 0.0, 1.0, 1.0])
            .unwrap();
        let options = BandwidthOptions {
            quantile: 0.5,
            n_samples: None,
        };
        // k = 2: nearest other corner is at distance 1
        let bw = estimate_bandwidth(x.view(), &options).unwrap();
        assert!((bw - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_sampled_estimate_is_reproducible() {
        let values: Vec<f64> = (0..200).map(|i| ((i * 37) % 101) as f64 / 100.0).collect();
        let x = column(&values);
        let options = BandwidthOptions {
            n_samples: Some(40),
            ..BandwidthOptions::default()
        };
        let first = estimate_bandwidth(x.view(), &options).unwrap();
        for _ in 0..3 {
            assert_eq!(estimate_bandwidth(x.view(), &options).unwrap(), first);
        }
        assert!(first > 0.0);
    }

    #[test]
    fn test_sample_rows() {
        assert_eq!(sample_rows(10, Some(5)), vec![0, 2, 4, 6, 8]);
        assert_eq!(sample_rows(3, Some(5)), vec![0, 1, 2]);
        assert_eq!(sample_rows(3, None), vec![0, 1, 2]);
    }
}
