//! Equal-width histograms
//!
//! Bins span `[min, max]` of the finite input values. Every bin is
//! half-open `[lo, hi)` except the last, which also includes `max`.

use crate::error::{StatsError, StatsResult};
use serde::{Deserialize, Serialize};

/// A one-dimensional histogram with equal-width bins
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Histogram {
    /// Bin edges, `bins + 1` values
    edges: Vec<f64>,
    /// Count per bin
    counts: Vec<usize>,
    /// Non-finite values that were not binned
    skipped: usize,
}

impl Histogram {
    /// Bin `data` into `bins` equal-width bins over its own range
    ///
    /// Constant data is binned over `[v - 0.5, v + 0.5]`; data without any
    /// finite value yields empty bins over `[0, 1]`.
    pub fn from_data(data: &[f64], bins: usize) -> StatsResult<Self> {
        let (min, max) = data
            .iter()
            .copied()
            .filter(|x| x.is_finite())
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), x| {
                (lo.min(x), hi.max(x))
            });

        let range = if min > max {
            (0.0, 1.0)
        } else if min == max {
            (min - 0.5, max + 0.5)
        } else {
            (min, max)
        };

        Self::with_range(data, bins, range)
    }

    /// Bin `data` into `bins` equal-width bins over an explicit range
    ///
    /// Values outside the range are counted as skipped.
    pub fn with_range(data: &[f64], bins: usize, range: (f64, f64)) -> StatsResult<Self> {
        if bins == 0 {
            return Err(StatsError::InvalidBins(bins));
        }

        let (lo, hi) = range;
        let width = (hi - lo) / bins as f64;
        let edges: Vec<f64> = (0..=bins)
            .map(|i| if i == bins { hi } else { lo + width * i as f64 })
            .collect();

        let mut histogram = Self {
            edges,
            counts: vec![0; bins],
            skipped: 0,
        };

        for &x in data {
            match histogram.bin_index(x) {
                Some(i) => histogram.counts[i] += 1,
                None => histogram.skipped += 1,
            }
        }

        Ok(histogram)
    }

    /// Index of the bin that holds `x`, if it falls inside the range
    pub fn bin_index(&self, x: f64) -> Option<usize> {
        let bins = self.counts.len();
        let lo = self.edges[0];
        let hi = self.edges[bins];

        if !x.is_finite() || x < lo || x > hi {
            return None;
        }
        if x == hi {
            return Some(bins - 1);
        }

        let idx = ((x - lo) / self.bin_width()) as usize;
        // Guard against rounding past the upper edge
        Some(idx.min(bins - 1))
    }

    /// Number of bins
    pub fn num_bins(&self) -> usize {
        self.counts.len()
    }

    pub fn edges(&self) -> &[f64] {
        &self.edges
    }

    pub fn counts(&self) -> &[usize] {
        &self.counts
    }

    /// Number of values that landed in a bin
    pub fn total(&self) -> usize {
        self.counts.iter().sum()
    }

    /// Number of values that were not binned (non-finite or out of range)
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    /// Lower and upper edge of the histogram
    pub fn range(&self) -> (f64, f64) {
        (self.edges[0], self.edges[self.counts.len()])
    }

    pub fn bin_width(&self) -> f64 {
        let (lo, hi) = self.range();
        (hi - lo) / self.counts.len() as f64
    }

    /// Midpoint of each bin
    pub fn bin_centers(&self) -> Vec<f64> {
        self.edges
            .windows(2)
            .map(|pair| (pair[0] + pair[1]) / 2.0)
            .collect()
    }

    /// Largest bin count
    pub fn max_count(&self) -> usize {
        self.counts.iter().copied().max().unwrap_or(0)
    }

    /// Index and count of the fullest bin (first one on ties)
    pub fn mode_bin(&self) -> Option<(usize, usize)> {
        let max = self.max_count();
        if max == 0 {
            return None;
        }
        self.counts
            .iter()
            .position(|&c| c == max)
            .map(|i| (i, max))
    }
}
