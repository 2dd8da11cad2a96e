//! Neighbour queries over a feature matrix
//!
//! One-dimensional data is searched through a sorted copy with prefix sums,
//! so radius queries cost O(log n). Higher dimensions fall back to a linear
//! scan.

use ndarray::ArrayView2;

/// Squared Euclidean distance between two points
pub(crate) fn squared_distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}

pub(crate) fn distance(a: &[f64], b: &[f64]) -> f64 {
    squared_distance(a, b).sqrt()
}

/// Radius-query index over the rows of a feature matrix
pub(crate) enum SearchIndex<'a> {
    Sorted1d {
        sorted: Vec<f64>,
        /// prefix[i] = sum of sorted[..i]
        prefix: Vec<f64>,
    },
    Linear(ArrayView2<'a, f64>),
}

impl<'a> SearchIndex<'a> {
    pub(crate) fn build(x: ArrayView2<'a, f64>) -> Self {
        if x.ncols() != 1 {
            return SearchIndex::Linear(x);
        }

        let mut sorted: Vec<f64> = x.column(0).iter().copied().collect();
        sorted.sort_by(f64::total_cmp);

        let mut prefix = Vec::with_capacity(sorted.len() + 1);
        let mut acc = 0.0;
        prefix.push(acc);
        for &v in &sorted {
            acc += v;
            prefix.push(acc);
        }

        SearchIndex::Sorted1d { sorted, prefix }
    }

    /// Mean of all rows within `radius` of `center` (inclusive), and how many there were
    pub(crate) fn mean_within(&self, center: &[f64], radius: f64) -> Option<(Vec<f64>, usize)> {
        match self {
            SearchIndex::Sorted1d { sorted, prefix } => {
                let c = center[0];
                let lo = sorted.partition_point(|&v| v < c - radius);
                let hi = sorted.partition_point(|&v| v <= c + radius);
                if hi <= lo {
                    return None;
                }
                let n = hi - lo;
                Some((vec![(prefix[hi] - prefix[lo]) / n as f64], n))
            }
            SearchIndex::Linear(x) => {
                let r2 = radius * radius;
                let mut sum = vec![0.0; x.ncols()];
                let mut n = 0;
                for row in x.rows() {
                    let point = row.to_vec();
                    if squared_distance(&point, center) <= r2 {
                        for (s, v) in sum.iter_mut().zip(&point) {
                            *s += v;
                        }
                        n += 1;
                    }
                }
                if n == 0 {
                    return None;
                }
                Some((sum.into_iter().map(|s| s / n as f64).collect(), n))
            }
        }
    }
}

/// Distance from each point of a sorted 1-D sample to its k-th nearest
/// neighbour, the point itself counting as the first
///
/// The k nearest neighbours of `sorted[p]` form a contiguous window of
/// length k that contains p; the window start is found by binary search
/// on where the left reach stops dominating the right reach.
pub(crate) fn kth_distances_sorted(sorted: &[f64], k: usize) -> Vec<f64> {
    let n = sorted.len();
    let k = k.clamp(1, n.max(1));

    (0..n)
        .map(|p| {
            let first = p.saturating_sub(k - 1);
            let last = p.min(n - k);
            // cost(l) = max(left(l), right(l)); left decreases, right increases in l
            let left = |l: usize| sorted[p] - sorted[l];
            let right = |l: usize| sorted[l + k - 1] - sorted[p];

            let (mut lo, mut hi) = (first, last);
            while lo < hi {
                let mid = lo + (hi - lo) / 2;
                if left(mid) > right(mid) {
                    lo = mid + 1;
                } else {
                    hi = mid;
                }
            }

            let mut best = left(lo).max(right(lo));
            if lo > first {
                best = best.min(left(lo - 1).max(right(lo - 1)));
            }
            best
        })
        .collect()
}

/// Distance from each sampled point to its k-th nearest neighbour among
/// `points`, by exhaustive search
pub(crate) fn kth_distances_brute(points: &[Vec<f64>], k: usize) -> Vec<f64> {
    let kth = |p: &Vec<f64>| kth_distance(points, p, k);

    #[cfg(feature = "parallel")]
    {
        use rayon::prelude::*;
        points.par_iter().map(kth).collect()
    }

    #[cfg(not(feature = "parallel"))]
    {
        points.iter().map(kth).collect()
    }
}

fn kth_distance(points: &[Vec<f64>], p: &[f64], k: usize) -> f64 {
    let mut dists: Vec<f64> = points.iter().map(|q| distance(p, q)).collect();
    let k = k.clamp(1, dists.len());
    let (_, nth, _) = dists.select_nth_unstable_by(k - 1, f64::total_cmp);
    *nth
}
