//! Mean-shift clustering with a flat kernel
//!
//! Each seed is moved to the mean of the points within `bandwidth` of it
//! until it stops moving. The converged positions are density modes; modes
//! closer than `bandwidth` to a stronger mode are merged into it.
//!
//! # Seeding
//!
//! With bin seeding, points are snapped to a grid of cell size `bandwidth`
//! and only occupied cells are used as starting points. This cuts the
//! number of seeds from `n` to roughly `range / bandwidth` per dimension.

use crate::bandwidth::{estimate_bandwidth, BandwidthOptions};
use crate::error::{StatsError, StatsResult};
use crate::neighbors::{squared_distance, SearchIndex};
use ndarray::{Array2, ArrayView2};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashMap;
use tracing::{debug, warn};

/// Seeds stop once a step moves less than this fraction of the bandwidth
const STOP_FRACTION: f64 = 1e-3;

/// Options for mean-shift clustering
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeanShiftOptions {
    /// Kernel bandwidth; estimated from the data when `None`
    pub bandwidth: Option<f64>,
    /// Options used when the bandwidth has to be estimated
    pub estimate: BandwidthOptions,
    /// Seed from occupied grid cells instead of from every point
    pub bin_seeding: bool,
    /// Grid cells with fewer points than this are not used as seeds
    pub min_bin_freq: usize,
    /// Label every point, even those farther than `bandwidth` from any center
    pub cluster_all: bool,
    /// Maximum number of shifts per seed
    pub max_iter: usize,
}

impl Default for MeanShiftOptions {
    fn default() -> Self {
        Self {
            bandwidth: None,
            estimate: BandwidthOptions::default(),
            bin_seeding: false,
            min_bin_freq: 1,
            cluster_all: true,
            max_iter: 300,
        }
    }
}

/// Result of a mean-shift fit
#[derive(Debug, Clone)]
pub struct MeanShiftResult {
    /// Cluster centers, one row per cluster, strongest first
    pub cluster_centers: Array2<f64>,
    /// Number of points within bandwidth of each center at convergence
    pub intensities: Vec<usize>,
    /// Cluster index per input row; -1 for unlabelled rows
    pub labels: Vec<i64>,
    /// Bandwidth that was used
    pub bandwidth: f64,
    /// Number of seeds that were shifted
    pub n_seeds: usize,
    /// Most shifts taken by any seed
    pub n_iter: usize,
}

impl MeanShiftResult {
    /// Number of clusters found
    pub fn num_clusters(&self) -> usize {
        self.cluster_centers.nrows()
    }

    /// Number of rows assigned to each cluster
    pub fn cluster_sizes(&self) -> Vec<usize> {
        let mut sizes = vec![0; self.num_clusters()];
        for &label in &self.labels {
            if label >= 0 {
                sizes[label as usize] += 1;
            }
        }
        sizes
    }
}

/// Mean-shift clusterer
#[derive(Debug, Clone, Default)]
pub struct MeanShift {
    options: MeanShiftOptions,
}

#[derive(Debug, PartialEq)]
struct Converged {
    center: Vec<f64>,
    intensity: usize,
    iterations: usize,
}

impl MeanShift {
    pub fn new(options: MeanShiftOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &MeanShiftOptions {
        &self.options
    }

    /// Cluster the rows of `x`
    pub fn fit(&self, x: ArrayView2<f64>) -> StatsResult<MeanShiftResult> {
        if self.options.max_iter == 0 {
            return Err(StatsError::InvalidMaxIter);
        }
        if x.nrows() == 0 {
            return Err(StatsError::EmptyInput);
        }
        if let Some(row) = x
            .rows()
            .into_iter()
            .position(|r| r.iter().any(|v| !v.is_finite()))
        {
            return Err(StatsError::NonFinite { row });
        }

        let bandwidth = match self.options.bandwidth {
            Some(bw) => bw,
            None => estimate_bandwidth(x, &self.options.estimate)?,
        };
        if !(bandwidth.is_finite() && bandwidth > 0.0) {
            return Err(StatsError::InvalidBandwidth(bandwidth));
        }

        let seeds = if self.options.bin_seeding {
            bin_seeds(x, bandwidth, self.options.min_bin_freq)
        } else {
            all_rows(x)
        };
        if seeds.is_empty() {
            return Err(StatsError::NoSeeds {
                min_bin_freq: self.options.min_bin_freq,
            });
        }
        debug!(seeds = seeds.len(), bandwidth, "shifting seeds");

        let index = SearchIndex::build(x);
        let converged = self.shift_all(&index, &seeds, bandwidth);

        let n_iter = converged.iter().map(|c| c.iterations).max().unwrap_or(0);
        let mut modes: Vec<Converged> = converged.into_iter().filter(|c| c.intensity > 0).collect();
        if modes.is_empty() {
            return Err(StatsError::NoPointsWithinBandwidth { bandwidth });
        }

        // Strongest first; ties broken by coordinates, descending
        modes.sort_by(|a, b| {
            b.intensity
                .cmp(&a.intensity)
                .then_with(|| compare_points(&b.center, &a.center))
        });

        let (centers, intensities) = suppress_neighbours(modes, bandwidth);
        let labels = assign_labels(x, &centers, bandwidth, self.options.cluster_all);

        let d = x.ncols();
        let flat: Vec<f64> = centers.iter().flatten().copied().collect();
        let cluster_centers = Array2::from_shape_vec((centers.len(), d), flat)
            .map_err(|_| StatsError::EmptyInput)?;

        debug!(clusters = centers.len(), n_iter, "mean-shift converged");

        Ok(MeanShiftResult {
            cluster_centers,
            intensities,
            labels,
            bandwidth,
            n_seeds: seeds.len(),
            n_iter,
        })
    }

    fn shift_all(&self, index: &SearchIndex, seeds: &[Vec<f64>], bandwidth: f64) -> Vec<Converged> {
        let shift = |seed: &Vec<f64>| shift_seed(index, seed, bandwidth, self.options.max_iter);

        #[cfg(feature = "parallel")]
        {
            use rayon::prelude::*;
            seeds.par_iter().map(shift).collect()
        }

        #[cfg(not(feature = "parallel"))]
        {
            seeds.iter().map(shift).collect()
        }
    }
}

/// Move one seed uphill until it converges or runs out of iterations
fn shift_seed(index: &SearchIndex, seed: &[f64], bandwidth: f64, max_iter: usize) -> Converged {
    let stop = STOP_FRACTION * bandwidth;
    let mut mean = seed.to_vec();
    let mut iterations = 0;

    let intensity = loop {
        let Some((next, within)) = index.mean_within(&mean, bandwidth) else {
            break 0;
        };
        let moved = squared_distance(&next, &mean).sqrt();
        mean = next;
        if moved <= stop || iterations == max_iter {
            break within;
        }
        iterations += 1;
    };

    Converged {
        center: mean,
        intensity,
        iterations,
    }
}

/// Keep each mode unless a stronger kept mode lies within `bandwidth`
fn suppress_neighbours(modes: Vec<Converged>, bandwidth: f64) -> (Vec<Vec<f64>>, Vec<usize>) {
    let r2 = bandwidth * bandwidth;
    let mut centers: Vec<Vec<f64>> = Vec::new();
    let mut intensities = Vec::new();

    for mode in modes {
        if centers
            .iter()
            .any(|kept| squared_distance(kept, &mode.center) <= r2)
        {
            continue;
        }
        centers.push(mode.center);
        intensities.push(mode.intensity);
    }

    (centers, intensities)
}

/// Label each row with its nearest center
fn assign_labels(
    x: ArrayView2<f64>,
    centers: &[Vec<f64>],
    bandwidth: f64,
    cluster_all: bool,
) -> Vec<i64> {
    let r2 = bandwidth * bandwidth;
    x.rows()
        .into_iter()
        .map(|row| {
            let point = row.to_vec();
            let nearest = centers
                .iter()
                .enumerate()
                .map(|(i, c)| (i, squared_distance(&point, c)))
                .min_by(|a, b| a.1.total_cmp(&b.1));

            match nearest {
                Some((i, d2)) if cluster_all || d2 <= r2 => i as i64,
                _ => -1,
            }
        })
        .collect()
}

/// Seeds at the occupied cells of a grid with cell size `bin_size`
///
/// Cells are visited in first-seen row order. When every point occupies its
/// own cell the points themselves are returned, since binning saves nothing.
pub fn bin_seeds(x: ArrayView2<f64>, bin_size: f64, min_bin_freq: usize) -> Vec<Vec<f64>> {
    if bin_size <= 0.0 {
        return all_rows(x);
    }

    let mut order: Vec<Vec<i64>> = Vec::new();
    let mut freq: HashMap<Vec<i64>, usize> = HashMap::new();
    for row in x.rows() {
        let cell: Vec<i64> = row
            .iter()
            .map(|v| (v / bin_size).round_ties_even() as i64)
            .collect();
        let count = freq.entry(cell.clone()).or_insert(0);
        if *count == 0 {
            order.push(cell);
        }
        *count += 1;
    }

    let seeds: Vec<Vec<f64>> = order
        .into_iter()
        .filter(|cell| freq.get(cell).copied().unwrap_or(0) >= min_bin_freq)
        .map(|cell| cell.iter().map(|&c| c as f64 * bin_size).collect())
        .collect();

    if seeds.len() == x.nrows() {
        warn!(
            bin_size,
            "bin seeding produced one seed per point; using every point as a seed"
        );
        return all_rows(x);
    }

    seeds
}

fn all_rows(x: ArrayView2<f64>) -> Vec<Vec<f64>> {
    x.rows().into_iter().map(|r| r.to_vec()).collect()
}

fn compare_points(a: &[f64], b: &[f64]) -> Ordering {
    a.iter()
        .zip(b)
        .map(|(x, y)| x.total_cmp(y))
        .find(|o| *o != Ordering::Equal)
        .unwrap_or(Ordering::Equal)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn column(values: &[f64]) -> Array2<f64> {
        Array2::from_shape_vec((values.len(), 1), values.to_vec()).unwrap()
    }

    /// 50 points evenly spread over [mode - 0.02, mode + 0.02] for each mode
    fn bimodal() -> Vec<f64> {
        let mut values = Vec::new();
        for mode in [0.1, 0.9] {
            for i in 0..50 {
                values.push(mode - 0.02 + 0.04 * i as f64 / 49.0);
            }
        }
        values
    }

    #[test]
    fn test_shift_all_matches_seed_by_seed() {
        let x = column(&bimodal());
        let ms = MeanShift::new(MeanShiftOptions {
            bandwidth: Some(0.05),
            bin_seeding: false,
            ..MeanShiftOptions::default()
        });
        let index = SearchIndex::build(x.view());
        let seeds = all_rows(x.view());

        let together = ms.shift_all(&index, &seeds, 0.05);
        let one_by_one: Vec<Converged> = seeds
            .iter()
            .map(|seed| shift_seed(&index, seed, 0.05, ms.options.max_iter))
            .collect();
        assert_eq!(together, one_by_one);
    }

    #[test]
    fn test_bimodal_two_centers() {
        let x = column(&bimodal());
        let ms = MeanShift::new(MeanShiftOptions {
            bin_seeding: true,
            ..Default::default()
        });
        let result = ms.fit(x.view()).unwrap();

        assert_eq!(result.num_clusters(), 2);
        let mut centers: Vec<f64> = result.cluster_centers.column(0).to_vec();
        centers.sort_by(f64::total_cmp);
        assert!((centers[0] - 0.1).abs() < 0.05, "centers = {:?}", centers);
        assert!((centers[1] - 0.9).abs() < 0.05, "centers = {:?}", centers);
        assert_eq!(result.cluster_sizes(), vec![50, 50]);
    }

    #[test]
    fn test_without_bin_seeding_same_centers() {
        let x = column(&bimodal());
        let seeded = MeanShift::new(MeanShiftOptions {
            bin_seeding: true,
            ..Default::default()
        })
        .fit(x.view())
        .unwrap();
        let exhaustive = MeanShift::default().fit(x.view()).unwrap();

        assert_eq!(exhaustive.num_clusters(), seeded.num_clusters());
        assert!(exhaustive.n_seeds > seeded.n_seeds);
    }

    #[test]
    fn test_fixed_bandwidth_single_cluster() {
        let x = column(&[0.1, 0.2, 0.3]);
        let result = MeanShift::new(MeanShiftOptions {
            bandwidth: Some(1.0),
            ..Default::default()
        })
        .fit(x.view())
        .unwrap();

        assert_eq!(result.num_clusters(), 1);
        assert!((result.cluster_centers[[0, 0]] - 0.2).abs() < 1e-9);
        assert_eq!(result.intensities, vec![3]);
        assert_eq!(result.labels, vec![0, 0, 0]);
    }

    #[test]
    fn test_constant_input_has_no_bandwidth() {
        let x = column(&[0.5; 10]);
        let result = MeanShift::default().fit(x.view());
        assert_eq!(result.unwrap_err(), StatsError::InvalidBandwidth(0.0));
    }

    #[test]
    fn test_empty_and_non_finite_input() {
        let empty = Array2::<f64>::zeros((0, 1));
        assert_eq!(
            MeanShift::default().fit(empty.view()).unwrap_err(),
            StatsError::EmptyInput
        );

        let x = column(&[0.1, f64::NAN]);
        assert_eq!(
            MeanShift::default().fit(x.view()).unwrap_err(),
            StatsError::NonFinite { row: 1 }
        );
    }

    #[test]
    fn test_min_bin_freq_can_leave_no_seeds() {
        let x = column(&[0.1, 0.5, 0.9]);
        let result = MeanShift::new(MeanShiftOptions {
            bandwidth: Some(0.1),
            bin_seeding: true,
            min_bin_freq: 5,
            ..Default::default()
        })
        .fit(x.view());
        assert_eq!(result.unwrap_err(), StatsError::NoSeeds { min_bin_freq: 5 });
    }

    #[test]
    fn test_cluster_all_false_leaves_outliers_unlabelled() {
        let x = column(&[0.0, 0.01, 0.02, 0.03, 0.5]);
        let result = MeanShift::new(MeanShiftOptions {
            bandwidth: Some(0.05),
            cluster_all: false,
            ..Default::default()
        })
        .fit(x.view())
        .unwrap();

        // The lone point is its own mode, so it still gets a label
        assert_eq!(result.num_clusters(), 2);
        assert!(result.labels.iter().all(|&l| l >= 0));

        let far = column(&[0.0, 0.01, 0.02, 0.03]);
        let centers = vec![vec![0.015]];
        let labels = assign_labels(far.view(), &centers, 0.01, false);
        assert_eq!(labels, vec![-1, 0, 0, -1]);
    }

    #[test]
    fn test_bin_seeds_grid() {
        let x = column(&[0.0, 0.04, 0.11, 0.12, 0.31]);
        let seeds = bin_seeds(x.view(), 0.1, 1);
        // cells 0, 1, 3 in first-seen order
        assert_eq!(seeds.len(), 3);
        assert!((seeds[0][0] - 0.0).abs() < 1e-12);
        assert!((seeds[1][0] - 0.1).abs() < 1e-12);
        assert!((seeds[2][0] - 0.3).abs() < 1e-12);

        let filtered = bin_seeds(x.view(), 0.1, 2);
        assert_eq!(filtered.len(), 2);
    }

    #[test]
    fn test_bin_seeds_fall_back_to_points() {
        let x = column(&[0.0, 1.0, 2.0]);
        let seeds = bin_seeds(x.view(), 0.1, 1);
        assert_eq!(seeds, vec![vec![0.0], vec![1.0], vec![2.0]]);
    }

    #[test]
    fn test_two_dimensional_blobs() {
        let x = Array2::from_shape_vec(
            (6, 2),
            vec![0.0, 0.0, 0.1, 0.0, 0.0, 0.1, 5.0, 5.0, 5.1, 5.0, 5.0, 5.1],
        )
        .unwrap();
        let result = MeanShift::new(MeanShiftOptions {
            bandwidth: Some(1.0),
            ..Default::default()
        })
        .fit(x.view())
        .unwrap();

        assert_eq!(result.num_clusters(), 2);
        assert_eq!(result.labels[0], result.labels[1]);
        assert_ne!(result.labels[0], result.labels[3]);
    }
}
