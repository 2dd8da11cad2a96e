//! simdist-stats - Statistical functions for similarity distributions
//!
//! This crate provides the numeric side of the analysis:
//!
//! - **Histogram**: equal-width binning of a score vector
//! - **SummaryStats**: mean, spread, median, MAD, percentiles
//! - **Bandwidth estimation**: k-nearest-neighbour heuristic
//! - **MeanShift**: flat-kernel mode seeking with optional bin seeding
//!
//! Clustering operates on `ndarray` feature matrices of shape `(n, d)`; a
//! score column is passed as an `(n, 1)` matrix. One-dimensional input uses
//! sorted-array neighbour search, so large score files stay fast.
//!
//! Enable the `parallel` feature to spread neighbour searches and seed
//! shifting over the rayon thread pool.

pub mod bandwidth;
pub mod error;
pub mod histogram;
pub mod mean_shift;
mod neighbors;
pub mod summary;

pub use bandwidth::*;
pub use error::*;
pub use histogram::*;
pub use mean_shift::*;
pub use summary::*;
