//! Error types for simdist-stats

use thiserror::Error;

/// Errors raised by the statistical routines
#[derive(Debug, Error, Clone, PartialEq)]
pub enum StatsError {
    #[error("Input contains no samples")]
    EmptyInput,

    #[error("Number of bins must be positive, got {0}")]
    InvalidBins(usize),

    #[error("Quantile must lie in [0, 1], got {0}")]
    InvalidQuantile(f64),

    #[error("Bandwidth must be a positive finite number, got {0}")]
    InvalidBandwidth(f64),

    #[error("Maximum iteration count must be positive")]
    InvalidMaxIter,

    #[error("Row {row} contains a non-finite value")]
    NonFinite { row: usize },

    #[error("No seeds to start from (min_bin_freq = {min_bin_freq})")]
    NoSeeds { min_bin_freq: usize },

    #[error(
        "No point was within bandwidth={bandwidth} of any seed; \
         try a different seeding strategy or increase the bandwidth"
    )]
    NoPointsWithinBandwidth { bandwidth: f64 },
}

/// Result type for statistical operations
pub type StatsResult<T> = Result<T, StatsError>;
