//! Error types for simdist-core

use crate::config::ConfigError;
use simdist_io::IoError;
use simdist_selection::{EvalError, ParseError};
use simdist_stats::StatsError;
use thiserror::Error;

/// Main error type for simdist operations
#[derive(Error, Debug)]
pub enum SimdistError {
    /// Loading or writing tables
    #[error("Data error: {0}")]
    Data(#[from] IoError),

    /// Histogram, bandwidth or clustering failures
    #[error("Statistics error: {0}")]
    Stats(#[from] StatsError),

    /// Filter expression did not parse
    #[error("Filter expression error: {0}")]
    Parse(#[from] ParseError),

    /// Filter expression could not be evaluated
    #[error("Filter evaluation error: {0}")]
    Eval(#[from] EvalError),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for simdist operations
pub type SimdistResult<T> = Result<T, SimdistError>;
