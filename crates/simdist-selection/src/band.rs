//! Score bands
//!
//! A [`SimilarityBand`] is an interval on the score axis with independently
//! open or closed ends. The near-duplicate band `(0.995, 1.0)` excludes both
//! bounds: exact 1.0 scores are self matches.

use crate::ast::{Comparison, ComparisonOp, SelectionExpr};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Lower bound of the near-duplicate band
pub const NEAR_DUPLICATE_LOWER: f64 = 0.995;

/// Upper bound of the near-duplicate band
pub const NEAR_DUPLICATE_UPPER: f64 = 1.0;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum BandError {
    #[error("Band bounds must be finite, got [{lower}, {upper}]")]
    NonFinite { lower: f64, upper: f64 },

    #[error("Band lower bound {lower} must be below upper bound {upper}")]
    Empty { lower: f64, upper: f64 },
}

/// An interval of similarity scores
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimilarityBand {
    pub lower: f64,
    pub upper: f64,
    pub lower_inclusive: bool,
    pub upper_inclusive: bool,
}

impl Default for SimilarityBand {
    fn default() -> Self {
        Self::near_duplicate()
    }
}

impl SimilarityBand {
    /// Open interval `(lower, upper)`
    pub fn new(lower: f64, upper: f64) -> Self {
        Self {
            lower,
            upper,
            lower_inclusive: false,
            upper_inclusive: false,
        }
    }

    /// Scores strictly between 0.995 and 1.0
    pub fn near_duplicate() -> Self {
        Self::new(NEAR_DUPLICATE_LOWER, NEAR_DUPLICATE_UPPER)
    }

    pub fn with_inclusive(mut self, lower_inclusive: bool, upper_inclusive: bool) -> Self {
        self.lower_inclusive = lower_inclusive;
        self.upper_inclusive = upper_inclusive;
        self
    }

    pub fn validate(&self) -> Result<(), BandError> {
        if !self.lower.is_finite() || !self.upper.is_finite() {
            return Err(BandError::NonFinite {
                lower: self.lower,
                upper: self.upper,
            });
        }
        if self.lower >= self.upper {
            return Err(BandError::Empty {
                lower: self.lower,
                upper: self.upper,
            });
        }
        Ok(())
    }

    /// Whether a score falls inside the band. NaN never does.
    pub fn contains(&self, value: f64) -> bool {
        self.lower_op().evaluate(value, self.lower) && self.upper_op().evaluate(value, self.upper)
    }

    /// Membership mask over a score column
    pub fn mask(&self, values: &[f64]) -> Vec<bool> {
        values.iter().map(|&v| self.contains(v)).collect()
    }

    /// The band as a selection expression over `field`
    pub fn to_expr(&self, field: &str) -> SelectionExpr {
        SelectionExpr::and(
            SelectionExpr::Comparison(Comparison::field(field, self.lower_op(), self.lower)),
            SelectionExpr::Comparison(Comparison::field(field, self.upper_op(), self.upper)),
        )
    }

    fn lower_op(&self) -> ComparisonOp {
        if self.lower_inclusive {
            ComparisonOp::Ge
        } else {
            ComparisonOp::Gt
        }
    }

    fn upper_op(&self) -> ComparisonOp {
        if self.upper_inclusive {
            ComparisonOp::Le
        } else {
            ComparisonOp::Lt
        }
    }
}

impl fmt::Display for SimilarityBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let open = if self.lower_inclusive { '[' } else { '(' };
        let close = if self.upper_inclusive { ']' } else { ')' };
        write!(f, "{}{}, {}{}", open, self.lower, self.upper, close)
    }
}
