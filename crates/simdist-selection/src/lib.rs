//! simdist-selection - Row selection for similarity tables
//!
//! Two ways to pick rows out of a score column:
//!
//! - **Bands**: [`SimilarityBand`] intervals such as the near-duplicate band `(0.995, 1.0)`
//! - **Expressions**: a small filter grammar evaluated per row
//!
//! # Expression Syntax
//!
//! - **Field predicates**: `simil > 0.995 && simil < 1`
//! - **Statistical filters**: `abs(zscore(simil)) < 3`, `simil >= percentile(simil, 99)`
//! - **Boolean operators**: `(A || B) && !C`, with `&&` binding tighter than `||`
//!
//! # Examples
//!
//! ```ignore
//! use simdist_selection::{parse_selection, SimilarityBand};
//!
//! let expr = parse_selection("simil > 0.995 && simil < 1")?;
//! assert_eq!(expr, SimilarityBand::near_duplicate().to_expr("simil"));
//! ```

pub mod ast;
pub mod band;
pub mod eval;
pub mod parser;

pub use ast::*;
pub use band::*;
pub use eval::*;
pub use parser::*;
