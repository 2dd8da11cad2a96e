//! simdist-core - Similarity distribution analysis
//!
//! Ties the workspace crates into one run over a score table:
//!
//! - **Config**: [`AnalysisConfig`] from TOML or JSON, with validation
//! - **Pipeline**: load, histogram, mean-shift, filter, export
//! - **Report**: [`AnalysisReport`] as text or JSON
//! - **Figures**: overlaid histograms drawn with kuva, as SVG or a terminal chart
//!
//! # Example
//!
//! ```ignore
//! use simdist_core::{AnalysisConfig, Pipeline};
//!
//! let report = Pipeline::new(AnalysisConfig::default()).run()?;
//! println!("{}", report.render_text());
//! ```

pub mod config;
pub mod context;
pub mod error;
pub mod pipeline;
pub mod plot;
pub mod report;

pub use config::*;
pub use context::TableContext;
pub use error::*;
pub use pipeline::Pipeline;
pub use report::AnalysisReport;
