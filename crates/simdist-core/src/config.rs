//! Configuration for simdist-core
//!
//! Every knob of the analysis lives here. Configs load from TOML or JSON
//! and any field left out falls back to its default.

use serde::{Deserialize, Serialize};
use simdist_io::{DEFAULT_ID_COLUMN, DEFAULT_VALUE_COLUMN};
use simdist_selection::{parse_selection, BandError, ParseError, SimilarityBand};
use simdist_stats::{BandwidthOptions, MeanShiftOptions, DEFAULT_QUANTILE};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Input file read when none is given
pub const DEFAULT_INPUT: &str = "rss-out.csv";

/// Top-level analysis configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// CSV or TSV file with one similarity score per row
    pub input: PathBuf,
    /// Identifier column
    pub id_column: String,
    /// Score column
    pub value_column: String,
    /// Histogram settings
    pub histogram: HistogramConfig,
    /// Mean-shift settings
    pub clustering: ClusteringConfig,
    /// Row filter settings
    pub filter: FilterConfig,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            input: PathBuf::from(DEFAULT_INPUT),
            id_column: DEFAULT_ID_COLUMN.to_string(),
            value_column: DEFAULT_VALUE_COLUMN.to_string(),
            histogram: HistogramConfig::default(),
            clustering: ClusteringConfig::default(),
            filter: FilterConfig::default(),
        }
    }
}

/// Histogram configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistogramConfig {
    /// One histogram per entry
    pub bins: Vec<usize>,
    /// Directory for the SVG figure; no figure is written when unset
    pub output_dir: Option<PathBuf>,
    /// Figure width in pixels
    pub width: u32,
    /// Figure height in pixels
    pub height: u32,
    /// Mark cluster centers on the figure
    pub show_centers: bool,
}

impl Default for HistogramConfig {
    fn default() -> Self {
        Self {
            bins: vec![50, 500],
            output_dir: None,
            width: 960,
            height: 540,
            show_centers: true,
        }
    }
}

/// Mean-shift configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusteringConfig {
    /// Fixed kernel bandwidth; estimated when unset
    pub bandwidth: Option<f64>,
    /// Neighbour quantile for bandwidth estimation
    pub quantile: f64,
    /// Rows sampled for bandwidth estimation; all rows when unset
    pub n_samples: Option<usize>,
    pub bin_seeding: bool,
    pub min_bin_freq: usize,
    pub cluster_all: bool,
    pub max_iter: usize,
}

impl Default for ClusteringConfig {
    fn default() -> Self {
        Self {
            bandwidth: None,
            quantile: DEFAULT_QUANTILE,
            n_samples: None,
            bin_seeding: true,
            min_bin_freq: 1,
            cluster_all: true,
            max_iter: 300,
        }
    }
}

impl ClusteringConfig {
    /// Options for [`simdist_stats::MeanShift`]
    pub fn mean_shift_options(&self) -> MeanShiftOptions {
        MeanShiftOptions {
            bandwidth: self.bandwidth,
            estimate: BandwidthOptions {
                quantile: self.quantile,
                n_samples: self.n_samples,
            },
            bin_seeding: self.bin_seeding,
            min_bin_freq: self.min_bin_freq,
            cluster_all: self.cluster_all,
            max_iter: self.max_iter,
        }
    }
}

/// Row filter configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct FilterConfig {
    /// Filter expression; replaces the band when set
    pub expression: Option<String>,
    /// Write the filtered rows to this CSV file
    pub output: Option<PathBuf>,
    /// Score band kept by the filter
    pub band: SimilarityBand,
}

impl FilterConfig {
    /// The expression the filter applies, as text
    pub fn describe(&self, field: &str) -> String {
        match &self.expression {
            Some(expr) => expr.clone(),
            None => self.band.to_expr(field).to_string(),
        }
    }
}

impl AnalysisConfig {
    /// Create a new configuration with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from a TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Serialize configuration to TOML
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Load configuration from a JSON string
    pub fn from_json(json_str: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json_str)?)
    }

    /// Serialize configuration to JSON
    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Load a `.json` or `.toml` file; other extensions are read as TOML
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        let is_json = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("json"));

        if is_json {
            Self::from_json(&text)
        } else {
            Self::from_toml(&text)
        }
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.id_column.is_empty() || self.value_column.is_empty() {
            return Err(ConfigError::OutOfRange(
                "column names must not be empty".to_string(),
            ));
        }

        if self.histogram.bins.is_empty() {
            return Err(ConfigError::InvalidBins(
                "at least one bin count is required".to_string(),
            ));
        }

        if self.histogram.bins.contains(&0) {
            return Err(ConfigError::InvalidBins(
                "bin counts must be positive".to_string(),
            ));
        }

        if self.histogram.width == 0 || self.histogram.height == 0 {
            return Err(ConfigError::OutOfRange(
                "figure width and height must be positive".to_string(),
            ));
        }

        let clustering = &self.clustering;
        if !(0.0..=1.0).contains(&clustering.quantile) {
            return Err(ConfigError::OutOfRange(
                "quantile must be between 0.0 and 1.0".to_string(),
            ));
        }

        if let Some(bw) = clustering.bandwidth {
            if !(bw.is_finite() && bw > 0.0) {
                return Err(ConfigError::OutOfRange(
                    "bandwidth must be a positive number".to_string(),
                ));
            }
        }

        if clustering.n_samples == Some(0) {
            return Err(ConfigError::OutOfRange(
                "n_samples must be positive".to_string(),
            ));
        }

        if clustering.max_iter == 0 {
            return Err(ConfigError::OutOfRange(
                "max_iter must be positive".to_string(),
            ));
        }

        self.filter.band.validate()?;

        if let Some(expr) = &self.filter.expression {
            parse_selection(expr)?;
        }

        Ok(())
    }
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid histogram bins: {0}")]
    InvalidBins(String),

    #[error("Value out of range: {0}")]
    OutOfRange(String),

    #[error("Invalid band: {0}")]
    InvalidBand(#[from] BandError),

    #[error("Invalid filter expression: {0}")]
    InvalidExpression(#[from] ParseError),

    #[error("Cannot read {path}: {message}")]
    Read { path: PathBuf, message: String },

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
