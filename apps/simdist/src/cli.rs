//! Command-line arguments
//!
//! Flags override values from `--config`, which override the defaults.

use clap::Parser;
use simdist_core::{AnalysisConfig, ConfigError};
use simdist_selection::SimilarityBand;
use std::path::PathBuf;

/// Analyze the distribution of pairwise similarity scores
#[derive(Parser, Debug)]
#[command(name = "simdist", version)]
#[command(about = "Histograms, mean-shift modes and near-duplicate pairs of a similarity score file", long_about = None)]
pub struct Cli {
    /// CSV or TSV file with an id column and a score column [default: rss-out.csv]
    pub input: Option<PathBuf>,

    /// TOML or JSON configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Name of the identifier column
    #[arg(long)]
    pub id_column: Option<String>,

    /// Name of the score column
    #[arg(long)]
    pub value_column: Option<String>,

    /// Histogram bin count; repeat for several histograms
    #[arg(short, long = "bins")]
    pub bins: Vec<usize>,

    /// Neighbour quantile for bandwidth estimation
    #[arg(long)]
    pub quantile: Option<f64>,

    /// Rows sampled for bandwidth estimation
    #[arg(long)]
    pub n_samples: Option<usize>,

    /// Fixed kernel bandwidth instead of an estimate
    #[arg(long)]
    pub bandwidth: Option<f64>,

    /// Seed mean-shift from every point instead of occupied bins
    #[arg(long)]
    pub no_bin_seeding: bool,

    /// Minimum points in a bin for it to seed mean-shift
    #[arg(long)]
    pub min_bin_freq: Option<usize>,

    /// Lower bound of the selected band (exclusive)
    #[arg(long)]
    pub lower: Option<f64>,

    /// Upper bound of the selected band (exclusive)
    #[arg(long)]
    pub upper: Option<f64>,

    /// Filter expression, e.g. "simil > 0.99 && simil < 1"; replaces the band
    #[arg(short, long)]
    pub filter: Option<String>,

    /// Write the histogram figure (SVG) into this directory
    #[arg(long)]
    pub plot_dir: Option<PathBuf>,

    /// Print the histograms as text bar charts
    #[arg(long)]
    pub text_plot: bool,

    /// Write the selected rows to this CSV file
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Print the report as JSON
    #[arg(long)]
    pub json: bool,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    /// Build the analysis configuration from the config file and flags
    pub fn to_config(&self) -> Result<AnalysisConfig, ConfigError> {
        let mut config = match &self.config {
            Some(path) => AnalysisConfig::load(path)?,
            None => AnalysisConfig::default(),
        };

        if let Some(input) = &self.input {
            config.input = input.clone();
        }
        if let Some(column) = &self.id_column {
            config.id_column = column.clone();
        }
        if let Some(column) = &self.value_column {
            config.value_column = column.clone();
        }
        if !self.bins.is_empty() {
            config.histogram.bins = self.bins.clone();
        }

        let clustering = &mut config.clustering;
        if let Some(q) = self.quantile {
            clustering.quantile = q;
        }
        if let Some(n) = self.n_samples {
            clustering.n_samples = Some(n);
        }
        if let Some(bw) = self.bandwidth {
            clustering.bandwidth = Some(bw);
        }
        if self.no_bin_seeding {
            clustering.bin_seeding = false;
        }
        if let Some(freq) = self.min_bin_freq {
            clustering.min_bin_freq = freq;
        }

        let band = &mut config.filter.band;
        if let Some(lower) = self.lower {
            *band = SimilarityBand {
                lower,
                lower_inclusive: false,
                ..*band
            };
        }
        if let Some(upper) = self.upper {
            *band = SimilarityBand {
                upper,
                upper_inclusive: false,
                ..*band
            };
        }
        if let Some(expr) = &self.filter {
            config.filter.expression = Some(expr.clone());
        }
        if let Some(path) = &self.output {
            config.filter.output = Some(path.clone());
        }
        if let Some(dir) = &self.plot_dir {
            config.histogram.output_dir = Some(dir.clone());
        }

        config.validate()?;
        Ok(config)
    }

    /// Default log directive for the verbosity flag
    pub fn log_level(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "info",
            _ => "debug",
        }
    }
}
