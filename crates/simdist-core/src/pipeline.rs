//! The analysis pipeline
//!
//! Steps, in order: load the table, summarize and bin the score column,
//! find its modes with mean-shift, write the figure, then filter rows and
//! optionally export them.

use crate::config::AnalysisConfig;
use crate::context::TableContext;
use crate::error::SimdistResult;
use crate::plot::{render_svg, FigureOptions};
use crate::report::AnalysisReport;
use ndarray::Array2;
use simdist_io::{write_csv, SimilarityTable};
use simdist_selection::{count_selected, parse_selection, Evaluator};
use simdist_stats::{Histogram, MeanShift, SummaryStats};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Runs one analysis as described by an [`AnalysisConfig`]
#[derive(Debug, Clone)]
pub struct Pipeline {
    config: AnalysisConfig,
}

impl Pipeline {
    pub fn new(config: AnalysisConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Load the configured input file and analyze it
    pub fn run(&self) -> SimdistResult<AnalysisReport> {
        self.config.validate()?;

        let input = &self.config.input;
        info!(path = %input.display(), "loading similarity table");
        let table = SimilarityTable::load_csv(
            &input.to_string_lossy(),
            &self.config.id_column,
            &self.config.value_column,
        )?;

        let mut report = self.analyze(table)?;
        report.input = Some(input.clone());
        Ok(report)
    }

    /// Analyze a table that is already in memory
    pub fn run_on_table(&self, table: SimilarityTable) -> SimdistResult<AnalysisReport> {
        self.config.validate()?;
        self.analyze(table)
    }

    fn analyze(&self, table: SimilarityTable) -> SimdistResult<AnalysisReport> {
        let values = table.values();
        info!(rows = table.len(), column = table.value_column(), "extracted score column");

        let summary = SummaryStats::from_data(values);
        if summary.missing > 0 {
            warn!(
                missing = summary.missing,
                "non-finite scores are left out of histograms and clustering"
            );
        }

        let histograms = self
            .config
            .histogram
            .bins
            .iter()
            .map(|&bins| Histogram::from_data(values, bins))
            .collect::<Result<Vec<_>, _>>()?;
        for hist in &histograms {
            debug!(bins = hist.num_bins(), skipped = hist.skipped(), "histogram");
        }

        let features = if summary.missing == 0 {
            table.to_feature_matrix()
        } else {
            finite_matrix(values)
        };
        let options = self.config.clustering.mean_shift_options();
        info!(
            bandwidth = ?options.bandwidth,
            bin_seeding = options.bin_seeding,
            "running mean-shift"
        );
        let fit = MeanShift::new(options).fit(features.view())?;
        let centers = fit.cluster_centers.column(0).to_vec();
        info!(
            bandwidth = fit.bandwidth,
            clusters = centers.len(),
            n_iter = fit.n_iter,
            "mean-shift finished"
        );

        let mut written = Vec::new();
        if let Some(dir) = &self.config.histogram.output_dir {
            let marked: &[f64] = if self.config.histogram.show_centers {
                &centers
            } else {
                &[]
            };
            written.push(self.write_figure(dir, &histograms, marked, table.value_column())?);
        }

        let filter = self.config.filter.describe(table.value_column());
        let mask = match &self.config.filter.expression {
            Some(text) => {
                let expr = parse_selection(text)?;
                let context = TableContext::new(&table);
                Evaluator::new(&context).evaluate(&expr)?
            }
            None => self.config.filter.band.mask(values),
        };
        info!(filter = %filter, selected = count_selected(&mask), "filtered rows");
        let selected = table.select(&mask)?;

        if let Some(path) = &self.config.filter.output {
            write_csv(&selected, path)?;
            info!(path = %path.display(), rows = selected.len(), "wrote filtered rows");
            written.push(path.clone());
        }

        Ok(AnalysisReport {
            input: None,
            value_column: table.value_column().to_string(),
            rows: table.len(),
            summary,
            histograms,
            bandwidth: fit.bandwidth,
            cluster_sizes: fit.cluster_sizes(),
            intensities: fit.intensities,
            n_iter: fit.n_iter,
            centers,
            filter,
            selected,
            written,
        })
    }

    fn write_figure(
        &self,
        dir: &Path,
        histograms: &[Histogram],
        centers: &[f64],
        column: &str,
    ) -> SimdistResult<PathBuf> {
        std::fs::create_dir_all(dir)?;
        let options = FigureOptions {
            width: self.config.histogram.width,
            height: self.config.histogram.height,
            title: format!("Distribution of {}", column),
            x_label: column.to_string(),
        };
        let path = dir.join(format!("{}-histogram.svg", column));
        std::fs::write(&path, render_svg(histograms, centers, &options))?;
        info!(path = %path.display(), "wrote histogram figure");
        Ok(path)
    }
}

/// The finite scores as an (n, 1) feature matrix
fn finite_matrix(values: &[f64]) -> Array2<f64> {
    let finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    Array2::from_shape_fn((finite.len(), 1), |(i, _)| finite[i])
}
