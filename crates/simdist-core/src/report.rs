//! Analysis results

use serde::Serialize;
use simdist_io::SimilarityTable;
use simdist_stats::{Histogram, SummaryStats};
use std::path::PathBuf;

/// Selected rows listed in the text report before truncating
const MAX_LISTED_ROWS: usize = 20;

/// Everything one pipeline run produces
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    /// Input file, when the table was loaded from disk
    pub input: Option<PathBuf>,
    pub value_column: String,
    pub rows: usize,
    pub summary: SummaryStats,
    pub histograms: Vec<Histogram>,
    /// Kernel bandwidth used for clustering
    pub bandwidth: f64,
    /// Cluster centers, strongest first
    pub centers: Vec<f64>,
    /// Points within bandwidth of each center at convergence
    pub intensities: Vec<usize>,
    /// Points labelled with each center
    pub cluster_sizes: Vec<usize>,
    /// Most shifts any seed needed
    pub n_iter: usize,
    /// The filter that produced `selected`
    pub filter: String,
    pub selected: SimilarityTable,
    /// Files written during the run
    pub written: Vec<PathBuf>,
}

impl AnalysisReport {
    pub fn num_clusters(&self) -> usize {
        self.centers.len()
    }

    /// Ids of the selected rows, in input order
    pub fn selected_ids(&self) -> &[String] {
        self.selected.ids()
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Human-readable report
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        let s = &self.summary;

        match &self.input {
            Some(path) => out.push_str(&format!("Input: {} ({} rows", path.display(), self.rows)),
            None => out.push_str(&format!("Input: {} rows", self.rows)),
        }
        if s.missing > 0 {
            out.push_str(&format!(", {} missing", s.missing));
        }
        out.push_str(if self.input.is_some() { ")\n" } else { "\n" });

        out.push_str(&format!(
            "{}: min {:.6}  max {:.6}  mean {:.6}  median {:.6}  std {:.6}\n",
            self.value_column, s.min, s.max, s.mean, s.median, s.std_dev
        ));

        for hist in &self.histograms {
            match hist.mode_bin() {
                Some((i, count)) => out.push_str(&format!(
                    "Histogram {} bins: mode [{:.6}, {:.6}) with {} rows\n",
                    hist.num_bins(),
                    hist.edges()[i],
                    hist.edges()[i + 1],
                    count
                )),
                None => out.push_str(&format!("Histogram {} bins: empty\n", hist.num_bins())),
            }
        }

        out.push_str(&format!("Bandwidth: {:.6}\n", self.bandwidth));
        out.push_str(&format!("Clusters: {}\n", self.num_clusters()));
        for (i, center) in self.centers.iter().enumerate() {
            out.push_str(&format!(
                "  #{:<3} center {:.6}  size {}\n",
                i + 1,
                center,
                self.cluster_sizes.get(i).copied().unwrap_or(0)
            ));
        }

        out.push_str(&format!(
            "Filter: {} -> {} rows\n",
            self.filter,
            self.selected.len()
        ));
        out.push_str(&format!(
            "  {:<20} {}\n",
            self.selected.id_column(),
            self.selected.value_column()
        ));
        for (id, value) in self.selected.iter().take(MAX_LISTED_ROWS) {
            out.push_str(&format!("  {:<20} {}\n", id, value));
        }
        if self.selected.len() > MAX_LISTED_ROWS {
            out.push_str(&format!(
                "  ... {} more\n",
                self.selected.len() - MAX_LISTED_ROWS
            ));
        }

        for path in &self.written {
            out.push_str(&format!("Wrote {}\n", path.display()));
        }

        out
    }
}
