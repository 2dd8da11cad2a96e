//! Histogram figures
//!
//! All histograms are overlaid on one set of axes, with an optional dashed
//! vertical line at each cluster center. The same scene renders as SVG for
//! files or as a braille chart for terminals.

use kuva::backend::svg::SvgBackend;
use kuva::backend::terminal::TerminalBackend;
use kuva::render::annotations::ReferenceLine;
use kuva::render::layout::Layout;
use kuva::render::plots::Plot;
use kuva::render::render::{collect_legend_entries, render_multiple};
use simdist_stats::Histogram;

/// Bar fill colors, cycled per histogram
const PALETTE: [&str; 6] = [
    "#1f77b4", "#ff7f0e", "#2ca02c", "#d62728", "#9467bd", "#8c564b",
];

/// Options for the histogram figure
#[derive(Debug, Clone)]
pub struct FigureOptions {
    pub width: u32,
    pub height: u32,
    pub title: String,
    pub x_label: String,
}

impl Default for FigureOptions {
    fn default() -> Self {
        Self {
            width: 960,
            height: 540,
            title: "Similarity distribution".to_string(),
            x_label: "simil".to_string(),
        }
    }
}

/// Label of the marker drawn at a cluster center
pub fn center_label(center: f64) -> String {
    format!("center {:.4}", center)
}

/// One kuva histogram per input, labelled by its bin count
fn histogram_plots(histograms: &[Histogram]) -> Vec<Plot> {
    histograms
        .iter()
        .zip(PALETTE.iter().cycle())
        .map(|(hist, color)| {
            let counts = hist.counts().iter().map(|&c| c as f64).collect();
            kuva::plot::Histogram::from_bins(hist.edges().to_vec(), counts)
                .with_color(*color)
                .with_legend(format!("{} bins", hist.num_bins()))
                .into()
        })
        .collect()
}

/// Lay out the overlaid histograms and center markers
///
/// Centers outside the span of the histogram edges are not drawn.
fn layout_for(
    plots: &[Plot],
    histograms: &[Histogram],
    centers: &[f64],
    options: &FigureOptions,
) -> Layout {
    let (x_min, x_max) = histograms
        .iter()
        .map(Histogram::range)
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), (a, b)| {
            (lo.min(a), hi.max(b))
        });

    let mut layout = Layout::auto_from_plots(plots)
        .with_width(options.width as f64)
        .with_height(options.height as f64)
        .with_title(options.title.as_str())
        .with_x_label(options.x_label.as_str())
        .with_y_label("count");

    let entries = collect_legend_entries(plots);
    if !entries.is_empty() {
        layout = layout.with_legend_entries(entries);
    }

    for &c in centers.iter().filter(|c| (x_min..=x_max).contains(*c)) {
        layout = layout.with_reference_line(
            ReferenceLine::vertical(c)
                .with_color("black")
                .with_dasharray("4 3")
                .with_label(center_label(c)),
        );
    }
    layout
}

/// Render histograms as one SVG document
pub fn render_svg(histograms: &[Histogram], centers: &[f64], options: &FigureOptions) -> String {
    let plots = histogram_plots(histograms);
    let layout = layout_for(&plots, histograms, centers, options);
    let scene = render_multiple(plots, layout);
    SvgBackend::new().render_scene(&scene)
}

/// Render histograms as a terminal chart of `cols` by `rows` characters
pub fn render_text(
    histograms: &[Histogram],
    centers: &[f64],
    options: &FigureOptions,
    cols: usize,
    rows: usize,
) -> String {
    let plots = histogram_plots(histograms);
    let layout = layout_for(&plots, histograms, centers, options);
    let scene = render_multiple(plots, layout);
    TerminalBackend::new(cols, rows).render_scene(&scene)
}
