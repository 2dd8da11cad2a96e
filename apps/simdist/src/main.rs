//! simdist - similarity distribution analysis
//!
//! Loads a score file, reports its histograms and mean-shift modes, and
//! lists the near-duplicate rows.

mod cli;

use clap::Parser;
use simdist_core::plot::{self, FigureOptions};
use simdist_core::Pipeline;
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use cli::Cli;

/// Terminal chart size in characters
const TEXT_PLOT_COLS: usize = 100;
const TEXT_PLOT_ROWS: usize = 30;

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Logs go to stderr so the report on stdout stays clean
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cli.log_level()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    let config = cli.to_config()?;
    debug!(?config, "resolved configuration");
    let report = Pipeline::new(config).run()?;

    if cli.json {
        println!("{}", report.to_json()?);
    } else {
        print!("{}", report.render_text());
    }

    if cli.text_plot {
        let options = FigureOptions {
            title: format!("Distribution of {}", report.value_column),
            x_label: report.value_column.clone(),
            ..FigureOptions::default()
        };
        println!();
        print!(
            "{}",
            plot::render_text(
                &report.histograms,
                &report.centers,
                &options,
                TEXT_PLOT_COLS,
                TEXT_PLOT_ROWS
            )
        );
    }

    Ok(())
}
