//! Pipeline integration tests
//!
//! Runs the full analysis over CSV files written to temporary directories.

use proptest::prelude::*;
use rstest::rstest;
use simdist_core::{AnalysisConfig, Pipeline, SimdistError};
use simdist_io::{IoError, SimilarityTable};
use simdist_selection::SimilarityBand;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const EXAMPLE: &str = "rss_id,simil\n1,0.996\n2,0.2\n3,0.999\n4,1.0\n5,0.3\n";

fn write_input(dir: &TempDir, name: &str, contents: &str) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, contents).unwrap();
    path
}

fn config_for(input: &Path) -> AnalysisConfig {
    let mut config = AnalysisConfig::default();
    config.input = input.to_path_buf();
    // Five rows are too few for the k-nearest-neighbour estimate
    config.clustering.bandwidth = Some(0.1);
    config
}

/// 50 points evenly spread over [mode - 0.02, mode + 0.02] for 0.1 and 0.9
fn bimodal_csv() -> String {
    let mut csv = String::from("rss_id,simil\n");
    let mut id = 0;
    for mode in [0.1, 0.9] {
        for i in 0..50 {
            id += 1;
            csv.push_str(&format!("{},{}\n", id, mode - 0.02 + 0.04 * i as f64 / 49.0));
        }
    }
    csv
}

// === Filtering ===

#[test]
fn test_example_selects_near_duplicates() {
    let dir = TempDir::new().unwrap();
    let input = write_input(&dir, "rss-out.csv", EXAMPLE);

    let report = Pipeline::new(config_for(&input)).run().unwrap();

    assert_eq!(report.rows, 5);
    assert_eq!(report.input.as_deref(), Some(input.as_path()));
    assert_eq!(report.selected_ids(), ["1".to_string(), "3".to_string()]);
    assert_eq!(report.selected.values(), &[0.996, 0.999]);
    assert_eq!(report.filter, "(simil > 0.995 && simil < 1)");
}

#[rstest]
#[case::lower_bound(0.995, false)]
#[case::upper_bound(1.0, false)]
#[case::just_above_lower(0.9951, true)]
#[case::just_below_upper(0.999_999, true)]
#[case::above_one(1.000_001, false)]
#[case::far_below(0.5, false)]
fn test_band_boundaries(#[case] value: f64, #[case] selected: bool) {
    let table = SimilarityTable::from_pairs([("x", value), ("a", 0.2), ("b", 0.25)]).unwrap();
    let mut config = AnalysisConfig::default();
    config.clustering.bandwidth = Some(0.1);

    let report = Pipeline::new(config).run_on_table(table).unwrap();
    assert_eq!(report.selected_ids().contains(&"x".to_string()), selected);
    assert_eq!(report.selected.len(), usize::from(selected));
}

#[test]
fn test_expression_overrides_band() {
    let dir = TempDir::new().unwrap();
    let input = write_input(&dir, "rss-out.csv", EXAMPLE);
    let mut config = config_for(&input);
    config.filter.expression = Some("simil >= 0.999 || simil < 0.25".to_string());

    let report = Pipeline::new(config).run().unwrap();
    assert_eq!(
        report.selected_ids(),
        ["2".to_string(), "3".to_string(), "4".to_string()]
    );
    assert_eq!(report.filter, "simil >= 0.999 || simil < 0.25");
}

#[test]
fn test_configured_band() {
    let dir = TempDir::new().unwrap();
    let input = write_input(&dir, "rss-out.csv", EXAMPLE);
    let mut config = config_for(&input);
    config.filter.band = SimilarityBand::new(0.995, 1.0).with_inclusive(false, true);

    let report = Pipeline::new(config).run().unwrap();
    assert_eq!(
        report.selected_ids(),
        ["1".to_string(), "3".to_string(), "4".to_string()]
    );
}

#[test]
fn test_missing_values_are_never_selected() {
    let dir = TempDir::new().unwrap();
    let input = write_input(
        &dir,
        "rss-out.csv",
        "rss_id,simil\n1,0.996\n2,\n3,0.2\n4,0.3\n",
    );

    let report = Pipeline::new(config_for(&input)).run().unwrap();
    assert_eq!(report.rows, 4);
    assert_eq!(report.summary.missing, 1);
    assert_eq!(report.summary.count, 3);
    assert_eq!(report.selected_ids(), ["1".to_string()]);
    assert_eq!(report.cluster_sizes.iter().sum::<usize>(), 3);
}

// === Clustering ===

#[test]
fn test_bimodal_input_two_centers() {
    let dir = TempDir::new().unwrap();
    let input = write_input(&dir, "rss-out.csv", &bimodal_csv());
    let mut config = AnalysisConfig::default();
    config.input = input;

    let report = Pipeline::new(config).run().unwrap();

    assert_eq!(report.num_clusters(), 2, "centers = {:?}", report.centers);
    let mut centers = report.centers.clone();
    centers.sort_by(f64::total_cmp);
    assert!((centers[0] - 0.1).abs() < 0.05, "centers = {:?}", centers);
    assert!((centers[1] - 0.9).abs() < 0.05, "centers = {:?}", centers);
    assert_eq!(report.cluster_sizes, vec![50, 50]);
    assert!(report.bandwidth > 0.0 && report.bandwidth < 0.1);
    assert!(report.selected.is_empty());
}

#[test]
fn test_histograms_follow_config() {
    let dir = TempDir::new().unwrap();
    let input = write_input(&dir, "rss-out.csv", &bimodal_csv());
    let mut config = AnalysisConfig::default();
    config.input = input;

    let report = Pipeline::new(config.clone()).run().unwrap();
    let bins: Vec<usize> = report.histograms.iter().map(|h| h.num_bins()).collect();
    assert_eq!(bins, vec![50, 500]);
    for hist in &report.histograms {
        assert_eq!(hist.total(), 100);
    }

    config.histogram.bins = vec![7];
    let report = Pipeline::new(config).run().unwrap();
    assert_eq!(report.histograms.len(), 1);
    assert_eq!(report.histograms[0].num_bins(), 7);
}

#[test]
fn test_constant_scores_fail_bandwidth_estimation() {
    let table = SimilarityTable::from_pairs((0..20).map(|i| (i.to_string(), 0.5))).unwrap();
    let result = Pipeline::new(AnalysisConfig::default()).run_on_table(table);
    assert!(matches!(result, Err(SimdistError::Stats(_))));
}

// === Outputs ===

#[test]
fn test_filtered_rows_exported() {
    let dir = TempDir::new().unwrap();
    let input = write_input(&dir, "rss-out.csv", EXAMPLE);
    let output = dir.path().join("near-duplicates.csv");
    let mut config = config_for(&input);
    config.filter.output = Some(output.clone());

    let report = Pipeline::new(config).run().unwrap();
    assert_eq!(report.written, vec![output.clone()]);

    let exported =
        SimilarityTable::load_csv(&output.to_string_lossy(), "rss_id", "simil").unwrap();
    assert_eq!(exported.ids(), report.selected.ids());
    assert_eq!(exported.values(), report.selected.values());
}

#[test]
fn test_figure_written() {
    let dir = TempDir::new().unwrap();
    let input = write_input(&dir, "rss-out.csv", &bimodal_csv());
    let figures = dir.path().join("figures");
    let mut config = AnalysisConfig::default();
    config.input = input;
    config.histogram.output_dir = Some(figures.clone());

    let report = Pipeline::new(config).run().unwrap();
    let path = figures.join("simil-histogram.svg");
    assert_eq!(report.written, vec![path.clone()]);

    let svg = std::fs::read_to_string(path).unwrap();
    assert!(svg.starts_with("<svg"));
    assert!(svg.contains("50 bins"));
    assert!(svg.contains("500 bins"));
    assert_eq!(svg.matches("center ").count(), 2);
}

#[test]
fn test_report_renders() {
    let dir = TempDir::new().unwrap();
    let input = write_input(&dir, "rss-out.csv", EXAMPLE);
    let report = Pipeline::new(config_for(&input)).run().unwrap();

    let text = report.render_text();
    assert!(text.contains("(5 rows)"));
    assert!(text.contains("-> 2 rows"));

    let json: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();
    assert_eq!(json["selected"]["ids"], serde_json::json!(["1", "3"]));
}

// === Input handling ===

#[test]
fn test_custom_columns_and_tsv() {
    let dir = TempDir::new().unwrap();
    let input = write_input(
        &dir,
        "pairs.tsv",
        "pair\tscore\textra\na\t0.999\tx\nb\t0.1\ty\nc\t0.12\tz\n",
    );
    let mut config = config_for(&input);
    config.id_column = "pair".to_string();
    config.value_column = "score".to_string();

    let report = Pipeline::new(config).run().unwrap();
    assert_eq!(report.selected_ids(), ["a".to_string()]);
    assert_eq!(report.selected.value_column(), "score");
    assert_eq!(report.filter, "(score > 0.995 && score < 1)");
}

#[test]
fn test_missing_file() {
    let config = config_for(Path::new("/nonexistent/rss-out.csv"));
    let result = Pipeline::new(config).run();
    assert!(matches!(
        result,
        Err(SimdistError::Data(IoError::FileNotFound(_)))
    ));
}

#[rstest]
#[case::id("rss_id", "pair")]
#[case::value("simil", "score")]
fn test_missing_column(#[case] present: &str, #[case] missing: &str) {
    let dir = TempDir::new().unwrap();
    let input = write_input(&dir, "rss-out.csv", &format!("{},other\n1,0.5\n", present));
    let mut config = config_for(&input);
    if present == "rss_id" {
        config.value_column = missing.to_string();
    } else {
        config.id_column = missing.to_string();
    }

    let result = Pipeline::new(config).run();
    match result {
        Err(SimdistError::Data(IoError::ColumnNotFound(column))) => assert_eq!(column, missing),
        other => panic!("expected missing column error, got {:?}", other),
    }
}

#[test]
fn test_non_numeric_score() {
    let dir = TempDir::new().unwrap();
    let input = write_input(&dir, "rss-out.csv", "rss_id,simil\n1,0.5\n2,high\n");
    let result = Pipeline::new(config_for(&input)).run();
    assert!(matches!(
        result,
        Err(SimdistError::Data(IoError::TypeMismatch { .. }))
    ));
}

#[test]
fn test_run_is_idempotent() {
    let dir = TempDir::new().unwrap();
    let input = write_input(&dir, "rss-out.csv", &bimodal_csv());
    let mut config = AnalysisConfig::default();
    config.input = input;
    config.filter.expression = Some("simil > 0.9".to_string());
    let pipeline = Pipeline::new(config);

    let first = pipeline.run().unwrap();
    let second = pipeline.run().unwrap();
    assert_eq!(first.selected.ids(), second.selected.ids());
    assert_eq!(first.selected.values(), second.selected.values());
    assert_eq!(first.centers, second.centers);
}

// === Properties ===

fn scores() -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(
        prop_oneof![
            0.0f64..=1.0,
            0.99f64..=1.0,
            Just(0.995),
            Just(1.0),
        ],
        1..60,
    )
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn filter_is_sound_and_complete(values in scores()) {
        let table = SimilarityTable::from_pairs(
            values.iter().enumerate().map(|(i, &v)| (i.to_string(), v)),
        ).unwrap();
        let mut config = AnalysisConfig::default();
        config.clustering.bandwidth = Some(0.1);

        let report = Pipeline::new(config).run_on_table(table).unwrap();

        let expected: Vec<String> = values
            .iter()
            .enumerate()
            .filter(|(_, v)| **v > 0.995 && **v < 1.0)
            .map(|(i, _)| i.to_string())
            .collect();
        prop_assert_eq!(report.selected_ids(), expected.as_slice());
        prop_assert!(report.selected.values().iter().all(|&v| v > 0.995 && v < 1.0));
    }

    #[test]
    fn extracted_column_keeps_length_and_order(values in scores()) {
        let dir = TempDir::new().unwrap();
        let mut csv = String::from("rss_id,simil\n");
        for (i, v) in values.iter().enumerate() {
            csv.push_str(&format!("r{},{}\n", i, v));
        }
        let input = write_input(&dir, "rss-out.csv", &csv);

        let table = SimilarityTable::load_csv(&input.to_string_lossy(), "rss_id", "simil").unwrap();
        prop_assert_eq!(table.len(), values.len());
        prop_assert_eq!(table.values(), values.as_slice());

        let report = Pipeline::new(config_for(&input)).run().unwrap();
        prop_assert_eq!(report.rows, values.len());
        prop_assert_eq!(report.cluster_sizes.iter().sum::<usize>(), values.len());
    }
}
