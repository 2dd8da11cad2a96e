//! Expression evaluation over a similarity table

use simdist_io::SimilarityTable;
use simdist_selection::{EvalContext, FieldStats};
use simdist_stats::{percentile_table, SummaryStats};

/// Exposes the score column of a [`SimilarityTable`] to the filter evaluator
///
/// The only field is the table's value column. Statistics for `zscore`,
/// `robust_zscore` and `percentile` are computed once, over finite values.
pub struct TableContext<'a> {
    table: &'a SimilarityTable,
    stats: Option<FieldStats>,
}

impl<'a> TableContext<'a> {
    pub fn new(table: &'a SimilarityTable) -> Self {
        let values = table.values();
        let summary = SummaryStats::from_data(values);
        let stats = percentile_table(values).map(|percentiles| FieldStats {
            mean: summary.mean,
            std_dev: summary.std_dev,
            median: summary.median,
            mad: summary.mad,
            percentiles,
        });

        Self { table, stats }
    }
}

impl EvalContext for TableContext<'_> {
    fn has_field(&self, field: &str) -> bool {
        field == self.table.value_column()
    }

    fn field_value(&self, field: &str, index: usize) -> Option<f64> {
        if field == self.table.value_column() {
            self.table.values().get(index).copied()
        } else {
            None
        }
    }

    fn num_rows(&self) -> usize {
        self.table.len()
    }

    fn field_stats(&self, field: &str) -> Option<&FieldStats> {
        if field == self.table.value_column() {
            self.stats.as_ref()
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use simdist_selection::{parse_selection, EvalError, Evaluator};

    fn table() -> SimilarityTable {
        SimilarityTable::from_pairs([("a", 0.1), ("b", 0.5), ("c", 0.9), ("d", f64::NAN)]).unwrap()
    }

    #[test]
    fn test_value_column_lookup() {
        let table = table();
        let ctx = TableContext::new(&table);
        assert_eq!(ctx.num_rows(), 4);
        assert_eq!(ctx.field_value("simil", 2), Some(0.9));
        assert_eq!(ctx.field_value("simil", 9), None);
        assert_eq!(ctx.field_value("rss_id", 0), None);
        assert!(ctx.has_field("simil"));
        assert!(!ctx.has_field("rss_id"));
    }

    #[test]
    fn test_empty_table_reports_unknown_names() {
        let table = SimilarityTable::from_pairs(Vec::<(String, f64)>::new()).unwrap();
        let ctx = TableContext::new(&table);
        let eval = Evaluator::new(&ctx);

        let expr = parse_selection("score > 0").unwrap();
        assert_eq!(
            eval.evaluate(&expr),
            Err(EvalError::FieldNotFound("score".to_string()))
        );
        let expr = parse_selection("simil > 0").unwrap();
        assert_eq!(eval.evaluate(&expr), Ok(Vec::new()));
    }

    #[test]
    fn test_stats_ignore_nan() {
        let table = table();
        let ctx = TableContext::new(&table);
        let stats = ctx.field_stats("simil").unwrap();
        assert!((stats.mean - 0.5).abs() < 1e-12);
        assert_eq!(stats.median, 0.5);
        assert_eq!(stats.percentile(0.0), 0.1);
        assert_eq!(stats.percentile(100.0), 0.9);
    }

    #[test]
    fn test_expression_over_table() {
        let table = table();
        let ctx = TableContext::new(&table);
        let eval = Evaluator::new(&ctx);

        let expr = parse_selection("simil > percentile(simil, 50)").unwrap();
        assert_eq!(eval.evaluate(&expr).unwrap(), vec![false, false, true, false]);

        let expr = parse_selection("score > 0").unwrap();
        assert_eq!(
            eval.evaluate(&expr),
            Err(EvalError::FieldNotFound("score".to_string()))
        );
    }

    #[test]
    fn test_no_finite_values() {
        let table = SimilarityTable::from_pairs([("a", f64::NAN)]).unwrap();
        let ctx = TableContext::new(&table);
        assert!(ctx.field_stats("simil").is_none());
    }
}
