//! Expression evaluation for selection
//!
//! Evaluates selection expressions against table rows.

use crate::ast::*;
use thiserror::Error;

/// Evaluation errors
#[derive(Debug, Error, Clone, PartialEq)]
pub enum EvalError {
    #[error("Field not found: {0}")]
    FieldNotFound(String),

    #[error("No statistics available for field: {0}")]
    StatsUnavailable(String),

    #[error("Unknown function: {0}")]
    UnknownFunction(String),

    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),
}

/// Result type for evaluation
pub type EvalResult<T> = Result<T, EvalError>;

/// Functions the evaluator understands
pub const FUNCTIONS: [&str; 6] = ["abs", "sqrt", "log10", "zscore", "robust_zscore", "percentile"];

/// Context for evaluation - provides field values
pub trait EvalContext {
    /// Whether rows have a value for this field
    fn has_field(&self, field: &str) -> bool;

    /// Get the value of a field at a row index
    fn field_value(&self, field: &str, index: usize) -> Option<f64>;

    /// Get the number of rows
    fn num_rows(&self) -> usize;

    /// Get computed statistics for a field
    fn field_stats(&self, field: &str) -> Option<&FieldStats>;
}

/// Pre-computed statistics for a field
#[derive(Debug, Clone)]
pub struct FieldStats {
    pub mean: f64,
    pub std_dev: f64,
    pub median: f64,
    pub mad: f64,
    /// 0th to 100th percentile
    pub percentiles: [f64; 101],
}

impl FieldStats {
    /// Compute z-score
    pub fn zscore(&self, value: f64) -> f64 {
        if self.std_dev == 0.0 {
            return 0.0;
        }
        (value - self.mean) / self.std_dev
    }

    /// Compute robust z-score (using median and MAD)
    pub fn robust_zscore(&self, value: f64) -> f64 {
        if self.mad == 0.0 {
            return 0.0;
        }
        (value - self.median) / (1.4826 * self.mad)
    }

    /// Get percentile value
    pub fn percentile(&self, p: f64) -> f64 {
        let p = p.clamp(0.0, 100.0);
        let idx = p.floor() as usize;
        let frac = p.fract();

        if idx >= 100 {
            self.percentiles[100]
        } else {
            self.percentiles[idx] * (1.0 - frac) + self.percentiles[idx + 1] * frac
        }
    }
}

/// Evaluator for selection expressions
pub struct Evaluator<'a, C: EvalContext> {
    context: &'a C,
}

impl<'a, C: EvalContext> Evaluator<'a, C> {
    /// Create a new evaluator
    pub fn new(context: &'a C) -> Self {
        Self { context }
    }

    /// Evaluate an expression, returning a selection mask
    ///
    /// Field and function names are checked before any row is visited, so an
    /// empty table reports the same errors as a full one.
    pub fn evaluate(&self, expr: &SelectionExpr) -> EvalResult<Vec<bool>> {
        self.check(expr)?;
        (0..self.context.num_rows())
            .map(|i| self.evaluate_at(expr, i))
            .collect()
    }

    /// Check that every field and function the expression names exists
    pub fn check(&self, expr: &SelectionExpr) -> EvalResult<()> {
        match expr {
            SelectionExpr::All | SelectionExpr::None => Ok(()),
            SelectionExpr::And(left, right) | SelectionExpr::Or(left, right) => {
                self.check(left)?;
                self.check(right)
            }
            SelectionExpr::Not(inner) => self.check(inner),
            SelectionExpr::Comparison(cmp) => {
                self.check_value(&cmp.lhs)?;
                self.check_value(&cmp.rhs)
            }
        }
    }

    fn check_value(&self, value: &Value) -> EvalResult<()> {
        match value {
            Value::Number(_) => Ok(()),
            Value::Field(name) if self.context.has_field(name) => Ok(()),
            Value::Field(name) => Err(EvalError::FieldNotFound(name.clone())),
            Value::Function(func) => {
                if !FUNCTIONS.contains(&func.name.as_str()) {
                    return Err(EvalError::UnknownFunction(func.name.clone()));
                }
                func.args.iter().try_for_each(|arg| self.check_value(arg))
            }
        }
    }

    /// Evaluate an expression at a single row index
    pub fn evaluate_at(&self, expr: &SelectionExpr, index: usize) -> EvalResult<bool> {
        match expr {
            SelectionExpr::All => Ok(true),
            SelectionExpr::None => Ok(false),

            SelectionExpr::And(left, right) => {
                Ok(self.evaluate_at(left, index)? && self.evaluate_at(right, index)?)
            }

            SelectionExpr::Or(left, right) => {
                Ok(self.evaluate_at(left, index)? || self.evaluate_at(right, index)?)
            }

            SelectionExpr::Not(inner) => Ok(!self.evaluate_at(inner, index)?),

            SelectionExpr::Comparison(cmp) => self.evaluate_comparison(cmp, index),
        }
    }

    /// Evaluate a comparison predicate
    fn evaluate_comparison(&self, cmp: &Comparison, index: usize) -> EvalResult<bool> {
        let lhs = self.evaluate_value(&cmp.lhs, index)?;
        let rhs = self.evaluate_value(&cmp.rhs, index)?;
        Ok(cmp.op.evaluate(lhs, rhs))
    }

    /// Evaluate a value
    fn evaluate_value(&self, value: &Value, index: usize) -> EvalResult<f64> {
        match value {
            Value::Number(n) => Ok(*n),
            Value::Field(name) => self.field(name, index),
            Value::Function(func) => self.evaluate_function(func, index),
        }
    }

    fn field(&self, name: &str, index: usize) -> EvalResult<f64> {
        self.context
            .field_value(name, index)
            .ok_or_else(|| EvalError::FieldNotFound(name.to_string()))
    }

    fn stats(&self, name: &str) -> EvalResult<&FieldStats> {
        self.context
            .field_stats(name)
            .ok_or_else(|| EvalError::StatsUnavailable(name.to_string()))
    }

    /// Evaluate a function call
    fn evaluate_function(&self, func: &FunctionCall, index: usize) -> EvalResult<f64> {
        match func.name.as_str() {
            "zscore" | "robust_zscore" => {
                let field = match func.args.first() {
                    Some(Value::Field(f)) => f,
                    _ => {
                        return Err(EvalError::InvalidArguments(format!(
                            "{} requires a field argument",
                            func.name
                        )))
                    }
                };

                let value = self.field(field, index)?;
                let stats = self.stats(field)?;
                Ok(if func.name == "zscore" {
                    stats.zscore(value)
                } else {
                    stats.robust_zscore(value)
                })
            }

            "percentile" => {
                let (field, p) = match (func.args.first(), func.args.get(1)) {
                    (Some(Value::Field(f)), Some(Value::Number(p))) => (f, *p),
                    _ => {
                        return Err(EvalError::InvalidArguments(
                            "percentile requires (field, p) arguments".to_string(),
                        ))
                    }
                };

                // Value at percentile p, so `simil > percentile(simil, 99)` keeps the top percent
                Ok(self.stats(field)?.percentile(p))
            }

            "abs" | "sqrt" | "log10" => {
                let value = match func.args.first() {
                    Some(v) => self.evaluate_value(v, index)?,
                    None => {
                        return Err(EvalError::InvalidArguments(format!(
                            "{} requires an argument",
                            func.name
                        )))
                    }
                };
                Ok(match func.name.as_str() {
                    "abs" => value.abs(),
                    "sqrt" => value.sqrt(),
                    _ => value.log10(),
                })
            }

            _ => Err(EvalError::UnknownFunction(func.name.clone())),
        }
    }
}

/// Count the number of selected rows
pub fn count_selected(mask: &[bool]) -> usize {
    mask.iter().filter(|&&b| b).count()
}

/// Get indices of selected rows
pub fn selected_indices(mask: &[bool]) -> Vec<usize> {
    mask.iter()
        .enumerate()
        .filter_map(|(i, &b)| if b { Some(i) } else { None })
        .collect()
}

/// Invert a selection mask
pub fn invert_mask(mask: &[bool]) -> Vec<bool> {
    mask.iter().map(|&b| !b).collect()
}
