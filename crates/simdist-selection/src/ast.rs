//! Abstract Syntax Tree for selection expressions

use serde::{Deserialize, Serialize};
use std::fmt;

/// A selection expression
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SelectionExpr {
    /// Logical AND of two expressions
    And(Box<SelectionExpr>, Box<SelectionExpr>),

    /// Logical OR of two expressions
    Or(Box<SelectionExpr>, Box<SelectionExpr>),

    /// Logical NOT of an expression
    Not(Box<SelectionExpr>),

    /// A comparison predicate
    Comparison(Comparison),

    /// All rows (constant true)
    All,

    /// No rows (constant false)
    None,
}

impl SelectionExpr {
    /// Create an AND expression
    pub fn and(left: SelectionExpr, right: SelectionExpr) -> Self {
        SelectionExpr::And(Box::new(left), Box::new(right))
    }

    /// Create an OR expression
    pub fn or(left: SelectionExpr, right: SelectionExpr) -> Self {
        SelectionExpr::Or(Box::new(left), Box::new(right))
    }

    /// Create a NOT expression
    #[allow(clippy::should_implement_trait)]
    pub fn not(expr: SelectionExpr) -> Self {
        SelectionExpr::Not(Box::new(expr))
    }

    /// Names of all fields the expression reads, in first-use order
    pub fn fields(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_fields(&mut out);
        out
    }

    fn collect_fields<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            SelectionExpr::And(l, r) | SelectionExpr::Or(l, r) => {
                l.collect_fields(out);
                r.collect_fields(out);
            }
            SelectionExpr::Not(inner) => inner.collect_fields(out),
            SelectionExpr::Comparison(cmp) => {
                cmp.lhs.collect_fields(out);
                cmp.rhs.collect_fields(out);
            }
            SelectionExpr::All | SelectionExpr::None => {}
        }
    }
}

impl fmt::Display for SelectionExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SelectionExpr::And(l, r) => write!(f, "({} && {})", l, r),
            SelectionExpr::Or(l, r) => write!(f, "({} || {})", l, r),
            SelectionExpr::Not(inner) => write!(f, "!{}", inner),
            SelectionExpr::Comparison(cmp) => write!(f, "{}", cmp),
            SelectionExpr::All => write!(f, "all"),
            SelectionExpr::None => write!(f, "none"),
        }
    }
}

/// A comparison predicate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comparison {
    /// Left-hand side (usually a field name)
    pub lhs: Value,
    /// Comparison operator
    pub op: ComparisonOp,
    /// Right-hand side (usually a literal)
    pub rhs: Value,
}

impl Comparison {
    /// Create a new comparison
    pub fn new(lhs: Value, op: ComparisonOp, rhs: Value) -> Self {
        Self { lhs, op, rhs }
    }

    /// Create a `field <op> value` comparison
    pub fn field(field: &str, op: ComparisonOp, value: f64) -> Self {
        Self::new(Value::Field(field.to_string()), op, Value::Number(value))
    }

    /// Create a field < value comparison
    pub fn field_lt(field: &str, value: f64) -> Self {
        Self::field(field, ComparisonOp::Lt, value)
    }

    /// Create a field > value comparison
    pub fn field_gt(field: &str, value: f64) -> Self {
        Self::field(field, ComparisonOp::Gt, value)
    }
}

impl fmt::Display for Comparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.lhs, self.op.as_str(), self.rhs)
    }
}

/// Comparison operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ComparisonOp {
    /// Less than (<)
    Lt,
    /// Less than or equal (<=)
    Le,
    /// Greater than (>)
    Gt,
    /// Greater than or equal (>=)
    Ge,
    /// Equal (==)
    Eq,
    /// Not equal (!=)
    Ne,
}

impl ComparisonOp {
    /// Evaluate the comparison for two f64 values
    ///
    /// Every comparison involving NaN is false, except `!=`.
    pub fn evaluate(&self, lhs: f64, rhs: f64) -> bool {
        match self {
            ComparisonOp::Lt => lhs < rhs,
            ComparisonOp::Le => lhs <= rhs,
            ComparisonOp::Gt => lhs > rhs,
            ComparisonOp::Ge => lhs >= rhs,
            ComparisonOp::Eq => (lhs - rhs).abs() < 1e-10,
            ComparisonOp::Ne => !((lhs - rhs).abs() < 1e-10),
        }
    }

    /// Get the string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            ComparisonOp::Lt => "<",
            ComparisonOp::Le => "<=",
            ComparisonOp::Gt => ">",
            ComparisonOp::Ge => ">=",
            ComparisonOp::Eq => "==",
            ComparisonOp::Ne => "!=",
        }
    }
}

/// A value in an expression
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    /// A field reference
    Field(String),
    /// A numeric literal
    Number(f64),
    /// A function call
    Function(FunctionCall),
}

impl Value {
    fn collect_fields<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Value::Field(name) => {
                if !out.contains(&name.as_str()) {
                    out.push(name);
                }
            }
            Value::Number(_) => {}
            Value::Function(func) => {
                for arg in &func.args {
                    arg.collect_fields(out);
                }
            }
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Field(name) => write!(f, "{}", name),
            Value::Number(n) => write!(f, "{}", n),
            Value::Function(func) => {
                let args: Vec<String> = func.args.iter().map(|a| a.to_string()).collect();
                write!(f, "{}({})", func.name, args.join(", "))
            }
        }
    }
}

/// A function call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionCall {
    /// Function name
    pub name: String,
    /// Arguments
    pub args: Vec<Value>,
}

impl FunctionCall {
    /// Create a new function call
    pub fn new(name: impl Into<String>, args: Vec<Value>) -> Self {
        Self {
            name: name.into(),
            args,
        }
    }

    /// Create a zscore(field) call
    pub fn zscore(field: &str) -> Self {
        Self::new("zscore", vec![Value::Field(field.to_string())])
    }
}
