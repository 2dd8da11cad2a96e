//! Schema and column types for tabular data

use serde::{Deserialize, Serialize};

/// Schema describing the structure of a dataset
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DataSchema {
    /// Column descriptors
    pub columns: Vec<ColumnDescriptor>,

    /// Number of records
    pub num_records: usize,
}

impl DataSchema {
    /// Create a new schema
    pub fn new(columns: Vec<ColumnDescriptor>, num_records: usize) -> Self {
        Self {
            columns,
            num_records,
        }
    }

    /// Get a column by name
    pub fn column(&self, name: &str) -> Option<&ColumnDescriptor> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Get column index by name
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    /// Get column names
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// Number of columns
    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }
}

/// Descriptor for a column
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnDescriptor {
    /// Column name
    pub name: String,

    /// Inferred data type
    pub dtype: ColumnType,
}

impl ColumnDescriptor {
    pub fn new(name: impl Into<String>, dtype: ColumnType) -> Self {
        Self {
            name: name.into(),
            dtype,
        }
    }
}

/// Column data type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColumnType {
    Float64,
    Int64,
    Bool,
    String,
}

impl ColumnType {
    /// Check if this is a numeric type
    pub fn is_numeric(&self) -> bool {
        matches!(self, ColumnType::Float64 | ColumnType::Int64)
    }

    pub fn name(&self) -> &'static str {
        match self {
            ColumnType::Float64 => "float",
            ColumnType::Int64 => "integer",
            ColumnType::Bool => "bool",
            ColumnType::String => "string",
        }
    }
}
