//! Data reader trait and common types
//!
//! The `DataReader` trait provides a uniform interface for reading
//! tabular data regardless of the file format it came from.

use crate::schema::DataSchema;
use thiserror::Error;

/// Errors that can occur during I/O operations
#[derive(Debug, Error)]
pub enum IoError {
    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("Failed to open file: {0}")]
    OpenFailed(String),

    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    #[error("Column not found: {0}")]
    ColumnNotFound(String),

    #[error("Type mismatch in column '{column}' at row {row}: expected {expected}, got '{actual}'")]
    TypeMismatch {
        column: String,
        row: usize,
        expected: String,
        actual: String,
    },

    #[error("Out of bounds: index {index}, size {size}")]
    OutOfBounds { index: usize, size: usize },

    #[error("I/O error: {0}")]
    Io(String),
}

impl From<std::io::Error> for IoError {
    fn from(err: std::io::Error) -> Self {
        IoError::Io(err.to_string())
    }
}

/// Result type for I/O operations
pub type IoResult<T> = Result<T, IoError>;

/// Trait for reading tabular data from various formats
pub trait DataReader: Send + Sync {
    /// Read the schema (column names, types, record count)
    fn read_schema(&self) -> IoResult<DataSchema>;

    /// Read several columns as raw cell text in one pass, in the order named
    fn read_columns_text(&self, names: &[&str]) -> IoResult<Vec<Vec<String>>>;

    /// Read a single column by name as the raw cell text
    fn read_column_text(&self, name: &str) -> IoResult<Vec<String>> {
        Ok(self.read_columns_text(&[name])?.pop().unwrap_or_default())
    }

    /// Get the file path (if applicable)
    fn path(&self) -> Option<&str> {
        None
    }

    /// Get the format name
    fn format_name(&self) -> &'static str;
}

/// A boxed reader for dynamic dispatch
pub type BoxedReader = Box<dyn DataReader>;

/// Open a file and return an appropriate reader
///
/// The format is auto-detected from the file extension.
pub fn open_file(path: &str) -> IoResult<BoxedReader> {
    let extension = path
        .rsplit('.')
        .next()
        .map(|s| s.to_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        #[cfg(feature = "csv")]
        "csv" => {
            use crate::csv_reader::CsvReader;
            Ok(Box::new(CsvReader::open(path)?))
        }

        #[cfg(feature = "csv")]
        "tsv" => {
            use crate::csv_reader::CsvReader;
            Ok(Box::new(CsvReader::open_with_options(path, b'\t', true)?))
        }

        _ => Err(IoError::InvalidFormat(format!(
            "Unknown file extension: {}",
            extension
        ))),
    }
}

/// List supported file extensions
pub fn supported_extensions() -> Vec<&'static str> {
    let mut extensions = Vec::new();

    #[cfg(feature = "csv")]
    {
        extensions.push("csv");
        extensions.push("tsv");
    }

    extensions
}
