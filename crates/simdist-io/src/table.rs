//! Similarity table indexed by record identifier
//!
//! A `SimilarityTable` holds the two columns the analysis needs: a record
//! identifier (the primary index) and a floating-point similarity score.
//! Rows keep the order in which they appeared in the source file.

use crate::reader::{DataReader, IoError, IoResult};
use ndarray::Array2;
use serde::Serialize;
use std::collections::HashMap;
use tracing::{debug, warn};

/// Default name of the identifier column
pub const DEFAULT_ID_COLUMN: &str = "rss_id";

/// Default name of the similarity column
pub const DEFAULT_VALUE_COLUMN: &str = "simil";

/// One row of the table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimilarityRecord {
    pub id: String,
    pub simil: f64,
}

/// Ordered table of similarity records with an id lookup index
#[derive(Debug, Clone, Serialize)]
pub struct SimilarityTable {
    id_column: String,
    value_column: String,
    ids: Vec<String>,
    values: Vec<f64>,
    #[serde(skip)]
    index: HashMap<String, usize>,
}

impl SimilarityTable {
    /// Build a table from parallel id/value vectors
    pub fn new(ids: Vec<String>, values: Vec<f64>) -> IoResult<Self> {
        Self::with_columns(DEFAULT_ID_COLUMN, DEFAULT_VALUE_COLUMN, ids, values)
    }

    /// Build a table with custom column names
    pub fn with_columns(
        id_column: impl Into<String>,
        value_column: impl Into<String>,
        ids: Vec<String>,
        values: Vec<f64>,
    ) -> IoResult<Self> {
        if ids.len() != values.len() {
            return Err(IoError::InvalidFormat(format!(
                "id column has {} rows but value column has {}",
                ids.len(),
                values.len()
            )));
        }

        let mut index = HashMap::with_capacity(ids.len());
        for (row, id) in ids.iter().enumerate() {
            // First occurrence wins for lookups
            index.entry(id.clone()).or_insert(row);
        }

        Ok(Self {
            id_column: id_column.into(),
            value_column: value_column.into(),
            ids,
            values,
            index,
        })
    }

    /// Build a table from (id, value) pairs
    pub fn from_pairs<I, S>(pairs: I) -> IoResult<Self>
    where
        I: IntoIterator<Item = (S, f64)>,
        S: Into<String>,
    {
        let (ids, values): (Vec<String>, Vec<f64>) =
            pairs.into_iter().map(|(id, v)| (id.into(), v)).unzip();
        Self::new(ids, values)
    }

    /// Read the id and value columns from any reader
    pub fn from_reader(
        reader: &dyn DataReader,
        id_column: &str,
        value_column: &str,
    ) -> IoResult<Self> {
        let schema = reader.read_schema()?;
        if schema.column(id_column).is_none() {
            return Err(IoError::ColumnNotFound(id_column.to_string()));
        }
        let dtype = schema
            .column(value_column)
            .map(|c| c.dtype)
            .ok_or_else(|| IoError::ColumnNotFound(value_column.to_string()))?;

        // The sampled rows already hold a non-numeric score; report it without reading the ids
        if !dtype.is_numeric() {
            debug!(column = value_column, dtype = dtype.name(), "score column is not numeric");
            parse_scores(value_column, &reader.read_column_text(value_column)?)?;
        }

        let mut columns = reader.read_columns_text(&[id_column, value_column])?;
        let raw_values = columns.pop().unwrap_or_default();
        let ids = columns.pop().unwrap_or_default();
        let values = parse_scores(value_column, &raw_values)?;

        let table = Self::with_columns(id_column, value_column, ids, values)?;
        debug!(rows = table.len(), "loaded similarity table");

        let duplicates = table.duplicate_ids();
        if !duplicates.is_empty() {
            warn!(
                count = duplicates.len(),
                "identifier column contains duplicate ids; lookups return the first row"
            );
        }

        Ok(table)
    }

    /// Load a CSV file into a table
    #[cfg(feature = "csv")]
    pub fn load_csv(path: &str, id_column: &str, value_column: &str) -> IoResult<Self> {
        let reader = crate::reader::open_file(path)?;
        Self::from_reader(reader.as_ref(), id_column, value_column)
    }

    /// Name of the identifier column
    pub fn id_column(&self) -> &str {
        &self.id_column
    }

    /// Name of the similarity column
    pub fn value_column(&self) -> &str {
        &self.value_column
    }

    /// Number of rows
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Identifiers in row order
    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    /// The similarity vector, in row order
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Look up the similarity for an id
    pub fn get(&self, id: &str) -> Option<f64> {
        self.index.get(id).map(|&row| self.values[row])
    }

    /// Get a row by position
    pub fn row(&self, row: usize) -> Option<SimilarityRecord> {
        Some(SimilarityRecord {
            id: self.ids.get(row)?.clone(),
            simil: *self.values.get(row)?,
        })
    }

    /// Iterate over (id, simil) in row order
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> + '_ {
        self.ids
            .iter()
            .map(|s| s.as_str())
            .zip(self.values.iter().copied())
    }

    /// All rows as owned records
    pub fn records(&self) -> Vec<SimilarityRecord> {
        self.iter()
            .map(|(id, simil)| SimilarityRecord {
                id: id.to_string(),
                simil,
            })
            .collect()
    }

    /// Subset of rows whose mask entry is true, in original order
    pub fn select(&self, mask: &[bool]) -> IoResult<Self> {
        if mask.len() != self.len() {
            return Err(IoError::OutOfBounds {
                index: mask.len(),
                size: self.len(),
            });
        }

        let (ids, values): (Vec<String>, Vec<f64>) = self
            .iter()
            .zip(mask.iter())
            .filter(|(_, keep)| **keep)
            .map(|((id, v), _)| (id.to_string(), v))
            .unzip();

        Self::with_columns(&self.id_column, &self.value_column, ids, values)
    }

    /// Identifiers that occur more than once, in first-seen order
    pub fn duplicate_ids(&self) -> Vec<&str> {
        let mut seen: HashMap<&str, usize> = HashMap::new();
        let mut duplicates = Vec::new();
        for id in &self.ids {
            let count = seen.entry(id.as_str()).or_insert(0);
            *count += 1;
            if *count == 2 {
                duplicates.push(id.as_str());
            }
        }
        duplicates
    }

    /// The similarity vector as an (N, 1) feature matrix
    pub fn to_feature_matrix(&self) -> Array2<f64> {
        Array2::from_shape_vec((self.values.len(), 1), self.values.clone())
            .unwrap_or_else(|_| Array2::zeros((0, 1)))
    }
}

fn parse_scores(column: &str, raw: &[String]) -> IoResult<Vec<f64>> {
    raw.iter()
        .enumerate()
        .map(|(row, cell)| parse_score(column, row, cell))
        .collect()
}

fn parse_score(column: &str, row: usize, raw: &str) -> IoResult<f64> {
    if raw.is_empty() {
        return Ok(f64::NAN);
    }
    raw.parse::<f64>().map_err(|_| IoError::TypeMismatch {
        column: column.to_string(),
        row: row + 1,
        expected: "float".to_string(),
        actual: raw.to_string(),
    })
}
