//! CSV file reader with type inference

use crate::reader::{DataReader, IoError, IoResult};
use crate::schema::{ColumnDescriptor, ColumnType, DataSchema};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tracing::debug;

/// Number of leading rows sampled for type inference
const INFERENCE_ROWS: usize = 100;

/// CSV file reader
pub struct CsvReader {
    path: String,
    schema: DataSchema,
    delimiter: u8,
    has_header: bool,
}

impl CsvReader {
    /// Open a comma-separated file with a header row
    pub fn open(path: &str) -> IoResult<Self> {
        Self::open_with_options(path, b',', true)
    }

    /// Open a CSV file with options
    pub fn open_with_options(path: &str, delimiter: u8, has_header: bool) -> IoResult<Self> {
        if !Path::new(path).exists() {
            return Err(IoError::FileNotFound(path.to_string()));
        }

        let mut reader = build_reader(path, delimiter, has_header)?;
        let schema = Self::infer_schema(&mut reader, has_header)?;
        debug!(
            path,
            columns = schema.num_columns(),
            records = schema.num_records,
            "inferred CSV schema"
        );

        Ok(Self {
            path: path.to_string(),
            schema,
            delimiter,
            has_header,
        })
    }

    fn infer_schema(
        reader: &mut csv::Reader<BufReader<File>>,
        has_header: bool,
    ) -> IoResult<DataSchema> {
        let headers: Option<Vec<String>> = if has_header {
            Some(
                reader
                    .headers()
                    .map_err(|e| IoError::InvalidFormat(e.to_string()))?
                    .iter()
                    .map(|s| s.trim().to_string())
                    .collect(),
            )
        } else {
            None
        };

        let mut sample_values: Vec<Vec<String>> = Vec::new();
        let mut num_records = 0;

        for result in reader.records() {
            let record = result.map_err(|e| IoError::InvalidFormat(e.to_string()))?;
            if num_records < INFERENCE_ROWS {
                if sample_values.len() < record.len() {
                    sample_values.resize(record.len(), Vec::new());
                }
                for (i, value) in record.iter().enumerate() {
                    sample_values[i].push(value.trim().to_string());
                }
            }
            num_records += 1;
        }

        // Without a header row, columns are named by position
        let headers = headers.unwrap_or_else(|| {
            (0..sample_values.len())
                .map(|i| format!("col_{}", i))
                .collect()
        });

        let columns: Vec<ColumnDescriptor> = headers
            .into_iter()
            .enumerate()
            .map(|(i, name)| {
                let dtype = sample_values
                    .get(i)
                    .map(|values| infer_type(values))
                    .unwrap_or(ColumnType::String);
                ColumnDescriptor::new(name, dtype)
            })
            .collect();

        Ok(DataSchema::new(columns, num_records))
    }

    fn column_position(&self, name: &str) -> IoResult<usize> {
        self.schema
            .column_index(name)
            .ok_or_else(|| IoError::ColumnNotFound(name.to_string()))
    }

    fn reopen(&self) -> IoResult<csv::Reader<BufReader<File>>> {
        build_reader(&self.path, self.delimiter, self.has_header)
    }
}

fn build_reader(
    path: &str,
    delimiter: u8,
    has_header: bool,
) -> IoResult<csv::Reader<BufReader<File>>> {
    let file = File::open(path).map_err(|e| IoError::OpenFailed(e.to_string()))?;
    Ok(csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(has_header)
        .from_reader(BufReader::new(file)))
}

impl DataReader for CsvReader {
    fn read_schema(&self) -> IoResult<DataSchema> {
        Ok(self.schema.clone())
    }

    fn read_columns_text(&self, names: &[&str]) -> IoResult<Vec<Vec<String>>> {
        let positions = names
            .iter()
            .map(|name| self.column_position(name))
            .collect::<IoResult<Vec<usize>>>()?;
        let mut reader = self.reopen()?;

        let mut columns: Vec<Vec<String>> = positions
            .iter()
            .map(|_| Vec::with_capacity(self.schema.num_records))
            .collect();
        for result in reader.records() {
            let record = result.map_err(|e| IoError::InvalidFormat(e.to_string()))?;
            for (column, &pos) in columns.iter_mut().zip(&positions) {
                column.push(record.get(pos).unwrap_or("").trim().to_string());
            }
        }

        Ok(columns)
    }

    fn path(&self) -> Option<&str> {
        Some(&self.path)
    }

    fn format_name(&self) -> &'static str {
        "CSV"
    }
}

/// Infer column type from sample values
fn infer_type(values: &[String]) -> ColumnType {
    let non_empty: Vec<&str> = values
        .iter()
        .map(|s| s.as_str())
        .filter(|s| !s.is_empty())
        .collect();
    if non_empty.is_empty() {
        return ColumnType::String;
    }

    if non_empty.iter().all(|s| s.parse::<i64>().is_ok()) {
        return ColumnType::Int64;
    }

    if non_empty.iter().all(|s| s.parse::<f64>().is_ok()) {
        return ColumnType::Float64;
    }

    if non_empty
        .iter()
        .all(|s| matches!(s.to_lowercase().as_str(), "true" | "false" | "yes" | "no"))
    {
        return ColumnType::Bool;
    }

    ColumnType::String
}
