//! CSV export of similarity tables

use crate::reader::{IoError, IoResult};
use crate::table::SimilarityTable;
use std::path::Path;

/// Write a table as `<id_column>,<value_column>` rows with a header
pub fn write_csv(table: &SimilarityTable, path: impl AsRef<Path>) -> IoResult<()> {
    let mut writer =
        csv::Writer::from_path(path.as_ref()).map_err(|e| IoError::OpenFailed(e.to_string()))?;

    writer
        .write_record([table.id_column(), table.value_column()])
        .map_err(|e| IoError::Io(e.to_string()))?;

    for (id, simil) in table.iter() {
        let value = if simil.is_nan() {
            String::new()
        } else {
            simil.to_string()
        };
        writer
            .write_record([id, value.as_str()])
            .map_err(|e| IoError::Io(e.to_string()))?;
    }

    writer.flush()?;
    Ok(())
}
