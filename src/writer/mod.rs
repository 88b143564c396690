//! CSV export - header and rows back to text

use crate::error::{GridError, GridResult};
use crate::types::{Row, Table};
use std::path::Path;

/// File name offered when the caller does not pick one
pub const DEFAULT_EXPORT_NAME: &str = "edited.csv";

/// Serialize a header and its rows to CSV text.
///
/// Every record ends with `\n`. Fields are quoted only when they contain a
/// comma, a quote or a line break; quotes inside a quoted field are doubled.
/// A record made of a single empty field is written as `""` so it does not
/// read back as a blank line.
///
/// A table with no header has no columns to write, so it serializes to the
/// empty string even when it holds (zero-width) rows. Parsing the result
/// gives back an empty table. Tables with a non-empty header round-trip
/// exactly.
///
/// # Example
/// ```
/// use csvgrid::writer::serialize;
///
/// let header = vec!["name".to_string(), "quote".to_string()];
/// let rows = vec![vec!["Bob".to_string(), "He said, \"hi\"".to_string()]];
/// let text = serialize(&header, &rows)?;
/// assert_eq!(text, "name,quote\nBob,\"He said, \"\"hi\"\"\"\n");
/// # Ok::<(), csvgrid::error::GridError>(())
/// ```
pub fn serialize(header: &[String], rows: &[Row]) -> GridResult<String> {
    if header.is_empty() {
        return Ok(String::new());
    }

    let mut writer = csv::WriterBuilder::new()
        .flexible(true)
        .quote_style(csv::QuoteStyle::Necessary)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    writer.write_record(header)?;
    for row in rows {
        writer.write_record(row)?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| GridError::Io(e.into_error()))?;

    String::from_utf8(bytes).map_err(|e| GridError::Encoding {
        offset: e.utf8_error().valid_up_to(),
    })
}

pub fn serialize_table(table: &Table) -> GridResult<String> {
    serialize(&table.header, &table.rows)
}

/// Serialize a table and write it to `path`
pub fn write_csv_file(path: &Path, table: &Table) -> GridResult<()> {
    let content = serialize_table(table)?;
    std::fs::write(path, content)?;
    Ok(())
}

/// Name for a downloaded export, always with a `.csv` extension
pub fn export_file_name(stem: &str) -> String {
    let stem = stem.trim();
    if stem.is_empty() {
        return DEFAULT_EXPORT_NAME.to_string();
    }
    if stem.to_ascii_lowercase().ends_with(".csv") {
        stem.to_string()
    } else {
        format!("{stem}.csv")
    }
}
