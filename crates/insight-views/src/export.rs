//! CSV export of query results

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;
use csv::{QuoteStyle, Terminator, WriterBuilder};
use thiserror::Error;
use tracing::info;

use insight_core::QueryResult;

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Write the header and every row, all fields quoted.
///
/// Each record ends with `\n`. Nulls become `""` and numbers use their
/// shortest form, so `3.0` is written as `3`.
pub fn write_csv<W: Write>(result: &QueryResult, writer: W) -> Result<(), ExportError> {
    if result.columns.is_empty() {
        return Ok(());
    }

    let mut csv_writer = WriterBuilder::new()
        .quote_style(QuoteStyle::Always)
        .terminator(Terminator::Any(b'\n'))
        .from_writer(writer);

    csv_writer.write_record(&result.columns)?;
    for row in &result.rows {
        csv_writer.write_record(row.iter().map(|cell| cell.to_string()))?;
    }
    csv_writer.flush()?;
    Ok(())
}

/// Render a result as CSV text with lines joined by `\n` (no trailing newline)
pub fn to_csv_string(result: &QueryResult) -> Result<String, ExportError> {
    let mut buffer = Vec::new();
    write_csv(result, &mut buffer)?;
    if buffer.last() == Some(&b'\n') {
        buffer.pop();
    }
    String::from_utf8(buffer).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e).into())
}

/// Export a result to a file
pub fn export_to_path(result: &QueryResult, path: &Path) -> Result<(), ExportError> {
    let text = to_csv_string(result)?;
    let mut file = File::create(path)?;
    file.write_all(text.as_bytes())?;
    info!("Exported {} rows to {}", result.row_count(), path.display());
    Ok(())
}
