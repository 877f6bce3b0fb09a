//! Delimited text parsing

use csv::{ReaderBuilder, StringRecord};
use tracing::debug;

use super::ParsedFile;
use crate::DataError;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Parse CSV/TSV bytes: the first record is the header, the rest are data.
///
/// A UTF-8 byte-order mark is stripped, quoted delimiters are handled by
/// the reader, and blank lines are skipped.
pub fn parse_delimited(bytes: &[u8], delimiter: u8) -> Result<ParsedFile, DataError> {
    let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);

    let mut csv_reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(delimiter)
        .from_reader(bytes);

    let mut record = StringRecord::new();
    if !csv_reader.read_record(&mut record)? {
        return Err(DataError::Parse("file is empty".to_string()));
    }

    let mut parsed = ParsedFile {
        header: record.iter().map(|s| s.to_string()).collect(),
        records: Vec::new(),
    };

    while csv_reader.read_record(&mut record)? {
        let line = record.position().map(|p| p.line()).unwrap_or_default();
        let values = record
            .iter()
            .map(|s| if s.is_empty() { None } else { Some(s.to_string()) })
            .collect();
        parsed.push_record(values, line)?;
    }

    debug!("Parsed {} columns and {} records", parsed.header.len(), parsed.records.len());
    Ok(parsed)
}
