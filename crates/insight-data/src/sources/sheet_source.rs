//! Spreadsheet parsing (xlsx, xlsm, xlsb, xls, ods)

use std::io::Cursor;
use calamine::{open_workbook_auto_from_rs, Data, Reader};
use tracing::{debug, warn};

use insight_core::format_number;
use super::ParsedFile;
use crate::DataError;

/// Parse the first worksheet of a workbook.
///
/// The first non-empty row of the sheet's used range is the header.
pub fn parse_workbook(bytes: &[u8]) -> Result<ParsedFile, DataError> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))?;

    let sheet_name = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(|| DataError::Parse("workbook has no sheets".to_string()))?;

    let range = workbook.worksheet_range(&sheet_name)?;
    let mut rows = range.rows();

    let header = rows
        .next()
        .ok_or_else(|| DataError::Parse(format!("sheet '{}' is empty", sheet_name)))?;

    let mut parsed = ParsedFile {
        header: header
            .iter()
            .map(|cell| render_cell(cell).unwrap_or_default())
            .collect(),
        records: Vec::new(),
    };

    for (idx, row) in rows.enumerate() {
        let values = row.iter().map(render_cell).collect();
        // header is line 1
        parsed.push_record(values, idx as u64 + 2)?;
    }

    debug!(
        "Parsed sheet '{}': {} columns, {} records",
        sheet_name,
        parsed.header.len(),
        parsed.records.len()
    );
    Ok(parsed)
}

/// Render a cell the way it would appear as text in a delimited export
fn render_cell(cell: &Data) -> Option<String> {
    match cell {
        Data::Empty => None,
        Data::String(s) => Some(s.clone()),
        Data::Int(i) => Some(i.to_string()),
        Data::Float(f) => Some(format_number(*f)),
        Data::Bool(b) => Some(b.to_string()),
        Data::DateTime(dt) => Some(
            dt.as_datetime()
                .map(|d| d.to_string())
                .unwrap_or_else(|| format_number(dt.as_f64())),
        ),
        Data::DateTimeIso(s) => Some(s.clone()),
        Data::DurationIso(s) => Some(s.clone()),
        Data::Error(e) => {
            warn!("Spreadsheet cell error {:?} imported as empty", e);
            None
        }
    }
}
