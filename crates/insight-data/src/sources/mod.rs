pub mod csv_source;
pub mod sheet_source;
pub mod sqlite_store;

pub use sqlite_store::TableStore;

use crate::config::FileFormat;
use crate::DataError;

/// Header plus raw records as handed over by a file parser.
///
/// Every record is exactly `header.len()` wide; absent values are `None`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedFile {
    pub header: Vec<String>,
    pub records: Vec<Vec<Option<String>>>,
}

impl ParsedFile {
    /// Align a record with the header, padding short records with `None`.
    ///
    /// Extra trailing fields are accepted only when they are blank.
    pub(crate) fn push_record(&mut self, mut record: Vec<Option<String>>, line: u64) -> Result<(), DataError> {
        let width = self.header.len();
        if record.len() > width {
            let extra_has_data = record[width..]
                .iter()
                .any(|value| value.as_deref().is_some_and(|v| !v.trim().is_empty()));
            if extra_has_data {
                return Err(DataError::Parse(format!(
                    "line {}: expected {} fields, found {}",
                    line,
                    width,
                    record.len()
                )));
            }
            record.truncate(width);
        }
        record.resize(width, None);
        self.records.push(record);
        Ok(())
    }
}

/// Parse raw file bytes in the given format
pub fn parse_file(bytes: &[u8], format: FileFormat) -> Result<ParsedFile, DataError> {
    match format.delimiter() {
        Some(delimiter) => csv_source::parse_delimited(bytes, delimiter),
        None => sheet_source::parse_workbook(bytes),
    }
}
