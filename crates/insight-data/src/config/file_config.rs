//! File format detection for imports

use std::path::Path;
use serde::{Serialize, Deserialize};

use crate::DataError;

/// Supported input formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FileFormat {
    /// Comma separated text
    Csv,
    /// Tab separated text
    Tsv,
    /// Excel or OpenDocument workbook; the first sheet is imported
    Spreadsheet,
}

impl FileFormat {
    /// Detect the format from a file name's extension
    pub fn from_file_name(file_name: &str) -> Result<Self, DataError> {
        let extension = Path::new(file_name)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase())
            .unwrap_or_default();

        match extension.as_str() {
            "csv" | "txt" => Ok(FileFormat::Csv),
            "tsv" | "tab" => Ok(FileFormat::Tsv),
            "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" => Ok(FileFormat::Spreadsheet),
            "" => Err(DataError::Parse(format!(
                "cannot detect the format of '{}': no file extension",
                file_name
            ))),
            other => Err(DataError::Parse(format!("unsupported file type: .{}", other))),
        }
    }

    /// Field delimiter for delimited text formats
    pub fn delimiter(&self) -> Option<u8> {
        match self {
            FileFormat::Csv => Some(b','),
            FileFormat::Tsv => Some(b'\t'),
            FileFormat::Spreadsheet => None,
        }
    }
}
