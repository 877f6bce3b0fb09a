//! Presentation of query results: chart selection, text tables, CSV export

pub mod chart;
pub mod export;
mod tables;

pub use chart::{is_numeric_column, select_chart, ChartChoice, ChartKind, ChartSpec, UnknownChartKind};
pub use export::{export_to_path, to_csv_string, write_csv, ExportError};
pub use tables::{TableConfig, TableView};
