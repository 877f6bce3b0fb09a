//! Core data model for the tabular ingestion and query pipeline
//!
//! This crate holds the value types shared by the storage, import and
//! view layers: typed cells and their coercion, column sets, table
//! descriptors, normalized query results and the query history.

pub mod cell;
pub mod history;
pub mod result;
pub mod table;

// Re-export commonly used types
pub use cell::{coerce, format_number, is_numeric_literal, Cell};
pub use history::{HistoryEntry, HistoryId, QueryHistory, DEFAULT_HISTORY_CAPACITY};
pub use result::{Insights, QueryResult};
pub use table::{ColumnSet, DuplicateColumn, Row, TableDescriptor};
