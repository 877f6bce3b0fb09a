//! Table-level data model: column sets, rows and table descriptors

use std::ops::Deref;
use serde::{Serialize, Deserialize};
use thiserror::Error;

use crate::cell::Cell;

/// A single row, ordered like the owning table's `ColumnSet`
pub type Row = Vec<Cell>;

/// Two header entries name the same column once trimmed, ignoring ASCII case
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("duplicate column name '{0}'")]
pub struct DuplicateColumn(pub String);

/// Ordered column names, unique under SQLite's case-insensitive identifier rules
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct ColumnSet(Vec<String>);

impl ColumnSet {
    /// Build a column set from a raw header, trimming every name.
    pub fn from_header<I, S>(header: I) -> Result<Self, DuplicateColumn>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut names: Vec<String> = Vec::new();
        for raw in header {
            let name = raw.as_ref().trim().to_string();
            if names.iter().any(|existing| existing.eq_ignore_ascii_case(&name)) {
                return Err(DuplicateColumn(name));
            }
            names.push(name);
        }
        Ok(Self(names))
    }

    pub fn names(&self) -> &[String] {
        &self.0
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.0.iter().position(|c| c == name)
    }
}

impl Deref for ColumnSet {
    type Target = [String];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl TryFrom<Vec<String>> for ColumnSet {
    type Error = DuplicateColumn;

    fn try_from(names: Vec<String>) -> Result<Self, Self::Error> {
        Self::from_header(names)
    }
}

impl From<ColumnSet> for Vec<String> {
    fn from(columns: ColumnSet) -> Self {
        columns.0
    }
}

/// Metadata identifying a loaded table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableDescriptor {
    /// Table name inside the store
    pub name: String,

    /// Columns in creation order
    pub columns: ColumnSet,

    /// Rows persisted by the last successful import
    pub row_count: u64,

    /// File the table was imported from
    pub source_file_name: String,
}
