use std::fmt;
use ahash::AHashSet;
use serde::{Serialize, Deserialize};

use insight_core::{Cell, ColumnSet, Row};
use crate::DataError;

/// Logical type of an imported column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ColumnKind {
    /// Every non-null value is a number
    Numeric,
    /// At least one non-null value is text
    Text,
    /// No non-null values at all
    Empty,
}

impl fmt::Display for ColumnKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnKind::Numeric => f.write_str("NUMERIC"),
            ColumnKind::Text => f.write_str("TEXT"),
            ColumnKind::Empty => f.write_str("EMPTY"),
        }
    }
}

/// Statistics about one column of an import batch
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnProfile {
    pub name: String,
    pub kind: ColumnKind,
    pub null_count: usize,
    pub distinct_count: usize,
}

/// Build the column set for an import from its raw header.
///
/// Names are trimmed. A blank name becomes `column_N` (1-based position).
/// Two names that trim to the same value are a schema conflict.
pub fn build_column_set(header: &[String]) -> Result<ColumnSet, DataError> {
    if header.is_empty() {
        return Err(DataError::Parse("file has no header row".to_string()));
    }

    let names = header.iter().enumerate().map(|(idx, raw)| {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            format!("column_{}", idx + 1)
        } else {
            trimmed.to_string()
        }
    });

    Ok(ColumnSet::from_header(names)?)
}

/// Profile every column of a batch of coerced rows
pub fn profile_rows(columns: &ColumnSet, rows: &[Row]) -> Vec<ColumnProfile> {
    columns
        .iter()
        .enumerate()
        .map(|(idx, name)| profile_column(name, rows, idx))
        .collect()
}

fn profile_column(name: &str, rows: &[Row], col_idx: usize) -> ColumnProfile {
    let mut null_count = 0;
    let mut saw_number = false;
    let mut saw_text = false;
    let mut distinct = AHashSet::new();

    for row in rows {
        match row.get(col_idx) {
            None | Some(Cell::Null) => null_count += 1,
            Some(Cell::Number(n)) => {
                saw_number = true;
                distinct.insert(n.to_bits().to_string());
            }
            Some(Cell::Text(s)) => {
                saw_text = true;
                distinct.insert(s.clone());
            }
        }
    }

    let kind = if saw_text {
        ColumnKind::Text
    } else if saw_number {
        ColumnKind::Numeric
    } else {
        ColumnKind::Empty
    };

    ColumnProfile {
        name: name.to_string(),
        kind,
        null_count,
        distinct_count: distinct.len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_build_column_set() {
        let columns = build_column_set(&header(&[" id ", "name", ""])).unwrap();
        assert_eq!(columns.names(), &["id", "name", "column_3"]);
    }

    #[test]
    fn test_build_column_set_conflict() {
        let err = build_column_set(&header(&["amount", "amount "])).unwrap_err();
        assert!(matches!(err, DataError::SchemaConflict(_)));
    }

    #[test]
    fn test_build_column_set_requires_header() {
        assert!(matches!(build_column_set(&[]), Err(DataError::Parse(_))));
    }

    #[test]
    fn test_profile_rows() {
        let columns = build_column_set(&header(&["region", "sales", "notes"])).unwrap();
        let rows = vec![
            vec![Cell::Text("north".into()), Cell::Number(1.0), Cell::Null],
            vec![Cell::Text("north".into()), Cell::Number(2.0), Cell::Null],
            vec![Cell::Text("south".into()), Cell::Null, Cell::Null],
        ];

        let profiles = profile_rows(&columns, &rows);
        assert_eq!(profiles[0].kind, ColumnKind::Text);
        assert_eq!(profiles[0].distinct_count, 2);
        assert_eq!(profiles[1].kind, ColumnKind::Numeric);
        assert_eq!(profiles[1].null_count, 1);
        assert_eq!(profiles[2].kind, ColumnKind::Empty);
        assert_eq!(profiles[2].null_count, 3);
    }
}
