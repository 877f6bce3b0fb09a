//! Query results: a rectangular matrix of cells plus the SQL that made it

use std::sync::Arc;
use arrow::array::{ArrayRef, Float64Builder, StringBuilder};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::error::ArrowError;
use arrow::record_batch::{RecordBatch, RecordBatchOptions};
use serde::{Serialize, Deserialize};

use crate::cell::Cell;

/// Forward-looking notes returned by the SQL assistant, passed through as-is
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Insights {
    pub prediction: String,
    pub confidence: f64,
    pub reasoning: String,
    #[serde(default)]
    pub what_if: Option<String>,
}

/// Normalized output of one query execution
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryResult {
    /// Column names in engine order; duplicates are allowed (`SELECT a, a`)
    pub columns: Vec<String>,

    /// Row values, each exactly `columns.len()` wide
    pub rows: Vec<Vec<Cell>>,

    /// SQL that produced this result
    pub source_sql: String,

    /// Assistant explanation, when the SQL came from the assistant
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,

    /// Assistant insights, when the SQL came from the assistant
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub insights: Option<Insights>,
}

impl QueryResult {
    /// Reshape raw engine output into a rectangular matrix.
    ///
    /// Column and row order are kept exactly. Short rows are padded with
    /// `Null`, long rows are cut to the column count. No columns means an
    /// empty result.
    pub fn normalize(
        raw_columns: Vec<String>,
        raw_rows: Vec<Vec<Cell>>,
        source_sql: impl Into<String>,
    ) -> Self {
        let source_sql = source_sql.into();
        if raw_columns.is_empty() {
            return Self::empty(source_sql);
        }

        let width = raw_columns.len();
        let rows = raw_rows
            .into_iter()
            .map(|mut row| {
                row.resize(width, Cell::Null);
                row
            })
            .collect();

        Self {
            columns: raw_columns,
            rows,
            source_sql,
            explanation: None,
            insights: None,
        }
    }

    /// Result of a statement that produced no result set
    pub fn empty(source_sql: impl Into<String>) -> Self {
        Self {
            source_sql: source_sql.into(),
            ..Self::default()
        }
    }

    /// Attach the assistant's explanation and insights
    pub fn with_annotations(mut self, explanation: Option<String>, insights: Option<Insights>) -> Self {
        self.explanation = explanation;
        self.insights = insights;
        self
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty() || self.rows.is_empty()
    }

    /// Iterate over the values of one column
    pub fn column_values(&self, index: usize) -> impl Iterator<Item = &Cell> + '_ {
        self.rows.iter().filter_map(move |row| row.get(index))
    }

    /// First non-null value of a column, scanning rows in order
    pub fn first_non_null(&self, index: usize) -> Option<&Cell> {
        self.column_values(index).find(|cell| !cell.is_null())
    }

    /// Convert into an Arrow batch for rendering.
    ///
    /// Columns whose non-null values are all numbers become `Float64`,
    /// everything else is rendered as `Utf8`.
    pub fn to_record_batch(&self) -> Result<RecordBatch, ArrowError> {
        let mut fields = Vec::with_capacity(self.columns.len());
        let mut arrays: Vec<ArrayRef> = Vec::with_capacity(self.columns.len());

        for (idx, name) in self.columns.iter().enumerate() {
            let numeric = self
                .column_values(idx)
                .all(|cell| matches!(cell, Cell::Null | Cell::Number(_)));

            if numeric {
                let mut builder = Float64Builder::with_capacity(self.rows.len());
                for cell in self.column_values(idx) {
                    match cell {
                        Cell::Number(n) => builder.append_value(*n),
                        _ => builder.append_null(),
                    }
                }
                fields.push(Field::new(name, DataType::Float64, true));
                arrays.push(Arc::new(builder.finish()));
            } else {
                let mut builder = StringBuilder::new();
                for cell in self.column_values(idx) {
                    match cell {
                        Cell::Null => builder.append_null(),
                        other => builder.append_value(other.to_string()),
                    }
                }
                fields.push(Field::new(name, DataType::Utf8, true));
                arrays.push(Arc::new(builder.finish()));
            }
        }

        let options = RecordBatchOptions::new().with_row_count(Some(self.rows.len()));
        RecordBatch::try_new_with_options(Arc::new(Schema::new(fields)), arrays, &options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::Array;

    fn text(s: &str) -> Cell {
        Cell::Text(s.to_string())
    }

    #[test]
    fn test_normalize_pads_short_rows() {
        let result = QueryResult::normalize(
            vec!["a".into(), "b".into(), "c".into()],
            vec![vec![Cell::Number(1.0)], vec![text("x"), text("y"), text("z")]],
            "SELECT a, b, c FROM t",
        );
        assert_eq!(result.rows[0], vec![Cell::Number(1.0), Cell::Null, Cell::Null]);
        assert_eq!(result.rows[1], vec![text("x"), text("y"), text("z")]);
        assert!(result.rows.iter().all(|r| r.len() == 3));
    }

    #[test]
    fn test_normalize_truncates_long_rows() {
        let result = QueryResult::normalize(
            vec!["a".into()],
            vec![vec![Cell::Number(1.0), Cell::Number(2.0)]],
            "SELECT a",
        );
        assert_eq!(result.rows, vec![vec![Cell::Number(1.0)]]);
    }

    #[test]
    fn test_normalize_without_columns_is_empty() {
        let result = QueryResult::normalize(vec![], vec![vec![Cell::Number(1.0)]], "CREATE TABLE t (a)");
        assert!(result.columns.is_empty());
        assert!(result.rows.is_empty());
        assert_eq!(result.source_sql, "CREATE TABLE t (a)");
    }

    #[test]
    fn test_normalize_preserves_order() {
        let result = QueryResult::normalize(
            vec!["z".into(), "a".into()],
            vec![vec![text("2"), text("1")], vec![text("4"), text("3")]],
            "SELECT z, a",
        );
        assert_eq!(result.columns, vec!["z", "a"]);
        assert_eq!(result.rows[1][0], text("4"));
    }

    #[test]
    fn test_first_non_null_skips_nulls() {
        let result = QueryResult::normalize(
            vec!["a".into()],
            vec![vec![Cell::Null], vec![Cell::Number(3.0)]],
            "SELECT a",
        );
        assert_eq!(result.first_non_null(0), Some(&Cell::Number(3.0)));
    }

    #[test]
    fn test_record_batch_types() {
        let result = QueryResult::normalize(
            vec!["name".into(), "value".into()],
            vec![
                vec![text("a"), Cell::Number(1.5)],
                vec![Cell::Null, Cell::Null],
            ],
            "SELECT name, value",
        );
        let batch = result.to_record_batch().unwrap();
        assert_eq!(batch.num_rows(), 2);
        assert_eq!(batch.schema().field(0).data_type(), &DataType::Utf8);
        assert_eq!(batch.schema().field(1).data_type(), &DataType::Float64);
        assert_eq!(batch.column(1).null_count(), 1);
    }

    #[test]
    fn test_record_batch_for_empty_result() {
        let batch = QueryResult::empty("DELETE FROM t").to_record_batch().unwrap();
        assert_eq!(batch.num_columns(), 0);
        assert_eq!(batch.num_rows(), 0);
    }

    #[test]
    fn test_insights_use_camel_case() {
        let insights: Insights = serde_json::from_str(
            r#"{"prediction":"up","confidence":0.8,"reasoning":"trend","whatIf":"if flat"}"#,
        )
        .unwrap();
        assert_eq!(insights.what_if.as_deref(), Some("if flat"));
    }
}
