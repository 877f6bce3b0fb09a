//! Text table rendering of query results

use arrow::error::ArrowError;
use arrow::util::pretty::pretty_format_batches;

use insight_core::QueryResult;

/// Configuration for table rendering
#[derive(Debug, Clone)]
pub struct TableConfig {
    /// Rows shown before the rest are elided
    pub max_rows_displayed: usize,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            max_rows_displayed: 1000,
        }
    }
}

/// Renders query results as boxed text tables
#[derive(Debug, Clone, Default)]
pub struct TableView {
    pub config: TableConfig,
}

impl TableView {
    pub fn new(config: TableConfig) -> Self {
        Self { config }
    }

    /// Render a result. Statements without a result set render a status line.
    pub fn render(&self, result: &QueryResult) -> Result<String, ArrowError> {
        if result.columns.is_empty() {
            return Ok("Statement executed (no result set).".to_string());
        }

        let shown = result.row_count().min(self.config.max_rows_displayed);
        let visible = QueryResult {
            rows: result.rows[..shown].to_vec(),
            ..result.clone()
        };
        let batch = visible.to_record_batch()?;
        let mut out = pretty_format_batches(&[batch])?.to_string();

        let hidden = result.row_count() - shown;
        if hidden > 0 {
            out.push_str(&format!("\n... {} more rows", hidden));
        }
        out.push_str(&format!(
            "\n{} row{}",
            result.row_count(),
            if result.row_count() == 1 { "" } else { "s" }
        ));
        Ok(out)
    }
}
