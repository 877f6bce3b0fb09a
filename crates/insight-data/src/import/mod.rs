//! Import pipeline: file bytes to a committed table
//!
//! The pipeline detects the file format, parses it into raw records,
//! builds the column set, discards fully empty records, coerces every cell,
//! applies the cleaning policy and hands the rows to the table store.

use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

use insight_core::{coerce, ColumnSet, Row, TableDescriptor};
use crate::config::{discard_empty_rows, CleaningPolicy, FileFormat};
use crate::schema::build_column_set;
use crate::sources::{parse_file, ParsedFile, TableStore};
use crate::DataError;

/// Turns files into tables in a `TableStore`
#[derive(Clone)]
pub struct ImportPipeline {
    store: Arc<TableStore>,
}

impl ImportPipeline {
    pub fn new(store: Arc<TableStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<TableStore> {
        &self.store
    }

    /// Import raw file bytes as table `table_name`.
    ///
    /// The returned descriptor's `row_count` counts the rows actually
    /// persisted after cleaning. On any error the store is unchanged.
    pub fn import(
        &self,
        bytes: &[u8],
        file_name: &str,
        table_name: &str,
        policy: &CleaningPolicy,
    ) -> Result<TableDescriptor, DataError> {
        let (columns, rows) = read_rows(bytes, file_name, policy)?;

        info!(
            "Importing {} into '{}' with policy {} ({} rows)",
            file_name,
            table_name,
            policy,
            rows.len()
        );
        self.store.create_or_replace(table_name, &columns, &rows, file_name)
    }

    /// Import raw file bytes under the next free `table_N` name.
    ///
    /// Naming and committing happen together, so concurrent unnamed imports
    /// always end up in distinct tables.
    pub fn import_as_next(
        &self,
        bytes: &[u8],
        file_name: &str,
        policy: &CleaningPolicy,
    ) -> Result<TableDescriptor, DataError> {
        let (columns, rows) = read_rows(bytes, file_name, policy)?;

        let descriptor = self.store.create_with_next_name(&columns, &rows, file_name)?;
        info!(
            "Imported {} as '{}' with policy {}",
            file_name, descriptor.name, policy
        );
        Ok(descriptor)
    }

    /// Read a file from disk and import it, under `table_name` or the next
    /// free `table_N`
    pub fn import_path(
        &self,
        path: &Path,
        table_name: Option<&str>,
        policy: &CleaningPolicy,
    ) -> Result<TableDescriptor, DataError> {
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| DataError::Parse(format!("invalid file name: {}", path.display())))?;
        let bytes = std::fs::read(path)?;
        match table_name {
            Some(table_name) => self.import(&bytes, file_name, table_name, policy),
            None => self.import_as_next(&bytes, file_name, policy),
        }
    }
}

fn read_rows(bytes: &[u8], file_name: &str, policy: &CleaningPolicy) -> Result<(ColumnSet, Vec<Row>), DataError> {
    let format = FileFormat::from_file_name(file_name)?;
    let parsed = parse_file(bytes, format)?;
    prepare_rows(parsed, policy)
}

/// Build the column set and the cleaned, coerced rows of a parsed file
pub fn prepare_rows(parsed: ParsedFile, policy: &CleaningPolicy) -> Result<(ColumnSet, Vec<Row>), DataError> {
    let columns = build_column_set(&parsed.header)?;

    let coerced: Vec<Row> = parsed
        .records
        .into_iter()
        .map(|record| record.iter().map(|raw| coerce(raw.as_deref())).collect())
        .collect();

    let total = coerced.len();
    let rows = discard_empty_rows(coerced);
    let non_empty = rows.len();
    let rows = policy.apply(rows);

    debug!(
        "Prepared {} rows ({} empty discarded, {} removed by cleaning)",
        rows.len(),
        total - non_empty,
        non_empty - rows.len()
    );
    Ok((columns, rows))
}

/// Name after the last loaded table (`table_{count + 1}`), skipping names
/// that are already taken. Gaps left by dropped tables below that are not
/// reused.
pub fn next_table_name(store: &TableStore) -> Result<String, DataError> {
    store.next_table_name()
}
