//! SQLite table store
//!
//! Owns the embedded database: creates, replaces and drops imported tables,
//! keeps their descriptors in an internal catalog table and executes
//! queries. Every mutation runs inside one transaction while holding the
//! connection lock, so a failed import never leaves a partial table behind
//! and mutations are serialized across threads. User statements may read
//! the catalog but never write to it.

use std::path::Path;
use chrono::Utc;
use parking_lot::Mutex;
use rusqlite::hooks::{AuthAction, AuthContext, Authorization};
use rusqlite::types::{Value, ValueRef};
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Transaction};
use tracing::{debug, info, warn};

use insight_core::{Cell, ColumnSet, QueryResult, Row, TableDescriptor};
use crate::config::StoreSettings;
use crate::schema::{profile_rows, ColumnKind};
use crate::DataError;

/// Internal table holding one descriptor per loaded table
const CATALOG_TABLE: &str = "_insight_tables";

/// Prefix reserved for internal tables
const RESERVED_PREFIX: &str = "_insight_";

/// Embedded table store
pub struct TableStore {
    conn: Mutex<Connection>,
    location: String,
}

impl TableStore {
    /// Open a private in-memory store
    pub fn open_in_memory() -> Result<Self, DataError> {
        let conn = Connection::open_in_memory()
            .map_err(|e| DataError::Storage(format!("Failed to open in-memory database: {}", e)))?;
        Self::init(conn, ":memory:".to_string())
    }

    /// Open (or create) a store backed by a database file
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, DataError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path)
            .map_err(|e| DataError::Storage(format!("Failed to open SQLite database: {}", e)))?;
        Self::init(conn, path.display().to_string())
    }

    /// Open the store the settings point at
    pub fn from_settings(settings: &StoreSettings) -> Result<Self, DataError> {
        match &settings.database_path {
            Some(path) => Self::open(path),
            None => Self::open_in_memory(),
        }
    }

    fn init(conn: Connection, location: String) -> Result<Self, DataError> {
        conn.execute_batch(&format!(
            "CREATE TABLE IF NOT EXISTS {} (
                seq INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL UNIQUE COLLATE NOCASE,
                columns TEXT NOT NULL,
                column_types TEXT NOT NULL,
                row_count INTEGER NOT NULL,
                source_file_name TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );",
            CATALOG_TABLE
        ))
        .map_err(|e| DataError::Storage(format!("Failed to create catalog: {}", e)))?;

        debug!("Opened table store at {}", location);
        Ok(Self {
            conn: Mutex::new(conn),
            location,
        })
    }

    /// Where the database lives (`:memory:` for in-memory stores)
    pub fn location(&self) -> &str {
        &self.location
    }

    /// Drop any existing table called `name` and create it afresh with
    /// `rows`, atomically.
    ///
    /// On failure the previous table (or its absence) is left untouched.
    pub fn create_or_replace(
        &self,
        name: &str,
        columns: &ColumnSet,
        rows: &[Row],
        source_file_name: &str,
    ) -> Result<TableDescriptor, DataError> {
        validate_table_name(name)?;
        if columns.is_empty() {
            return Err(DataError::Storage(format!("table '{}' has no columns", name)));
        }

        let mut conn = self.conn.lock();
        Self::commit_table(&mut conn, name, columns, rows, source_file_name)
    }

    /// Create a table under the next free `table_N` name.
    ///
    /// The name is picked and the table committed under one lock, so
    /// concurrent callers never land on the same name.
    pub fn create_with_next_name(
        &self,
        columns: &ColumnSet,
        rows: &[Row],
        source_file_name: &str,
    ) -> Result<TableDescriptor, DataError> {
        if columns.is_empty() {
            return Err(DataError::Storage(format!("{} has no columns", source_file_name)));
        }

        let mut conn = self.conn.lock();
        let name = next_free_name(&conn)?;
        Self::commit_table(&mut conn, &name, columns, rows, source_file_name)
    }

    /// Name the next unnamed import would get: `table_{count + 1}`, moving
    /// past names already in use
    pub fn next_table_name(&self) -> Result<String, DataError> {
        let conn = self.conn.lock();
        next_free_name(&conn)
    }

    fn commit_table(
        conn: &mut Connection,
        name: &str,
        columns: &ColumnSet,
        rows: &[Row],
        source_file_name: &str,
    ) -> Result<TableDescriptor, DataError> {
        let tx = conn.transaction().map_err(DataError::storage)?;

        match Self::write_table(&tx, name, columns, rows, source_file_name) {
            Ok(descriptor) => {
                tx.commit().map_err(DataError::storage)?;
                info!(
                    "Created table '{}' from {} ({} columns, {} rows)",
                    name,
                    source_file_name,
                    columns.len(),
                    descriptor.row_count
                );
                Ok(descriptor)
            }
            Err(e) => {
                // dropping the transaction rolls it back
                warn!("Rolled back import of table '{}': {}", name, e);
                Err(e)
            }
        }
    }

    fn write_table(
        tx: &Transaction<'_>,
        name: &str,
        columns: &ColumnSet,
        rows: &[Row],
        source_file_name: &str,
    ) -> Result<TableDescriptor, DataError> {
        let table = quote_identifier(name);

        tx.execute_batch(&format!("DROP TABLE IF EXISTS {}", table))
            .map_err(DataError::storage)?;

        // Untyped columns keep each coerced value's storage class as inserted
        let column_defs = columns
            .iter()
            .map(|c| quote_identifier(c))
            .collect::<Vec<_>>()
            .join(", ");
        tx.execute_batch(&format!("CREATE TABLE {} ({})", table, column_defs))
            .map_err(DataError::storage)?;

        let placeholders = vec!["?"; columns.len()].join(", ");
        {
            let mut stmt = tx
                .prepare(&format!("INSERT INTO {} VALUES ({})", table, placeholders))
                .map_err(DataError::storage)?;

            for (idx, row) in rows.iter().enumerate() {
                if row.len() != columns.len() {
                    return Err(DataError::Storage(format!(
                        "row {} has {} values, expected {}",
                        idx + 1,
                        row.len(),
                        columns.len()
                    )));
                }
                stmt.execute(params_from_iter(row.iter().map(cell_to_value)))
                    .map_err(DataError::storage)?;
            }
        }

        let kinds: Vec<ColumnKind> = profile_rows(columns, rows).into_iter().map(|p| p.kind).collect();
        let now = Utc::now().to_rfc3339();
        tx.execute(
            &format!(
                "INSERT INTO {} (name, columns, column_types, row_count, source_file_name, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)
                 ON CONFLICT(name) DO UPDATE SET
                    name = excluded.name,
                    columns = excluded.columns,
                    column_types = excluded.column_types,
                    row_count = excluded.row_count,
                    source_file_name = excluded.source_file_name,
                    updated_at = excluded.updated_at",
                CATALOG_TABLE
            ),
            params![
                name,
                to_json(columns)?,
                to_json(&kinds)?,
                rows.len() as i64,
                source_file_name,
                now,
            ],
        )
        .map_err(DataError::storage)?;

        Ok(TableDescriptor {
            name: name.to_string(),
            columns: columns.clone(),
            row_count: rows.len() as u64,
            source_file_name: source_file_name.to_string(),
        })
    }

    /// Drop a table; returns whether it existed
    pub fn drop_table(&self, name: &str) -> Result<bool, DataError> {
        validate_table_name(name)?;

        let mut conn = self.conn.lock();
        let tx = conn.transaction().map_err(DataError::storage)?;

        let existed = tx
            .execute(&format!("DELETE FROM {} WHERE name = ?1", CATALOG_TABLE), [name])
            .map_err(DataError::storage)?
            > 0;
        tx.execute_batch(&format!("DROP TABLE IF EXISTS {}", quote_identifier(name)))
            .map_err(DataError::storage)?;
        tx.commit().map_err(DataError::storage)?;

        if existed {
            info!("Dropped table '{}'", name);
        }
        Ok(existed)
    }

    /// All loaded tables, in the order they were first created
    pub fn list(&self) -> Result<Vec<TableDescriptor>, DataError> {
        let conn = self.conn.lock();
        let mut stmt = conn
            .prepare(&format!(
                "SELECT name, columns, row_count, source_file_name FROM {} ORDER BY seq",
                CATALOG_TABLE
            ))
            .map_err(DataError::storage)?;

        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, i64>(2)?,
                    row.get::<_, String>(3)?,
                ))
            })
            .map_err(DataError::storage)?;

        let mut descriptors = Vec::new();
        for row in rows {
            let (name, columns, row_count, source_file_name) = row.map_err(DataError::storage)?;
            descriptors.push(TableDescriptor {
                name,
                columns: from_json(&columns)?,
                row_count: row_count as u64,
                source_file_name,
            });
        }
        Ok(descriptors)
    }

    /// Descriptor of one table, if loaded
    pub fn describe(&self, name: &str) -> Result<Option<TableDescriptor>, DataError> {
        Ok(self
            .list()?
            .into_iter()
            .find(|d| d.name.eq_ignore_ascii_case(name)))
    }

    pub fn contains(&self, name: &str) -> Result<bool, DataError> {
        Ok(self.describe(name)?.is_some())
    }

    /// Execute a SQL statement and normalize whatever it returns.
    ///
    /// Statements without a result set yield an empty result. Statements
    /// that would write to an internal `_insight_` object are refused.
    /// Failures are always reported against the SQL text.
    pub fn query(&self, sql: &str) -> Result<QueryResult, DataError> {
        if sql.trim().is_empty() {
            return Err(DataError::query(sql, "empty query"));
        }

        debug!("Executing query: {}", sql);
        let conn = self.conn.lock();
        let guard = InternalObjectGuard::install(&conn);
        let mut stmt = conn.prepare(sql).map_err(|e| DataError::query(sql, e))?;

        let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
        let width = stmt.column_count();
        let readonly = stmt.readonly();

        let mut raw_rows = Vec::new();
        {
            let mut rows = stmt.query([]).map_err(|e| DataError::query(sql, e))?;
            while let Some(row) = rows.next().map_err(|e| DataError::query(sql, e))? {
                let mut values = Vec::with_capacity(width);
                for idx in 0..width {
                    let value = row.get_ref(idx).map_err(|e| DataError::query(sql, e))?;
                    values.push(value_to_cell(value));
                }
                raw_rows.push(values);
            }
        }
        drop(stmt);
        drop(guard);

        if !readonly {
            Self::reconcile_catalog(&conn)?;
        }

        Ok(QueryResult::normalize(columns, raw_rows, sql))
    }

    /// First `limit` rows of a table
    pub fn sample(&self, name: &str, limit: usize) -> Result<QueryResult, DataError> {
        self.query(&format!("SELECT * FROM {} LIMIT {}", quote_identifier(name), limit))
    }

    /// One line per table: `Table name: [col (TYPE), ...]`
    pub fn schema_summary(&self) -> Result<String, DataError> {
        let conn = self.conn.lock();
        let mut stmt = conn
            .prepare(&format!("SELECT name, columns, column_types FROM {} ORDER BY seq", CATALOG_TABLE))
            .map_err(DataError::storage)?;
        let rows = stmt
            .query_map([], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?, row.get::<_, String>(2)?))
            })
            .map_err(DataError::storage)?;

        let mut summary = String::new();
        for row in rows {
            let (name, columns, kinds) = row.map_err(DataError::storage)?;
            let columns: ColumnSet = from_json(&columns)?;
            let kinds: Vec<ColumnKind> = from_json(&kinds)?;
            let described = columns
                .iter()
                .zip(kinds.iter())
                .map(|(column, kind)| format!("{} ({})", column, kind))
                .collect::<Vec<_>>()
                .join(", ");
            summary.push_str(&format!("Table {}: [{}]\n", name, described));
        }

        if summary.is_empty() {
            summary.push_str("No tables loaded.");
        }
        Ok(summary)
    }

    /// Bring the catalog in line with what a user statement did: forget
    /// tables it dropped and refresh row counts of the ones it changed
    fn reconcile_catalog(conn: &Connection) -> Result<(), DataError> {
        let removed = conn
            .execute(
                &format!(
                    "DELETE FROM {} WHERE name NOT IN
                        (SELECT name FROM sqlite_master WHERE type = 'table')",
                    CATALOG_TABLE
                ),
                [],
            )
            .map_err(DataError::storage)?;
        if removed > 0 {
            info!("Removed {} catalog entries for tables dropped by a query", removed);
        }

        let names = {
            let mut stmt = conn
                .prepare(&format!("SELECT name FROM {}", CATALOG_TABLE))
                .map_err(DataError::storage)?;
            let names = stmt
                .query_map([], |row| row.get::<_, String>(0))
                .map_err(DataError::storage)?
                .collect::<Result<Vec<_>, _>>()
                .map_err(DataError::storage)?;
            names
        };

        let now = Utc::now().to_rfc3339();
        for name in names {
            let count: i64 = conn
                .query_row(&format!("SELECT COUNT(*) FROM {}", quote_identifier(&name)), [], |row| row.get(0))
                .map_err(DataError::storage)?;
            let changed = conn
                .execute(
                    &format!(
                        "UPDATE {} SET row_count = ?1, updated_at = ?2 WHERE name = ?3 AND row_count <> ?1",
                        CATALOG_TABLE
                    ),
                    params![count, now, name],
                )
                .map_err(DataError::storage)?;
            if changed > 0 {
                debug!("Table '{}' now holds {} rows", name, count);
            }
        }
        Ok(())
    }

    /// Whether an unmanaged table of this name exists (e.g. created by a query)
    pub fn has_raw_table(&self, name: &str) -> Result<bool, DataError> {
        let conn = self.conn.lock();
        conn.query_row(
            "SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1 COLLATE NOCASE",
            [name],
            |_| Ok(()),
        )
        .optional()
        .map(|found| found.is_some())
        .map_err(DataError::storage)
    }
}

/// Installs an authorizer that refuses writes to `_insight_` objects and
/// removes it again when dropped
struct InternalObjectGuard<'c> {
    conn: &'c Connection,
}

impl<'c> InternalObjectGuard<'c> {
    fn install(conn: &'c Connection) -> Self {
        conn.authorizer(Some(deny_internal_writes));
        Self { conn }
    }
}

impl Drop for InternalObjectGuard<'_> {
    fn drop(&mut self) {
        self.conn.authorizer(None::<fn(AuthContext<'_>) -> Authorization>);
    }
}

fn deny_internal_writes(ctx: AuthContext<'_>) -> Authorization {
    let target = match ctx.action {
        AuthAction::CreateTable { table_name }
        | AuthAction::CreateTempTable { table_name }
        | AuthAction::DropTable { table_name }
        | AuthAction::DropTempTable { table_name }
        | AuthAction::Insert { table_name }
        | AuthAction::Delete { table_name }
        | AuthAction::Update { table_name, .. }
        | AuthAction::AlterTable { table_name, .. }
        | AuthAction::CreateIndex { table_name, .. }
        | AuthAction::CreateTempIndex { table_name, .. }
        | AuthAction::DropIndex { table_name, .. }
        | AuthAction::DropTempIndex { table_name, .. }
        | AuthAction::CreateTrigger { table_name, .. }
        | AuthAction::CreateTempTrigger { table_name, .. }
        | AuthAction::DropTrigger { table_name, .. }
        | AuthAction::DropTempTrigger { table_name, .. } => Some(table_name),
        AuthAction::CreateView { view_name }
        | AuthAction::CreateTempView { view_name }
        | AuthAction::DropView { view_name }
        | AuthAction::DropTempView { view_name } => Some(view_name),
        _ => None,
    };

    match target {
        Some(name) if is_reserved(name) => {
            warn!("Refused write to internal object '{}'", name);
            Authorization::Deny
        }
        _ => Authorization::Allow,
    }
}

/// First `table_N` from `table_{count + 1}` that no table, view or catalog
/// entry already uses
fn next_free_name(conn: &Connection) -> Result<String, DataError> {
    let loaded: i64 = conn
        .query_row(&format!("SELECT COUNT(*) FROM {}", CATALOG_TABLE), [], |row| row.get(0))
        .map_err(DataError::storage)?;

    let mut n = loaded + 1;
    loop {
        let candidate = format!("table_{}", n);
        let taken = conn
            .query_row(
                &format!(
                    "SELECT 1 FROM sqlite_master WHERE name = ?1 COLLATE NOCASE
                     UNION ALL
                     SELECT 1 FROM {} WHERE name = ?1",
                    CATALOG_TABLE
                ),
                [&candidate],
                |_| Ok(()),
            )
            .optional()
            .map_err(DataError::storage)?
            .is_some();
        if !taken {
            return Ok(candidate);
        }
        n += 1;
    }
}

fn is_reserved(name: &str) -> bool {
    name.get(..RESERVED_PREFIX.len())
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case(RESERVED_PREFIX))
}

fn validate_table_name(name: &str) -> Result<(), DataError> {
    if name.trim().is_empty() {
        return Err(DataError::Storage("table name must not be empty".to_string()));
    }
    if is_reserved(name) {
        return Err(DataError::Storage(format!("table name '{}' is reserved", name)));
    }
    Ok(())
}

/// Quote an identifier for SQLite, doubling embedded quotes
pub fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

fn cell_to_value(cell: &Cell) -> Value {
    match cell {
        Cell::Null => Value::Null,
        Cell::Number(n) if n.fract() == 0.0 && n.abs() < 9.0e15 => Value::Integer(*n as i64),
        Cell::Number(n) => Value::Real(*n),
        Cell::Text(s) => Value::Text(s.clone()),
    }
}

fn value_to_cell(value: ValueRef<'_>) -> Cell {
    match value {
        ValueRef::Null => Cell::Null,
        ValueRef::Integer(i) => Cell::Number(i as f64),
        ValueRef::Real(f) => Cell::Number(f),
        ValueRef::Text(bytes) => Cell::Text(String::from_utf8_lossy(bytes).into_owned()),
        ValueRef::Blob(bytes) => Cell::Text(bytes.iter().map(|b| format!("{:02x}", b)).collect()),
    }
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String, DataError> {
    serde_json::to_string(value).map_err(DataError::storage)
}

fn from_json<T: serde::de::DeserializeOwned>(json: &str) -> Result<T, DataError> {
    serde_json::from_str(json).map_err(|e| DataError::Storage(format!("corrupt catalog entry: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn columns(names: &[&str]) -> ColumnSet {
        ColumnSet::from_header(names.iter().copied()).unwrap()
    }

    fn text(s: &str) -> Cell {
        Cell::Text(s.to_string())
    }

    fn sales_rows() -> Vec<Row> {
        vec![
            vec![text("north"), Cell::Number(10.0)],
            vec![text("south"), Cell::Number(2.5)],
            vec![text("east"), Cell::Null],
        ]
    }

    #[test]
    fn test_create_and_query() {
        let store = TableStore::open_in_memory().unwrap();
        let descriptor = store
            .create_or_replace("sales", &columns(&["region", "amount"]), &sales_rows(), "sales.csv")
            .unwrap();
        assert_eq!(descriptor.row_count, 3);
        assert_eq!(descriptor.source_file_name, "sales.csv");

        let result = store.query("SELECT region, amount FROM sales ORDER BY rowid").unwrap();
        assert_eq!(result.columns, vec!["region", "amount"]);
        assert_eq!(result.rows, sales_rows());
    }

    #[test]
    fn test_numbers_keep_numeric_storage() {
        let store = TableStore::open_in_memory().unwrap();
        store
            .create_or_replace("t", &columns(&["v"]), &[vec![Cell::Number(3.0)], vec![Cell::Number(0.5)], vec![text("7")]], "t.csv")
            .unwrap();

        let result = store.query("SELECT typeof(v) FROM t ORDER BY rowid").unwrap();
        assert_eq!(result.rows, vec![vec![text("integer")], vec![text("real")], vec![text("text")]]);
    }

    #[test]
    fn test_replace_swaps_schema() {
        let store = TableStore::open_in_memory().unwrap();
        store.create_or_replace("t", &columns(&["a", "b"]), &vec![vec![text("x"), text("y")]; 4], "old.csv").unwrap();
        let replaced = store.create_or_replace("t", &columns(&["c"]), &[vec![Cell::Number(1.0)]], "new.csv").unwrap();

        assert_eq!(replaced.row_count, 1);
        assert_eq!(store.list().unwrap(), vec![replaced]);
        assert!(matches!(store.query("SELECT a FROM t"), Err(DataError::Query { .. })));
    }

    #[test]
    fn test_failed_write_rolls_back() {
        let store = TableStore::open_in_memory().unwrap();
        let original = store.create_or_replace("t", &columns(&["a"]), &[vec![text("keep")]], "a.csv").unwrap();

        let bad_rows = vec![vec![text("x")], vec![text("y"), text("extra")]];
        let err = store.create_or_replace("t", &columns(&["a"]), &bad_rows, "b.csv").unwrap_err();
        assert!(matches!(err, DataError::Storage(_)));

        assert_eq!(store.list().unwrap(), vec![original]);
        let result = store.query("SELECT a FROM t").unwrap();
        assert_eq!(result.rows, vec![vec![text("keep")]]);
    }

    #[test]
    fn test_reserved_names_are_rejected() {
        let store = TableStore::open_in_memory().unwrap();
        for name in ["_insight_tables", "sqlite_master", "  "] {
            let err = store.create_or_replace(name, &columns(&["a"]), &[], "x.csv").unwrap_err();
            assert!(matches!(err, DataError::Storage(_)), "{name}");
        }
        assert!(store.list().unwrap().is_empty());
    }

    #[test]
    fn test_drop_is_idempotent() {
        let store = TableStore::open_in_memory().unwrap();
        store.create_or_replace("t", &columns(&["a"]), &[], "a.csv").unwrap();

        assert!(store.drop_table("t").unwrap());
        assert!(!store.drop_table("t").unwrap());
        assert!(store.list().unwrap().is_empty());
        assert!(!store.has_raw_table("t").unwrap());
    }

    #[test]
    fn test_list_order_is_stable() {
        let store = TableStore::open_in_memory().unwrap();
        for name in ["table_2", "table_1", "table_3"] {
            store.create_or_replace(name, &columns(&["a"]), &[], "a.csv").unwrap();
        }
        // re-import keeps its slot
        store.create_or_replace("table_1", &columns(&["b"]), &[], "b.csv").unwrap();

        let names: Vec<_> = store.list().unwrap().into_iter().map(|d| d.name).collect();
        assert_eq!(names, vec!["table_2", "table_1", "table_3"]);
        assert_eq!(names, store.list().unwrap().into_iter().map(|d| d.name).collect::<Vec<_>>());
    }

    #[test]
    fn test_query_errors_carry_sql() {
        let store = TableStore::open_in_memory().unwrap();
        match store.query("SELEC nonsense") {
            Err(DataError::Query { sql, .. }) => assert_eq!(sql, "SELEC nonsense"),
            other => panic!("expected query error, got {:?}", other),
        }
        assert!(matches!(store.query("   "), Err(DataError::Query { .. })));
        assert!(matches!(store.query("SELECT * FROM missing"), Err(DataError::Query { .. })));
    }

    #[test]
    fn test_statement_without_result_set() {
        let store = TableStore::open_in_memory().unwrap();
        store.create_or_replace("t", &columns(&["a"]), &[vec![text("x")]], "a.csv").unwrap();

        let result = store.query("UPDATE t SET a = 'y'").unwrap();
        assert!(result.columns.is_empty());
        assert!(result.rows.is_empty());
    }

    #[test]
    fn test_dropping_through_query_updates_catalog() {
        let store = TableStore::open_in_memory().unwrap();
        store.create_or_replace("t", &columns(&["a"]), &[], "a.csv").unwrap();
        store.query("DROP TABLE t").unwrap();
        assert!(store.list().unwrap().is_empty());
    }

    #[test]
    fn test_catalog_rejects_user_writes() {
        let store = TableStore::open_in_memory().unwrap();
        store.create_or_replace("t", &columns(&["a"]), &[vec![text("x")]], "a.csv").unwrap();

        for sql in [
            "DROP TABLE _insight_tables",
            "DELETE FROM _insight_tables",
            "UPDATE _insight_tables SET row_count = 99",
            "INSERT INTO _INSIGHT_TABLES (name) VALUES ('ghost')",
            "ALTER TABLE _insight_tables RENAME TO stolen",
            "CREATE TABLE _insight_extra (a)",
        ] {
            match store.query(sql) {
                Err(DataError::Query { sql: failed, .. }) => assert_eq!(failed, sql),
                other => panic!("expected query error for {sql}, got {:?}", other),
            }
        }

        let tables = store.list().unwrap();
        assert_eq!(tables.len(), 1);
        assert_eq!(tables[0].row_count, 1);

        store.create_or_replace("u", &columns(&["b"]), &[], "b.csv").unwrap();
        let names = store.query("SELECT name FROM _insight_tables ORDER BY seq").unwrap();
        assert_eq!(names.rows, vec![vec![text("t")], vec![text("u")]]);
    }

    #[test]
    fn test_row_counts_follow_user_statements() {
        let store = TableStore::open_in_memory().unwrap();
        store.create_or_replace("sales", &columns(&["region", "amount"]), &sales_rows(), "s.csv").unwrap();

        store.query("DELETE FROM sales WHERE amount IS NULL").unwrap();
        assert_eq!(store.describe("sales").unwrap().unwrap().row_count, 2);

        store.query("INSERT INTO sales VALUES ('west', 1), ('west', 2), ('west', 3)").unwrap();
        assert_eq!(store.describe("sales").unwrap().unwrap().row_count, 5);

        store.query("DELETE FROM sales").unwrap();
        assert_eq!(store.list().unwrap()[0].row_count, 0);
    }

    #[test]
    fn test_next_name_is_taken_atomically() {
        let store = Arc::new(TableStore::open_in_memory().unwrap());
        store.query("CREATE TABLE table_2 (a)").unwrap();

        let handles: Vec<_> = (0..4)
            .map(|i| {
                let store = store.clone();
                std::thread::spawn(move || {
                    let rows = vec![vec![Cell::Number(i as f64)]; 500];
                    store.create_with_next_name(&columns(&["n"]), &rows, "n.csv").unwrap().name
                })
            })
            .collect();
        let mut names: Vec<String> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        names.sort();

        assert_eq!(names, vec!["table_1", "table_3", "table_4", "table_5"]);
        assert_eq!(store.list().unwrap().len(), 4);
        assert_eq!(store.next_table_name().unwrap(), "table_6");
    }

    #[test]
    fn test_identifiers_are_quoted() {
        let store = TableStore::open_in_memory().unwrap();
        let cols = columns(&["first name", "say \"hi\"", "select"]);
        store.create_or_replace("my table", &cols, &[vec![text("a"), text("b"), text("c")]], "x.csv").unwrap();

        let result = store.query("SELECT \"say \"\"hi\"\"\" FROM \"my table\"").unwrap();
        assert_eq!(result.rows, vec![vec![text("b")]]);
    }

    #[test]
    fn test_sample_and_schema_summary() {
        let store = TableStore::open_in_memory().unwrap();
        assert_eq!(store.schema_summary().unwrap(), "No tables loaded.");

        store.create_or_replace("sales", &columns(&["region", "amount"]), &sales_rows(), "s.csv").unwrap();
        assert_eq!(
            store.schema_summary().unwrap(),
            "Table sales: [region (TEXT), amount (NUMERIC)]\n"
        );

        let sample = store.sample("sales", 2).unwrap();
        assert_eq!(sample.row_count(), 2);
    }

    #[test]
    fn test_file_store_persists_descriptors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data").join("insight.db");
        {
            let store = TableStore::open(&path).unwrap();
            store.create_or_replace("t", &columns(&["a"]), &[vec![text("x")]], "a.csv").unwrap();
        }
        let store = TableStore::open(&path).unwrap();
        let tables = store.list().unwrap();
        assert_eq!(tables.len(), 1);
        assert_eq!(tables[0].source_file_name, "a.csv");
    }
}
