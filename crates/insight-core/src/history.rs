//! Query history
//!
//! Every executed query is recorded as a `HistoryEntry` in a capped,
//! append-only ring buffer. When the buffer is full the oldest entry is
//! evicted. The buffer can be persisted to and restored from a JSON file.

use std::collections::VecDeque;
use std::path::Path;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

/// Default number of entries kept
pub const DEFAULT_HISTORY_CAPACITY: usize = 20;

/// Unique identifier for a history entry
pub type HistoryId = Uuid;

/// One executed query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Unique identifier
    pub id: HistoryId,

    /// Question the SQL was generated from, if any
    pub natural_language_query: Option<String>,

    /// SQL that was executed
    pub sql: String,

    /// When the query ran
    pub timestamp: DateTime<Utc>,
}

impl HistoryEntry {
    pub fn new(natural_language_query: Option<String>, sql: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            natural_language_query,
            sql,
            timestamp: Utc::now(),
        }
    }
}

/// Capped ring buffer of history entries, oldest first internally
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryHistory {
    capacity: usize,
    entries: VecDeque<HistoryEntry>,
}

impl Default for QueryHistory {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAPACITY)
    }
}

impl QueryHistory {
    /// Create an empty history holding at most `capacity` entries
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            entries: VecDeque::with_capacity(capacity),
        }
    }

    /// Append an entry, evicting the oldest one on overflow
    pub fn push(&mut self, entry: HistoryEntry) -> HistoryId {
        let id = entry.id;
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(entry);
        id
    }

    /// Record a query and return its entry id
    pub fn record(&mut self, natural_language_query: Option<String>, sql: impl Into<String>) -> HistoryId {
        self.push(HistoryEntry::new(natural_language_query, sql.into()))
    }

    /// Entries from newest to oldest
    pub fn newest_first(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.entries.iter().rev()
    }

    pub fn get(&self, id: HistoryId) -> Option<&HistoryEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    pub fn latest(&self) -> Option<&HistoryEntry> {
        self.entries.back()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Load a history file; a missing file yields an empty history.
    ///
    /// The stored entries are re-capped to `capacity`, keeping the newest.
    pub fn load(path: &Path, capacity: usize) -> Result<Self> {
        let mut history = Self::new(capacity);
        if !path.exists() {
            return Ok(history);
        }

        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read history file {}", path.display()))?;
        let stored: Vec<HistoryEntry> = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse history file {}", path.display()))?;

        for entry in stored {
            history.push(entry);
        }
        debug!("Loaded {} history entries from {}", history.len(), path.display());
        Ok(history)
    }

    /// Write the history as a JSON array, oldest first
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create {}", parent.display()))?;
            }
        }
        let json = serde_json::to_string_pretty(&self.entries)?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write history file {}", path.display()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_history_evicts_oldest() {
        let mut history = QueryHistory::new(3);
        for i in 0..5 {
            history.record(None, format!("SELECT {i}"));
        }

        assert_eq!(history.len(), 3);
        let sql: Vec<_> = history.newest_first().map(|e| e.sql.as_str()).collect();
        assert_eq!(sql, vec!["SELECT 4", "SELECT 3", "SELECT 2"]);
    }

    #[test]
    fn test_history_lookup() {
        let mut history = QueryHistory::default();
        let id = history.record(Some("total sales".to_string()), "SELECT SUM(sales) FROM t");

        let entry = history.get(id).unwrap();
        assert_eq!(entry.natural_language_query.as_deref(), Some("total sales"));
        assert_eq!(history.latest().map(|e| e.id), Some(id));
        assert_eq!(history.capacity(), DEFAULT_HISTORY_CAPACITY);
    }

    #[test]
    fn test_history_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("history.json");

        let mut history = QueryHistory::new(5);
        history.record(None, "SELECT 1");
        history.record(Some("two".to_string()), "SELECT 2");
        history.save(&path).unwrap();

        let loaded = QueryHistory::load(&path, 5).unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded.latest().unwrap().sql, "SELECT 2");

        let capped = QueryHistory::load(&path, 1).unwrap();
        assert_eq!(capped.len(), 1);
        assert_eq!(capped.latest().unwrap().sql, "SELECT 2");
    }

    #[test]
    fn test_history_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = QueryHistory::load(&dir.path().join("none.json"), 4).unwrap();
        assert!(loaded.is_empty());
    }
}
