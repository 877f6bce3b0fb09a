//! Store and session settings

use std::path::{Path, PathBuf};
use serde::{Serialize, Deserialize};

use insight_core::DEFAULT_HISTORY_CAPACITY;
use super::cleaning::CleaningPolicy;
use crate::DataError;

/// Settings for a store and the session built around it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreSettings {
    /// SQLite database file; `None` keeps everything in memory
    pub database_path: Option<PathBuf>,

    /// JSON file the query history is persisted to
    pub history_path: Option<PathBuf>,

    /// Maximum number of history entries kept
    pub history_capacity: usize,

    /// Rows sampled from the first table as assistant context
    pub sample_rows: usize,

    /// Cleaning policy used when an import does not name one
    pub default_policy: CleaningPolicy,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            database_path: None,
            history_path: None,
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            sample_rows: 5,
            default_policy: CleaningPolicy::Ignore,
        }
    }
}

impl StoreSettings {
    /// Load settings from a JSON file; missing fields take their defaults
    pub fn load(path: &Path) -> Result<Self, DataError> {
        let contents = std::fs::read_to_string(path)?;
        serde_json::from_str(&contents)
            .map_err(|e| DataError::Config(format!("{}: {}", path.display(), e)))
    }

    /// Keep everything in one directory: `insight.db` and `history.json`
    pub fn in_directory(dir: &Path) -> Self {
        Self {
            database_path: Some(dir.join("insight.db")),
            history_path: Some(dir.join("history.json")),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_settings_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, r#"{"history_capacity": 5, "default_policy": {"kind": "zero_fill"}}"#).unwrap();

        let settings = StoreSettings::load(&path).unwrap();
        assert_eq!(settings.history_capacity, 5);
        assert_eq!(settings.default_policy, CleaningPolicy::ZeroFill);
        assert_eq!(settings.sample_rows, 5);
        assert!(settings.database_path.is_none());
    }

    #[test]
    fn test_invalid_settings_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, "not json").unwrap();
        assert!(matches!(StoreSettings::load(&path), Err(DataError::Config(_))));
    }

    #[test]
    fn test_in_directory() {
        let settings = StoreSettings::in_directory(Path::new("/tmp/insight"));
        assert_eq!(settings.database_path, Some(PathBuf::from("/tmp/insight/insight.db")));
        assert_eq!(settings.history_path, Some(PathBuf::from("/tmp/insight/history.json")));
    }
}
