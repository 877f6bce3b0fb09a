//! Null cell handling applied to a batch of rows before it is committed

use std::fmt;
use std::str::FromStr;
use serde::{Serialize, Deserialize};

use insight_core::{Cell, Row};
use crate::DataError;

/// What to do with `Null` cells in an import batch
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum CleaningPolicy {
    /// Keep rows and nulls as they are
    #[default]
    Ignore,

    /// Replace every null with the number zero
    ZeroFill,

    /// Remove every row holding at least one null
    Drop,

    /// Replace every null with this text, stored exactly as typed
    CustomFill(String),
}

impl CleaningPolicy {
    /// Build a policy from an option name plus an optional fill value.
    ///
    /// Accepts `none`/`ignore`, `zero`/`zero_fill`, `drop` and `custom`;
    /// `custom` requires a value.
    pub fn from_option(option: &str, custom_value: Option<&str>) -> Result<Self, DataError> {
        match option.trim().to_ascii_lowercase().as_str() {
            "custom" | "custom_fill" => custom_value
                .map(|v| CleaningPolicy::CustomFill(v.to_string()))
                .ok_or_else(|| DataError::Config("custom cleaning requires a fill value".to_string())),
            other => other.parse(),
        }
    }

    /// Apply the policy to every row.
    ///
    /// Never fails. Row order is preserved; only `Drop` removes rows.
    pub fn apply(&self, rows: Vec<Row>) -> Vec<Row> {
        match self {
            CleaningPolicy::Ignore => rows,
            CleaningPolicy::Drop => rows
                .into_iter()
                .filter(|row| !row.iter().any(Cell::is_null))
                .collect(),
            CleaningPolicy::ZeroFill => fill_nulls(rows, || Cell::Number(0.0)),
            CleaningPolicy::CustomFill(value) => fill_nulls(rows, || Cell::Text(value.clone())),
        }
    }
}

impl FromStr for CleaningPolicy {
    type Err = DataError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" | "ignore" => Ok(CleaningPolicy::Ignore),
            "zero" | "zero_fill" => Ok(CleaningPolicy::ZeroFill),
            "drop" => Ok(CleaningPolicy::Drop),
            "custom" | "custom_fill" => Err(DataError::Config(
                "custom cleaning requires a fill value".to_string(),
            )),
            other => Err(DataError::Config(format!("unknown cleaning option '{}'", other))),
        }
    }
}

impl fmt::Display for CleaningPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CleaningPolicy::Ignore => f.write_str("none"),
            CleaningPolicy::ZeroFill => f.write_str("zero"),
            CleaningPolicy::Drop => f.write_str("drop"),
            CleaningPolicy::CustomFill(value) => write!(f, "custom({:?})", value),
        }
    }
}

/// Free function form of `CleaningPolicy::apply`
pub fn apply_policy(rows: Vec<Row>, policy: &CleaningPolicy) -> Vec<Row> {
    policy.apply(rows)
}

/// Remove rows whose every cell is null.
///
/// Runs before any policy, whatever the policy is.
pub fn discard_empty_rows(rows: Vec<Row>) -> Vec<Row> {
    rows.into_iter()
        .filter(|row| !row.iter().all(Cell::is_null))
        .collect()
}

fn fill_nulls(rows: Vec<Row>, fill: impl Fn() -> Cell) -> Vec<Row> {
    rows.into_iter()
        .map(|row| {
            row.into_iter()
                .map(|cell| if cell.is_null() { fill() } else { cell })
                .collect()
        })
        .collect()
}
