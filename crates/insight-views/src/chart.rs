//! Chart type selection for query results

use std::fmt;
use std::str::FromStr;
use serde::{Serialize, Deserialize};
use thiserror::Error;

use insight_core::QueryResult;

/// Results with at most this many rows may render as a pie
const PIE_MAX_ROWS: usize = 5;

/// Results with more rows than this render as a line
const LINE_MIN_ROWS: usize = 15;

/// Visualization category for a query result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartKind {
    Bar,
    Line,
    Pie,
    Area,
    Scatter,
    None,
}

impl ChartKind {
    pub const ALL: [ChartKind; 6] = [
        ChartKind::Bar,
        ChartKind::Line,
        ChartKind::Pie,
        ChartKind::Area,
        ChartKind::Scatter,
        ChartKind::None,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ChartKind::Bar => "bar",
            ChartKind::Line => "line",
            ChartKind::Pie => "pie",
            ChartKind::Area => "area",
            ChartKind::Scatter => "scatter",
            ChartKind::None => "none",
        }
    }
}

impl fmt::Display for ChartKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown chart kind '{0}' (expected auto, bar, line, pie, area, scatter or none)")]
pub struct UnknownChartKind(pub String);

/// User choice of chart: let the heuristic decide, or force a kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChartChoice {
    #[default]
    Auto,
    Fixed(ChartKind),
}

impl ChartChoice {
    /// Resolve the choice against a concrete result
    pub fn resolve(&self, result: &QueryResult) -> ChartKind {
        match self {
            ChartChoice::Auto => select_chart(result),
            ChartChoice::Fixed(kind) => *kind,
        }
    }
}

impl FromStr for ChartKind {
    type Err = UnknownChartKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        ChartKind::ALL
            .into_iter()
            .find(|kind| kind.name() == wanted)
            .ok_or_else(|| UnknownChartKind(s.to_string()))
    }
}

impl FromStr for ChartChoice {
    type Err = UnknownChartKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("auto") {
            Ok(ChartChoice::Auto)
        } else {
            s.parse().map(ChartChoice::Fixed)
        }
    }
}

/// Whether column `index` holds numbers.
///
/// Decided by the first non-null value; an all-null column is categorical.
pub fn is_numeric_column(result: &QueryResult, index: usize) -> bool {
    result
        .first_non_null(index)
        .is_some_and(|cell| cell.looks_numeric())
}

/// Pick a chart kind for a result. First matching rule wins:
///
/// | rule | kind |
/// |---|---|
/// | no rows or no numeric column | `None` |
/// | at most 5 rows, one numeric column, some categorical column | `Pie` |
/// | more than 15 rows | `Line` |
/// | one numeric column, more than 5 rows | `Area` |
/// | anything else | `Bar` |
pub fn select_chart(result: &QueryResult) -> ChartKind {
    let rows = result.row_count();
    let numeric = (0..result.columns.len())
        .filter(|&idx| is_numeric_column(result, idx))
        .count();
    let categorical = result.columns.len() - numeric;

    if rows == 0 || numeric == 0 {
        ChartKind::None
    } else if rows <= PIE_MAX_ROWS && categorical >= 1 && numeric == 1 {
        ChartKind::Pie
    } else if rows > LINE_MIN_ROWS {
        ChartKind::Line
    } else if numeric == 1 && rows > PIE_MAX_ROWS {
        ChartKind::Area
    } else {
        ChartKind::Bar
    }
}

/// Chart kind plus the columns to plot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartSpec {
    pub kind: ChartKind,

    /// Index of the x-axis (label) column
    pub x_column: Option<usize>,

    /// Indices of the plotted numeric columns
    pub y_columns: Vec<usize>,
}

impl ChartSpec {
    /// Heuristic chart for a result
    pub fn for_result(result: &QueryResult) -> Self {
        Self::with_kind(result, select_chart(result))
    }

    /// Axes for a result with an already chosen kind.
    ///
    /// x is the first categorical column, falling back to the first numeric
    /// column; y is every numeric column.
    pub fn with_kind(result: &QueryResult, kind: ChartKind) -> Self {
        let (numeric, categorical): (Vec<usize>, Vec<usize>) =
            (0..result.columns.len()).partition(|&idx| is_numeric_column(result, idx));

        let x_column = categorical
            .first()
            .or(numeric.first())
            .copied();

        Self {
            kind,
            x_column,
            y_columns: numeric,
        }
    }

    pub fn x_name<'a>(&self, result: &'a QueryResult) -> Option<&'a str> {
        self.x_column
            .and_then(|idx| result.columns.get(idx))
            .map(String::as_str)
    }

    pub fn y_names<'a>(&self, result: &'a QueryResult) -> Vec<&'a str> {
        self.y_columns
            .iter()
            .filter_map(|&idx| result.columns.get(idx))
            .map(String::as_str)
            .collect()
    }
}
