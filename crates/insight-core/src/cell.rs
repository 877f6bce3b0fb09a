//! Typed cell values and the coercion applied to raw imported text

use std::fmt;
use serde::{Serialize, Deserialize};

/// A single imported or queried value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Cell {
    Null,
    Number(f64),
    Text(String),
}

impl Cell {
    pub fn is_null(&self) -> bool {
        matches!(self, Cell::Null)
    }

    /// Numeric view of the cell, including text holding a plain finite number
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Cell::Number(n) => Some(*n),
            Cell::Text(s) => parse_finite(s.trim()),
            Cell::Null => None,
        }
    }

    /// Whether the cell reads as a number under the import grammar
    pub fn looks_numeric(&self) -> bool {
        self.as_number().is_some()
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Null => Ok(()),
            Cell::Number(n) => f.write_str(&format_number(*n)),
            Cell::Text(s) => f.write_str(s),
        }
    }
}

impl From<f64> for Cell {
    fn from(value: f64) -> Self {
        Cell::Number(value)
    }
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        Cell::Text(value.to_string())
    }
}

impl From<String> for Cell {
    fn from(value: String) -> Self {
        Cell::Text(value)
    }
}

/// Classify a raw value coming off a file parser.
///
/// Absent and all-whitespace values become `Null`. Anything else is trimmed
/// and becomes a `Number` when it matches the plain numeric grammar, or
/// `Text` holding the trimmed string.
pub fn coerce(raw: Option<&str>) -> Cell {
    let Some(raw) = raw else {
        return Cell::Null;
    };
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Cell::Null;
    }
    match parse_finite(trimmed) {
        Some(value) => Cell::Number(value),
        None => Cell::Text(trimmed.to_string()),
    }
}

/// Value of a plain numeric literal, unless it overflows to infinity
fn parse_finite(value: &str) -> Option<f64> {
    if !is_numeric_literal(value) {
        return None;
    }
    value.parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Check a string against the plain numeric grammar:
/// `[+-]? (digits [. digits?] | . digits) ([eE] [+-]? digits)?`
///
/// No currency symbols, thousands separators, hex, `inf` or `NaN`.
pub fn is_numeric_literal(value: &str) -> bool {
    let bytes = value.as_bytes();
    let mut pos = 0;

    if matches!(bytes.first(), Some(b'+') | Some(b'-')) {
        pos += 1;
    }

    let int_start = pos;
    while pos < bytes.len() && bytes[pos].is_ascii_digit() {
        pos += 1;
    }
    let int_digits = pos - int_start;

    let mut frac_digits = 0;
    if pos < bytes.len() && bytes[pos] == b'.' {
        pos += 1;
        let frac_start = pos;
        while pos < bytes.len() && bytes[pos].is_ascii_digit() {
            pos += 1;
        }
        frac_digits = pos - frac_start;
    }

    if int_digits == 0 && frac_digits == 0 {
        return false;
    }

    if pos < bytes.len() && matches!(bytes[pos], b'e' | b'E') {
        pos += 1;
        if matches!(bytes.get(pos), Some(b'+') | Some(b'-')) {
            pos += 1;
        }
        let exp_start = pos;
        while pos < bytes.len() && bytes[pos].is_ascii_digit() {
            pos += 1;
        }
        if pos == exp_start {
            return false;
        }
    }

    pos == bytes.len()
}

/// Render a number the way it is shown and exported: integral values
/// without a trailing `.0`, everything else in shortest round-trip form.
pub fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coerce_null_inputs() {
        assert_eq!(coerce(None), Cell::Null);
        assert_eq!(coerce(Some("")), Cell::Null);
        assert_eq!(coerce(Some("   \t ")), Cell::Null);
    }

    #[test]
    fn test_coerce_numbers() {
        assert_eq!(coerce(Some("  42 ")), Cell::Number(42.0));
        assert_eq!(coerce(Some("-3.5")), Cell::Number(-3.5));
        assert_eq!(coerce(Some("+.5")), Cell::Number(0.5));
        assert_eq!(coerce(Some("7.")), Cell::Number(7.0));
        assert_eq!(coerce(Some("1e3")), Cell::Number(1000.0));
        assert_eq!(coerce(Some("2.5E-2")), Cell::Number(0.025));
    }

    #[test]
    fn test_coerce_text() {
        assert_eq!(coerce(Some("42abc")), Cell::Text("42abc".to_string()));
        assert_eq!(coerce(Some(" hello ")), Cell::Text("hello".to_string()));
        for raw in ["$5", "1,000", "0x10", "inf", "NaN", "1e", ".", "-", "1.2.3", "1e400"] {
            assert!(matches!(coerce(Some(raw)), Cell::Text(_)), "{raw} should be text");
        }
    }

    #[test]
    fn test_coerce_is_deterministic() {
        for raw in ["", " 1 ", "abc", "3.14", "1e400"] {
            assert_eq!(coerce(Some(raw)), coerce(Some(raw)));
        }
    }

    #[test]
    fn test_numeric_view_agrees_with_coerce() {
        assert_eq!(Cell::from(" 12.5 ").as_number(), Some(12.5));
        assert!(Cell::from("-4").looks_numeric());
        assert!(Cell::Number(3.0).looks_numeric());

        for raw in ["1e400", "-1e400", "abc", "1,000", "inf"] {
            let cell = Cell::from(raw);
            assert_eq!(cell.as_number(), None, "{raw}");
            assert!(!cell.looks_numeric(), "{raw}");
            assert!(matches!(coerce(Some(raw)), Cell::Text(_)));
        }
        assert!(!Cell::Null.looks_numeric());
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(42.0), "42");
        assert_eq!(format_number(-0.25), "-0.25");
        assert_eq!(format_number(0.1 + 0.2), "0.30000000000000004");
    }

    #[test]
    fn test_display_round_trips_through_coerce() {
        for cell in [Cell::Number(12.0), Cell::Number(-1.5), Cell::Number(1e-7)] {
            assert_eq!(coerce(Some(&cell.to_string())), cell);
        }
    }
}
