//! # Raw Cell Values
//!
//! A remote table hands back rows of loosely typed cells: text, numbers,
//! booleans, or nothing at all. [`Cell`] keeps that shape untouched so the
//! domain transform decides what each column means.

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt::{self, Display};

/// One cell as delivered by (or sent to) the remote table.
///
/// Deserialization is untagged, so a JSON `values` array such as
/// `["2022-05-10", 3, true, null]` maps onto the matching variants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(untagged)]
pub enum Cell {
    #[default]
    Empty,
    Bool(bool),
    Number(f64),
    Text(String),
}

/// A rectangular block of cells, row-major.
pub type Rows = Vec<Vec<Cell>>;

impl Cell {
    /// Shorthand for a text cell.
    pub fn text(value: impl Into<String>) -> Self {
        Cell::Text(value.into())
    }

    /// True for missing cells and for text that is blank after trimming.
    pub fn is_empty(&self) -> bool {
        match self {
            Cell::Empty => true,
            Cell::Text(s) => s.trim().is_empty(),
            Cell::Bool(_) | Cell::Number(_) => false,
        }
    }

    /// Renders the cell the way a spreadsheet would show it.
    ///
    /// Booleans become `TRUE` / `FALSE` and integral numbers lose their
    /// fractional part, so `3.0` renders as `3`.
    pub fn as_text(&self) -> Cow<'_, str> {
        match self {
            Cell::Empty => Cow::Borrowed(""),
            Cell::Bool(true) => Cow::Borrowed("TRUE"),
            Cell::Bool(false) => Cow::Borrowed("FALSE"),
            Cell::Number(n) if n.fract() == 0.0 && n.is_finite() => {
                Cow::Owned(format!("{}", *n as i64))
            }
            Cell::Number(n) => Cow::Owned(n.to_string()),
            Cell::Text(s) => Cow::Borrowed(s.as_str()),
        }
    }

    /// Integral value of a numeric cell, if it has one.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Cell::Number(n) if n.fract() == 0.0 && n.is_finite() => Some(*n as i64),
            _ => None,
        }
    }
}

impl Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_text())
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

impl From<bool> for Cell {
    fn from(value: bool) -> Self {
        Cell::Bool(value)
    }
}

impl From<f64> for Cell {
    fn from(value: f64) -> Self {
        Cell::Number(value)
    }
}

impl From<i64> for Cell {
    fn from(value: i64) -> Self {
        Cell::Number(value as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_text_counts_as_empty() {
        assert!(Cell::Empty.is_empty());
        assert!(Cell::text("   ").is_empty());
        assert!(!Cell::text("x").is_empty());
        assert!(!Cell::Bool(false).is_empty());
        assert!(!Cell::Number(0.0).is_empty());
    }

    #[test]
    fn test_as_text_matches_spreadsheet_rendering() {
        assert_eq!(Cell::Bool(true).as_text(), "TRUE");
        assert_eq!(Cell::Number(3.0).as_text(), "3");
        assert_eq!(Cell::Number(0.25).as_text(), "0.25");
        assert_eq!(Cell::Empty.as_text(), "");
    }

    #[test]
    fn test_untagged_json_values() {
        let row: Vec<Cell> = serde_json::from_str(r#"["Ana", 7, true, null, ""]"#).unwrap();
        assert_eq!(
            row,
            vec![
                Cell::text("Ana"),
                Cell::Number(7.0),
                Cell::Bool(true),
                Cell::Empty,
                Cell::text(""),
            ]
        );
        assert_eq!(row[1].as_integer(), Some(7));
    }
}
