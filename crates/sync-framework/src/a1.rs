//! # A1 Range Notation
//!
//! Spreadsheet ranges are addressed as `Sheet!A2:W` (open-ended) or
//! `Sheet!Q5:T7` (closed). Columns are letters (`A`..`Z`, `AA`..), rows are
//! 1-based numbers.

use crate::error::FrameworkError;
use std::fmt::{self, Display};

/// Letters for a zero-based column index: `0 -> A`, `25 -> Z`, `26 -> AA`.
pub fn column_letters(index: usize) -> String {
    let mut n = index + 1;
    let mut letters = Vec::new();
    while n > 0 {
        let rem = (n - 1) % 26;
        letters.push(b'A' + rem as u8);
        n = (n - 1) / 26;
    }
    letters.reverse();
    String::from_utf8(letters).unwrap_or_default()
}

/// Zero-based column index for a run of letters (case-insensitive).
pub fn column_index(letters: &str) -> Option<usize> {
    if letters.is_empty() {
        return None;
    }
    let mut n: usize = 0;
    for c in letters.chars() {
        if !c.is_ascii_alphabetic() {
            return None;
        }
        let digit = (c.to_ascii_uppercase() as u8 - b'A') as usize + 1;
        n = n.checked_mul(26)?.checked_add(digit)?;
    }
    Some(n - 1)
}

/// A rectangular range. `end_row == None` means "to the last row with data".
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct A1Range {
    pub sheet: Option<String>,
    pub start_col: usize,
    pub start_row: u32,
    pub end_col: usize,
    pub end_row: Option<u32>,
}

impl A1Range {
    /// Open-ended range covering `start_col..=end_col` from `start_row` down.
    pub fn columns(sheet: Option<&str>, start_col: usize, end_col: usize, start_row: u32) -> Self {
        Self {
            sheet: sheet.map(str::to_string),
            start_col,
            start_row,
            end_col,
            end_row: None,
        }
    }

    /// Closed range `start_col start_row : end_col end_row`.
    pub fn block(
        sheet: Option<&str>,
        start_col: usize,
        start_row: u32,
        end_col: usize,
        end_row: u32,
    ) -> Self {
        Self {
            sheet: sheet.map(str::to_string),
            start_col,
            start_row,
            end_col,
            end_row: Some(end_row),
        }
    }

    pub fn width(&self) -> usize {
        self.end_col - self.start_col + 1
    }

    /// Number of rows for a closed range.
    pub fn height(&self) -> Option<usize> {
        self.end_row.map(|end| (end - self.start_row + 1) as usize)
    }

    /// Parses `Sheet!A2:W`, `'My Sheet'!Q5:T7` or `B3:C4`.
    pub fn parse(input: &str) -> Result<Self, FrameworkError> {
        let invalid = || FrameworkError::InvalidRange(input.to_string());

        let (sheet, cells) = match input.rsplit_once('!') {
            Some((sheet, cells)) => {
                let sheet = sheet.trim_matches('\'');
                if sheet.is_empty() {
                    return Err(invalid());
                }
                (Some(sheet.to_string()), cells)
            }
            None => (None, input),
        };

        let (start, end) = cells.split_once(':').ok_or_else(invalid)?;
        let (start_col, start_row) = split_cell(start).ok_or_else(invalid)?;
        let (end_col, end_row) = split_cell(end).ok_or_else(invalid)?;
        let start_row = start_row.ok_or_else(invalid)?;

        if end_col < start_col || end_row.is_some_and(|end| end < start_row) || start_row == 0 {
            return Err(invalid());
        }

        Ok(Self {
            sheet,
            start_col,
            start_row,
            end_col,
            end_row,
        })
    }
}

fn split_cell(cell: &str) -> Option<(usize, Option<u32>)> {
    let digits_at = cell.find(|c: char| c.is_ascii_digit()).unwrap_or(cell.len());
    let (letters, digits) = cell.split_at(digits_at);
    let col = column_index(letters)?;
    let row = if digits.is_empty() {
        None
    } else {
        Some(digits.parse().ok()?)
    };
    Some((col, row))
}

impl Display for A1Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(sheet) = &self.sheet {
            if sheet.contains(|c: char| !c.is_ascii_alphanumeric() && c != '_') {
                write!(f, "'{}'!", sheet)?;
            } else {
                write!(f, "{}!", sheet)?;
            }
        }
        write!(
            f,
            "{}{}:{}",
            column_letters(self.start_col),
            self.start_row,
            column_letters(self.end_col)
        )?;
        if let Some(end_row) = self.end_row {
            write!(f, "{}", end_row)?;
        }
        Ok(())
    }
}
