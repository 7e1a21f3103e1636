//! # Order Sheet Schema
//!
//! The order form writes one row per request into a 23-column sheet (`A..W`).
//! Row 1 holds the form's column titles, so data starts at row 2.

use std::fmt;
use sync_framework::a1::column_letters;
use sync_framework::A1Range;

use crate::model::{Flag, RowId};

/// Column tags in sheet order, replacing the form's generated titles.
pub const COLUMN_NAMES: [&str; 23] = [
    "TEMP",
    "EMAIL",
    "NAME",
    "TEF",
    "FILE_LINK",
    "LAYER_H",
    "RIGIDITY",
    "COLOUR_MATERIAL",
    "COMMENT",
    "SAYS_IS_MEMBER",
    "ACCEPTS_PAYING",
    "PRINTER",
    "LOOKUP_MEMBER",
    "WEIGHT",
    "TIME",
    "PRICE",
    "APPROVED",
    "PRINTED",
    "PICKED_UP",
    "PAID",
    "COMPLETION",
    "REF",
    "REPRO_COMMENTS",
];

pub const SCHEMA_LEN: usize = COLUMN_NAMES.len();

/// One column of the order sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Column {
    Temp,
    Email,
    Name,
    Tef,
    FileLink,
    LayerH,
    Rigidity,
    ColourMaterial,
    Comment,
    SaysIsMember,
    AcceptsPaying,
    Printer,
    LookupMember,
    Weight,
    Time,
    Price,
    Approved,
    Printed,
    PickedUp,
    Paid,
    Completion,
    Ref,
    ReproComments,
}

/// Columns holding `TRUE` / `FALSE` / empty.
pub const BOOLEAN_COLUMNS: [Column; 5] = [
    Column::SaysIsMember,
    Column::Approved,
    Column::Printed,
    Column::PickedUp,
    Column::Paid,
];

impl Column {
    /// Zero-based position in the row.
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        COLUMN_NAMES[self.index()]
    }

    /// Column letter, e.g. `Q` for [`Column::Approved`].
    pub fn letter(self) -> String {
        column_letters(self.index())
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Where the orders live inside the spreadsheet.
///
/// This is the scheduler context for the order book: it is handed to `run()` and
/// used to address both the full fetch and the partial flag writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetLayout {
    pub sheet: String,
    /// Sheet row of the first order (row 1 holds the column titles).
    pub first_data_row: u32,
    /// Rows with fewer non-empty cells than this are treated as malformed.
    pub min_populated_fields: usize,
}

impl Default for SheetLayout {
    fn default() -> Self {
        Self {
            sheet: "HojaA".to_string(),
            first_data_row: 2,
            min_populated_fields: 18,
        }
    }
}

impl SheetLayout {
    /// The full order range, e.g. `HojaA!A2:W`.
    pub fn data_range(&self) -> A1Range {
        A1Range::columns(Some(&self.sheet), 0, SCHEMA_LEN - 1, self.first_data_row)
    }

    /// Sheet row number of an order.
    pub fn sheet_row(&self, row: RowId) -> u32 {
        self.first_data_row + row.0
    }

    /// The four flag cells of a block of consecutive orders, e.g. `HojaA!Q5:T7`.
    pub fn flag_range(&self, first: RowId, last: RowId) -> A1Range {
        A1Range::block(
            Some(&self.sheet),
            Flag::FIRST.column().index(),
            self.sheet_row(first),
            Flag::LAST.column().index(),
            self.sheet_row(last),
        )
    }
}
