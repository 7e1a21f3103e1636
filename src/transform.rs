//! # Order Transform
//!
//! Turns the raw rows of the order sheet into an [`OrderBook`]:
//!
//! 1. pad each row to the schema width (the Sheets API omits trailing empty cells),
//! 2. drop rows with too few populated cells (half-filled or broken form entries),
//! 3. parse the boolean, membership and completion columns,
//! 4. redact the requester's name to `First L.` form.
//!
//! A single bad cell in a kept row fails the whole batch; no partial book is
//! returned.

use sync_framework::{Cell, Rows};
use tracing::debug;

use crate::error::DeskError;
use crate::model::{MemberStatus, Order, OrderBook, RowId};
use crate::schema::{Column, SCHEMA_LEN};

/// Brings a row to exactly `schema_len` cells.
///
/// Rows longer than the schema cannot come from the order range and are
/// rejected.
pub fn pad_row(mut row: Vec<Cell>, id: RowId, schema_len: usize) -> Result<Vec<Cell>, DeskError> {
    if row.len() == schema_len - 1 {
        row.push(Cell::Empty);
    }
    if row.len() > schema_len {
        return Err(DeskError::DataIntegrity {
            row: id,
            column: "*",
            value: format!("{} cells, expected {}", row.len(), schema_len),
        });
    }
    row.resize(schema_len, Cell::Empty);
    Ok(row)
}

/// Number of non-empty cells.
pub fn populated_fields(row: &[Cell]) -> usize {
    row.iter().filter(|cell| !cell.is_empty()).count()
}

/// `TRUE` / `FALSE` / empty, exact match. Native booleans pass through.
pub fn parse_flag(cell: &Cell, id: RowId, column: Column) -> Result<bool, DeskError> {
    match cell {
        Cell::Empty => Ok(false),
        Cell::Bool(b) => Ok(*b),
        Cell::Text(s) => match s.as_str() {
            "TRUE" => Ok(true),
            "FALSE" | "" => Ok(false),
            _ => Err(integrity(id, column, cell)),
        },
        Cell::Number(_) => Err(integrity(id, column, cell)),
    }
}

/// Like [`parse_flag`], but an empty cell means the check was never done.
pub fn parse_member(cell: &Cell, id: RowId) -> Result<MemberStatus, DeskError> {
    if cell.is_empty() {
        return Ok(MemberStatus::Unchecked);
    }
    parse_flag(cell, id, Column::LookupMember).map(|verified| {
        if verified {
            MemberStatus::Verified
        } else {
            MemberStatus::NotVerified
        }
    })
}

/// A number, a percentage such as `50%`, or empty (0.0). Must land in `0.0..=1.0`.
pub fn parse_completion(cell: &Cell, id: RowId) -> Result<f64, DeskError> {
    let value = match cell {
        Cell::Empty => Some(0.0),
        Cell::Number(n) => Some(*n),
        Cell::Text(s) => {
            let s = s.trim();
            if s.is_empty() {
                Some(0.0)
            } else if let Some(percent) = s.strip_suffix('%') {
                percent.trim().parse::<f64>().ok().map(|p| p / 100.0)
            } else {
                s.parse::<f64>().ok()
            }
        }
        Cell::Bool(_) => None,
    };
    match value {
        Some(v) if v.is_finite() && (0.0..=1.0).contains(&v) => Ok(v),
        _ => Err(integrity(id, Column::Completion, cell)),
    }
}

/// Keeps the first name and shortens every other token to its initial.
///
/// `"Jose Maria Lopez"` becomes `"Jose M. L."`.
pub fn redact_name(name: &str) -> String {
    let mut tokens = name.split_whitespace();
    let Some(first) = tokens.next() else {
        return String::new();
    };
    let mut redacted = vec![first.to_string()];
    for token in tokens {
        let initial: String = token
            .chars()
            .next()
            .map(|c| c.to_uppercase().collect())
            .unwrap_or_default();
        redacted.push(format!("{}.", initial));
    }
    redacted.join(" ")
}

/// Decodes one padded row.
pub fn decode_row(id: RowId, row: &[Cell]) -> Result<Order, DeskError> {
    let text = |column: Column| row[column.index()].as_text().into_owned();
    let flag = |column: Column| parse_flag(&row[column.index()], id, column);

    Ok(Order {
        row: id,
        timestamp: text(Column::Temp),
        email: text(Column::Email),
        name: redact_name(&text(Column::Name)),
        phone: text(Column::Tef),
        file_link: text(Column::FileLink),
        layer_height: text(Column::LayerH),
        rigidity: text(Column::Rigidity),
        colour_material: text(Column::ColourMaterial),
        comment: text(Column::Comment),
        says_is_member: flag(Column::SaysIsMember)?,
        accepts_paying: text(Column::AcceptsPaying),
        printer: text(Column::Printer),
        member_lookup: parse_member(&row[Column::LookupMember.index()], id)?,
        weight: text(Column::Weight),
        time: text(Column::Time),
        price: text(Column::Price),
        approved: flag(Column::Approved)?,
        printed: flag(Column::Printed)?,
        picked_up: flag(Column::PickedUp)?,
        paid: flag(Column::Paid)?,
        completion: parse_completion(&row[Column::Completion.index()], id)?,
        reference: row[Column::Ref.index()].clone(),
        repro_comments: text(Column::ReproComments),
    })
}

/// Decodes the whole order range.
///
/// Sparse rows are dropped before any column is parsed, so a half-filled row with
/// garbage in a flag column is skipped rather than reported.
pub fn decode_rows(rows: Rows, min_populated_fields: usize) -> Result<OrderBook, DeskError> {
    let total = rows.len();
    let mut orders = Vec::with_capacity(total);

    for (i, raw) in rows.into_iter().enumerate() {
        let id = RowId(i as u32);
        let row = pad_row(raw, id, SCHEMA_LEN)?;
        let populated = populated_fields(&row);
        if populated < min_populated_fields {
            debug!(row = %id, populated, "Skipping sparse row");
            continue;
        }
        orders.push(decode_row(id, &row)?);
    }

    debug!(total, kept = orders.len(), "Decoded orders");
    Ok(OrderBook::new(orders))
}

fn integrity(id: RowId, column: Column, cell: &Cell) -> DeskError {
    DeskError::DataIntegrity {
        row: id,
        column: column.name(),
        value: cell.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::demo;

    fn full_row() -> Vec<Cell> {
        demo::order_row("Jose Maria Lopez", 1, false)
    }

    #[test]
    fn test_pad_row_adds_one_trailing_empty() {
        let mut row = full_row();
        row.pop();
        assert_eq!(row.len(), SCHEMA_LEN - 1);

        let padded = pad_row(row, RowId(0), SCHEMA_LEN).unwrap();
        assert_eq!(padded.len(), SCHEMA_LEN);
        assert_eq!(padded[SCHEMA_LEN - 1], Cell::Empty);
    }

    #[test]
    fn test_pad_row_fills_short_rows_and_rejects_long_ones() {
        let short = vec![Cell::text("a"), Cell::text("b")];
        assert_eq!(pad_row(short, RowId(0), SCHEMA_LEN).unwrap().len(), SCHEMA_LEN);

        let mut long = full_row();
        long.push(Cell::text("extra"));
        assert!(matches!(
            pad_row(long, RowId(4), SCHEMA_LEN),
            Err(DeskError::DataIntegrity { row: RowId(4), .. })
        ));
    }

    #[test]
    fn test_parse_flag_mapping() {
        let id = RowId(0);
        let col = Column::Approved;
        assert_eq!(parse_flag(&Cell::text("TRUE"), id, col), Ok(true));
        assert_eq!(parse_flag(&Cell::text("FALSE"), id, col), Ok(false));
        assert_eq!(parse_flag(&Cell::text(""), id, col), Ok(false));
        assert_eq!(parse_flag(&Cell::Empty, id, col), Ok(false));
        assert_eq!(parse_flag(&Cell::Bool(true), id, col), Ok(true));
    }

    #[test]
    fn test_parse_flag_rejects_other_literals() {
        for value in ["true", "yes", "1", " TRUE"] {
            let result = parse_flag(&Cell::text(value), RowId(3), Column::Paid);
            assert_eq!(
                result,
                Err(DeskError::DataIntegrity {
                    row: RowId(3),
                    column: "PAID",
                    value: value.to_string(),
                })
            );
        }
        assert!(parse_flag(&Cell::Number(1.0), RowId(3), Column::Paid).is_err());
    }

    #[test]
    fn test_parse_member_is_tri_state() {
        let id = RowId(0);
        assert_eq!(parse_member(&Cell::Empty, id), Ok(MemberStatus::Unchecked));
        assert_eq!(parse_member(&Cell::text(""), id), Ok(MemberStatus::Unchecked));
        assert_eq!(parse_member(&Cell::Bool(true), id), Ok(MemberStatus::Verified));
        assert_eq!(
            parse_member(&Cell::text("FALSE"), id),
            Ok(MemberStatus::NotVerified)
        );
        assert!(parse_member(&Cell::text("maybe"), id).is_err());
    }

    #[test]
    fn test_parse_completion() {
        let id = RowId(0);
        assert_eq!(parse_completion(&Cell::Empty, id), Ok(0.0));
        assert_eq!(parse_completion(&Cell::Number(1.0), id), Ok(1.0));
        assert_eq!(parse_completion(&Cell::text("50%"), id), Ok(0.5));
        assert_eq!(parse_completion(&Cell::text("0%"), id), Ok(0.0));
        assert_eq!(parse_completion(&Cell::text("0.25"), id), Ok(0.25));
        assert!(parse_completion(&Cell::text("half"), id).is_err());
        assert!(parse_completion(&Cell::Number(2.0), id).is_err());
        assert!(parse_completion(&Cell::Bool(true), id).is_err());
    }

    #[test]
    fn test_redact_name() {
        assert_eq!(redact_name("Jose Maria Lopez"), "Jose M. L.");
        assert_eq!(redact_name("Maribí"), "Maribí");
        assert_eq!(redact_name("ana  de   la cruz"), "ana D. L. C.");
        assert_eq!(redact_name("Jose álvarez"), "Jose Á.");
        assert_eq!(redact_name(""), "");
        assert_eq!(redact_name("   "), "");
    }

    #[test]
    fn test_decode_rows_skips_sparse_rows_and_keeps_row_ids() {
        let rows = vec![
            demo::order_row("Jose Maria", 1, false),
            // half-filled form entry with junk in a flag column
            vec![
                Cell::text("2022-05-10 10:00:00"),
                Cell::text("x@y.z"),
                Cell::Empty,
                Cell::Empty,
                Cell::Empty,
                Cell::Empty,
                Cell::Empty,
                Cell::Empty,
                Cell::Empty,
                Cell::Empty,
                Cell::Empty,
                Cell::Empty,
                Cell::Empty,
                Cell::Empty,
                Cell::Empty,
                Cell::Empty,
                Cell::text("???"),
            ],
            demo::order_row("Maribí", 3, false),
        ];

        let book = decode_rows(rows, 18).unwrap();
        assert_eq!(book.len(), 2);
        assert!(book.contains(&RowId(0)));
        assert!(!book.contains(&RowId(1)));
        let second = book.get(&RowId(2)).unwrap();
        assert_eq!(second.name, "Maribí");
        assert_eq!(second.ref_label(), "#0003");
    }

    #[test]
    fn test_decode_rows_fails_whole_batch_on_bad_flag() {
        let mut bad = demo::order_row("Jose Maria", 2, false);
        bad[Column::Printed.index()] = Cell::text("yes");
        let rows = vec![demo::order_row("Ana", 1, false), bad];

        let result = decode_rows(rows, 18);
        assert_eq!(
            result,
            Err(DeskError::DataIntegrity {
                row: RowId(1),
                column: "PRINTED",
                value: "yes".to_string(),
            })
        );
    }

    #[test]
    fn test_decode_row_normalizes_fields() {
        let mut row = full_row();
        row[Column::Approved.index()] = Cell::text("TRUE");
        row[Column::Paid.index()] = Cell::Bool(true);
        row[Column::Tef.index()] = Cell::Number(612345678.0);
        row[Column::Completion.index()] = Cell::text("100%");

        let order = decode_row(RowId(5), &row).unwrap();
        assert_eq!(order.row, RowId(5));
        assert_eq!(order.name, "Jose M. L.");
        assert_eq!(order.phone, "612345678");
        assert!(order.approved);
        assert!(order.paid);
        assert!(!order.printed);
        assert!(order.is_complete());
    }
}
