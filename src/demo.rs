//! Example orders for running the desk without a spreadsheet (`--offline`).
//!
//! The rows look like what the Sheets API returns for the real form: unformatted
//! values, booleans as booleans, trailing empty cells left out.

use sync_framework::mock::MemoryTable;
use sync_framework::{Cell, Rows};

use crate::model::{MemberStatus, Order, RowId};
use crate::schema::{Column, COLUMN_NAMES};

/// A complete order row (all 23 columns, flags cleared).
pub fn order_row(name: &str, reference: i64, complete: bool) -> Vec<Cell> {
    vec![
        Cell::text("10/05/2022 10:00:00"),
        Cell::text(format!("order{}@serv.com", reference)),
        Cell::text(name),
        Cell::text(format!("--------{}", reference)),
        Cell::text("about:blank"),
        Cell::text("0.2 mm"),
        Cell::Number(3.0),
        Cell::text("PLA-Negro"),
        Cell::text(format!("Comentario {:02}", reference)),
        Cell::Bool(true),
        Cell::text("Me doy por enterado de los métodos de pago"),
        Cell::text("Impresora?"),
        Cell::Bool(true),
        Cell::text("Peso?"),
        Cell::text("Tiempo?"),
        Cell::text("Precio?"),
        Cell::Bool(false),
        Cell::Bool(false),
        Cell::Bool(false),
        Cell::Bool(false),
        if complete {
            Cell::Number(1.0)
        } else {
            Cell::text("0%")
        },
        Cell::Number(reference as f64),
        Cell::text(""),
    ]
}

/// The whole offline sheet, title row included.
pub fn sample_sheet() -> Rows {
    let header: Vec<Cell> = COLUMN_NAMES.iter().map(|name| Cell::text(*name)).collect();

    let mut maribi = order_row("Maribí", 2, false);
    maribi[Column::Rigidity.index()] = Cell::Number(4.0);
    maribi[Column::ColourMaterial.index()] = Cell::text("PLA-Blanco");
    maribi[Column::SaysIsMember.index()] = Cell::Bool(false);
    maribi[Column::LookupMember.index()] = Cell::Bool(false);
    // the API drops the empty REPRO_COMMENTS cell
    maribi.pop();

    let mut unchecked = order_row("Lucía Fernández Ruiz", 4, false);
    unchecked[Column::LookupMember.index()] = Cell::Empty;
    unchecked[Column::Approved.index()] = Cell::Bool(true);

    vec![
        header,
        order_row("Jose María", 1, false),
        maribi,
        order_row("Pedro Gómez", 3, true),
        unchecked,
        // someone abandoned the form half way
        vec![Cell::text("12/05/2022 18:30:00"), Cell::text("x@serv.com")],
        order_row("Carmen de la Torre", 5, false),
    ]
}

pub fn offline_table(sheet: &str) -> MemoryTable {
    MemoryTable::new(Some(sheet), sample_sheet())
}

/// A decoded order with every field filled in.
pub fn sample_order(row: RowId) -> Order {
    Order {
        row,
        timestamp: "10/05/2022 10:00:00".to_string(),
        email: "correo@serv.com".to_string(),
        name: "Jose M.".to_string(),
        phone: "--------1".to_string(),
        file_link: "about:blank".to_string(),
        layer_height: "0.3 mm".to_string(),
        rigidity: "3".to_string(),
        colour_material: "PLA-Negro".to_string(),
        comment: "Comentario 01".to_string(),
        says_is_member: true,
        accepts_paying: "Me doy por enterado de los métodos de pago".to_string(),
        printer: "Impresora?".to_string(),
        member_lookup: MemberStatus::Verified,
        weight: "Peso?".to_string(),
        time: "Tiempo?".to_string(),
        price: "Precio?".to_string(),
        approved: false,
        printed: false,
        picked_up: false,
        paid: false,
        completion: 0.0,
        reference: Cell::Number(1.0),
        repro_comments: String::new(),
    }
}
