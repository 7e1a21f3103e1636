//! [`SyncEntity`] implementation for [`OrderBook`].

use std::collections::BTreeSet;
use sync_framework::{A1Range, RangeWrite, Rows, SyncEntity};

use crate::error::DeskError;
use crate::model::{FlagEdit, Order, OrderBook, RowId};
use crate::schema::SheetLayout;
use crate::transform;

impl SyncEntity for OrderBook {
    type Id = RowId;
    type Record = Order;
    type Edit = FlagEdit;
    type Context = SheetLayout;
    type Error = DeskError;

    fn fetch_range(layout: &SheetLayout) -> A1Range {
        layout.data_range()
    }

    fn decode(rows: Rows, layout: &SheetLayout) -> Result<Self, DeskError> {
        transform::decode_rows(rows, layout.min_populated_fields)
    }

    fn edit_target(edit: &FlagEdit) -> RowId {
        edit.row
    }

    fn apply_edit(&mut self, edit: &FlagEdit) -> Result<(), DeskError> {
        let order = self
            .get_mut(&edit.row)
            .ok_or_else(|| DeskError::OrderNotFound(edit.row.to_string()))?;
        order.set_flag(edit.flag, edit.value);
        Ok(())
    }

    fn contains(&self, id: &RowId) -> bool {
        OrderBook::contains(self, id)
    }

    fn get(&self, id: &RowId) -> Option<Order> {
        OrderBook::get(self, id).cloned()
    }

    fn records(&self) -> Vec<Order> {
        self.iter().cloned().collect()
    }

    fn len(&self) -> usize {
        OrderBook::len(self)
    }

    /// One range per run of consecutive dirty rows, covering only `Q..T`. The
    /// scheduler sends them all in a single batch call.
    fn flush_writes(&self, dirty: &BTreeSet<RowId>, layout: &SheetLayout) -> Vec<RangeWrite> {
        let mut writes = Vec::new();
        let mut run: Vec<&Order> = Vec::new();

        for id in dirty {
            let Some(order) = OrderBook::get(self, id) else {
                continue;
            };
            let breaks = run.last().is_some_and(|last| last.row.0 + 1 != id.0);
            if breaks {
                writes.push(flag_write(&run, layout));
                run.clear();
            }
            run.push(order);
        }
        if !run.is_empty() {
            writes.push(flag_write(&run, layout));
        }
        writes
    }
}

fn flag_write(run: &[&Order], layout: &SheetLayout) -> RangeWrite {
    let first = run[0].row;
    let last = run[run.len() - 1].row;
    let rows = run.iter().map(|order| order.flag_cells()).collect();
    (layout.flag_range(first, last), rows)
}
