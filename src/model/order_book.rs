use std::collections::BTreeMap;

use super::{Order, RowId};

/// The orders currently known to the desk, keyed by row.
///
/// Owned by the sync scheduler; everyone else sees clones.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OrderBook {
    orders: BTreeMap<RowId, Order>,
}

impl OrderBook {
    pub fn new(orders: impl IntoIterator<Item = Order>) -> Self {
        Self {
            orders: orders.into_iter().map(|order| (order.row, order)).collect(),
        }
    }

    pub fn get(&self, row: &RowId) -> Option<&Order> {
        self.orders.get(row)
    }

    pub(crate) fn get_mut(&mut self, row: &RowId) -> Option<&mut Order> {
        self.orders.get_mut(row)
    }

    pub fn contains(&self, row: &RowId) -> bool {
        self.orders.contains_key(row)
    }

    /// Orders in sheet order.
    pub fn iter(&self) -> impl Iterator<Item = &Order> {
        self.orders.values()
    }

    pub fn len(&self) -> usize {
        self.orders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }
}
