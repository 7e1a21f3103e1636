//! # Order Book Scheduler
//!
//! Wires the [`OrderBook`] into a [`SyncActor`]: the book is fetched from the order
//! range, flag edits are debounced, and dirty rows are written back to `Q..T`.
//!
//! ## Structure
//!
//! - [`entity`] - [`SyncEntity`](sync_framework::SyncEntity) implementation for [`OrderBook`]
//! - [`new()`] - Factory function that creates the actor and client
//!
//! ## Usage
//!
//! ```rust,ignore
//! let (actor, client) = book::new(table, SyncTiming::default());
//! tokio::spawn(actor.run(SheetLayout::default()));
//!
//! client.set_flag(RowId(3), Flag::Printed, true).await?;
//! ```

pub mod entity;

use sync_framework::{SerializedTable, SyncActor, SyncTiming, TableClient};

use crate::clients::OrderDeskClient;
use crate::model::OrderBook;

/// Creates the order book scheduler and its client.
pub fn new<C: TableClient>(
    table: SerializedTable<C>,
    timing: SyncTiming,
) -> (SyncActor<OrderBook, C>, OrderDeskClient) {
    let (actor, generic_client) = SyncActor::new(32, table, timing);
    (actor, OrderDeskClient::new(generic_client))
}
