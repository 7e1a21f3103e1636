//! # SyncEntity Trait
//!
//! The `SyncEntity` trait is the contract a record set implements to be owned by the
//! generic [`SyncActor`](crate::SyncActor). The actor knows about timers, locks and
//! message passing; the entity knows what the rows mean.
//!
//! # Architecture Note
//! The scheduler loop (debounce, poll, flush, re-fetch) is written *once* against
//! this trait. A record set only has to say how to turn raw rows into itself, how to
//! apply one local edit, and which partial ranges to write back for a set of dirty
//! rows.
//!
//! Associated types keep the pieces apart: an `OrderBook` accepts `FlagEdit`s and
//! nothing else, and the compiler enforces it.

use crate::a1::A1Range;
use crate::cell::Rows;
use crate::table::RangeWrite;
use std::collections::BTreeSet;
use std::fmt::{Debug, Display};

/// A record set that can be fetched, edited locally and flushed back.
pub trait SyncEntity: Sized + Send + Sync + 'static {
    /// Identifies one record (for a sheet, its row position in the fetched range).
    type Id: Ord + Clone + Send + Sync + Display + Debug;

    /// One record as handed to the presentation layer.
    type Record: Clone + Send + Sync + Debug;

    /// A local mutation of one record.
    type Edit: Clone + Send + Sync + Debug;

    /// Static description of where the data lives (sheet name, schema, thresholds).
    /// Injected into `run()`, not `new()`.
    type Context: Send + Sync;

    /// The error type for decoding and editing.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Range read on every fetch.
    fn fetch_range(ctx: &Self::Context) -> A1Range;

    /// Builds a fresh record set from raw rows. A single bad row fails the whole
    /// fetch; no partial set is returned.
    fn decode(rows: Rows, ctx: &Self::Context) -> Result<Self, Self::Error>;

    /// The record an edit targets.
    fn edit_target(edit: &Self::Edit) -> Self::Id;

    /// Applies an edit in place. Only called for ids that [`contains`](Self::contains).
    fn apply_edit(&mut self, edit: &Self::Edit) -> Result<(), Self::Error>;

    fn contains(&self, id: &Self::Id) -> bool;

    fn get(&self, id: &Self::Id) -> Option<Self::Record>;

    /// All records in display order.
    fn records(&self) -> Vec<Self::Record>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Partial ranges covering exactly the dirty records. The scheduler sends all of
    /// them in one [`write_batch`](crate::TableClient::write_batch) call.
    fn flush_writes(&self, dirty: &BTreeSet<Self::Id>, ctx: &Self::Context) -> Vec<RangeWrite>;
}
