//! # Sync Scheduler
//!
//! This module defines the `SyncActor`, the task that owns a record set and keeps it in
//! step with a remote table. It is the "Server" side of the pattern: one task, one
//! loop, exclusive ownership of the state.
//!
//! ## The loop
//!
//! Three event sources feed a single `tokio::select!`:
//!
//! * **Requests** from [`SyncClient`]s (edits, queries, manual refresh/flush).
//! * **Debounce deadline**: single-shot, pushed back by every edit. When it expires the
//!   dirty records are written back in one batch call and the table is re-fetched.
//! * **Poll interval**: repeating. Fetches the whole range regardless of edit activity.
//!
//! Remote calls are awaited inside the loop, so a poll tick that elapses during a flush
//! is only observed once the flush is done (`MissedTickBehavior::Delay`). The table
//! itself sits behind a [`SerializedTable`], which keeps any other caller from
//! overlapping with the scheduler.
//!
//! ## Failure policy
//!
//! A failed fetch keeps the previous record set. A failed flush keeps the edits pending;
//! the next poll tick retries them before it fetches. There is no backoff.
//!
//! ## Events
//!
//! Events go out on a bounded channel with `try_send`. The scheduler never waits for
//! the presentation layer: when the receiver falls behind, new events are dropped
//! and a warning is logged.

use crate::client::SyncClient;
use crate::entity::SyncEntity;
use crate::error::FrameworkError;
use crate::message::{SyncEvent, SyncRequest, SyncState};
use crate::table::{SerializedTable, TableClient};
use std::collections::BTreeSet;
use std::time::Duration;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, watch};
use tokio::time::{interval_at, sleep_until, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

/// Timer settings for the scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncTiming {
    /// Quiet period after the last edit before a flush.
    pub debounce: Duration,
    /// Period of the unconditional full refresh.
    pub poll_interval: Duration,
}

impl Default for SyncTiming {
    fn default() -> Self {
        Self {
            debounce: Duration::from_secs(5),
            poll_interval: Duration::from_secs(60),
        }
    }
}

/// The scheduler that owns a record set of type `T` and syncs it through `C`.
///
/// # Usage Pattern
///
/// 1.  **Create**: `SyncActor::new()` returns the actor and a cloneable [`SyncClient`].
/// 2.  **Wire**: optionally attach an event channel with [`with_events`](Self::with_events).
/// 3.  **Run**: spawn `actor.run(context)`; the first fetch happens immediately.
///
/// Dropping every client ends the loop. Edits still pending at that point are
/// flushed once before the task returns.
pub struct SyncActor<T: SyncEntity, C: TableClient> {
    receiver: mpsc::Receiver<SyncRequest<T>>,
    table: SerializedTable<C>,
    timing: SyncTiming,
    book: Option<T>,
    pending: Vec<T::Edit>,
    debounce_deadline: Option<Instant>,
    state: watch::Sender<SyncState>,
    events: Option<mpsc::Sender<SyncEvent<T::Record>>>,
    entity_type: &'static str,
}

impl<T: SyncEntity, C: TableClient> SyncActor<T, C> {
    /// Creates a new `SyncActor` and its associated `SyncClient`.
    ///
    /// `buffer_size` is the capacity of the request channel. When it is full, client
    /// calls wait for space.
    pub fn new(
        buffer_size: usize,
        table: SerializedTable<C>,
        timing: SyncTiming,
    ) -> (Self, SyncClient<T>) {
        let (sender, receiver) = mpsc::channel(buffer_size);
        let (state, state_rx) = watch::channel(SyncState::Idle);
        // Just the type name, e.g. "OrderBook"
        let entity_type = std::any::type_name::<T>()
            .split("::")
            .last()
            .unwrap_or("Unknown");
        let actor = Self {
            receiver,
            table,
            timing,
            book: None,
            pending: Vec::new(),
            debounce_deadline: None,
            state,
            events: None,
            entity_type,
        };
        (actor, SyncClient::new(sender, state_rx))
    }

    /// Sends [`SyncEvent`]s to the presentation layer. Events that do not fit in the
    /// channel are dropped.
    pub fn with_events(mut self, events: mpsc::Sender<SyncEvent<T::Record>>) -> Self {
        self.events = Some(events);
        self
    }

    /// Runs the scheduler loop until every client has been dropped.
    ///
    /// # Context Injection
    /// The `context` (sheet layout, thresholds) is handed to every entity hook.
    pub async fn run(mut self, context: T::Context) {
        let entity_type = self.entity_type;
        info!(
            entity_type,
            debounce_ms = self.timing.debounce.as_millis() as u64,
            poll_secs = self.timing.poll_interval.as_secs(),
            "Scheduler started"
        );

        let _ = self.on_poll(&context).await;

        let period = self.timing.poll_interval;
        let mut poll = interval_at(Instant::now() + period, period);
        poll.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            let deadline = self.debounce_deadline;
            tokio::select! {
                msg = self.receiver.recv() => match msg {
                    Some(msg) => self.handle(msg, &context).await,
                    None => break,
                },
                _ = sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                    self.debounce_deadline = None;
                    self.on_debounce(&context).await;
                }
                _ = poll.tick() => {
                    let _ = self.on_poll(&context).await;
                }
            }
        }

        if !self.pending.is_empty() {
            info!(entity_type, pending = self.pending.len(), "Flushing before shutdown");
            let _ = self.flush(&context).await;
        }
        self.set_state(SyncState::Idle);
        let size = self.book.as_ref().map(|book| book.len()).unwrap_or(0);
        info!(entity_type, size, "Shutdown");
    }

    async fn handle(&mut self, msg: SyncRequest<T>, ctx: &T::Context) {
        let entity_type = self.entity_type;
        match msg {
            SyncRequest::Edit { edit, respond_to } => {
                debug!(entity_type, ?edit, "Edit");
                let result = self.apply_local(edit);
                if result.is_ok() {
                    // Restarting the deadline coalesces rapid edits into one flush
                    self.debounce_deadline = Some(Instant::now() + self.timing.debounce);
                    self.set_state(SyncState::DebouncePending);
                }
                let _ = respond_to.send(result);
            }
            SyncRequest::Get { id, respond_to } => {
                let item = self.book.as_ref().and_then(|book| book.get(&id));
                debug!(entity_type, %id, found = item.is_some(), "Get");
                let _ = respond_to.send(Ok(item));
            }
            SyncRequest::Snapshot { respond_to } => {
                let records = self
                    .book
                    .as_ref()
                    .map(|book| book.records())
                    .unwrap_or_default();
                debug!(entity_type, size = records.len(), "Snapshot");
                let _ = respond_to.send(Ok(records));
            }
            SyncRequest::Refresh { respond_to } => {
                debug!(entity_type, "Refresh requested");
                let result = self.on_poll(ctx).await;
                let _ = respond_to.send(result);
            }
            SyncRequest::Flush { respond_to } => {
                debug!(entity_type, "Flush requested");
                self.debounce_deadline = None;
                let result = self.flush(ctx).await;
                if matches!(result, Ok(rows) if rows > 0) {
                    let _ = self.fetch(ctx).await;
                }
                self.settle();
                let _ = respond_to.send(result);
            }
        }
    }

    fn apply_local(&mut self, edit: T::Edit) -> Result<T::Record, FrameworkError> {
        let entity_type = self.entity_type;
        let id = T::edit_target(&edit);
        let book = match self.book.as_mut() {
            Some(book) if book.contains(&id) => book,
            _ => {
                warn!(entity_type, %id, "Not found");
                return Err(FrameworkError::NotFound(id.to_string()));
            }
        };
        if let Err(e) = book.apply_edit(&edit) {
            warn!(entity_type, %id, error = %e, "Edit failed");
            return Err(FrameworkError::EntityError(Box::new(e)));
        }
        let record = book
            .get(&id)
            .ok_or_else(|| FrameworkError::NotFound(id.to_string()))?;
        self.pending.push(edit);
        info!(entity_type, %id, pending = self.pending.len(), "Edited");
        Ok(record)
    }

    async fn on_debounce(&mut self, ctx: &T::Context) {
        debug!(entity_type = self.entity_type, "Debounce fired");
        if matches!(self.flush(ctx).await, Ok(rows) if rows > 0) {
            // Re-fetch to pick up edits made by anyone else in the meantime
            let _ = self.fetch(ctx).await;
        }
        self.settle();
    }

    async fn on_poll(&mut self, ctx: &T::Context) -> Result<usize, FrameworkError> {
        // Edits left over from a failed flush ride along with the poll
        if !self.pending.is_empty() && self.debounce_deadline.is_none() {
            let _ = self.flush(ctx).await;
        }
        self.set_state(SyncState::Polling);
        let result = self.fetch(ctx).await;
        self.settle();
        result
    }

    /// Writes the dirty records in one batch call. Pending edits are only dropped
    /// once the batch succeeded. Returns the number of records written.
    async fn flush(&mut self, ctx: &T::Context) -> Result<usize, FrameworkError> {
        let entity_type = self.entity_type;
        let Some(book) = self.book.as_ref() else {
            return Ok(0);
        };
        if self.pending.is_empty() {
            return Ok(0);
        }

        let dirty: BTreeSet<T::Id> = self.pending.iter().map(T::edit_target).collect();
        let writes = book.flush_writes(&dirty, ctx);
        if writes.is_empty() {
            self.pending.clear();
            return Ok(0);
        }
        self.set_state(SyncState::Flushing);
        debug!(entity_type, rows = dirty.len(), ranges = writes.len(), "Flushing");

        let ack = match self.table.write_batch(writes).await {
            Ok(ack) => ack,
            Err(e) => {
                warn!(entity_type, error = %e, "Flush failed");
                self.emit(SyncEvent::FlushFailed(e.to_string()));
                return Err(e);
            }
        };

        self.pending.clear();
        info!(
            entity_type,
            rows = dirty.len(),
            cells = ack.total_updated_cells,
            "Flushed"
        );
        self.emit(SyncEvent::Flushed { rows: dirty.len() });
        Ok(dirty.len())
    }

    /// Replaces the record set with a fresh read. Leaves it untouched on failure.
    async fn fetch(&mut self, ctx: &T::Context) -> Result<usize, FrameworkError> {
        let entity_type = self.entity_type;
        let range = T::fetch_range(ctx);

        let rows = match self.table.read(&range).await {
            Ok(rows) => rows,
            Err(e) => {
                warn!(entity_type, %range, error = %e, "Fetch failed");
                self.emit(SyncEvent::FetchFailed(e.to_string()));
                return Err(e);
            }
        };

        let mut book = match T::decode(rows, ctx) {
            Ok(book) => book,
            Err(e) => {
                warn!(entity_type, %range, error = %e, "Fetch rejected");
                self.emit(SyncEvent::FetchFailed(e.to_string()));
                return Err(FrameworkError::EntityError(Box::new(e)));
            }
        };

        // Edits that have not reached the table yet stay visible
        self.pending.retain(|edit| {
            let id = T::edit_target(edit);
            if !book.contains(&id) {
                warn!(entity_type, %id, "Pending edit lost its record");
                return false;
            }
            match book.apply_edit(edit) {
                Ok(()) => true,
                Err(e) => {
                    warn!(entity_type, %id, error = %e, "Pending edit no longer applies");
                    false
                }
            }
        });

        if self.pending.is_empty() && self.debounce_deadline.take().is_some() {
            debug!(entity_type, "Nothing left to flush");
        }

        let size = book.len();
        self.emit(SyncEvent::Refreshed(book.records()));
        self.book = Some(book);
        info!(entity_type, size, pending = self.pending.len(), "Fetched");
        Ok(size)
    }

    fn settle(&self) {
        if self.debounce_deadline.is_some() {
            self.set_state(SyncState::DebouncePending);
        } else {
            self.set_state(SyncState::Idle);
        }
    }

    fn set_state(&self, state: SyncState) {
        let previous = self.state.send_replace(state);
        if previous != state {
            debug!(entity_type = self.entity_type, from = %previous, to = %state, "State");
        }
    }

    fn emit(&self, event: SyncEvent<T::Record>) {
        let Some(events) = &self.events else {
            return;
        };
        match events.try_send(event) {
            Ok(()) | Err(TrySendError::Closed(_)) => {}
            Err(TrySendError::Full(_)) => {
                warn!(entity_type = self.entity_type, "Event receiver is behind, event dropped");
            }
        }
    }
}
