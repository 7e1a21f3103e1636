//! # Generic Messages
//!
//! This module defines the messages exchanged between [`SyncClient`](crate::SyncClient),
//! [`SyncActor`](crate::SyncActor) and the presentation layer.

use crate::entity::SyncEntity;
use crate::error::FrameworkError;
use std::fmt::{self, Display};
use tokio::sync::oneshot;

/// Type alias for the one-shot response channel used by the actor.
pub type Response<T> = oneshot::Sender<Result<T, FrameworkError>>;

/// Requests handled by the scheduler loop.
///
/// Edits and queries arrive on the same channel as the control requests, so
/// everything touching the record set is processed in order by one task.
#[derive(Debug)]
pub enum SyncRequest<T: SyncEntity> {
    /// Apply a local edit and (re)start the debounce timer.
    Edit {
        edit: T::Edit,
        respond_to: Response<T::Record>,
    },
    /// Single-record detail.
    Get {
        id: T::Id,
        respond_to: Response<Option<T::Record>>,
    },
    /// The full record list.
    Snapshot {
        respond_to: Response<Vec<T::Record>>,
    },
    /// Fetch now instead of waiting for the poll tick. Returns the record count.
    Refresh { respond_to: Response<usize> },
    /// Flush pending edits now instead of waiting for the debounce. Returns the
    /// number of records written.
    Flush { respond_to: Response<usize> },
}

/// Where the scheduler currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SyncState {
    #[default]
    Idle,
    DebouncePending,
    Flushing,
    Polling,
}

impl Display for SyncState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SyncState::Idle => "idle",
            SyncState::DebouncePending => "debounce-pending",
            SyncState::Flushing => "flushing",
            SyncState::Polling => "polling",
        };
        f.write_str(name)
    }
}

/// Notifications pushed to the presentation layer.
#[derive(Debug, Clone, PartialEq)]
pub enum SyncEvent<R> {
    /// A fetch replaced the record set.
    Refreshed(Vec<R>),
    /// Pending edits reached the remote table.
    Flushed { rows: usize },
    /// A fetch failed; the previous record set is still current.
    FetchFailed(String),
    /// A flush failed; the edits stay pending until the next poll tick.
    FlushFailed(String),
}
