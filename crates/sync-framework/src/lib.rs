//! # Sync Framework
//!
//! Building blocks for keeping a local, editable record set in step with a remote
//! table (a shared spreadsheet). The crate knows nothing about what the rows mean;
//! a domain crate supplies that through the [`SyncEntity`] trait.
//!
//! ## The Model
//!
//! - **One owner**: a [`SyncActor`] task owns the record set. Nobody else holds it.
//! - **Message passing**: edits and queries reach the actor through a cloneable
//!   [`SyncClient`]; answers come back on oneshot channels.
//! - **Two timers, one loop**: a debounce deadline (restarted by every edit) and a
//!   poll interval feed the same `tokio::select!` as the request channel, so edits,
//!   flushes and refreshes never race each other.
//! - **One lane to the remote**: [`SerializedTable`] wraps the [`TableClient`] in an
//!   async mutex. At most one read or write is in flight at any time.
//! - **One write per flush**: all dirty ranges go out in a single batch call.
//!
//! ## Scheduler States
//!
//! ```text
//!            edit                      debounce fires
//!   Idle ───────────▶ DebouncePending ───────────────▶ Flushing ──▶ (re-fetch) ──▶ Idle
//!    ▲  │                   │ edit: restart deadline
//!    │  │ poll tick         │ poll tick: fetch, re-apply pending edits
//!    │  ▼                   ▼
//!    └─ Polling ◀───────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! let table = SerializedTable::new(MemoryTable::with_rows(rows));
//! let (actor, client) = SyncActor::<MyBook, _>::new(32, table, SyncTiming::default());
//! tokio::spawn(actor.run(my_layout));
//!
//! let record = client.edit(my_edit).await?;   // debounce starts
//! let all = client.snapshot().await?;
//! ```
//!
//! ## Testing
//!
//! The [`mock`] module has an in-memory table, a recording mock table with scripted
//! failures, and helpers for testing domain clients without an actor.

pub mod a1;
pub mod actor;
pub mod cell;
pub mod client;
pub mod client_trait;
pub mod entity;
pub mod error;
pub mod message;
pub mod mock;
pub mod table;
pub mod tracing;

// Re-export core types for convenience
pub use a1::A1Range;
pub use actor::{SyncActor, SyncTiming};
pub use cell::{Cell, Rows};
pub use client::SyncClient;
pub use client_trait::ActorClient;
pub use entity::SyncEntity;
pub use error::FrameworkError;
pub use message::{Response, SyncEvent, SyncRequest, SyncState};
pub use table::{BatchAck, RangeWrite, SerializedTable, TableClient, WriteAck};
