//! # System Lifecycle
//!
//! Starts the order book scheduler, hands out its client and event stream, and
//! shuts it down cleanly.
//!
//! ## Dependency Injection via Context
//!
//! The scheduler is created without knowing where the orders live. The
//! [`SheetLayout`](crate::schema::SheetLayout) (sheet name, first data row,
//! malformed-row threshold) is injected when the task starts, through
//! `run(context)`.
//!
//! ## Graceful Shutdown
//!
//! 1. **Drop the client** - closes the sender side of the request channel
//! 2. **Scheduler detects closure** - `receiver.recv()` returns `None`
//! 3. **Pending edits are flushed** - one last write, so a quick exit loses nothing
//! 4. **Await completion** - the task handle is joined
//!
//! Tracing is set up by [`sync_framework::tracing::setup_tracing`].

pub mod desk_system;

pub use desk_system::*;
