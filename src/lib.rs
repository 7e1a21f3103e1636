//! # ReproUI Order Desk
//!
//! > **The front desk of a 3D-print service, backed by a shared spreadsheet.**
//!
//! Print requests arrive through a web form that appends one row per order to a
//! spreadsheet. The desk shows the pending orders and lets an operator tick four
//! status flags on each one (approved, printed, picked up, paid). The flags are
//! written back to the sheet without ever blocking the operator.
//!
//! ## Design Notes
//!
//! ### 1. One owner for the orders
//! The [`OrderBook`](model::OrderBook) lives inside a single scheduler task
//! ([`sync_framework::SyncActor`]). The console and every other caller talk to it through
//! [`OrderDeskClient`](clients::OrderDeskClient) messages and receive clones.
//!
//! ### 2. Debounced write-back
//! Every flag edit restarts a short timer. When the operator pauses, all dirty rows
//! are written in one batch call, one range per block of consecutive rows, touching
//! only the flag columns `Q..T`. A long poll interval re-reads the whole sheet to
//! pick up new orders and edits made by others.
//!
//! ### 3. One call at a time
//! The spreadsheet is reached through a serialized channel: a poll that comes due
//! while a write is in flight waits for the write to finish.
//!
//! ### 4. Privacy
//! Requester names are cut down to `First L.` before they enter the book.
//!
//! ## Module Tour
//!
//! - [`schema`]: the 23-column order sheet and its layout.
//! - [`model`]: [`Order`](model::Order), [`Flag`](model::Flag), [`RowId`](model::RowId) and the book.
//! - [`transform`]: raw rows to orders (padding, flag parsing, sparse rows, redaction).
//! - [`book`]: the order book as a [`SyncEntity`](sync_framework::SyncEntity).
//! - [`clients`]: the domain client.
//! - [`lifecycle`]: [`DeskSystem`](lifecycle::DeskSystem), start and shutdown.
//! - [`sheets`]: Google Sheets v4 client; [`auth`]: its OAuth token refresh.
//! - [`console`]: the line-oriented front end.
//! - [`config`], [`error`], [`demo`]: configuration, errors and offline example orders.
//!
//! ## Running
//!
//! ```bash
//! # against the spreadsheet named in secrets/config.toml
//! RUST_LOG=info cargo run
//!
//! # with built-in example orders
//! cargo run -- --offline
//! ```

pub mod auth;
pub mod book;
pub mod clients;
pub mod config;
pub mod console;
pub mod demo;
pub mod error;
pub mod lifecycle;
pub mod model;
pub mod schema;
pub mod sheets;
pub mod transform;
