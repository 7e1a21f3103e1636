//! # Observability & Tracing
//!
//! [`setup_tracing`] installs a compact `tracing-subscriber` formatter filtered by
//! `RUST_LOG`. Output goes to stderr so it stays out of the console front end.
//!
//! ## What Gets Traced
//!
//! - **Scheduler lifecycle**: startup (with debounce and poll settings), shutdown
//! - **Record operations**: Edit, Get, Snapshot, Fetched, Flushed
//! - **State transitions**: `from=idle to=debounce-pending` at debug level
//! - **Remote calls**: one span per read/write on the serialized table
//! - **Failures**: fetch and flush errors with the range that failed
//!
//! ## Usage Examples
//!
//! ```bash
//! RUST_LOG=info reproui          # edits, flushes, fetch sizes
//! RUST_LOG=debug reproui         # plus payloads, state changes and remote spans
//! RUST_LOG=sync_framework=debug,reproui=info reproui
//! ```
//!
//! With `RUST_LOG=info` a typical edit burst looks like:
//!
//! ```text
//! INFO Edited entity_type="OrderBook" id=row_3 pending=1
//! INFO Edited entity_type="OrderBook" id=row_3 pending=2
//! INFO Flushed entity_type="OrderBook" rows=1
//! INFO Fetched entity_type="OrderBook" size=14 pending=0
//! ```
pub fn setup_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false) // entity_type already says where a line comes from
        .with_writer(std::io::stderr)
        .compact()
        .init();
}
