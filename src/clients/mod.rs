//! Type-safe wrappers around [`SyncClient`](sync_framework::SyncClient).

pub mod order_desk_client;

pub use order_desk_client::*;
