//! Plain data for the order desk: orders, their status flags and the book that
//! holds them.

pub mod flag;
pub mod order;
pub mod order_book;

pub use flag::*;
pub use order::*;
pub use order_book::*;
