//! SQLite backend for the YACOID definition store.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime. Every guarded write runs inside a
//! single `BEGIN IMMEDIATE` transaction on that thread, which is what makes
//! the check-then-write atomic.

mod encode;
mod identity;
mod query;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteStore;
