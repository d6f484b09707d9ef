//! SQLite backend for the polyglot translation store.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime. One [`SqliteStore`] implements both
//! [`ValueStore`](polyglot_core::store::ValueStore) and
//! [`RecordStore`](polyglot_core::store::RecordStore).

mod encode;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteStore;
