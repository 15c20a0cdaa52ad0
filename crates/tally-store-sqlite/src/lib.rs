//! SQLite backend for the Tally production store.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime. Each engine call runs as one SQLite
//! transaction through [`SqliteStore`]'s [`tally_core::store::ProductionStore`]
//! impl.

mod encode;
mod schema;
mod store;
mod unit;

pub mod error;

pub use error::{Error, Result};
pub use store::{DEFAULT_BUSY_TIMEOUT, SqliteStore};
