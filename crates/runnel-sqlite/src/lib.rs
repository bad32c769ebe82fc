//! SQLite row store for runnel
//!
//! Implements the [`RowStore`](runnel_core::RowStore) boundary over a
//! single rusqlite connection. The connection is mutex-guarded and shared
//! across callers; whatever atomicity SQLite provides for one statement
//! is the guarantee the layers above inherit.

pub mod store;

mod sql;

pub use store::SqliteRowStore;
