//! The backing-store boundary
//!
//! Everything the core needs from a storage engine: row-oriented read
//! and write primitives attributed to named tables. The engine guards
//! its own handle; the core adds no write-serialization of its own and
//! shares one store across concurrent callers.

use crate::error::Result;
use crate::types::{DeleteQuery, Predicate, Query, RawQuery, Record};

/// Row-oriented storage engine
///
/// Implementations must be safely shareable across threads; whatever
/// atomicity the engine claims for a single write is the strongest
/// guarantee the layer above inherits.
pub trait RowStore: Send + Sync + 'static {
    /// Execute a structured read, materializing the matching rows.
    fn select(&self, query: &Query) -> Result<Vec<Record>>;

    /// Execute an opaque read. The query's declared watched set is the
    /// caller's concern; the engine just runs the text.
    fn select_raw(&self, query: &RawQuery) -> Result<Vec<Record>>;

    /// Insert one record, returning the engine-assigned row identity.
    fn insert(&self, table: &str, record: &Record) -> Result<i64>;

    /// Update rows matching the predicate, returning the affected count.
    fn update(&self, table: &str, record: &Record, predicate: &Predicate) -> Result<u64>;

    /// Delete rows matching the predicate (all rows when `None`),
    /// returning the affected count.
    fn delete(&self, table: &str, predicate: Option<&Predicate>) -> Result<u64>;

    /// Execute a delete query. Provided for symmetry with
    /// [`select`](Self::select); the default splits the query into its parts.
    fn delete_query(&self, query: &DeleteQuery) -> Result<u64> {
        self.delete(&query.table, query.predicate.as_ref())
    }
}
