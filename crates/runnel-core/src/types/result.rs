//! Operation results for writes
//!
//! Every successful write result carries exactly the table(s) it
//! affected; this is the only channel through which the bus learns what
//! to invalidate.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Result of a single put: either a fresh insert or an update in place
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PutResult {
    Inserted {
        /// Rowid assigned by the engine
        row_id: i64,
        table: String,
    },
    Updated {
        /// Number of rows the update touched
        rows: u64,
        table: String,
    },
}

impl PutResult {
    pub fn inserted(row_id: i64, table: impl Into<String>) -> Self {
        PutResult::Inserted {
            row_id,
            table: table.into(),
        }
    }

    pub fn updated(rows: u64, table: impl Into<String>) -> Self {
        PutResult::Updated {
            rows,
            table: table.into(),
        }
    }

    pub fn affected_table(&self) -> &str {
        match self {
            PutResult::Inserted { table, .. } => table,
            PutResult::Updated { table, .. } => table,
        }
    }

    pub fn was_inserted(&self) -> bool {
        matches!(self, PutResult::Inserted { .. })
    }

    pub fn was_updated(&self) -> bool {
        matches!(self, PutResult::Updated { .. })
    }

    /// Rowid of the inserted row, if this was an insert.
    pub fn inserted_id(&self) -> Option<i64> {
        match self {
            PutResult::Inserted { row_id, .. } => Some(*row_id),
            PutResult::Updated { .. } => None,
        }
    }

    /// Number of updated rows, if this was an update.
    pub fn rows_updated(&self) -> Option<u64> {
        match self {
            PutResult::Inserted { .. } => None,
            PutResult::Updated { rows, .. } => Some(*rows),
        }
    }
}

/// Result of a single delete
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteResult {
    rows: u64,
    table: String,
}

impl DeleteResult {
    pub fn new(rows: u64, table: impl Into<String>) -> Self {
        Self {
            rows,
            table: table.into(),
        }
    }

    pub fn rows_deleted(&self) -> u64 {
        self.rows
    }

    pub fn affected_table(&self) -> &str {
        &self.table
    }
}

/// Composite result of a batch put, one entry per input item
///
/// Items are kept as ordered `(item, result)` pairs in input order, so a
/// per-item result is recovered by the identity of the item the caller
/// passed in rather than by the record it mapped to.
#[derive(Debug)]
pub struct PutResults<T> {
    results: Vec<(T, PutResult)>,
}

impl<T> PutResults<T> {
    pub fn new(results: Vec<(T, PutResult)>) -> Self {
        Self { results }
    }

    pub fn iter(&self) -> impl Iterator<Item = &(T, PutResult)> {
        self.results.iter()
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn num_inserted(&self) -> usize {
        self.results.iter().filter(|(_, r)| r.was_inserted()).count()
    }

    pub fn num_updated(&self) -> usize {
        self.results.iter().filter(|(_, r)| r.was_updated()).count()
    }

    /// Union of tables affected by the per-item results.
    pub fn affected_tables(&self) -> BTreeSet<String> {
        self.results
            .iter()
            .map(|(_, r)| r.affected_table().to_string())
            .collect()
    }

    /// Give the items back to the caller, hook mutations applied.
    pub fn into_items(self) -> Vec<T> {
        self.results.into_iter().map(|(item, _)| item).collect()
    }

    pub fn into_pairs(self) -> Vec<(T, PutResult)> {
        self.results
    }
}

/// Composite result of a batch delete, one entry per input item
#[derive(Debug)]
pub struct DeleteResults<T> {
    results: Vec<(T, DeleteResult)>,
}

impl<T> DeleteResults<T> {
    pub fn new(results: Vec<(T, DeleteResult)>) -> Self {
        Self { results }
    }

    pub fn iter(&self) -> impl Iterator<Item = &(T, DeleteResult)> {
        self.results.iter()
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn rows_deleted(&self) -> u64 {
        self.results.iter().map(|(_, r)| r.rows_deleted()).sum()
    }

    pub fn affected_tables(&self) -> BTreeSet<String> {
        self.results
            .iter()
            .map(|(_, r)| r.affected_table().to_string())
            .collect()
    }

    pub fn into_pairs(self) -> Vec<(T, DeleteResult)> {
        self.results
    }
}
