//! Change records emitted by the bus
//!
//! A [`Changes`] value announces that one or more tables were just
//! written. It is the only channel through which writes become visible
//! to reactive reads: write-side operations publish one `Changes` per
//! logical write, and the bus fans it out to every subscription whose
//! watched set intersects it.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Immutable notification that a set of tables was written
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Changes {
    tables: BTreeSet<String>,
}

impl Changes {
    /// A change touching a single table.
    pub fn table(table: impl Into<String>) -> Self {
        Self {
            tables: BTreeSet::from([table.into()]),
        }
    }

    /// A change touching a set of tables (e.g. one batch write).
    pub fn tables<I, T>(tables: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        Self {
            tables: tables.into_iter().map(Into::into).collect(),
        }
    }

    pub fn affected(&self) -> &BTreeSet<String> {
        &self.tables
    }

    /// True when this change intersects the given watched set.
    pub fn affects(&self, watched: &BTreeSet<String>) -> bool {
        self.tables.iter().any(|t| watched.contains(t))
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_table_change() {
        let changes = Changes::table("items");
        assert_eq!(changes.affected().len(), 1);
        assert!(changes.affects(&BTreeSet::from(["items".to_string()])));
    }

    #[test]
    fn disjoint_sets_do_not_affect() {
        let changes = Changes::table("items");
        assert!(!changes.affects(&BTreeSet::from(["users".to_string()])));
    }

    #[test]
    fn multi_table_change_affects_any_watcher() {
        let changes = Changes::tables(["a", "b"]);
        assert!(changes.affects(&BTreeSet::from(["b".to_string()])));
        assert!(changes.affects(&BTreeSet::from(["a".to_string(), "c".to_string()])));
        assert!(!changes.affects(&BTreeSet::from(["c".to_string()])));
    }

    #[test]
    fn duplicate_tables_collapse() {
        let changes = Changes::tables(["items", "items"]);
        assert_eq!(changes.affected().len(), 1);
    }
}
