//! Immutable read/delete descriptors
//!
//! A [`Query`] describes a structured read against one table; a
//! [`RawQuery`] carries opaque SQL plus an explicit declaration of the
//! tables it reads from, since raw text cannot be parsed for dependency
//! analysis. [`QueryTarget`] unifies the two for resolvers and is the
//! single place watched tables are derived.

use crate::types::record::Value;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A SQL predicate fragment with positional arguments
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Predicate {
    /// Clause with `?` placeholders, e.g. `"id = ? AND status = ?"`
    pub clause: String,

    /// Values bound to the placeholders, in order
    pub args: Vec<Value>,
}

impl Predicate {
    pub fn new(clause: impl Into<String>, args: Vec<Value>) -> Self {
        Self {
            clause: clause.into(),
            args,
        }
    }
}

/// Immutable descriptor of a structured read
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Query {
    /// Target table
    pub table: String,

    /// Column projection; `None` selects all columns
    pub columns: Option<Vec<String>>,

    /// Row filter
    pub predicate: Option<Predicate>,

    pub group_by: Option<String>,

    pub having: Option<String>,

    pub order_by: Option<String>,

    pub limit: Option<u64>,

    /// SELECT DISTINCT
    pub distinct: bool,
}

impl Query {
    pub fn table(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            columns: None,
            predicate: None,
            group_by: None,
            having: None,
            order_by: None,
            limit: None,
            distinct: false,
        }
    }

    pub fn with_columns<I, C>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: Into<String>,
    {
        self.columns = Some(columns.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_predicate(mut self, predicate: Predicate) -> Self {
        self.predicate = Some(predicate);
        self
    }

    /// Shorthand for [`with_predicate`](Self::with_predicate).
    pub fn filter(self, clause: impl Into<String>, args: Vec<Value>) -> Self {
        self.with_predicate(Predicate::new(clause, args))
    }

    pub fn with_group_by(mut self, group_by: impl Into<String>) -> Self {
        self.group_by = Some(group_by.into());
        self
    }

    pub fn with_having(mut self, having: impl Into<String>) -> Self {
        self.having = Some(having.into());
        self
    }

    pub fn with_order_by(mut self, order_by: impl Into<String>) -> Self {
        self.order_by = Some(order_by.into());
        self
    }

    pub fn with_limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_distinct(mut self, distinct: bool) -> Self {
        self.distinct = distinct;
        self
    }
}

/// Opaque SQL text with self-declared read dependencies
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawQuery {
    pub sql: String,

    pub args: Vec<Value>,

    /// Tables this query reads from. Required for reactive use: the text
    /// is opaque to the core, so the watched set must be declared.
    pub watched: BTreeSet<String>,
}

impl RawQuery {
    pub fn new(sql: impl Into<String>, args: Vec<Value>) -> Self {
        Self {
            sql: sql.into(),
            args,
            watched: BTreeSet::new(),
        }
    }

    /// Declare the tables this query reads from.
    pub fn watching<I, T>(mut self, tables: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.watched = tables.into_iter().map(Into::into).collect();
        self
    }
}

/// Immutable descriptor of a delete
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeleteQuery {
    pub table: String,

    /// Row filter; `None` deletes all rows in the table
    pub predicate: Option<Predicate>,
}

impl DeleteQuery {
    pub fn table(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            predicate: None,
        }
    }

    pub fn with_predicate(mut self, predicate: Predicate) -> Self {
        self.predicate = Some(predicate);
        self
    }

    pub fn filter(self, clause: impl Into<String>, args: Vec<Value>) -> Self {
        self.with_predicate(Predicate::new(clause, args))
    }
}

/// The structured-or-raw target of a prepared get
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum QueryTarget {
    Structured(Query),
    Raw(RawQuery),
}

impl QueryTarget {
    /// Tables a reactive get on this target must watch.
    ///
    /// An empty set degenerates the streaming form to a one-shot emission.
    pub fn watched_tables(&self) -> BTreeSet<String> {
        match self {
            QueryTarget::Structured(query) => {
                if query.table.is_empty() {
                    BTreeSet::new()
                } else {
                    BTreeSet::from([query.table.clone()])
                }
            }
            QueryTarget::Raw(raw) => raw.watched.clone(),
        }
    }
}

impl From<Query> for QueryTarget {
    fn from(query: Query) -> Self {
        QueryTarget::Structured(query)
    }
}

impl From<RawQuery> for QueryTarget {
    fn from(raw: RawQuery) -> Self {
        QueryTarget::Raw(raw)
    }
}
