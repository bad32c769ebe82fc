//! Runnel Core: traits and types for the runnel data-access layer
//!
//! This crate defines the abstractions shared by the runnel workspace:
//! - Row store boundary: the read/write primitives a backing engine must expose
//! - Record mapping boundary: pure domain object ↔ storage record conversion
//! - Value types: queries, records, change records, operation results
//! - Error taxonomy and configuration
//!
//! The concrete SQLite engine lives in `runnel-sqlite`, the change bus in
//! `runnel-bus`, and the operation surface (prepared gets/puts/deletes) in
//! the `runnel` facade crate.

pub mod config;
pub mod error;
pub mod observe;
pub mod traits;
pub mod types;

pub use config::{StoreConfig, SynchronousMode};
pub use error::{Result, RunnelError};
pub use traits::{FromRecord, RowStore, ToDeleteQuery, ToRecord};
pub use types::{
    Changes, DeleteQuery, DeleteResult, DeleteResults, Predicate, PutResult, PutResults, Query,
    QueryTarget, RawQuery, Record, Value,
};
