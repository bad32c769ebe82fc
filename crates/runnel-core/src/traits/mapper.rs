//! The domain-mapping boundary
//!
//! Pure conversions between domain objects and their storage-native
//! records, supplied per domain type. Mappers must not touch the store;
//! operation semantics live in resolvers.

use crate::error::Result;
use crate::types::{DeleteQuery, Record};

/// Map a domain object to its storage record.
pub trait ToRecord {
    fn to_record(&self) -> Result<Record>;
}

/// Build a domain object from a storage record.
pub trait FromRecord: Sized {
    fn from_record(record: &Record) -> Result<Self>;
}

/// Identity mapping: get operations can return raw records directly.
impl FromRecord for Record {
    fn from_record(record: &Record) -> Result<Self> {
        Ok(record.clone())
    }
}

/// Map a domain object to the delete query that removes it.
pub trait ToDeleteQuery {
    fn to_delete_query(&self) -> Result<DeleteQuery>;
}
