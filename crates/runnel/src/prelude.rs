//! Convenience re-exports for the common runnel surface

pub use crate::db::RunnelDb;
pub use crate::delete::{DefaultDeleteResolver, DeleteResolver};
pub use crate::get::{DefaultGetResolver, GetResolver};
pub use crate::put::{DefaultPutResolver, PutResolver};

pub use runnel_core::{
    error::{Result, RunnelError},
    traits::{FromRecord, RowStore, ToDeleteQuery, ToRecord},
    types::{
        Changes, DeleteQuery, DeleteResult, Predicate, PutResult, Query, RawQuery, Record, Value,
    },
};

pub use runnel_bus::{ChangeBus, ChangesStream};
pub use runnel_sqlite::SqliteRowStore;
