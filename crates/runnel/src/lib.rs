//! Runnel: a reactive typed data-access layer
//!
//! Runnel decouples *how a record is read and written* from *how that
//! operation is executed and observed* against a changing backing store:
//! - **Resolvers**: strategy objects performing one operation kind
//!   (get/put/delete) against the store
//! - **Prepared operations**: a resolver + mapping + target bound into a
//!   callable that runs once, or streams re-executions on relevant writes
//! - **Change bus**: write-side operations announce the tables they
//!   touched; read-side queries watch exactly the tables they depend on
//!
//! # Quick Start
//!
//! ```no_run
//! use runnel::prelude::*;
//!
//! struct Item {
//!     id: Option<i64>,
//!     name: String,
//! }
//!
//! impl FromRecord for Item {
//!     fn from_record(record: &Record) -> Result<Self> {
//!         Ok(Item {
//!             id: record.get_opt_i64("id")?,
//!             name: record.get_str("name")?.to_string(),
//!         })
//!     }
//! }
//!
//! impl ToRecord for Item {
//!     fn to_record(&self) -> Result<Record> {
//!         Ok(Record::new()
//!             .with("id", self.id)
//!             .with("name", self.name.as_str()))
//!     }
//! }
//!
//! # fn main() -> Result<()> {
//! let db = RunnelDb::open("./data.db")?;
//!
//! let mut item = Item { id: None, name: "hammer".into() };
//! db.put(&mut item)
//!     .resolver(DefaultPutResolver::new("items", &["id"]))
//!     .prepare()?
//!     .execute()?;
//!
//! let items: Vec<Item> = db.get().query(Query::table("items")).prepare()?.execute()?;
//! # let _ = items;
//! # Ok(())
//! # }
//! ```

pub mod db;
pub mod delete;
pub mod get;
pub mod prelude;
pub mod put;

mod stream;

// Re-export core types
pub use runnel_core::{
    config::{StoreConfig, SynchronousMode},
    error::{Result, RunnelError},
    traits::{FromRecord, RowStore, ToDeleteQuery, ToRecord},
    types::{
        Changes, DeleteQuery, DeleteResult, DeleteResults, Predicate, PutResult, PutResults,
        Query, QueryTarget, RawQuery, Record, Value,
    },
};

// Re-export the bus and the SQLite engine
pub use runnel_bus::{BusConfig, ChangeBus, ChangesStream};
pub use runnel_sqlite::SqliteRowStore;

// Re-export main types from this crate
pub use db::RunnelDb;
pub use delete::{
    DefaultDeleteResolver, DeleteAllBuilder, DeleteBuilder, DeleteResolver, PreparedDelete,
    PreparedDeleteAll,
};
pub use get::{DefaultGetResolver, GetBuilder, GetResolver, PreparedGet};
pub use put::{DefaultPutResolver, PreparedPut, PreparedPutAll, PutAllBuilder, PutBuilder, PutResolver};
