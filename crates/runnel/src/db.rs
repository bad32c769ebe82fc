//! Unified runnel store handle
//!
//! Bundles the backing engine and the change bus into a single entry
//! point, and hands out the builders for prepared operations.

use crate::delete::{DeleteAllBuilder, DeleteBuilder};
use crate::get::GetBuilder;
use crate::put::{PutAllBuilder, PutBuilder};
use runnel_bus::{BusConfig, ChangeBus, ChangesStream};
use runnel_core::{
    Changes, DeleteQuery, FromRecord, Result, RowStore, StoreConfig, ToDeleteQuery, ToRecord,
};
use runnel_sqlite::SqliteRowStore;
use std::path::Path;
use std::sync::Arc;

/// The runnel store handle
///
/// Owns the change bus (created here, torn down on [`close`](Self::close))
/// and shares the backing engine across every prepared operation. The
/// handle is cheap to clone; all clones share one engine and one bus.
pub struct RunnelDb<S: RowStore> {
    engine: Arc<S>,
    bus: ChangeBus,
}

impl<S: RowStore> Clone for RunnelDb<S> {
    fn clone(&self) -> Self {
        Self {
            engine: self.engine.clone(),
            bus: self.bus.clone(),
        }
    }
}

impl RunnelDb<SqliteRowStore> {
    /// Open (or create) a SQLite-backed store at the given path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open_with_config(StoreConfig::new(path.as_ref().to_path_buf()))
    }

    /// Open with a custom engine configuration.
    pub fn open_with_config(config: StoreConfig) -> Result<Self> {
        Ok(Self::new(SqliteRowStore::open(config)?))
    }

    /// Open an in-memory store, mostly useful for tests and demos.
    pub fn open_in_memory() -> Result<Self> {
        Ok(Self::new(SqliteRowStore::open_in_memory()?))
    }
}

impl<S: RowStore> RunnelDb<S> {
    /// Wrap an already-opened engine.
    pub fn new(engine: S) -> Self {
        Self::with_bus_config(engine, BusConfig::default())
    }

    pub fn with_bus_config(engine: S, config: BusConfig) -> Self {
        Self {
            engine: Arc::new(engine),
            bus: ChangeBus::with_config(config),
        }
    }

    /// Start a get operation returning mapped objects.
    pub fn get<T: FromRecord>(&self) -> GetBuilder<S, T> {
        GetBuilder::new(self.engine.clone(), self.bus.clone())
    }

    /// Start a put of one object.
    ///
    /// The object is borrowed mutably so the resolver's after-put hook
    /// can write a generated identity back into it.
    pub fn put<'a, T: ToRecord>(&self, object: &'a mut T) -> PutBuilder<'a, S, T> {
        PutBuilder::new(self.engine.clone(), self.bus.clone(), object)
    }

    /// Start a batch put. Items are returned in the composite result
    /// with hook mutations applied.
    pub fn put_all<T: ToRecord>(&self, objects: Vec<T>) -> PutAllBuilder<S, T> {
        PutAllBuilder::new(self.engine.clone(), self.bus.clone(), objects)
    }

    /// Start a delete targeting rows by query.
    pub fn delete(&self, query: DeleteQuery) -> DeleteBuilder<S> {
        DeleteBuilder::new(self.engine.clone(), self.bus.clone(), query)
    }

    /// Start a batch delete of mapped objects.
    pub fn delete_all<T: ToDeleteQuery>(&self, objects: Vec<T>) -> DeleteAllBuilder<S, T> {
        DeleteAllBuilder::new(self.engine.clone(), self.bus.clone(), objects)
    }

    /// Subscribe to raw change notifications for the given tables.
    ///
    /// Useful for out-of-band consumers; reactive gets subscribe through
    /// their own [`stream`](crate::get::PreparedGet::stream).
    pub fn observe_changes<I, T>(&self, tables: I) -> ChangesStream
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.bus.observe(tables)
    }

    /// Publish a change notification on behalf of an external writer.
    ///
    /// Prepared puts and deletes notify automatically; this is the hook
    /// for writers that bypass them.
    pub fn notify_changes(&self, changes: Changes) {
        self.bus.notify(changes);
    }

    pub fn engine(&self) -> &Arc<S> {
        &self.engine
    }

    pub fn bus(&self) -> &ChangeBus {
        &self.bus
    }

    /// Tear down the reactive surface: live streams end, later
    /// notifications are dropped. Blocking execution still works against
    /// the engine. Idempotent.
    pub fn close(&self) {
        self.bus.close();
        tracing::debug!("runnel store closed");
    }
}
