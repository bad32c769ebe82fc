//! Put operations
//!
//! A put maps a domain object to its storage record, lets a
//! [`PutResolver`] decide insert-vs-update, runs the resolver's
//! after-put hook in the same call stack, and, only on success,
//! notifies the bus with the affected table. Batch puts aggregate
//! per-item results and notify exactly once.

use runnel_bus::ChangeBus;
use runnel_core::{
    observe, Changes, Predicate, PutResult, PutResults, Query, Record, Result, RowStore,
    RunnelError, ToRecord, Value,
};
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Instant;

/// Defines behavior of a put operation (insert or update)
pub trait PutResolver<S: RowStore, T>: Send + Sync {
    /// Perform the write for one mapped record.
    fn perform_put(&self, store: &S, record: &Record) -> Result<PutResult>;

    /// Called on the same thread that performed the put, right after
    /// [`perform_put`](Self::perform_put) succeeds and before the bus is
    /// notified. Use it to write a generated identity back into the
    /// domain object. Default: no-op.
    fn after_put(&self, object: &mut T, result: &PutResult) {
        let _ = (object, result);
    }
}

/// Default put resolver: insert-or-update keyed on identity columns
///
/// Probes the target table for a row matching the record's key-column
/// values; updates in place when one exists, inserts otherwise. A key
/// column that is absent or `Null` short-circuits to insert. The probe
/// and the write are only as atomic as the engine's own write atomicity;
/// no extra locking is taken.
pub struct DefaultPutResolver<T> {
    table: String,
    key_columns: Vec<String>,
    assign_id: Option<Box<dyn Fn(&mut T, i64) + Send + Sync>>,
}

impl<T> DefaultPutResolver<T> {
    pub fn new(table: impl Into<String>, key_columns: &[&str]) -> Self {
        Self {
            table: table.into(),
            key_columns: key_columns.iter().map(|c| c.to_string()).collect(),
            assign_id: None,
        }
    }

    /// Write the engine-assigned rowid back into the object on insert.
    pub fn with_id_assignment(
        mut self,
        assign: impl Fn(&mut T, i64) + Send + Sync + 'static,
    ) -> Self {
        self.assign_id = Some(Box::new(assign));
        self
    }

    /// Predicate matching the record's identity, or `None` when the
    /// identity is unassigned and the put must insert.
    fn identity_predicate(&self, record: &Record) -> Option<Predicate> {
        if self.key_columns.is_empty() {
            return None;
        }

        let mut clause = String::new();
        let mut args = Vec::with_capacity(self.key_columns.len());
        for column in &self.key_columns {
            match record.get(column) {
                None | Some(Value::Null) => return None,
                Some(value) => {
                    if !clause.is_empty() {
                        clause.push_str(" AND ");
                    }
                    clause.push_str(column);
                    clause.push_str(" = ?");
                    args.push(value.clone());
                }
            }
        }
        Some(Predicate::new(clause, args))
    }
}

impl<S: RowStore, T> PutResolver<S, T> for DefaultPutResolver<T> {
    fn perform_put(&self, store: &S, record: &Record) -> Result<PutResult> {
        if let Some(predicate) = self.identity_predicate(record) {
            let probe = Query::table(&self.table)
                .with_columns(self.key_columns.clone())
                .with_predicate(predicate.clone());
            if !store.select(&probe)?.is_empty() {
                let rows = store.update(&self.table, record, &predicate)?;
                return Ok(PutResult::updated(rows, self.table.clone()));
            }
        }

        let row_id = store.insert(&self.table, record)?;
        Ok(PutResult::inserted(row_id, self.table.clone()))
    }

    fn after_put(&self, object: &mut T, result: &PutResult) {
        if let (Some(assign), Some(row_id)) = (&self.assign_id, result.inserted_id()) {
            assign(object, row_id);
        }
    }
}

/// Builder for a prepared put of one object
pub struct PutBuilder<'a, S: RowStore, T> {
    engine: Arc<S>,
    bus: ChangeBus,
    object: &'a mut T,
    resolver: Option<Arc<dyn PutResolver<S, T>>>,
}

impl<'a, S: RowStore, T: ToRecord> PutBuilder<'a, S, T> {
    pub(crate) fn new(engine: Arc<S>, bus: ChangeBus, object: &'a mut T) -> Self {
        Self {
            engine,
            bus,
            object,
            resolver: None,
        }
    }

    /// Required: the resolver deciding insert-vs-update semantics.
    pub fn resolver(mut self, resolver: impl PutResolver<S, T> + 'static) -> Self {
        self.resolver = Some(Arc::new(resolver));
        self
    }

    /// Validate configuration and bind the operation; fails before any
    /// I/O when no resolver was supplied.
    pub fn prepare(self) -> Result<PreparedPut<'a, S, T>> {
        let resolver = self
            .resolver
            .ok_or(RunnelError::MissingConfiguration("put resolver"))?;

        Ok(PreparedPut {
            engine: self.engine,
            bus: self.bus,
            object: self.object,
            resolver,
        })
    }
}

/// A bound, executable put of one object
pub struct PreparedPut<'a, S: RowStore, T> {
    engine: Arc<S>,
    bus: ChangeBus,
    object: &'a mut T,
    resolver: Arc<dyn PutResolver<S, T>>,
}

impl<S: RowStore, T> std::fmt::Debug for PreparedPut<'_, S, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PreparedPut").finish_non_exhaustive()
    }
}

impl<S: RowStore, T: ToRecord> PreparedPut<'_, S, T> {
    /// Execute immediately on the calling thread.
    ///
    /// On success the after-put hook runs first, then the bus is
    /// notified with the affected table. A failed write never notifies.
    pub fn execute(self) -> Result<PutResult> {
        let start = Instant::now();

        let record = self.object.to_record()?;
        let result = self.resolver.perform_put(&self.engine, &record)?;
        self.resolver.after_put(self.object, &result);

        observe::record_execute(start.elapsed(), "put");
        self.bus.notify(Changes::table(result.affected_table()));

        Ok(result)
    }
}

/// Builder for a prepared batch put
pub struct PutAllBuilder<S: RowStore, T> {
    engine: Arc<S>,
    bus: ChangeBus,
    objects: Vec<T>,
    resolver: Option<Arc<dyn PutResolver<S, T>>>,
}

impl<S: RowStore, T: ToRecord> PutAllBuilder<S, T> {
    pub(crate) fn new(engine: Arc<S>, bus: ChangeBus, objects: Vec<T>) -> Self {
        Self {
            engine,
            bus,
            objects,
            resolver: None,
        }
    }

    /// Required: the resolver applied to every item.
    pub fn resolver(mut self, resolver: impl PutResolver<S, T> + 'static) -> Self {
        self.resolver = Some(Arc::new(resolver));
        self
    }

    pub fn prepare(self) -> Result<PreparedPutAll<S, T>> {
        let resolver = self
            .resolver
            .ok_or(RunnelError::MissingConfiguration("put resolver"))?;

        Ok(PreparedPutAll {
            engine: self.engine,
            bus: self.bus,
            objects: self.objects,
            resolver,
        })
    }
}

/// A bound, executable batch put
///
/// Each item runs map → resolve → after-put as one sub-operation, with
/// exactly one engine write per item. The bus is notified once per batch
/// with the union of affected tables, never once per item.
pub struct PreparedPutAll<S: RowStore, T> {
    engine: Arc<S>,
    bus: ChangeBus,
    objects: Vec<T>,
    resolver: Arc<dyn PutResolver<S, T>>,
}

impl<S: RowStore, T: ToRecord> PreparedPutAll<S, T> {
    /// Execute immediately on the calling thread.
    ///
    /// Stops at the first failing item; nothing is notified in that
    /// case. On success, returns per-item results in input order.
    pub fn execute(self) -> Result<PutResults<T>> {
        let PreparedPutAll {
            engine,
            bus,
            objects,
            resolver,
        } = self;

        let start = Instant::now();
        let mut results = Vec::with_capacity(objects.len());
        let mut affected = BTreeSet::new();

        for mut object in objects {
            let record = object.to_record()?;
            let result = resolver.perform_put(&engine, &record)?;
            resolver.after_put(&mut object, &result);
            affected.insert(result.affected_table().to_string());
            results.push((object, result));
        }

        observe::record_execute(start.elapsed(), "put_all");
        if !affected.is_empty() {
            bus.notify(Changes::tables(affected));
        }

        Ok(PutResults::new(results))
    }
}

impl<S: RowStore, T: ToRecord + Send + 'static> PreparedPutAll<S, T> {
    /// Execute on the blocking pool, safe to call from async context.
    pub async fn execute_async(self) -> Result<PutResults<T>> {
        tokio::task::spawn_blocking(move || self.execute())
            .await
            .map_err(|e| RunnelError::InvalidState(format!("task join error: {}", e)))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::RunnelDb;
    use runnel_sqlite::SqliteRowStore;

    #[derive(Debug, Clone, PartialEq)]
    struct Item {
        id: Option<i64>,
        name: String,
        qty: i64,
    }

    impl Item {
        fn new(name: &str, qty: i64) -> Self {
            Self {
                id: None,
                name: name.to_string(),
                qty,
            }
        }
    }

    impl ToRecord for Item {
        fn to_record(&self) -> Result<Record> {
            Ok(Record::new()
                .with("id", self.id)
                .with("name", self.name.as_str())
                .with("qty", self.qty))
        }
    }

    fn item_resolver() -> DefaultPutResolver<Item> {
        DefaultPutResolver::new("items", &["id"])
            .with_id_assignment(|item: &mut Item, id| item.id = Some(id))
    }

    fn test_db() -> RunnelDb<SqliteRowStore> {
        let db = RunnelDb::open_in_memory().unwrap();
        db.engine()
            .execute_batch(
                "CREATE TABLE items (
                    id INTEGER PRIMARY KEY,
                    name TEXT NOT NULL,
                    qty INTEGER NOT NULL
                )",
            )
            .unwrap();
        db
    }

    #[test]
    fn prepare_without_resolver_fails_before_io() {
        let db = test_db();
        let mut item = Item::new("hammer", 1);
        let err = db.put(&mut item).prepare().unwrap_err();
        assert!(matches!(err, RunnelError::MissingConfiguration(_)));
    }

    #[test]
    fn unassigned_identity_inserts_and_assigns_id() {
        let db = test_db();
        let mut item = Item::new("hammer", 1);

        let result = db
            .put(&mut item)
            .resolver(item_resolver())
            .prepare()
            .unwrap()
            .execute()
            .unwrap();

        assert!(result.was_inserted());
        assert_eq!(result.affected_table(), "items");
        // after_put ran in the same call stack and assigned the rowid
        assert_eq!(item.id, result.inserted_id());
    }

    #[test]
    fn assigned_identity_updates_in_place() {
        let db = test_db();
        let mut item = Item::new("hammer", 1);
        db.put(&mut item)
            .resolver(item_resolver())
            .prepare()
            .unwrap()
            .execute()
            .unwrap();

        item.qty = 7;
        let result = db
            .put(&mut item)
            .resolver(item_resolver())
            .prepare()
            .unwrap()
            .execute()
            .unwrap();

        assert!(result.was_updated());
        assert_eq!(result.rows_updated(), Some(1));

        let rows = db.engine().select(&Query::table("items")).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get_i64("qty").unwrap(), 7);
    }

    #[test]
    fn stale_identity_with_no_matching_row_inserts() {
        let db = test_db();
        let mut item = Item {
            id: Some(41),
            name: "wrench".into(),
            qty: 2,
        };

        let result = db
            .put(&mut item)
            .resolver(item_resolver())
            .prepare()
            .unwrap()
            .execute()
            .unwrap();

        assert!(result.was_inserted());
        assert_eq!(result.inserted_id(), Some(41));
    }

    #[test]
    fn batch_put_preserves_input_order_and_assigns_ids() {
        let db = test_db();
        let items = vec![
            Item::new("hammer", 1),
            Item::new("wrench", 2),
            Item::new("pliers", 3),
        ];

        let results = db
            .put_all(items)
            .resolver(item_resolver())
            .prepare()
            .unwrap()
            .execute()
            .unwrap();

        assert_eq!(results.len(), 3);
        assert_eq!(results.num_inserted(), 3);
        assert_eq!(results.affected_tables(), BTreeSet::from(["items".to_string()]));

        let items = results.into_items();
        assert_eq!(items[0].name, "hammer");
        assert_eq!(items[2].name, "pliers");
        assert!(items.iter().all(|i| i.id.is_some()));
    }

    #[test]
    fn failed_put_surfaces_engine_error() {
        let db = test_db();
        let mut item = Item::new("hammer", 1);

        let err = db
            .put(&mut item)
            .resolver(DefaultPutResolver::new("no_such_table", &["id"]))
            .prepare()
            .unwrap()
            .execute()
            .unwrap_err();

        assert!(matches!(err, RunnelError::Storage(_)));
        assert_eq!(item.id, None);
    }
}
