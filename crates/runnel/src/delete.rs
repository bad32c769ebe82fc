//! Delete operations
//!
//! Symmetric to put: a [`DeleteResolver`] performs the write, the result
//! carries the affected table, and the bus is notified only on success.
//! Batch deletes map each object to its delete query and notify once
//! with the union of affected tables.

use runnel_bus::ChangeBus;
use runnel_core::{
    observe, Changes, DeleteQuery, DeleteResult, DeleteResults, Result, RowStore, RunnelError,
    ToDeleteQuery,
};
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Instant;

/// Defines behavior of a delete operation
pub trait DeleteResolver<S: RowStore>: Send + Sync {
    fn perform_delete(&self, store: &S, query: &DeleteQuery) -> Result<DeleteResult>;
}

/// Default delete resolver: delegates to the engine's delete primitive.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultDeleteResolver;

impl<S: RowStore> DeleteResolver<S> for DefaultDeleteResolver {
    fn perform_delete(&self, store: &S, query: &DeleteQuery) -> Result<DeleteResult> {
        let rows = store.delete_query(query)?;
        Ok(DeleteResult::new(rows, query.table.clone()))
    }
}

/// Builder for a prepared delete by query
pub struct DeleteBuilder<S: RowStore> {
    engine: Arc<S>,
    bus: ChangeBus,
    query: DeleteQuery,
    resolver: Option<Arc<dyn DeleteResolver<S>>>,
}

impl<S: RowStore> DeleteBuilder<S> {
    pub(crate) fn new(engine: Arc<S>, bus: ChangeBus, query: DeleteQuery) -> Self {
        Self {
            engine,
            bus,
            query,
            resolver: None,
        }
    }

    /// Override the default delete resolver.
    pub fn resolver(mut self, resolver: impl DeleteResolver<S> + 'static) -> Self {
        self.resolver = Some(Arc::new(resolver));
        self
    }

    /// Bind the operation. The query was supplied at construction and
    /// the resolver defaults, so this cannot fail.
    pub fn prepare(self) -> PreparedDelete<S> {
        PreparedDelete {
            engine: self.engine,
            bus: self.bus,
            query: self.query,
            resolver: self
                .resolver
                .unwrap_or_else(|| Arc::new(DefaultDeleteResolver)),
        }
    }
}

/// A bound, executable delete by query
pub struct PreparedDelete<S: RowStore> {
    engine: Arc<S>,
    bus: ChangeBus,
    query: DeleteQuery,
    resolver: Arc<dyn DeleteResolver<S>>,
}

impl<S: RowStore> Clone for PreparedDelete<S> {
    fn clone(&self) -> Self {
        Self {
            engine: self.engine.clone(),
            bus: self.bus.clone(),
            query: self.query.clone(),
            resolver: self.resolver.clone(),
        }
    }
}

impl<S: RowStore> PreparedDelete<S> {
    /// Execute immediately on the calling thread.
    ///
    /// On success the bus is notified with the affected table, whether
    /// or not any rows matched. A failed delete never notifies.
    pub fn execute(&self) -> Result<DeleteResult> {
        let start = Instant::now();
        let result = self.resolver.perform_delete(&self.engine, &self.query)?;

        observe::record_execute(start.elapsed(), "delete");
        self.bus.notify(Changes::table(result.affected_table()));

        Ok(result)
    }

    /// Execute on the blocking pool, safe to call from async context.
    pub async fn execute_async(&self) -> Result<DeleteResult> {
        let this = self.clone();
        tokio::task::spawn_blocking(move || this.execute())
            .await
            .map_err(|e| RunnelError::InvalidState(format!("task join error: {}", e)))?
    }
}

/// Builder for a prepared batch delete of mapped objects
pub struct DeleteAllBuilder<S: RowStore, T: ToDeleteQuery> {
    engine: Arc<S>,
    bus: ChangeBus,
    objects: Vec<T>,
    resolver: Option<Arc<dyn DeleteResolver<S>>>,
}

impl<S: RowStore, T: ToDeleteQuery> DeleteAllBuilder<S, T> {
    pub(crate) fn new(engine: Arc<S>, bus: ChangeBus, objects: Vec<T>) -> Self {
        Self {
            engine,
            bus,
            objects,
            resolver: None,
        }
    }

    pub fn resolver(mut self, resolver: impl DeleteResolver<S> + 'static) -> Self {
        self.resolver = Some(Arc::new(resolver));
        self
    }

    pub fn prepare(self) -> PreparedDeleteAll<S, T> {
        PreparedDeleteAll {
            engine: self.engine,
            bus: self.bus,
            objects: self.objects,
            resolver: self
                .resolver
                .unwrap_or_else(|| Arc::new(DefaultDeleteResolver)),
        }
    }
}

/// A bound, executable batch delete
///
/// One engine write per item; one bus notification per batch carrying
/// the union of affected tables.
pub struct PreparedDeleteAll<S: RowStore, T: ToDeleteQuery> {
    engine: Arc<S>,
    bus: ChangeBus,
    objects: Vec<T>,
    resolver: Arc<dyn DeleteResolver<S>>,
}

impl<S: RowStore, T: ToDeleteQuery> PreparedDeleteAll<S, T> {
    /// Execute immediately on the calling thread.
    ///
    /// Stops at the first failing item; nothing is notified in that
    /// case. On success, returns per-item results in input order.
    pub fn execute(self) -> Result<DeleteResults<T>> {
        let PreparedDeleteAll {
            engine,
            bus,
            objects,
            resolver,
        } = self;

        let start = Instant::now();
        let mut results = Vec::with_capacity(objects.len());
        let mut affected = BTreeSet::new();

        for object in objects {
            let query = object.to_delete_query()?;
            let result = resolver.perform_delete(&engine, &query)?;
            affected.insert(result.affected_table().to_string());
            results.push((object, result));
        }

        observe::record_execute(start.elapsed(), "delete_all");
        if !affected.is_empty() {
            bus.notify(Changes::tables(affected));
        }

        Ok(DeleteResults::new(results))
    }
}

impl<S: RowStore, T: ToDeleteQuery + Send + 'static> PreparedDeleteAll<S, T> {
    /// Execute on the blocking pool, safe to call from async context.
    pub async fn execute_async(self) -> Result<DeleteResults<T>> {
        tokio::task::spawn_blocking(move || self.execute())
            .await
            .map_err(|e| RunnelError::InvalidState(format!("task join error: {}", e)))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::RunnelDb;
    use runnel_core::{Predicate, Query, Value};
    use runnel_sqlite::SqliteRowStore;

    struct Tag {
        name: String,
    }

    impl ToDeleteQuery for Tag {
        fn to_delete_query(&self) -> Result<DeleteQuery> {
            Ok(DeleteQuery::table("tags").with_predicate(Predicate::new(
                "name = ?",
                vec![Value::Text(self.name.clone())],
            )))
        }
    }

    fn test_db() -> RunnelDb<SqliteRowStore> {
        let db = RunnelDb::open_in_memory().unwrap();
        db.engine()
            .execute_batch(
                "CREATE TABLE tags (id INTEGER PRIMARY KEY, name TEXT NOT NULL);
                 INSERT INTO tags (name) VALUES ('red');
                 INSERT INTO tags (name) VALUES ('green');
                 INSERT INTO tags (name) VALUES ('blue');",
            )
            .unwrap();
        db
    }

    #[test]
    fn delete_by_query_reports_affected_rows() {
        let db = test_db();

        let result = db
            .delete(DeleteQuery::table("tags").filter("name = ?", vec!["red".into()]))
            .prepare()
            .execute()
            .unwrap();

        assert_eq!(result.rows_deleted(), 1);
        assert_eq!(result.affected_table(), "tags");
        assert_eq!(db.engine().select(&Query::table("tags")).unwrap().len(), 2);
    }

    #[test]
    fn delete_matching_nothing_still_succeeds() {
        let db = test_db();

        let result = db
            .delete(DeleteQuery::table("tags").filter("name = ?", vec!["mauve".into()]))
            .prepare()
            .execute()
            .unwrap();

        assert_eq!(result.rows_deleted(), 0);
    }

    #[test]
    fn batch_delete_maps_each_object() {
        let db = test_db();
        let doomed = vec![
            Tag { name: "red".into() },
            Tag { name: "blue".into() },
        ];

        let results = db.delete_all(doomed).prepare().execute().unwrap();

        assert_eq!(results.len(), 2);
        assert_eq!(results.rows_deleted(), 2);
        assert_eq!(
            results.affected_tables(),
            BTreeSet::from(["tags".to_string()])
        );

        let left = db.engine().select(&Query::table("tags")).unwrap();
        assert_eq!(left.len(), 1);
        assert_eq!(left[0].get_str("name").unwrap(), "green");
    }

    #[test]
    fn failed_delete_surfaces_engine_error() {
        let db = test_db();
        let err = db
            .delete(DeleteQuery::table("no_such_table"))
            .prepare()
            .execute()
            .unwrap_err();
        assert!(matches!(err, RunnelError::Storage(_)));
    }

    #[test]
    fn custom_resolver_overrides_default() {
        struct Dry;
        impl<S: RowStore> DeleteResolver<S> for Dry {
            fn perform_delete(&self, _store: &S, query: &DeleteQuery) -> Result<DeleteResult> {
                Ok(DeleteResult::new(0, query.table.clone()))
            }
        }

        let db = test_db();
        let result = db
            .delete(DeleteQuery::table("tags"))
            .resolver(Dry)
            .prepare()
            .execute()
            .unwrap();

        assert_eq!(result.rows_deleted(), 0);
        // Nothing actually deleted
        assert_eq!(db.engine().select(&Query::table("tags")).unwrap().len(), 3);
    }
}
