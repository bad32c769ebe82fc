use runnel_core::{
    config::{StoreConfig, SynchronousMode},
    error::{Result, RunnelError},
    traits::RowStore,
    types::{Predicate, Query, RawQuery, Record, Value},
};
use rusqlite::{Connection, OpenFlags};
use std::sync::{Arc, Mutex};

use crate::sql::{self, SqlValue};

/// SQLite-backed row store
pub struct SqliteRowStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteRowStore {
    /// Open (or create) a database file with the given configuration.
    pub fn open(config: StoreConfig) -> Result<Self> {
        // Create parent directory if needed
        if let Some(parent) = config.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open_with_flags(
            &config.path,
            OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_CREATE,
        )
        .map_err(RunnelError::storage)?;

        Self::configure_connection(&conn, &config)?;
        tracing::debug!(path = %config.path.display(), "sqlite row store opened");

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Open an in-memory database, mostly useful for tests and demos.
    ///
    /// WAL mode does not apply to in-memory databases and is skipped.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(RunnelError::storage)?;
        conn.pragma_update(None, "foreign_keys", "ON")
            .map_err(RunnelError::storage)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Get the underlying connection (for DDL and custom queries)
    ///
    /// Returns an Arc to the mutex-protected SQLite connection.
    /// Users should lock the mutex to access the connection.
    pub fn conn(&self) -> &Arc<Mutex<Connection>> {
        &self.conn
    }

    /// Run a batch of semicolon-separated statements.
    ///
    /// Escape hatch for schema setup in tests and demos; this is not a
    /// migration facility and reports no affected tables.
    pub fn execute_batch(&self, sql: &str) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute_batch(sql).map_err(RunnelError::storage)
    }

    /// Configure SQLite connection
    fn configure_connection(conn: &Connection, config: &StoreConfig) -> Result<()> {
        if config.wal_mode {
            conn.pragma_update(None, "journal_mode", "WAL")
                .map_err(RunnelError::storage)?;
        }

        let sync_mode = match config.synchronous {
            SynchronousMode::Full => "FULL",
            SynchronousMode::Normal => "NORMAL",
            SynchronousMode::Off => "OFF",
        };
        conn.pragma_update(None, "synchronous", sync_mode)
            .map_err(RunnelError::storage)?;

        if config.foreign_keys {
            conn.pragma_update(None, "foreign_keys", "ON")
                .map_err(RunnelError::storage)?;
        }

        conn.pragma_update(None, "cache_size", config.cache_size)
            .map_err(RunnelError::storage)?;

        Ok(())
    }

    fn run_select(&self, sql_text: &str, args: &[&Value]) -> Result<Vec<Record>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(sql_text).map_err(RunnelError::storage)?;
        let column_names: Vec<String> =
            stmt.column_names().iter().map(|s| s.to_string()).collect();

        let mut rows = stmt
            .query(rusqlite::params_from_iter(args.iter().copied().map(SqlValue)))
            .map_err(RunnelError::storage)?;

        let mut records = Vec::new();
        while let Some(row) = rows.next().map_err(RunnelError::storage)? {
            let mut record = Record::new();
            for (i, name) in column_names.iter().enumerate() {
                let value = sql::value_from_sql(row.get_ref(i).map_err(RunnelError::storage)?);
                record.set(name.clone(), value);
            }
            records.push(record);
        }

        Ok(records)
    }

    fn run_execute(&self, sql_text: &str, args: &[&Value]) -> Result<usize> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            sql_text,
            rusqlite::params_from_iter(args.iter().copied().map(SqlValue)),
        )
        .map_err(RunnelError::storage)
    }
}

impl RowStore for SqliteRowStore {
    fn select(&self, query: &Query) -> Result<Vec<Record>> {
        let (sql_text, args) = sql::select_sql(query);
        self.run_select(&sql_text, &args)
    }

    fn select_raw(&self, query: &RawQuery) -> Result<Vec<Record>> {
        let args: Vec<&Value> = query.args.iter().collect();
        self.run_select(&query.sql, &args)
    }

    fn insert(&self, table: &str, record: &Record) -> Result<i64> {
        let (sql_text, args) = sql::insert_sql(table, record);
        let conn = self.conn.lock().unwrap();
        conn.execute(
            &sql_text,
            rusqlite::params_from_iter(args.iter().copied().map(SqlValue)),
        )
        .map_err(RunnelError::storage)?;
        Ok(conn.last_insert_rowid())
    }

    fn update(&self, table: &str, record: &Record, predicate: &Predicate) -> Result<u64> {
        let (sql_text, args) = sql::update_sql(table, record, predicate);
        Ok(self.run_execute(&sql_text, &args)? as u64)
    }

    fn delete(&self, table: &str, predicate: Option<&Predicate>) -> Result<u64> {
        let (sql_text, args) = sql::delete_sql(table, predicate);
        Ok(self.run_execute(&sql_text, &args)? as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use runnel_core::types::DeleteQuery;
    use tempfile::TempDir;

    fn test_store() -> (SqliteRowStore, TempDir) {
        let temp = TempDir::new().unwrap();
        let config = StoreConfig::new(temp.path().join("test.db"));
        let store = SqliteRowStore::open(config).unwrap();
        store
            .execute_batch(
                "CREATE TABLE items (
                    id INTEGER PRIMARY KEY,
                    name TEXT NOT NULL,
                    qty INTEGER NOT NULL DEFAULT 0
                )",
            )
            .unwrap();
        (store, temp)
    }

    fn item(name: &str, qty: i64) -> Record {
        Record::new().with("name", name).with("qty", qty)
    }

    #[test]
    fn insert_assigns_rowids() {
        let (store, _temp) = test_store();

        let first = store.insert("items", &item("hammer", 1)).unwrap();
        let second = store.insert("items", &item("wrench", 2)).unwrap();
        assert!(second > first);
    }

    #[test]
    fn select_round_trip() {
        let (store, _temp) = test_store();
        store.insert("items", &item("hammer", 1)).unwrap();
        store.insert("items", &item("wrench", 2)).unwrap();

        let rows = store
            .select(&Query::table("items").with_order_by("name ASC"))
            .unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].get_str("name").unwrap(), "hammer");
        assert_eq!(rows[1].get_str("name").unwrap(), "wrench");
        assert_eq!(rows[1].get_i64("qty").unwrap(), 2);
    }

    #[test]
    fn select_with_predicate_and_projection() {
        let (store, _temp) = test_store();
        store.insert("items", &item("hammer", 1)).unwrap();
        store.insert("items", &item("wrench", 5)).unwrap();

        let rows = store
            .select(
                &Query::table("items")
                    .with_columns(["name"])
                    .filter("qty > ?", vec![Value::Integer(3)]),
            )
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get_str("name").unwrap(), "wrench");
        assert!(!rows[0].contains("qty"));
    }

    #[test]
    fn raw_select_binds_args() {
        let (store, _temp) = test_store();
        store.insert("items", &item("hammer", 1)).unwrap();
        store.insert("items", &item("wrench", 5)).unwrap();

        let raw = RawQuery::new(
            "SELECT name FROM items WHERE qty >= ? ORDER BY name",
            vec![Value::Integer(5)],
        )
        .watching(["items"]);
        let rows = store.select_raw(&raw).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get_str("name").unwrap(), "wrench");
    }

    #[test]
    fn update_reports_affected_rows() {
        let (store, _temp) = test_store();
        store.insert("items", &item("hammer", 1)).unwrap();
        store.insert("items", &item("wrench", 1)).unwrap();

        let rows = store
            .update(
                "items",
                &Record::new().with("qty", 9i64),
                &Predicate::new("qty = ?", vec![Value::Integer(1)]),
            )
            .unwrap();
        assert_eq!(rows, 2);

        let all = store.select(&Query::table("items")).unwrap();
        assert!(all.iter().all(|r| r.get_i64("qty").unwrap() == 9));
    }

    #[test]
    fn delete_with_and_without_predicate() {
        let (store, _temp) = test_store();
        store.insert("items", &item("hammer", 1)).unwrap();
        store.insert("items", &item("wrench", 2)).unwrap();

        let deleted = store
            .delete(
                "items",
                Some(&Predicate::new("name = ?", vec![Value::Text("hammer".into())])),
            )
            .unwrap();
        assert_eq!(deleted, 1);

        let deleted = store.delete("items", None).unwrap();
        assert_eq!(deleted, 1);
        assert!(store.select(&Query::table("items")).unwrap().is_empty());
    }

    #[test]
    fn delete_query_splits_into_parts() {
        let (store, _temp) = test_store();
        store.insert("items", &item("hammer", 1)).unwrap();

        let deleted = store
            .delete_query(&DeleteQuery::table("items").filter(
                "name = ?",
                vec![Value::Text("hammer".into())],
            ))
            .unwrap();
        assert_eq!(deleted, 1);
    }

    #[test]
    fn null_round_trip() {
        let (store, _temp) = test_store();
        store
            .execute_batch("CREATE TABLE maybe (id INTEGER PRIMARY KEY, note TEXT)")
            .unwrap();
        store
            .insert("maybe", &Record::new().with("note", Option::<String>::None))
            .unwrap();

        let rows = store.select(&Query::table("maybe")).unwrap();
        assert!(rows[0].get("note").unwrap().is_null());
    }

    #[test]
    fn engine_failures_surface_as_storage_errors() {
        let (store, _temp) = test_store();
        let err = store.select(&Query::table("no_such_table")).unwrap_err();
        assert!(matches!(err, RunnelError::Storage(_)));
    }

    #[test]
    fn in_memory_store_works() {
        let store = SqliteRowStore::open_in_memory().unwrap();
        store
            .execute_batch("CREATE TABLE t (id INTEGER PRIMARY KEY, v TEXT)")
            .unwrap();
        store.insert("t", &Record::new().with("v", "x")).unwrap();
        assert_eq!(store.select(&Query::table("t")).unwrap().len(), 1);
    }
}
