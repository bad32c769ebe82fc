//! Reactive get behavior: first snapshot, invalidation-driven
//! re-execution, subscription isolation, and failure propagation.

use futures::{Stream, StreamExt};
use runnel::prelude::*;
use std::pin::Pin;
use std::time::Duration;
use tokio::time::timeout;

#[derive(Debug, Clone, PartialEq)]
struct Item {
    id: Option<i64>,
    name: String,
}

impl Item {
    fn new(name: &str) -> Self {
        Self {
            id: None,
            name: name.to_string(),
        }
    }
}

impl FromRecord for Item {
    fn from_record(record: &Record) -> Result<Self> {
        Ok(Item {
            id: record.get_opt_i64("id")?,
            name: record.get_str("name")?.to_string(),
        })
    }
}

impl ToRecord for Item {
    fn to_record(&self) -> Result<Record> {
        Ok(Record::new()
            .with("id", self.id)
            .with("name", self.name.as_str()))
    }
}

fn item_resolver() -> DefaultPutResolver<Item> {
    DefaultPutResolver::new("items", &["id"]).with_id_assignment(|item: &mut Item, id| item.id = Some(id))
}

fn test_db() -> RunnelDb<SqliteRowStore> {
    let db = RunnelDb::open_in_memory().unwrap();
    db.engine()
        .execute_batch("CREATE TABLE items (id INTEGER PRIMARY KEY, name TEXT NOT NULL)")
        .unwrap();
    db
}

fn put_item(db: &RunnelDb<SqliteRowStore>, item: &mut Item) -> PutResult {
    db.put(item)
        .resolver(item_resolver())
        .prepare()
        .unwrap()
        .execute()
        .unwrap()
}

type ItemStream = Pin<Box<dyn Stream<Item = Result<Vec<Item>>> + Send>>;

fn watch_items(db: &RunnelDb<SqliteRowStore>) -> ItemStream {
    Box::pin(
        db.get::<Item>()
            .query(Query::table("items").with_order_by("id ASC"))
            .prepare()
            .unwrap()
            .stream(),
    )
}

async fn next_emission(stream: &mut ItemStream) -> Vec<Item> {
    timeout(Duration::from_secs(1), stream.next())
        .await
        .expect("stream should emit in time")
        .expect("stream should still be live")
        .expect("pass should succeed")
}

async fn assert_silent(stream: &mut ItemStream) {
    let result = timeout(Duration::from_millis(100), stream.next()).await;
    assert!(result.is_err(), "stream should not emit");
}

// First emission equals what a blocking execution returns at that instant,
// before any write occurs.
#[tokio::test]
async fn first_emission_matches_blocking_execution() {
    let db = test_db();
    put_item(&db, &mut Item::new("hammer"));
    put_item(&db, &mut Item::new("wrench"));

    let prepared = db
        .get::<Item>()
        .query(Query::table("items").with_order_by("id ASC"))
        .prepare()
        .unwrap();
    let blocking = prepared.execute().unwrap();

    let mut stream = watch_items(&db);
    let first = next_emission(&mut stream).await;

    assert_eq!(first, blocking);
    assert_eq!(first.len(), 2);
}

// A write touching a watched table triggers exactly one re-read; a write
// touching a different table triggers none.
#[tokio::test]
async fn relevant_write_triggers_exactly_one_re_emission() {
    let db = test_db();
    let mut stream = watch_items(&db);
    assert_eq!(next_emission(&mut stream).await.len(), 0);

    put_item(&db, &mut Item::new("hammer"));

    let after_write = next_emission(&mut stream).await;
    assert_eq!(after_write.len(), 1);
    assert_eq!(after_write[0].name, "hammer");
    assert_silent(&mut stream).await;

    // A write attributed elsewhere is invisible to this watcher
    db.notify_changes(Changes::table("users"));
    assert_silent(&mut stream).await;
}

// Two subscriptions to the same query are independent: disposing one
// leaves the other live.
#[tokio::test]
async fn disposed_subscription_stops_while_active_one_continues() {
    let db = test_db();

    let mut active = watch_items(&db);
    let mut disposed = watch_items(&db);
    next_emission(&mut active).await;
    next_emission(&mut disposed).await;
    assert_eq!(db.bus().subscription_count(), 2);

    drop(disposed);
    assert_eq!(db.bus().subscription_count(), 1);

    put_item(&db, &mut Item::new("hammer"));
    assert_eq!(next_emission(&mut active).await.len(), 1);
}

// End-to-end: a put deciding "insert" lands in a parallel streaming get
// within one notification cycle.
#[tokio::test]
async fn insert_becomes_visible_within_one_cycle() {
    let db = test_db();
    let mut stream = watch_items(&db);
    next_emission(&mut stream).await;

    let mut item = Item::new("hammer");
    let result = put_item(&db, &mut item);

    assert!(result.was_inserted());
    assert_eq!(result.affected_table(), "items");
    let id = result.inserted_id().unwrap();
    assert_eq!(item.id, Some(id));

    let emitted = next_emission(&mut stream).await;
    assert!(emitted.iter().any(|i| i.id == Some(id) && i.name == "hammer"));
}

// End-to-end: a raw query's declared table set gates re-emission.
#[tokio::test]
async fn raw_query_watches_only_declared_tables() {
    let db = test_db();
    db.engine()
        .execute_batch(
            "CREATE TABLE a (id INTEGER PRIMARY KEY);
             CREATE TABLE b (id INTEGER PRIMARY KEY)",
        )
        .unwrap();

    let mut stream: ItemStream = Box::pin(
        db.get::<Item>()
            .raw_query(
                RawQuery::new(
                    "SELECT id, 'row' AS name FROM a UNION ALL SELECT id, 'row' FROM b",
                    vec![],
                )
                .watching(["a", "b"]),
            )
            .prepare()
            .unwrap()
            .stream(),
    );
    next_emission(&mut stream).await;

    db.notify_changes(Changes::table("c"));
    assert_silent(&mut stream).await;

    db.notify_changes(Changes::table("b"));
    next_emission(&mut stream).await;
}

// A raw query declaring no tables degenerates to a one-shot emission.
#[tokio::test]
async fn undeclared_raw_query_is_one_shot() {
    let db = test_db();

    let mut stream: ItemStream = Box::pin(
        db.get::<Item>()
            .raw_query(RawQuery::new("SELECT id, name FROM items", vec![]))
            .prepare()
            .unwrap()
            .stream(),
    );

    assert_eq!(next_emission(&mut stream).await.len(), 0);
    let end = timeout(Duration::from_millis(100), stream.next())
        .await
        .expect("one-shot stream should end promptly");
    assert!(end.is_none());
    assert_eq!(db.bus().subscription_count(), 0);
}

// A failing re-execution pass surfaces its error and ends the sequence
// rather than silently skipping the refresh.
#[tokio::test]
async fn failed_pass_terminates_the_stream() {
    let db = test_db();
    let mut stream = watch_items(&db);
    next_emission(&mut stream).await;

    db.engine().execute_batch("DROP TABLE items").unwrap();
    db.notify_changes(Changes::table("items"));

    let failure = timeout(Duration::from_secs(1), stream.next())
        .await
        .expect("failing pass should emit in time")
        .expect("stream should emit the failure");
    assert!(matches!(failure, Err(RunnelError::Storage(_))));

    let end = timeout(Duration::from_millis(100), stream.next())
        .await
        .expect("stream should end after the failure");
    assert!(end.is_none());
}

// Closing the store ends live streams after their current pass.
#[tokio::test]
async fn close_ends_live_streams() {
    let db = test_db();
    let mut stream = watch_items(&db);
    next_emission(&mut stream).await;

    db.close();

    let end = timeout(Duration::from_secs(1), stream.next())
        .await
        .expect("stream should end after close");
    assert!(end.is_none());
}
