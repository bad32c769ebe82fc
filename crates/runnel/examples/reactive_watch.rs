//! Reactive Query Example
//!
//! This example demonstrates:
//! - A streaming get that emits an immediate first snapshot
//! - Automatic re-execution when a watched table is written
//! - Writes to unrelated tables staying invisible to the watcher
//!
//! Run with: cargo run --example reactive_watch

use futures::StreamExt;
use runnel::prelude::*;
use std::time::Duration;

#[derive(Debug, Clone)]
struct Task {
    id: Option<i64>,
    title: String,
    done: bool,
}

impl Task {
    fn new(title: &str) -> Self {
        Self {
            id: None,
            title: title.to_string(),
            done: false,
        }
    }
}

impl ToRecord for Task {
    fn to_record(&self) -> Result<Record> {
        Ok(Record::new()
            .with("id", self.id)
            .with("title", self.title.as_str())
            .with("done", self.done))
    }
}

impl FromRecord for Task {
    fn from_record(record: &Record) -> Result<Self> {
        Ok(Task {
            id: record.get_opt_i64("id")?,
            title: record.get_str("title")?.to_string(),
            done: record.get_i64("done")? != 0,
        })
    }
}

fn task_resolver() -> DefaultPutResolver<Task> {
    DefaultPutResolver::new("tasks", &["id"]).with_id_assignment(|task: &mut Task, id| task.id = Some(id))
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter("runnel=debug")
        .init();

    println!("\n╔═══════════════════════════════════════╗");
    println!("║   Runnel Reactive Query Example       ║");
    println!("╚═══════════════════════════════════════╝\n");

    let temp_dir = tempfile::tempdir()?;
    let db = RunnelDb::open(temp_dir.path().join("tasks.db"))?;
    db.engine().execute_batch(
        "CREATE TABLE tasks (
            id INTEGER PRIMARY KEY,
            title TEXT NOT NULL,
            done INTEGER NOT NULL DEFAULT 0
        );
        CREATE TABLE audit (id INTEGER PRIMARY KEY, note TEXT)",
    )?;

    // Watch the open task list; the first snapshot arrives immediately
    let mut open_tasks = Box::pin(
        db.get::<Task>()
            .query(
                Query::table("tasks")
                    .filter("done = ?", vec![Value::Integer(0)])
                    .with_order_by("id ASC"),
            )
            .prepare()?
            .stream(),
    );

    let writer = db.clone();
    let handle = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;

        println!("✏️  writer: adding tasks");
        writer
            .put_all(vec![Task::new("write report"), Task::new("review report")])
            .resolver(task_resolver())
            .prepare()
            .unwrap()
            .execute_async()
            .await
            .unwrap();

        tokio::time::sleep(Duration::from_millis(50)).await;

        // This table is not watched; the stream stays quiet
        println!("✏️  writer: touching the audit table (unwatched)");
        writer
            .engine()
            .execute_batch("INSERT INTO audit (note) VALUES ('checkpoint')")
            .unwrap();
        writer.notify_changes(Changes::table("audit"));

        tokio::time::sleep(Duration::from_millis(50)).await;

        println!("✏️  writer: completing a task");
        let mut done = Task {
            id: Some(1),
            title: "write report".into(),
            done: true,
        };
        writer
            .put(&mut done)
            .resolver(task_resolver())
            .prepare()
            .unwrap()
            .execute()
            .unwrap();
    });

    // Three emissions: empty snapshot, two open tasks, one open task
    for round in 0..3 {
        let tasks = open_tasks
            .next()
            .await
            .expect("stream is live")
            .expect("pass succeeded");
        println!("📥 emission {}: {} open task(s)", round, tasks.len());
        for task in &tasks {
            println!("      • #{} {}", task.id.unwrap_or(0), task.title);
        }
    }

    handle.await.expect("writer finished");
    db.close();

    println!("\n✅ watcher saw every relevant write, and only those\n");
    Ok(())
}
