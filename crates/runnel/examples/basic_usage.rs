//! Basic Runnel Usage Example
//!
//! This example demonstrates:
//! - Opening a store
//! - Mapping a domain type to and from records
//! - Put (insert and update) with the default resolver
//! - Structured and raw queries
//! - Delete by query
//!
//! Run with: cargo run --example basic_usage

use runnel::prelude::*;

#[derive(Debug, Clone)]
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

impl FromRecord for Item {
    fn from_record(record: &Record) -> Result<Self> {
        Ok(Item {
            id: record.get_opt_i64("id")?,
            name: record.get_str("name")?.to_string(),
            qty: record.get_i64("qty")?,
        })
    }
}

fn item_resolver() -> DefaultPutResolver<Item> {
    DefaultPutResolver::new("items", &["id"]).with_id_assignment(|item: &mut Item, id| item.id = Some(id))
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter("runnel=debug")
        .init();

    println!("\n╔═══════════════════════════════════════╗");
    println!("║   Runnel Basic Usage Example          ║");
    println!("╚═══════════════════════════════════════╝\n");

    let temp_dir = tempfile::tempdir()?;
    let db_path = temp_dir.path().join("inventory.db");

    // ========================================
    // 1. Open Store
    // ========================================
    println!("📂 Step 1: Opening Store");
    println!("   Path: {:?}", db_path);

    let db = RunnelDb::open(&db_path)?;
    db.engine().execute_batch(
        "CREATE TABLE items (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            qty INTEGER NOT NULL
        )",
    )?;
    println!("   ✅ Store opened, schema ready\n");

    // ========================================
    // 2. Insert Objects
    // ========================================
    println!("📦 Step 2: Inserting Items");

    let mut hammer = Item::new("hammer", 3);
    let result = db
        .put(&mut hammer)
        .resolver(item_resolver())
        .prepare()?
        .execute()?;
    println!(
        "   ✅ Inserted '{}' (rowid {})",
        hammer.name,
        result.inserted_id().unwrap()
    );

    let results = db
        .put_all(vec![Item::new("wrench", 5), Item::new("pliers", 2)])
        .resolver(item_resolver())
        .prepare()?
        .execute()?;
    println!(
        "   ✅ Batch put: {} inserted, {} updated\n",
        results.num_inserted(),
        results.num_updated()
    );

    // ========================================
    // 3. Update In Place
    // ========================================
    println!("🔧 Step 3: Updating an Item");

    hammer.qty = 10;
    let result = db
        .put(&mut hammer)
        .resolver(item_resolver())
        .prepare()?
        .execute()?;
    println!(
        "   ✅ '{}' now qty 10 ({} row updated)\n",
        hammer.name,
        result.rows_updated().unwrap()
    );

    // ========================================
    // 4. Query
    // ========================================
    println!("🔍 Step 4: Querying");

    let items: Vec<Item> = db
        .get()
        .query(
            Query::table("items")
                .filter("qty >= ?", vec![Value::Integer(3)])
                .with_order_by("qty DESC"),
        )
        .prepare()?
        .execute()?;

    println!("   📋 Items with qty >= 3:");
    for item in &items {
        println!("      #{:?} {} × {}", item.id, item.name, item.qty);
    }

    // Records map to themselves, handy for aggregates
    let total: Vec<Record> = db
        .get()
        .raw_query(RawQuery::new("SELECT SUM(qty) AS total FROM items", vec![]))
        .prepare()?
        .execute()?;
    println!(
        "   Σ Total stock: {}\n",
        total[0].get_i64("total").unwrap_or(0)
    );

    // ========================================
    // 5. Delete
    // ========================================
    println!("🗑️  Step 5: Deleting");

    let result = db
        .delete(DeleteQuery::table("items").filter("qty < ?", vec![Value::Integer(3)]))
        .prepare()
        .execute()?;
    println!("   ✅ Deleted {} low-stock item(s)", result.rows_deleted());

    let left: Vec<Item> = db
        .get()
        .query(Query::table("items"))
        .prepare()?
        .execute()?;
    println!("   📦 {} item(s) remain\n", left.len());

    db.close();
    println!("╔═══════════════════════════════════════╗");
    println!("║   Example Completed Successfully!     ║");
    println!("╚═══════════════════════════════════════╝\n");

    Ok(())
}
