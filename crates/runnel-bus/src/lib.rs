//! # Runnel Bus
//!
//! Process-wide change notification hub keyed by table name.
//!
//! Write-side operations publish [`Changes`](runnel_core::Changes) after a
//! successful write; read-side subscriptions watch exactly the tables they
//! depend on and receive every relevant notification in publish order. The
//! bus never buffers beyond each subscription's bounded queue: a subscriber
//! that is not consuming drops overflow and relies on its next pass
//! re-reading full state.
//!
//! ## Example
//!
//! ```rust,no_run
//! use futures::StreamExt;
//! use runnel_bus::ChangeBus;
//! use runnel_core::Changes;
//!
//! # async fn demo() {
//! let bus = ChangeBus::new();
//! let mut watcher = bus.observe(["items"]);
//!
//! bus.notify(Changes::table("items"));
//!
//! let changes = watcher.next().await.unwrap();
//! assert!(changes.affected().contains("items"));
//! # }
//! ```

pub mod bus;
pub mod config;
pub mod subscription;

pub use bus::ChangeBus;
pub use config::BusConfig;
pub use subscription::ChangesStream;
