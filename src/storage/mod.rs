//! Storage backends for sample persistence
//!
//! ## Backends
//!
//! - **SQLite** (default): one append-only `metrics` table in an embedded database file
//! - **In-Memory**: no persistence, for dry runs and tests
//!
//! ## Usage
//!
//! ```no_run
//! use netpulse::storage::{SampleStore, sqlite::SqliteStore};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let store = SqliteStore::open("./metrics.db").await?;
//!     store.init().await?;
//!     // hand it to the Scheduler
//!     Ok(())
//! }
//! ```

pub mod backend;
pub mod error;
pub mod memory;
pub mod schema;
#[cfg(feature = "storage-sqlite")]
pub mod sqlite;

pub use backend::{SampleStore, StoreStats, init_or_close};
pub use error::{StorageError, StorageResult};
pub use memory::MemoryStore;
pub use schema::SampleRow;
