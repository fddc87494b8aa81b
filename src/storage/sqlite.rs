//! SQLite sample store
//!
//! ## Features
//!
//! - **Embedded**: No separate database server required
//! - **WAL mode**: Readers never block the writer
//! - **Single connection**: The sampler is the only writer, one connection serializes ticks
//! - **One transaction per tick**: A tick lands completely or not at all

use std::path::Path;

use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{Pool, Sqlite};
use tracing::{debug, info, instrument};

use super::backend::{SampleStore, StoreStats};
use super::error::{StorageError, StorageResult};
use super::schema::{CREATE_METRICS_TABLE, INSERT_SAMPLE, SampleRow};
use crate::Sample;

/// SQLite-backed sample store
pub struct SqliteStore {
    pool: Pool<Sqlite>,
    db_path: String,
}

impl SqliteStore {
    /// Open (and create if missing) the database file
    ///
    /// This does not create the table, call [`SampleStore::init`] for that.
    ///
    /// ## Example
    ///
    /// ```no_run
    /// # use netpulse::storage::{SampleStore, sqlite::SqliteStore};
    /// # async fn example() -> anyhow::Result<()> {
    /// let store = SqliteStore::open("./metrics.db").await?;
    /// store.init().await?;
    /// # Ok(())
    /// # }
    /// ```
    #[instrument(skip_all)]
    pub async fn open(db_path: impl AsRef<Path>) -> StorageResult<Self> {
        let db_path_str = db_path.as_ref().to_string_lossy().to_string();

        info!("opening SQLite store at: {}", db_path_str);

        let options = SqliteConnectOptions::new()
            .filename(&db_path_str)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .busy_timeout(std::time::Duration::from_secs(5));

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .map_err(|e| StorageError::ConnectionFailed(e.to_string()))?;

        Ok(Self {
            pool,
            db_path: db_path_str,
        })
    }

    pub fn path(&self) -> &str {
        &self.db_path
    }
}

#[async_trait]
impl SampleStore for SqliteStore {
    #[instrument(skip(self))]
    async fn init(&self) -> StorageResult<()> {
        sqlx::query(CREATE_METRICS_TABLE)
            .execute(&self.pool)
            .await
            .map_err(|e| StorageError::SchemaFailed(e.to_string()))?;

        debug!("metrics table ready");
        Ok(())
    }

    #[instrument(skip(self, samples), fields(count = samples.len()))]
    async fn append(&self, samples: &[Sample]) -> StorageResult<()> {
        if self.pool.is_closed() {
            return Err(StorageError::Closed);
        }

        if samples.is_empty() {
            return Ok(());
        }

        let mut tx = self.pool.begin().await?;

        for sample in samples {
            let row = SampleRow::from(sample);

            sqlx::query(INSERT_SAMPLE)
                .bind(row.timestamp)
                .bind(row.hostname)
                .bind(row.os_system)
                .bind(row.scenario)
                .bind(row.cpu_percent)
                .bind(row.ram_percent)
                .bind(row.target_name)
                .bind(row.ping_latency_ms)
                .bind(row.http_latency_ms)
                .bind(row.http_status_code)
                .execute(&mut *tx)
                .await?;
        }

        // dropping an uncommitted transaction rolls it back
        tx.commit().await?;

        debug!("appended {} samples", samples.len());
        Ok(())
    }

    #[instrument(skip(self))]
    async fn stats(&self) -> StorageResult<StoreStats> {
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM metrics")
            .fetch_one(&self.pool)
            .await?;

        let rows = row.0.max(0) as u64;

        let file_size = std::fs::metadata(&self.db_path)
            .map(|m| m.len())
            .unwrap_or(0);

        Ok(StoreStats {
            rows,
            description: format!(
                "SQLite: {} rows, {:.2} MB on disk ({})",
                rows,
                file_size as f64 / 1_000_000.0,
                self.db_path
            ),
        })
    }

    async fn close(&self) -> StorageResult<()> {
        info!("closing SQLite store");
        self.pool.close().await;
        Ok(())
    }
}
