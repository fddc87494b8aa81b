//! Sample store trait definition

use async_trait::async_trait;
use tracing::error;

use super::error::StorageResult;
use crate::Sample;

/// Row count and a human-readable summary of a store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreStats {
    pub rows: u64,
    pub description: String,
}

/// Append-only persistence for samples
///
/// The scheduler is the only writer: it calls `append` once per tick, in
/// chronological order, and `close` exactly once when the run ends.
#[async_trait]
pub trait SampleStore: Send + Sync {
    /// Create the samples table if it does not exist
    ///
    /// Safe to call on every start. Never touches existing rows.
    async fn init(&self) -> StorageResult<()>;

    /// Persist all samples of one tick
    ///
    /// Either every sample is written or, on error, none is. An empty slice
    /// is a no-op.
    async fn append(&self, samples: &[Sample]) -> StorageResult<()>;

    /// Number of stored rows plus a short description
    async fn stats(&self) -> StorageResult<StoreStats>;

    /// Release the underlying handle
    ///
    /// Later `append` calls fail with `StorageError::Closed`.
    async fn close(&self) -> StorageResult<()>;
}

/// Run `init`, closing the store if it fails
///
/// The init error is returned; a close error on that path is only logged.
pub async fn init_or_close(store: &dyn SampleStore) -> StorageResult<()> {
    let result = store.init().await;

    if result.is_err()
        && let Err(e) = store.close().await
    {
        error!("error closing store after failed init: {e}");
    }

    result
}
