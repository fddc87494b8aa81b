//! In-memory sample store (no persistence)
//!
//! Useful for dry runs and for tests that should not touch the file system.
//! Honors the same contract as the SQLite store: appends are all-or-nothing
//! per tick and fail once the store is closed.

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tracing::debug;

use super::backend::{SampleStore, StoreStats};
use super::error::{StorageError, StorageResult};
use crate::Sample;

#[derive(Default)]
pub struct MemoryStore {
    samples: Mutex<Vec<Sample>>,
    closed: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything appended so far, in append order
    pub fn samples(&self) -> Vec<Sample> {
        self.samples
            .lock()
            .map(|samples| samples.clone())
            .unwrap_or_default()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SampleStore for MemoryStore {
    async fn init(&self) -> StorageResult<()> {
        Ok(())
    }

    async fn append(&self, samples: &[Sample]) -> StorageResult<()> {
        if self.is_closed() {
            return Err(StorageError::Closed);
        }

        let mut stored = self
            .samples
            .lock()
            .map_err(|e| StorageError::QueryFailed(e.to_string()))?;
        stored.extend_from_slice(samples);

        debug!("in-memory store: appended {} samples", samples.len());
        Ok(())
    }

    async fn stats(&self) -> StorageResult<StoreStats> {
        let rows = self
            .samples
            .lock()
            .map_err(|e| StorageError::QueryFailed(e.to_string()))?
            .len() as u64;

        Ok(StoreStats {
            rows,
            description: format!("In-Memory: {} rows", rows),
        })
    }

    async fn close(&self) -> StorageResult<()> {
        debug!("closing in-memory store");
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}
