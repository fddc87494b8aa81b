//! Error types for storage operations

use std::fmt;

/// Result type alias for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur during storage operations
///
/// Every variant is fatal for a sampling run: losing samples silently is
/// never acceptable.
#[derive(Debug)]
pub enum StorageError {
    /// Database could not be opened
    ConnectionFailed(String),

    /// Database query failed
    QueryFailed(String),

    /// Table creation failed
    SchemaFailed(String),

    /// The store was already closed
    Closed,

    /// I/O error (file access, etc.)
    IoError(std::io::Error),
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageError::ConnectionFailed(msg) => {
                write!(f, "failed to open sample store: {}", msg)
            }
            StorageError::QueryFailed(msg) => write!(f, "storage query failed: {}", msg),
            StorageError::SchemaFailed(msg) => write!(f, "failed to create schema: {}", msg),
            StorageError::Closed => write!(f, "sample store is closed"),
            StorageError::IoError(err) => write!(f, "I/O error: {}", err),
        }
    }
}

impl std::error::Error for StorageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StorageError::IoError(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for StorageError {
    fn from(err: std::io::Error) -> Self {
        StorageError::IoError(err)
    }
}

#[cfg(feature = "storage-sqlite")]
impl From<sqlx::Error> for StorageError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Io(io_err) => StorageError::IoError(io_err),
            sqlx::Error::PoolClosed => StorageError::Closed,
            sqlx::Error::RowNotFound => StorageError::QueryFailed("no rows found".to_string()),
            _ => StorageError::QueryFailed(err.to_string()),
        }
    }
}
