//! Storage traits and error types
//!
//! This module defines the trait interfaces the crawl engine persists through:
//! the account directory and the checkpoint store.

use crate::state::Checkpoint;
use crate::storage::AccountRecord;
use thiserror::Error;

/// Errors that can occur during directory operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Run not found: {0}")]
    RunNotFound(i64),

    /// A text field the directory cannot store; the record is dropped, not retried
    #[error("Cannot encode {field} of account {identifier}")]
    Encoding { identifier: String, field: &'static str },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

impl StorageError {
    pub fn is_encoding(&self) -> bool {
        matches!(self, Self::Encoding { .. })
    }
}

/// Errors that can occur while reading or writing the checkpoint
#[derive(Debug, Error)]
pub enum CheckpointError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed checkpoint: {0}")]
    Malformed(String),
}

/// Result type for directory operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Result type for checkpoint operations
pub type CheckpointResult<T> = Result<T, CheckpointError>;

/// Durable store of every known account and its visited flag
///
/// The identifier is the only key. Implementations must keep at most one
/// record per identifier.
pub trait AccountDirectory {
    /// Lists identifiers with the given visited flag, in insertion order
    fn list(&self, visited: bool) -> StorageResult<Vec<String>>;

    /// Inserts a record unless one with the same identifier exists
    ///
    /// # Returns
    ///
    /// * `Ok(true)` - The record was inserted
    /// * `Ok(false)` - A record with this identifier already exists
    /// * `Err(StorageError::Encoding { .. })` - A field cannot be stored
    fn insert_if_absent(&mut self, record: &AccountRecord) -> StorageResult<bool>;

    /// Flips the visited flag on; a missing identifier is not an error
    fn mark_visited(&mut self, id: &str) -> StorageResult<()>;

    /// Deletes the record entirely
    fn remove(&mut self, id: &str) -> StorageResult<()>;

    /// Gets a record by identifier
    fn get(&self, id: &str) -> StorageResult<Option<AccountRecord>>;

    /// Counts records, optionally filtered by visited flag
    fn count(&self, visited: Option<bool>) -> StorageResult<u64>;
}

/// Durable record of where a crawl should resume
pub trait CheckpointStore {
    /// Reads the current checkpoint, or None if there is none
    fn read(&self) -> CheckpointResult<Option<Checkpoint>>;

    /// Replaces the current checkpoint
    fn write(&mut self, checkpoint: &Checkpoint) -> CheckpointResult<()>;

    /// Forgets the current checkpoint
    fn clear(&mut self) -> CheckpointResult<()>;
}
