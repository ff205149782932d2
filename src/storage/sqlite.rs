//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the AccountDirectory
//! trait, plus run tracking for crawl history.

use crate::storage::schema::initialize_schema;
use crate::storage::traits::{AccountDirectory, StorageError, StorageResult};
use crate::storage::{AccountRecord, RunRecord, RunStatus};
use crate::GeoflockError;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;

/// SQLite account directory
pub struct SqliteDirectory {
    conn: Connection,
}

impl SqliteDirectory {
    /// Opens or creates the directory database at `path`
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteDirectory)` - Successfully opened/created database
    /// * `Err(GeoflockError)` - Failed to open database
    pub fn new(path: &Path) -> Result<Self, GeoflockError> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database
    pub fn new_in_memory() -> Result<Self, GeoflockError> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }

    // ===== Run Management =====

    /// Creates a new crawl run and returns its ID
    pub fn create_run(&mut self, config_hash: &str) -> StorageResult<i64> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO runs (started_at, config_hash, status) VALUES (?1, ?2, ?3)",
            params![now, config_hash, RunStatus::Running.to_db_string()],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn get_run(&self, run_id: i64) -> StorageResult<RunRecord> {
        self.conn
            .query_row(
                "SELECT id, started_at, finished_at, config_hash, status FROM runs WHERE id = ?1",
                params![run_id],
                run_from_row,
            )
            .optional()?
            .ok_or(StorageError::RunNotFound(run_id))
    }

    /// Gets the most recent run
    pub fn get_latest_run(&self) -> StorageResult<Option<RunRecord>> {
        let run = self
            .conn
            .query_row(
                "SELECT id, started_at, finished_at, config_hash, status FROM runs ORDER BY id DESC LIMIT 1",
                [],
                run_from_row,
            )
            .optional()?;
        Ok(run)
    }

    pub fn count_runs(&self) -> StorageResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM runs", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    /// Records a run's final status with a finish timestamp
    pub fn finish_run(&mut self, run_id: i64, status: RunStatus) -> StorageResult<()> {
        let now = Utc::now().to_rfc3339();
        let updated = self.conn.execute(
            "UPDATE runs SET status = ?1, finished_at = ?2 WHERE id = ?3",
            params![status.to_db_string(), now, run_id],
        )?;
        if updated == 0 {
            return Err(StorageError::RunNotFound(run_id));
        }
        Ok(())
    }
}

impl AccountDirectory for SqliteDirectory {
    fn list(&self, visited: bool) -> StorageResult<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT identifier FROM accounts WHERE visited = ?1 ORDER BY seq ASC")?;

        let ids = stmt
            .query_map(params![visited], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;

        Ok(ids)
    }

    fn insert_if_absent(&mut self, record: &AccountRecord) -> StorageResult<bool> {
        check_encodable(record)?;

        let now = Utc::now().to_rfc3339();
        let inserted = self.conn.execute(
            "INSERT OR IGNORE INTO accounts
             (identifier, name, location, follower_count, visited, discovered_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                record.identifier,
                record.name,
                record.location,
                i64::try_from(record.follower_count).unwrap_or(i64::MAX),
                record.visited,
                now
            ],
        )?;

        Ok(inserted > 0)
    }

    fn mark_visited(&mut self, id: &str) -> StorageResult<()> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "UPDATE accounts SET visited = 1, visited_at = ?1 WHERE identifier = ?2",
            params![now, id],
        )?;
        Ok(())
    }

    fn remove(&mut self, id: &str) -> StorageResult<()> {
        self.conn
            .execute("DELETE FROM accounts WHERE identifier = ?1", params![id])?;
        Ok(())
    }

    fn get(&self, id: &str) -> StorageResult<Option<AccountRecord>> {
        let record = self
            .conn
            .query_row(
                "SELECT identifier, name, location, follower_count, visited
                 FROM accounts WHERE identifier = ?1",
                params![id],
                |row| {
                    Ok(AccountRecord {
                        identifier: row.get(0)?,
                        name: row.get(1)?,
                        location: row.get(2)?,
                        follower_count: row.get::<_, i64>(3)?.max(0) as u64,
                        visited: row.get(4)?,
                    })
                },
            )
            .optional()?;
        Ok(record)
    }

    fn count(&self, visited: Option<bool>) -> StorageResult<u64> {
        let count: i64 = match visited {
            Some(flag) => self.conn.query_row(
                "SELECT COUNT(*) FROM accounts WHERE visited = ?1",
                params![flag],
                |row| row.get(0),
            )?,
            None => self
                .conn
                .query_row("SELECT COUNT(*) FROM accounts", [], |row| row.get(0))?,
        };
        Ok(count as u64)
    }
}

fn run_from_row(row: &Row<'_>) -> rusqlite::Result<RunRecord> {
    Ok(RunRecord {
        id: row.get(0)?,
        started_at: row.get(1)?,
        finished_at: row.get(2)?,
        config_hash: row.get(3)?,
        status: RunStatus::from_db_string(&row.get::<_, String>(4)?)
            .unwrap_or(RunStatus::Running),
    })
}

/// Rejects text SQLite's C string APIs would truncate
fn check_encodable(record: &AccountRecord) -> StorageResult<()> {
    for (field, value) in [
        ("identifier", &record.identifier),
        ("name", &record.name),
        ("location", &record.location),
    ] {
        if value.contains('\0') {
            return Err(StorageError::Encoding {
                identifier: record.identifier.replace('\0', "\\0"),
                field,
            });
        }
    }
    Ok(())
}
