//! Storage module for persisting crawl data
//!
//! This module handles everything the crawl writes to disk:
//! - SQLite account directory with visited flags
//! - Run tracking for crawl history
//! - Line-oriented checkpoint file for resumption

mod checkpoint;
mod schema;
mod sqlite;
mod traits;

pub use checkpoint::{parse_checkpoint, render_checkpoint, FileCheckpointStore};
pub use sqlite::SqliteDirectory;
pub use traits::{
    AccountDirectory, CheckpointError, CheckpointResult, CheckpointStore, StorageError,
    StorageResult,
};

use crate::remote::AccountProfile;
use std::fmt;

/// An account stored in the directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountRecord {
    pub identifier: String,
    pub name: String,
    pub location: String,
    pub follower_count: u64,
    pub visited: bool,
}

/// A profile field required to build an `AccountRecord` was absent
///
/// Not an error: the crawl treats such a profile as a non-match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MissingField(pub &'static str);

impl fmt::Display for MissingField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "missing field '{}'", self.0)
    }
}

impl AccountRecord {
    pub fn new(identifier: &str, name: &str, location: &str, follower_count: u64) -> Self {
        Self {
            identifier: identifier.to_string(),
            name: name.to_string(),
            location: location.to_string(),
            follower_count,
            visited: false,
        }
    }

    /// Builds an unvisited record from a discovered connection
    ///
    /// Name and location are required; a missing follower count is stored as 0.
    pub fn from_profile(profile: &AccountProfile) -> Result<Self, MissingField> {
        if profile.identifier.is_empty() {
            return Err(MissingField("screen_name"));
        }
        let name = profile.name.as_deref().ok_or(MissingField("name"))?;
        let location = profile.location.as_deref().ok_or(MissingField("location"))?;

        Ok(Self::new(
            &profile.identifier,
            name,
            location,
            profile.follower_count.unwrap_or(0),
        ))
    }

    /// Builds a record for a seed, tolerating absent profile fields
    pub fn seed_from_profile(profile: &AccountProfile) -> Self {
        Self::new(
            &profile.identifier,
            profile.name.as_deref().unwrap_or_default(),
            profile.location.as_deref().unwrap_or_default(),
            profile.follower_count.unwrap_or(0),
        )
    }
}

/// Represents a crawl run
#[derive(Debug, Clone)]
pub struct RunRecord {
    pub id: i64,
    pub started_at: String,
    pub finished_at: Option<String>,
    pub config_hash: String,
    pub status: RunStatus,
}

/// Status of a crawl run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Running,
    Completed,
    Interrupted,
    Failed,
}

impl RunStatus {
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Interrupted => "interrupted",
            Self::Failed => "failed",
        }
    }

    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "running" => Some(Self::Running),
            "completed" => Some(Self::Completed),
            "interrupted" => Some(Self::Interrupted),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }
}
