//! Geoflock: resumable breadth-first discovery of social-graph accounts
//!
//! This crate walks an account's connections page by page, keeps every
//! account that passes a discovery predicate (by default a location match),
//! and expands those accounts in turn. Progress lives in a SQLite account
//! directory plus a small checkpoint file so a crawl survives throttling,
//! crashes and restarts.

pub mod config;
pub mod crawler;
pub mod output;
pub mod remote;
pub mod state;
pub mod storage;

use thiserror::Error;

/// Main error type for Geoflock operations
#[derive(Debug, Error)]
pub enum GeoflockError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Remote error: {0}")]
    Remote(#[from] remote::RemoteError),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("Checkpoint error: {0}")]
    Checkpoint(#[from] storage::CheckpointError),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Search for '{query}' returned no usable account")]
    SearchEmpty { query: String },

    #[error("No seed account: pass --seed or --search, or resume from a checkpoint")]
    NoSeed,

    #[error("No checkpoint to resume from: drop --resume or pass --seed/--search")]
    NoCheckpoint,

    #[error("Crawl interrupted")]
    Interrupted,
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Environment variable {0} is not set")]
    MissingEnv(String),
}

/// Result type alias for Geoflock operations
pub type Result<T> = std::result::Result<T, GeoflockError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{CrawlReport, FrontierController, RateLimitedCaller, StartPoint};
pub use remote::{AccountProfile, ConnectionPage, RemoteGraphClient};
pub use state::{Checkpoint, Cursor, FrontierState};
pub use storage::{AccountDirectory, AccountRecord, CheckpointStore};
