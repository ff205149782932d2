//! Configuration module for Geoflock
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use geoflock::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("geoflock.toml")).unwrap();
//! println!("Page size: {}", config.crawler.page_size);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    Config, CrawlerConfig, DiscoveryConfig, OutputConfig, RemoteConfig, SearchConfig,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, read_env_secret};
