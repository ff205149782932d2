//! Output module for crawl reporting
//!
//! This module handles:
//! - The append-only event log of crawl progress
//! - Crawl statistics for the `--stats` mode

pub mod event_log;
pub mod stats;

pub use event_log::{CrawlEvent, EventLog};
pub use stats::{load_statistics, print_statistics, CrawlStatistics};
