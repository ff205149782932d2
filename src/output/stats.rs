//! Statistics generation from the account directory
//!
//! This module provides functionality for extracting and displaying
//! crawl statistics from the storage layer.

use crate::state::Checkpoint;
use crate::storage::{AccountDirectory, CheckpointStore, RunRecord, SqliteDirectory};
use crate::GeoflockError;

/// Crawl statistics summary
#[derive(Debug, Clone)]
pub struct CrawlStatistics {
    /// Total number of accounts in the directory
    pub total_accounts: u64,

    /// Accounts already expanded as seeds
    pub visited: u64,

    /// Accounts discovered but not yet expanded
    pub eligible: u64,

    /// Number of recorded crawl runs
    pub total_runs: u64,

    /// Most recent run, if any
    pub latest_run: Option<RunRecord>,

    /// Current resume point, if any
    pub checkpoint: Option<Checkpoint>,
}

/// Loads statistics from storage
///
/// # Arguments
///
/// * `directory` - The account directory to query
/// * `checkpoints` - The checkpoint store holding the resume point
///
/// # Returns
///
/// * `Ok(CrawlStatistics)` - Successfully loaded statistics
/// * `Err(GeoflockError)` - Failed to query statistics
pub fn load_statistics(
    directory: &SqliteDirectory,
    checkpoints: &dyn CheckpointStore,
) -> Result<CrawlStatistics, GeoflockError> {
    Ok(CrawlStatistics {
        total_accounts: directory.count(None)?,
        visited: directory.count(Some(true))?,
        eligible: directory.count(Some(false))?,
        total_runs: directory.count_runs()?,
        latest_run: directory.get_latest_run()?,
        checkpoint: checkpoints.read()?,
    })
}

/// Prints statistics to stdout in a formatted manner
pub fn print_statistics(stats: &CrawlStatistics) {
    println!("=== Crawl Statistics ===\n");

    println!("Accounts:");
    println!("  Total in directory: {}", stats.total_accounts);
    println!("  Visited (expanded): {}", stats.visited);
    println!("  Eligible (frontier): {}", stats.eligible);
    println!();

    println!("Runs: {}", stats.total_runs);
    if let Some(run) = &stats.latest_run {
        println!(
            "  Latest: #{} {} (started {}, finished {})",
            run.id,
            run.status.to_db_string(),
            run.started_at,
            run.finished_at.as_deref().unwrap_or("-")
        );
    }
    println!();

    match &stats.checkpoint {
        Some(checkpoint) if checkpoint.is_exhausted() => println!(
            "Checkpoint: {} finished after page {}",
            checkpoint.seed,
            checkpoint.page_number.saturating_sub(1)
        ),
        Some(checkpoint) => println!(
            "Checkpoint: {} page {} (cursor {})",
            checkpoint.seed, checkpoint.page_number, checkpoint.cursor
        ),
        None => println!("Checkpoint: none"),
    }

    let progress = if stats.total_accounts > 0 {
        (stats.visited as f64 / stats.total_accounts as f64) * 100.0
    } else {
        0.0
    };
    println!(
        "\nProgress: {:.1}% ({} / {} accounts expanded)",
        progress, stats.visited, stats.total_accounts
    );
}
