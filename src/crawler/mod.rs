//! Crawler module for breadth-first account discovery
//!
//! This module contains the core crawling logic, including:
//! - Rate-limit aware retries around every remote call
//! - Seed resolution and resume planning
//! - The discovery predicate
//! - Overall crawl coordination

mod coordinator;
mod predicate;
mod rate_limit;
mod seed;

pub use coordinator::{CrawlReport, FrontierController, StopReason};
pub use predicate::{DiscoveryPredicate, LocationPredicate};
pub use rate_limit::{RateLimitWindow, RateLimitedCaller};
pub use seed::{plan_start, resolve_seed, SeedSource, StartMode, StartPoint};

use crate::config::Config;
use crate::output::{CrawlEvent, EventLog};
use crate::remote::{HttpGraphClient, HttpSearchClient, RemoteGraphClient, SearchClient};
use crate::storage::{FileCheckpointStore, RunStatus, SqliteDirectory};
use crate::GeoflockError;
use std::path::Path;
use std::sync::Arc;

/// Command-line choices for a crawl run
#[derive(Debug, Clone, Default)]
pub struct CrawlOptions {
    /// Whether to resume from, clear, or insist on the checkpoint
    pub mode: StartMode,

    /// Where the first seed comes from when there is nothing to resume
    pub seed: Option<SeedSource>,

    /// Overrides `crawler.max-seeds`
    pub max_seeds: Option<u32>,

    /// Hash of the configuration file, stored with the run record
    pub config_hash: String,
}

/// Runs a complete crawl operation
///
/// This is the main entry point for starting a crawl. It will:
/// 1. Open the account directory, checkpoint store and event log
/// 2. Build the remote graph client (and the search client if needed)
/// 3. Decide where to start: checkpoint, seed, search or directory
/// 4. Record a new run and expand seeds until done or interrupted
///
/// Ctrl-C ends the run as `interrupted`; the checkpoint is left pointing at
/// the page in flight.
///
/// # Returns
///
/// * `Ok(CrawlReport)` - The run finished or reached its seed limit
/// * `Err(GeoflockError)` - The run failed or was interrupted
pub async fn run_crawl(config: &Config, options: CrawlOptions) -> crate::Result<CrawlReport> {
    let database_path = Path::new(&config.output.database_path);
    let directory = SqliteDirectory::new(database_path)?;
    // Separate connection so the run can be closed out after the controller is dropped
    let mut runs = SqliteDirectory::new(database_path)?;
    let mut checkpoints = FileCheckpointStore::new(&config.output.checkpoint_path);
    let events = Arc::new(EventLog::open_or_unavailable(Path::new(
        &config.output.event_log_path,
    )));

    let client: Arc<dyn RemoteGraphClient> = Arc::new(HttpGraphClient::from_config(config)?);
    let search = match (&options.seed, &config.search) {
        (Some(SeedSource::Search { .. }), Some(search)) => Some(HttpSearchClient::from_config(
            search,
            &config.remote.user_agent,
        )?),
        _ => None,
    };

    let start = plan_start(
        options.mode,
        &mut checkpoints,
        &directory,
        options.seed.as_ref(),
        search.as_ref().map(|s| s as &dyn SearchClient),
    )
    .await?;

    let run_id = runs.create_run(&options.config_hash)?;
    tracing::info!("Starting crawl run {} from {}", run_id, start);
    events.record(CrawlEvent::RunStarted {
        run_id: Some(run_id),
        start: start.to_string(),
    });

    let max_seeds = options.max_seeds.or(config.crawler.seed_limit());
    let mut controller = FrontierController::new(
        client,
        Box::new(directory),
        Box::new(checkpoints),
        Box::new(LocationPredicate::from_config(&config.discovery)),
        Arc::clone(&events),
    )
    .with_caller(RateLimitedCaller::from_config(
        &config.crawler,
        Arc::clone(&events),
    ))
    .with_max_seeds(max_seeds);

    let outcome = tokio::select! {
        result = controller.run(start) => result,
        _ = tokio::signal::ctrl_c() => {
            tracing::warn!("Interrupted; the next run resumes from the checkpoint");
            Err(GeoflockError::Interrupted)
        }
    };

    let status = match &outcome {
        Ok(_) => RunStatus::Completed,
        Err(GeoflockError::Interrupted) => RunStatus::Interrupted,
        Err(_) => RunStatus::Failed,
    };
    runs.finish_run(run_id, status)?;

    if events.has_failed() {
        tracing::warn!(
            "Some events could not be written to {}",
            config.output.event_log_path
        );
    }

    outcome
}
