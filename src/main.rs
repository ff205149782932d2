//! Geoflock main entry point
//!
//! This is the command-line interface for the Geoflock account crawler.

use anyhow::Context;
use clap::Parser;
use geoflock::config::{load_config_with_hash, Config};
use geoflock::crawler::{run_crawl, CrawlOptions, SeedSource, StartMode};
use geoflock::output::{load_statistics, print_statistics};
use geoflock::storage::{CheckpointStore, FileCheckpointStore, SqliteDirectory};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Geoflock: resumable breadth-first account discovery
///
/// Geoflock expands a seed account's connections page by page, keeps the
/// accounts whose profile location matches the configured keywords and
/// expands those in turn. Interrupted crawls resume from a checkpoint.
#[derive(Parser, Debug)]
#[command(name = "geoflock")]
#[command(version)]
#[command(about = "Resumable breadth-first account discovery", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Account identifier to start from
    #[arg(long, value_name = "ID", conflicts_with = "search")]
    seed: Option<String>,

    /// Web search whose first result names the starting account
    #[arg(long, value_name = "QUERY", conflicts_with = "seed")]
    search: Option<String>,

    /// Search locale, overriding search.locale
    #[arg(long, requires = "search")]
    locale: Option<String>,

    /// Expand at most N seeds this run (0 = unlimited)
    #[arg(long, value_name = "N")]
    max_seeds: Option<u32>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Require a checkpoint to resume from (resuming is otherwise the default when one exists)
    #[arg(long, conflicts_with = "fresh")]
    resume: bool,

    /// Discard the checkpoint and start from the given seed
    #[arg(long, conflicts_with = "resume")]
    fresh: bool,

    /// Validate config and show where the crawl would start without crawling
    #[arg(long, conflicts_with = "stats")]
    dry_run: bool,

    /// Show statistics from the database and exit
    #[arg(long, conflicts_with = "dry_run")]
    stats: bool,
}

impl Cli {
    fn start_mode(&self) -> StartMode {
        if self.fresh {
            StartMode::Fresh
        } else if self.resume {
            StartMode::Resume
        } else {
            StartMode::Auto
        }
    }

    fn seed_source(&self, config: &Config) -> Option<SeedSource> {
        if let Some(id) = &self.seed {
            return Some(SeedSource::Account(id.clone()));
        }
        let query = self.search.clone()?;
        let locale = self
            .locale
            .clone()
            .or_else(|| config.search.as_ref().map(|s| s.locale.clone()))
            .unwrap_or_default();
        Some(SeedSource::Search { query, locale })
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("Failed to load {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    if cli.dry_run {
        handle_dry_run(&cli, &config)
    } else if cli.stats {
        handle_stats(&config)
    } else {
        let options = CrawlOptions {
            mode: cli.start_mode(),
            seed: cli.seed_source(&config),
            max_seeds: cli.max_seeds,
            config_hash,
        };
        handle_crawl(&config, options).await
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("geoflock=info,warn"),
            1 => EnvFilter::new("geoflock=debug,info"),
            2 => EnvFilter::new("geoflock=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the --dry-run mode: validates config and shows where the crawl would start
fn handle_dry_run(cli: &Cli, config: &Config) -> anyhow::Result<()> {
    println!("=== Geoflock Dry Run ===\n");

    println!("Crawler Configuration:");
    println!("  Page size: {}", config.crawler.page_size);
    match cli.max_seeds.or(config.crawler.seed_limit()) {
        Some(limit) if limit > 0 => println!("  Max seeds: {}", limit),
        _ => println!("  Max seeds: unlimited"),
    }
    println!(
        "  Rate limit margin: {}s (minimum wait {}ms)",
        config.crawler.reset_margin_secs, config.crawler.min_wait_ms
    );
    println!(
        "  Transport retries: {} every {}ms",
        config.crawler.transport_retries, config.crawler.transport_retry_delay_ms
    );

    println!("\nRemote:");
    println!("  Base URL: {}", config.remote.base_url);
    println!("  Token from: ${}", config.remote.token_env);
    if let Some(search) = &config.search {
        println!("  Search: {} (engine {})", search.base_url, search.engine_id);
    }

    println!("\nDiscovery:");
    println!(
        "  Location keywords: {}",
        config.discovery.location_keywords.join(", ")
    );
    println!("  Skip protected: {}", config.discovery.skip_protected);

    println!("\nOutput:");
    println!("  Database: {}", config.output.database_path);
    println!("  Checkpoint: {}", config.output.checkpoint_path);
    println!("  Event log: {}", config.output.event_log_path);

    let checkpoints = FileCheckpointStore::new(&config.output.checkpoint_path);
    println!("\n✓ Configuration is valid");
    match (checkpoints.read()?, cli.seed_source(config)) {
        (Some(checkpoint), _) if !cli.fresh => println!(
            "✓ Would resume {} at page {} (cursor {})",
            checkpoint.seed, checkpoint.page_number, checkpoint.cursor
        ),
        (None, _) if cli.resume => println!("✗ No checkpoint to resume from"),
        (_, Some(SeedSource::Account(id))) => println!("✓ Would start from seed {}", id),
        (_, Some(SeedSource::Search { query, locale })) => {
            println!("✓ Would search '{}' ({}) for a seed", query, locale)
        }
        (_, None) => println!("✓ Would start from the first eligible account in the database"),
    }

    Ok(())
}

/// Handles the --stats mode: shows statistics from the database
fn handle_stats(config: &Config) -> anyhow::Result<()> {
    println!("Database: {}\n", config.output.database_path);

    let directory = SqliteDirectory::new(Path::new(&config.output.database_path))?;
    let checkpoints = FileCheckpointStore::new(&config.output.checkpoint_path);

    let stats = load_statistics(&directory, &checkpoints)?;
    print_statistics(&stats);

    Ok(())
}

/// Handles the main crawl operation
async fn handle_crawl(config: &Config, options: CrawlOptions) -> anyhow::Result<()> {
    match options.mode {
        StartMode::Fresh => tracing::info!("Starting fresh crawl (ignoring checkpoint)"),
        StartMode::Resume => tracing::info!("Resuming crawl from checkpoint"),
        StartMode::Auto => {
            tracing::info!("Starting crawl (will resume from checkpoint if present)")
        }
    }

    tracing::info!(
        "Location keywords: {}",
        config.discovery.location_keywords.join(", ")
    );

    match run_crawl(config, options).await {
        Ok(report) => {
            tracing::info!(
                "Crawl completed ({}): {} seeds expanded, {} pages, {} accounts discovered, {} pruned, {} dropped",
                report.stop,
                report.seeds_expanded,
                report.pages_fetched,
                report.accounts_discovered,
                report.seeds_pruned,
                report.candidates_dropped
            );
            Ok(())
        }
        Err(e) => {
            tracing::error!("Crawl failed: {}", e);
            Err(e.into())
        }
    }
}
