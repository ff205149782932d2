//! Choosing where a crawl starts
//!
//! A run starts from, in order of preference:
//! 1. The checkpoint left by a previous run (unless starting fresh)
//! 2. An explicit account identifier
//! 3. The first usable result of a web search
//! 4. The head of the directory's eligible list

use crate::remote::SearchClient;
use crate::state::Checkpoint;
use crate::storage::{AccountDirectory, CheckpointStore};
use crate::{ConfigError, GeoflockError};
use std::fmt;

/// Where the first seed identifier comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SeedSource {
    /// A known account identifier
    Account(String),

    /// A web search whose first result names the seed account
    Search { query: String, locale: String },
}

/// How a run treats an existing checkpoint
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StartMode {
    /// Resume from the checkpoint if there is one
    #[default]
    Auto,

    /// Clear the checkpoint and start from the seed source
    Fresh,

    /// Resume from the checkpoint; its absence is an error
    Resume,
}

/// Resolved starting point of a crawl run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartPoint {
    /// Expand this account from its first page
    Seed(String),

    /// Continue from a previous run's checkpoint
    Resume(Checkpoint),
}

impl fmt::Display for StartPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Seed(id) => write!(f, "seed {}", id),
            Self::Resume(checkpoint) if checkpoint.is_exhausted() => {
                write!(f, "checkpoint after finished seed {}", checkpoint.seed)
            }
            Self::Resume(checkpoint) => write!(
                f,
                "checkpoint {} page {} (cursor {})",
                checkpoint.seed, checkpoint.page_number, checkpoint.cursor
            ),
        }
    }
}

/// Turns a seed source into an account identifier
pub async fn resolve_seed(
    source: &SeedSource,
    search: Option<&dyn SearchClient>,
) -> Result<String, GeoflockError> {
    match source {
        SeedSource::Account(id) => Ok(id.clone()),
        SeedSource::Search { query, locale } => {
            let search = search.ok_or_else(|| {
                ConfigError::Validation("searching for a seed requires a [search] section".into())
            })?;

            let results = search.search(query, locale).await?;
            let identifier = results
                .iter()
                .find_map(|result| result.identifier())
                .ok_or_else(|| GeoflockError::SearchEmpty {
                    query: query.clone(),
                })?;

            tracing::info!("Search '{}' resolved to seed {}", query, identifier);
            Ok(identifier)
        }
    }
}

/// Decides where this run starts
///
/// With [`StartMode::Fresh`], any checkpoint is cleared first. Otherwise an
/// existing checkpoint wins over the seed source, and [`StartMode::Resume`]
/// fails with `NoCheckpoint` when there is none.
pub async fn plan_start(
    mode: StartMode,
    checkpoints: &mut dyn CheckpointStore,
    directory: &dyn AccountDirectory,
    source: Option<&SeedSource>,
    search: Option<&dyn SearchClient>,
) -> Result<StartPoint, GeoflockError> {
    if mode == StartMode::Fresh {
        checkpoints.clear()?;
    } else if let Some(checkpoint) = checkpoints.read()? {
        if source.is_some() {
            tracing::info!("Checkpoint found; ignoring the given seed (use --fresh to override)");
        }
        return Ok(StartPoint::Resume(checkpoint));
    } else if mode == StartMode::Resume {
        return Err(GeoflockError::NoCheckpoint);
    }

    if let Some(source) = source {
        return Ok(StartPoint::Seed(resolve_seed(source, search).await?));
    }

    directory
        .list(false)?
        .into_iter()
        .next()
        .map(StartPoint::Seed)
        .ok_or(GeoflockError::NoSeed)
}
