//! Crawler coordinator - breadth-first expansion of seed accounts
//!
//! The controller runs two nested loops:
//! - The outer loop picks a seed, fetches it, marks it visited and hands it
//!   to the inner loop, then moves on to the head of the eligible list.
//! - The inner loop walks the seed's connection pages, records every
//!   connection that passes the discovery predicate, and advances the
//!   checkpoint once the page's discoveries are in the directory.
//!
//! The checkpoint always points at a page that has not been fully committed,
//! so an interrupted run repeats at most one page and never skips one.

use crate::crawler::predicate::DiscoveryPredicate;
use crate::crawler::rate_limit::RateLimitedCaller;
use crate::crawler::seed::StartPoint;
use crate::output::{CrawlEvent, EventLog};
use crate::remote::{AccountProfile, RemoteError, RemoteGraphClient};
use crate::state::{Checkpoint, FrontierState};
use crate::storage::{AccountDirectory, AccountRecord, CheckpointStore};
use crate::GeoflockError;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

/// Why a crawl run stopped
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StopReason {
    /// No eligible account left to expand
    #[default]
    FrontierExhausted,

    /// The configured number of seeds has been expanded
    SeedLimitReached,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FrontierExhausted => write!(f, "frontier exhausted"),
            Self::SeedLimitReached => write!(f, "seed limit reached"),
        }
    }
}

/// Summary of one crawl run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrawlReport {
    pub seeds_expanded: u32,
    pub pages_fetched: u64,
    pub accounts_discovered: u64,
    pub seeds_pruned: u32,
    pub candidates_dropped: u64,
    pub stop: StopReason,
}

/// The crawl engine
pub struct FrontierController {
    client: Arc<dyn RemoteGraphClient>,
    directory: Box<dyn AccountDirectory>,
    checkpoints: Box<dyn CheckpointStore>,
    predicate: Box<dyn DiscoveryPredicate>,
    caller: RateLimitedCaller,
    events: Arc<EventLog>,
    max_seeds: Option<u32>,

    /// Identifiers removed this run; never expanded or rediscovered again
    pruned: HashSet<String>,
}

impl FrontierController {
    /// Creates a controller with the default retry policy and no seed limit
    ///
    /// # Arguments
    ///
    /// * `client` - Remote graph the connections are read from
    /// * `directory` - Durable record of every known account
    /// * `checkpoints` - Durable resume point
    /// * `predicate` - Decides which connections are recorded
    /// * `events` - Audit log of crawl progress
    pub fn new(
        client: Arc<dyn RemoteGraphClient>,
        directory: Box<dyn AccountDirectory>,
        checkpoints: Box<dyn CheckpointStore>,
        predicate: Box<dyn DiscoveryPredicate>,
        events: Arc<EventLog>,
    ) -> Self {
        Self {
            client,
            directory,
            checkpoints,
            predicate,
            caller: RateLimitedCaller::new(Arc::clone(&events)),
            events,
            max_seeds: None,
            pruned: HashSet::new(),
        }
    }

    pub fn with_caller(mut self, caller: RateLimitedCaller) -> Self {
        self.caller = caller;
        self
    }

    /// Stops the run after `limit` seeds have been expanded; None or 0 means unlimited
    pub fn with_max_seeds(mut self, limit: Option<u32>) -> Self {
        self.max_seeds = limit.filter(|n| *n > 0);
        self
    }

    pub fn directory(&self) -> &dyn AccountDirectory {
        self.directory.as_ref()
    }

    pub fn checkpoints(&self) -> &dyn CheckpointStore {
        self.checkpoints.as_ref()
    }

    /// Runs the crawl until the frontier is empty or the seed limit is hit
    ///
    /// Rate limiting, missing accounts and unstorable candidates are handled
    /// here. Any other remote, storage or checkpoint failure ends the run and
    /// is returned; the checkpoint then still points at the unfinished page.
    pub async fn run(&mut self, start: StartPoint) -> Result<CrawlReport, GeoflockError> {
        let mut report = CrawlReport::default();

        let (mut next_seed, mut resume) = match start {
            StartPoint::Seed(seed) => (Some(seed), None),
            StartPoint::Resume(checkpoint) if checkpoint.is_exhausted() => {
                tracing::info!(
                    "Seed {} was already finished, moving to the next eligible account",
                    checkpoint.seed
                );
                (None, None)
            }
            StartPoint::Resume(checkpoint) => (Some(checkpoint.seed.clone()), Some(checkpoint)),
        };

        loop {
            if let Some(limit) = self.max_seeds {
                if report.seeds_expanded >= limit {
                    report.stop = StopReason::SeedLimitReached;
                    break;
                }
            }

            let mut frontier = FrontierState::load(self.directory.as_ref())?;
            debug_assert!(frontier.is_disjoint());
            tracing::debug!(
                "Frontier: {} checked, {} eligible",
                frontier.checked_len(),
                frontier.eligible_len()
            );

            let seed = match next_seed.take().or_else(|| frontier.pop_next()) {
                Some(seed) => seed,
                None => {
                    report.stop = StopReason::FrontierExhausted;
                    break;
                }
            };

            let profile = match self
                .caller
                .call(self.client.as_ref(), "fetch_account", || {
                    self.client.fetch_account(&seed)
                })
                .await
            {
                Ok(profile) => profile,
                Err(RemoteError::NotFound(_)) => {
                    self.prune(&seed, "account not found", &mut report)?;
                    resume = None;
                    continue;
                }
                Err(e) => return Err(e.into()),
            };

            // Only the first seed of a run can resume mid-sequence
            let (position, resumed) = match resume.take() {
                Some(checkpoint) if checkpoint.seed == seed => (checkpoint, true),
                _ => {
                    let checkpoint = Checkpoint::start_of(&seed);
                    self.checkpoints.write(&checkpoint)?;
                    (checkpoint, false)
                }
            };

            self.record_seed(&seed, &profile)?;
            self.directory.mark_visited(&seed)?;
            frontier.mark_checked(&seed);
            report.seeds_expanded += 1;

            self.events.record(CrawlEvent::SeedStarted {
                seed: seed.clone(),
                page_number: position.page_number,
                cursor: position.cursor.as_raw(),
                resumed,
            });

            match self
                .process_pages(&seed, position, &mut frontier, &mut report)
                .await
            {
                Ok(()) => {}
                Err(GeoflockError::Remote(RemoteError::NotFound(_))) => {
                    self.prune(&seed, "connections not found", &mut report)?;
                }
                Err(e) => return Err(e),
            }
        }

        self.events.record(CrawlEvent::CrawlFinished {
            seeds_expanded: report.seeds_expanded,
            accounts_discovered: report.accounts_discovered,
            reason: report.stop.to_string(),
        });

        Ok(report)
    }

    /// Walks a seed's connection pages from `position` until the cursor is exhausted
    async fn process_pages(
        &mut self,
        seed: &str,
        position: Checkpoint,
        frontier: &mut FrontierState,
        report: &mut CrawlReport,
    ) -> Result<(), GeoflockError> {
        let mut page_number = position.page_number;
        let mut cursor = position.cursor;

        while !cursor.is_exhausted() {
            let page = self
                .caller
                .call(self.client.as_ref(), "fetch_connections_page", || {
                    self.client.fetch_connections_page(seed, cursor)
                })
                .await?;
            report.pages_fetched += 1;

            let discovered = self.evaluate_page(&page.accounts, frontier, report)?;

            // Advance only once the page's discoveries are durable
            self.checkpoints
                .write(&Checkpoint::after_page(seed, page_number, page.next_cursor))?;

            self.events.record(CrawlEvent::PageCommitted {
                seed: seed.to_string(),
                page_number,
                next_cursor: page.next_cursor.as_raw(),
                connections: page.accounts.len(),
                discovered,
            });

            page_number += 1;
            cursor = page.next_cursor;
        }

        Ok(())
    }

    /// Records every new matching connection; returns how many were inserted
    fn evaluate_page(
        &mut self,
        accounts: &[AccountProfile],
        frontier: &mut FrontierState,
        report: &mut CrawlReport,
    ) -> Result<usize, GeoflockError> {
        let mut discovered = 0;

        for profile in accounts {
            let id = profile.identifier.as_str();
            if frontier.contains(id) || self.pruned.contains(id) {
                continue;
            }
            if !self.predicate.matches(profile) {
                continue;
            }

            let record = match AccountRecord::from_profile(profile) {
                Ok(record) => record,
                Err(missing) => {
                    tracing::trace!("Skipping {}: {}", id, missing);
                    continue;
                }
            };

            match self.directory.insert_if_absent(&record) {
                Ok(true) => {
                    frontier.push_eligible(id);
                    discovered += 1;
                    report.accounts_discovered += 1;
                    self.events.record(CrawlEvent::AccountDiscovered {
                        identifier: record.identifier,
                        location: record.location,
                    });
                }
                Ok(false) => tracing::debug!("{} is already in the directory", id),
                Err(e) if e.is_encoding() => {
                    report.candidates_dropped += 1;
                    self.events.record(CrawlEvent::CandidateDropped {
                        identifier: id.to_string(),
                        reason: e.to_string(),
                    });
                }
                Err(e) => return Err(e.into()),
            }
        }

        Ok(discovered)
    }

    /// Makes sure the seed has a directory row so marking it visited sticks
    fn record_seed(&mut self, seed: &str, profile: &AccountProfile) -> Result<(), GeoflockError> {
        let mut record = AccountRecord::seed_from_profile(profile);
        record.identifier = seed.to_string();

        match self.directory.insert_if_absent(&record) {
            Ok(_) => Ok(()),
            Err(e) if e.is_encoding() => {
                tracing::warn!("Recording seed {} with placeholder fields: {}", seed, e);
                self.directory
                    .insert_if_absent(&AccountRecord::new(seed, "", "", record.follower_count))?;
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Removes an unresolvable account from the directory and the resume point
    fn prune(
        &mut self,
        seed: &str,
        reason: &str,
        report: &mut CrawlReport,
    ) -> Result<(), GeoflockError> {
        self.directory.remove(seed)?;
        self.pruned.insert(seed.to_string());
        report.seeds_pruned += 1;

        if let Some(checkpoint) = self.checkpoints.read()? {
            if checkpoint.seed == seed {
                self.checkpoints.clear()?;
            }
        }

        self.events.record(CrawlEvent::SeedPruned {
            seed: seed.to_string(),
            reason: reason.to_string(),
        });
        Ok(())
    }
}
