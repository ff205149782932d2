//! Append-only audit log of crawl progress
//!
//! Every event that moves the crawl forward (seed starts, throttling, pruning,
//! page commits, discoveries) is written as one JSON object per line and
//! mirrored to `tracing`. A failing log never stops the crawl: the first
//! write error is reported with `tracing::warn!` and later ones are dropped.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

/// A crawl-progress event
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum CrawlEvent {
    RunStarted {
        run_id: Option<i64>,
        start: String,
    },
    SeedStarted {
        seed: String,
        page_number: u32,
        cursor: i64,
        resumed: bool,
    },
    RateLimited {
        operation: String,
        reset_at: DateTime<Utc>,
        wait_secs: u64,
    },
    SeedPruned {
        seed: String,
        reason: String,
    },
    PageCommitted {
        seed: String,
        page_number: u32,
        next_cursor: i64,
        connections: usize,
        discovered: usize,
    },
    AccountDiscovered {
        identifier: String,
        location: String,
    },
    CandidateDropped {
        identifier: String,
        reason: String,
    },
    CrawlFinished {
        seeds_expanded: u32,
        accounts_discovered: u64,
        reason: String,
    },
}

impl CrawlEvent {
    /// Mirrors the event to the tracing subscriber
    fn trace(&self) {
        match self {
            Self::RunStarted { run_id, start } => {
                tracing::info!("Run {:?} starting from {}", run_id, start)
            }
            Self::SeedStarted {
                seed,
                page_number,
                resumed,
                ..
            } => {
                if *resumed {
                    tracing::info!("Resuming {} at page {}", seed, page_number)
                } else {
                    tracing::info!("Processing {}", seed)
                }
            }
            Self::RateLimited {
                operation,
                reset_at,
                wait_secs,
            } => tracing::warn!(
                "Rate limited during {}; waiting {}s until {}",
                operation,
                wait_secs,
                reset_at.with_timezone(&chrono::Local).format("%Y-%m-%d %H:%M:%S %Z")
            ),
            Self::SeedPruned { seed, reason } => {
                tracing::warn!("Pruned {} from the directory: {}", seed, reason)
            }
            Self::PageCommitted {
                seed,
                page_number,
                connections,
                discovered,
                ..
            } => tracing::debug!(
                "{} page {}: {} connections, {} discovered",
                seed,
                page_number,
                connections,
                discovered
            ),
            Self::AccountDiscovered {
                identifier,
                location,
            } => tracing::info!("Discovered {} ({})", identifier, location),
            Self::CandidateDropped { identifier, reason } => {
                tracing::debug!("Dropped candidate {}: {}", identifier, reason)
            }
            Self::CrawlFinished {
                seeds_expanded,
                accounts_discovered,
                reason,
            } => tracing::info!(
                "Crawl finished ({}): {} seeds expanded, {} accounts discovered",
                reason,
                seeds_expanded,
                accounts_discovered
            ),
        }
    }
}

#[derive(Serialize)]
struct EventLine<'a> {
    at: String,
    #[serde(flatten)]
    event: &'a CrawlEvent,
}

enum Sink {
    File(Mutex<File>),
    Memory(Mutex<Vec<CrawlEvent>>),
    Unavailable,
}

/// Append-only event log shared by the crawl components
pub struct EventLog {
    sink: Sink,
    write_failed: AtomicBool,
}

impl EventLog {
    /// Opens (or creates) a JSON-lines log at `path` in append mode
    pub fn open(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self::with_sink(Sink::File(Mutex::new(file))))
    }

    /// Opens the log at `path`, or falls back to tracing only if it cannot be opened
    ///
    /// The fallback reports itself through [`has_failed`](Self::has_failed).
    pub fn open_or_unavailable(path: &Path) -> Self {
        match Self::open(path) {
            Ok(log) => log,
            Err(e) => {
                tracing::warn!(
                    "Cannot open event log {}, continuing without it: {}",
                    path.display(),
                    e
                );
                let log = Self::with_sink(Sink::Unavailable);
                log.write_failed.store(true, Ordering::Relaxed);
                log
            }
        }
    }

    /// Keeps events in memory, for inspection in tests
    pub fn in_memory() -> Self {
        Self::with_sink(Sink::Memory(Mutex::new(Vec::new())))
    }

    fn with_sink(sink: Sink) -> Self {
        Self {
            sink,
            write_failed: AtomicBool::new(false),
        }
    }

    /// Records an event; never fails
    pub fn record(&self, event: CrawlEvent) {
        event.trace();

        match &self.sink {
            Sink::File(file) => {
                if let Err(e) = Self::append(file, &event) {
                    if !self.write_failed.swap(true, Ordering::Relaxed) {
                        tracing::warn!("Event log write failed, continuing without it: {}", e);
                    }
                }
            }
            Sink::Memory(events) => {
                if let Ok(mut events) = events.lock() {
                    events.push(event);
                }
            }
            Sink::Unavailable => {}
        }
    }

    fn append(file: &Mutex<File>, event: &CrawlEvent) -> io::Result<()> {
        let line = serde_json::to_string(&EventLine {
            at: Utc::now().to_rfc3339(),
            event,
        })?;
        let mut file = file
            .lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "event log lock poisoned"))?;
        writeln!(file, "{}", line)
    }

    /// Events held by an in-memory log; empty for other sinks
    pub fn events(&self) -> Vec<CrawlEvent> {
        match &self.sink {
            Sink::Memory(events) => events.lock().map(|e| e.clone()).unwrap_or_default(),
            _ => Vec::new(),
        }
    }

    /// Returns true once a write to the log file has failed
    pub fn has_failed(&self) -> bool {
        self.write_failed.load(Ordering::Relaxed)
    }
}
