//! Rate-limit aware retry policy for remote calls
//!
//! Every remote graph request goes through `RateLimitedCaller::call`:
//!
//! | Outcome | Action |
//! |---------|--------|
//! | Success | Return immediately |
//! | RateLimited | Sleep until the reset time, retry the same request |
//! | Transport | Retry up to `transport_retries` times with a fixed delay |
//! | NotFound | Return immediately so the caller can prune |
//! | Anything else | Return immediately |
//!
//! A throttling episode (consecutive RateLimited responses for one request)
//! produces exactly one `rate_limited` event, however many waits it takes.

use crate::config::CrawlerConfig;
use crate::output::{CrawlEvent, EventLog};
use crate::remote::{RemoteError, RemoteGraphClient, RemoteResult};
use chrono::{DateTime, Utc};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

/// Time at which the remote's request quota replenishes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitWindow {
    pub reset_at: DateTime<Utc>,
}

impl RateLimitWindow {
    /// Time left until the reset, zero if it has passed
    pub fn remaining(&self, now: DateTime<Utc>) -> Duration {
        (self.reset_at - now).to_std().unwrap_or(Duration::ZERO)
    }
}

/// Retry policy wrapped around a single remote request
pub struct RateLimitedCaller {
    reset_margin: Duration,
    min_wait: Duration,
    transport_retries: u32,
    transport_retry_delay: Duration,
    events: Arc<EventLog>,
}

impl RateLimitedCaller {
    /// Creates a caller with the default crawler settings
    pub fn new(events: Arc<EventLog>) -> Self {
        Self::from_config(&CrawlerConfig::default(), events)
    }

    pub fn from_config(config: &CrawlerConfig, events: Arc<EventLog>) -> Self {
        Self {
            reset_margin: config.reset_margin(),
            min_wait: config.min_wait(),
            transport_retries: config.transport_retries,
            transport_retry_delay: config.transport_retry_delay(),
            events,
        }
    }

    pub fn with_reset_margin(mut self, margin: Duration) -> Self {
        self.reset_margin = margin;
        self
    }

    pub fn with_min_wait(mut self, min_wait: Duration) -> Self {
        self.min_wait = min_wait;
        self
    }

    pub fn with_transport_retries(mut self, retries: u32, delay: Duration) -> Self {
        self.transport_retries = retries;
        self.transport_retry_delay = delay;
        self
    }

    /// Runs `request` until it succeeds or fails with something other than throttling
    ///
    /// # Arguments
    ///
    /// * `client` - Queried for the reset time when a throttled response carries none
    /// * `operation` - Name used in logs and events
    /// * `request` - Produces a fresh request future for every attempt
    pub async fn call<T, F, Fut>(
        &self,
        client: &dyn RemoteGraphClient,
        operation: &str,
        mut request: F,
    ) -> RemoteResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = RemoteResult<T>>,
    {
        let mut episode: Option<RateLimitWindow> = None;
        let mut transport_failures = 0u32;

        loop {
            match request().await {
                Ok(value) => {
                    if episode.is_some() {
                        tracing::info!("{} succeeded after rate limit reset", operation);
                    }
                    return Ok(value);
                }

                Err(RemoteError::RateLimited { reset_at }) => {
                    let window = match reset_at {
                        Some(reset_at) => RateLimitWindow { reset_at },
                        None => self.query_window(client).await,
                    };
                    let wait = self.wait_for(&window);

                    if episode.is_none() {
                        self.events.record(CrawlEvent::RateLimited {
                            operation: operation.to_string(),
                            reset_at: window.reset_at,
                            wait_secs: wait.as_secs(),
                        });
                    } else {
                        tracing::debug!("{} still rate limited, waiting {:?}", operation, wait);
                    }
                    episode = Some(window);

                    tokio::time::sleep(wait).await;
                }

                Err(e) if e.is_transient() && transport_failures < self.transport_retries => {
                    transport_failures += 1;
                    tracing::warn!(
                        "{} failed: {} (retry {}/{} in {:?})",
                        operation,
                        e,
                        transport_failures,
                        self.transport_retries,
                        self.transport_retry_delay
                    );
                    tokio::time::sleep(self.transport_retry_delay).await;
                }

                Err(e) => return Err(e),
            }
        }
    }

    /// Asks the remote for its reset time; falls back to now so `min_wait` applies
    async fn query_window(&self, client: &dyn RemoteGraphClient) -> RateLimitWindow {
        let reset_at = match client.rate_limit_reset().await {
            Ok(reset_at) => reset_at,
            Err(e) => {
                tracing::debug!("Could not read rate limit reset time: {}", e);
                Utc::now()
            }
        };
        RateLimitWindow { reset_at }
    }

    fn wait_for(&self, window: &RateLimitWindow) -> Duration {
        (window.remaining(Utc::now()) + self.reset_margin).max(self.min_wait)
    }
}
