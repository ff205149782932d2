use serde::Deserialize;
use std::time::Duration;

/// Main configuration structure for Geoflock
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub crawler: CrawlerConfig,
    pub remote: RemoteConfig,
    #[serde(default)]
    pub search: Option<SearchConfig>,
    #[serde(default)]
    pub discovery: DiscoveryConfig,
    pub output: OutputConfig,
}

/// Crawl pacing and retry configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Number of connections requested per page
    #[serde(rename = "page-size", default = "default_page_size")]
    pub page_size: u32,

    /// Maximum number of seeds to expand in one run (0 means no limit)
    #[serde(rename = "max-seeds", default)]
    pub max_seeds: u32,

    /// Seconds added to the remote's reset time before retrying
    #[serde(rename = "reset-margin-secs", default = "default_reset_margin_secs")]
    pub reset_margin_secs: u64,

    /// Minimum wait when a throttled call reports a reset time already in the past (milliseconds)
    #[serde(rename = "min-wait-ms", default = "default_min_wait_ms")]
    pub min_wait_ms: u64,

    /// How many times a transient transport failure is retried before it is fatal
    #[serde(rename = "transport-retries", default = "default_transport_retries")]
    pub transport_retries: u32,

    /// Delay between transport retries (milliseconds)
    #[serde(
        rename = "transport-retry-delay-ms",
        default = "default_transport_retry_delay_ms"
    )]
    pub transport_retry_delay_ms: u64,
}

impl CrawlerConfig {
    /// Returns the seed limit, or None when unlimited
    pub fn seed_limit(&self) -> Option<u32> {
        (self.max_seeds > 0).then_some(self.max_seeds)
    }

    pub fn reset_margin(&self) -> Duration {
        Duration::from_secs(self.reset_margin_secs)
    }

    pub fn min_wait(&self) -> Duration {
        Duration::from_millis(self.min_wait_ms)
    }

    pub fn transport_retry_delay(&self) -> Duration {
        Duration::from_millis(self.transport_retry_delay_ms)
    }
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            max_seeds: 0,
            reset_margin_secs: default_reset_margin_secs(),
            min_wait_ms: default_min_wait_ms(),
            transport_retries: default_transport_retries(),
            transport_retry_delay_ms: default_transport_retry_delay_ms(),
        }
    }
}

/// Remote graph API configuration
#[derive(Debug, Clone, Deserialize)]
pub struct RemoteConfig {
    /// Base URL of the graph API (e.g. "https://api.twitter.com/1.1")
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Name of the environment variable holding the bearer token
    #[serde(rename = "token-env")]
    pub token_env: String,

    /// User agent sent with every request
    #[serde(rename = "user-agent", default = "default_user_agent")]
    pub user_agent: String,
}

/// Web search configuration, used to derive a seed from a query
#[derive(Debug, Clone, Deserialize)]
pub struct SearchConfig {
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Name of the environment variable holding the search API key
    #[serde(rename = "key-env")]
    pub key_env: String,

    /// Custom search engine identifier
    #[serde(rename = "engine-id")]
    pub engine_id: String,

    /// Language restriction passed to the search API
    #[serde(default = "default_locale")]
    pub locale: String,
}

/// Discovery predicate configuration
#[derive(Debug, Clone, Deserialize)]
pub struct DiscoveryConfig {
    /// Substrings matched case-insensitively against the profile location
    #[serde(rename = "location-keywords", default = "default_location_keywords")]
    pub location_keywords: Vec<String>,

    /// Reject protected profiles regardless of location
    #[serde(rename = "skip-protected", default = "default_true")]
    pub skip_protected: bool,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            location_keywords: default_location_keywords(),
            skip_protected: true,
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Path to the SQLite account directory
    #[serde(rename = "database-path")]
    pub database_path: String,

    /// Path to the resume checkpoint file
    #[serde(rename = "checkpoint-path")]
    pub checkpoint_path: String,

    /// Path to the append-only JSON-lines event log
    #[serde(rename = "event-log-path")]
    pub event_log_path: String,
}

fn default_page_size() -> u32 {
    200
}

fn default_reset_margin_secs() -> u64 {
    1
}

fn default_min_wait_ms() -> u64 {
    1000
}

fn default_transport_retries() -> u32 {
    3
}

fn default_transport_retry_delay_ms() -> u64 {
    5000
}

fn default_user_agent() -> String {
    format!("geoflock/{}", env!("CARGO_PKG_VERSION"))
}

fn default_locale() -> String {
    "lang_es".to_string()
}

fn default_location_keywords() -> Vec<String> {
    vec!["peru".to_string(), "perú".to_string()]
}

fn default_true() -> bool {
    true
}
