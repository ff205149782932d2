//! Remote collaborators: the social graph API and the web search API
//!
//! Both are exposed as `async_trait` traits so the crawl engine can be driven
//! by the HTTP implementations in production and by scripted fakes in tests.

mod http;
mod search;
mod types;

pub use http::{build_http_client, HttpGraphClient};
pub use search::{identifier_from_link, HttpSearchClient};
pub use types::{AccountProfile, ConnectionPage, RemoteError, SearchResult};

use crate::state::Cursor;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Result type for remote operations
pub type RemoteResult<T> = Result<T, RemoteError>;

/// Access to account profiles and their connection pages
#[async_trait]
pub trait RemoteGraphClient: Send + Sync {
    /// Fetches a single account's profile
    async fn fetch_account(&self, id: &str) -> RemoteResult<AccountProfile>;

    /// Fetches one page of an account's connections starting at `cursor`
    async fn fetch_connections_page(&self, id: &str, cursor: Cursor)
        -> RemoteResult<ConnectionPage>;

    /// Asks the remote when its request quota replenishes
    async fn rate_limit_reset(&self) -> RemoteResult<DateTime<Utc>>;
}

/// Web search used to derive a seed account from a query
#[async_trait]
pub trait SearchClient: Send + Sync {
    /// Runs a query restricted to `locale`, returning results in rank order
    async fn search(&self, query: &str, locale: &str) -> RemoteResult<Vec<SearchResult>>;
}
