use crate::state::Cursor;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors reported by remote collaborators
///
/// Throttling and missing accounts are distinct variants so callers never
/// have to inspect message text to tell them apart.
#[derive(Debug, Clone, Error)]
pub enum RemoteError {
    #[error("Rate limited by remote (reset at {reset_at:?})")]
    RateLimited { reset_at: Option<DateTime<Utc>> },

    #[error("Account not found: {0}")]
    NotFound(String),

    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Failed to decode response: {0}")]
    Decode(String),
}

impl RemoteError {
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Self::RateLimited { .. })
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// Connection-level failures that may succeed on a plain retry
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transport(_))
    }
}

/// Profile of a remote account as returned by the graph API
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountProfile {
    /// Empty when the remote omitted it; such profiles never match
    #[serde(rename = "screen_name", default)]
    pub identifier: String,

    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub location: Option<String>,

    #[serde(rename = "followers_count", default)]
    pub follower_count: Option<u64>,

    #[serde(default)]
    pub protected: Option<bool>,

    #[serde(default)]
    pub description: Option<String>,
}

impl AccountProfile {
    pub fn new(identifier: &str) -> Self {
        Self {
            identifier: identifier.to_string(),
            ..Self::default()
        }
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    pub fn with_location(mut self, location: &str) -> Self {
        self.location = Some(location.to_string());
        self
    }

    pub fn with_follower_count(mut self, count: u64) -> Self {
        self.follower_count = Some(count);
        self
    }

    pub fn with_protected(mut self, protected: bool) -> Self {
        self.protected = Some(protected);
        self
    }

    pub fn is_protected(&self) -> bool {
        self.protected.unwrap_or(false)
    }
}

/// One page of an account's connections
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConnectionPage {
    pub accounts: Vec<AccountProfile>,
    pub next_cursor: Cursor,
}

impl ConnectionPage {
    pub fn new(accounts: Vec<AccountProfile>, next_cursor: Cursor) -> Self {
        Self {
            accounts,
            next_cursor,
        }
    }

    /// A page with no successor
    pub fn last(accounts: Vec<AccountProfile>) -> Self {
        Self::new(accounts, Cursor::Exhausted)
    }
}

/// A single web search hit
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SearchResult {
    pub link: String,

    #[serde(default)]
    pub title: Option<String>,
}

impl SearchResult {
    /// Account identifier encoded in the result link
    pub fn identifier(&self) -> Option<String> {
        crate::remote::identifier_from_link(&self.link)
    }
}
