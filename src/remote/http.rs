//! HTTP graph client
//!
//! Talks to a Twitter v1.1 shaped REST API:
//! - `users/show.json` for a single profile
//! - `followers/list.json` for cursor-paginated connections
//! - `application/rate_limit_status.json` for quota reset times
//!
//! Status codes are classified into `RemoteError` variants here so nothing
//! downstream ever looks at message text.

use crate::config::{read_env_secret, Config, RemoteConfig};
use crate::remote::{
    AccountProfile, ConnectionPage, RemoteError, RemoteGraphClient, RemoteResult,
};
use crate::state::Cursor;
use crate::GeoflockError;
use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use reqwest::header::HeaderMap;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use url::Url;

/// Header carrying the quota reset time as epoch seconds
const RATE_LIMIT_RESET_HEADER: &str = "x-rate-limit-reset";

/// Builds an HTTP client with the configured user agent
///
/// # Example
///
/// ```no_run
/// use geoflock::remote::build_http_client;
///
/// let client = build_http_client("geoflock/0.1").unwrap();
/// ```
pub fn build_http_client(user_agent: &str) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(user_agent)
        .timeout(Duration::from_secs(30))
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Graph API client backed by reqwest
pub struct HttpGraphClient {
    client: Client,
    base_url: Url,
    token: String,
    page_size: u32,
}

impl HttpGraphClient {
    /// Creates a client for the API rooted at `config.base_url`
    ///
    /// # Arguments
    ///
    /// * `config` - Remote API configuration
    /// * `token` - Bearer token sent with every request
    /// * `page_size` - Number of connections requested per page
    pub fn new(config: &RemoteConfig, token: String, page_size: u32) -> Result<Self, GeoflockError> {
        let mut base_url = Url::parse(&config.base_url).map_err(|e| {
            crate::ConfigError::InvalidUrl(format!("Invalid remote.base_url: {}", e))
        })?;

        // Url::join drops the last segment unless the base ends with a slash
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        Ok(Self {
            client: build_http_client(&config.user_agent)?,
            base_url,
            token,
            page_size,
        })
    }

    /// Creates a client from the full configuration, reading the token from the environment
    pub fn from_config(config: &Config) -> Result<Self, GeoflockError> {
        let token = read_env_secret(&config.remote.token_env)?;
        Self::new(&config.remote, token, config.crawler.page_size)
    }

    fn endpoint(&self, path: &str) -> RemoteResult<Url> {
        self.base_url
            .join(path)
            .map_err(|e| RemoteError::Transport(format!("Invalid endpoint {}: {}", path, e)))
    }

    /// Sends an authenticated GET and decodes a JSON body
    ///
    /// `subject` names the account in NotFound errors.
    async fn get_json<T: DeserializeOwned>(&self, url: Url, subject: &str) -> RemoteResult<T> {
        tracing::trace!("GET {}", url);

        let response = self
            .client
            .get(url)
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(classify_transport_error)?;

        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(RemoteError::RateLimited {
                reset_at: parse_reset_header(response.headers()),
            });
        }

        if status == StatusCode::NOT_FOUND || status == StatusCode::GONE {
            return Err(RemoteError::NotFound(subject.to_string()));
        }

        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(RemoteError::Http {
                status: status.as_u16(),
                message,
            });
        }

        response
            .json::<T>()
            .await
            .map_err(|e| RemoteError::Decode(e.to_string()))
    }
}

#[async_trait]
impl RemoteGraphClient for HttpGraphClient {
    async fn fetch_account(&self, id: &str) -> RemoteResult<AccountProfile> {
        let mut url = self.endpoint("users/show.json")?;
        url.query_pairs_mut().append_pair("screen_name", id);
        self.get_json(url, id).await
    }

    async fn fetch_connections_page(
        &self,
        id: &str,
        cursor: Cursor,
    ) -> RemoteResult<ConnectionPage> {
        let mut url = self.endpoint("followers/list.json")?;
        url.query_pairs_mut()
            .append_pair("screen_name", id)
            .append_pair("cursor", &cursor.as_raw().to_string())
            .append_pair("count", &self.page_size.to_string())
            .append_pair("skip_status", "true");

        let payload: FollowersPayload = self.get_json(url, id).await?;
        let next_cursor = payload.next_cursor;
        Ok(ConnectionPage::new(
            payload.profiles(),
            Cursor::from_raw(next_cursor),
        ))
    }

    async fn rate_limit_reset(&self) -> RemoteResult<DateTime<Utc>> {
        let mut url = self.endpoint("application/rate_limit_status.json")?;
        url.query_pairs_mut()
            .append_pair("resources", "users,followers");

        let status: RateLimitStatus = self.get_json(url, "rate_limit_status").await?;
        status.latest_reset().ok_or_else(|| {
            RemoteError::Decode("rate limit status listed no usable windows".to_string())
        })
    }
}

/// Wire format of `followers/list.json`
///
/// Users are kept raw so one malformed entry cannot sink the whole page.
#[derive(Debug, Deserialize)]
struct FollowersPayload {
    #[serde(default)]
    users: Vec<serde_json::Value>,
    #[serde(default)]
    next_cursor: i64,
}

impl FollowersPayload {
    fn profiles(self) -> Vec<AccountProfile> {
        self.users
            .into_iter()
            .filter_map(|user| match serde_json::from_value(user) {
                Ok(profile) => Some(profile),
                Err(e) => {
                    tracing::debug!("Skipping undecodable connection: {}", e);
                    None
                }
            })
            .collect()
    }
}

/// Wire format of `application/rate_limit_status.json`
#[derive(Debug, Deserialize)]
struct RateLimitStatus {
    #[serde(default)]
    resources: HashMap<String, HashMap<String, RateLimitWindow>>,
}

#[derive(Debug, Deserialize)]
struct RateLimitWindow {
    remaining: u32,
    reset: i64,
}

impl RateLimitStatus {
    /// Reset time of the latest exhausted window, or of the latest window if none is exhausted
    fn latest_reset(&self) -> Option<DateTime<Utc>> {
        let windows: Vec<&RateLimitWindow> = self
            .resources
            .values()
            .flat_map(|endpoints| endpoints.values())
            .collect();

        let exhausted = windows
            .iter()
            .filter(|w| w.remaining == 0)
            .map(|w| w.reset)
            .max();

        exhausted
            .or_else(|| windows.iter().map(|w| w.reset).max())
            .and_then(epoch_to_utc)
    }
}

fn parse_reset_header(headers: &HeaderMap) -> Option<DateTime<Utc>> {
    headers
        .get(RATE_LIMIT_RESET_HEADER)?
        .to_str()
        .ok()?
        .trim()
        .parse::<i64>()
        .ok()
        .and_then(epoch_to_utc)
}

fn epoch_to_utc(secs: i64) -> Option<DateTime<Utc>> {
    Utc.timestamp_opt(secs, 0).single()
}

fn classify_transport_error(e: reqwest::Error) -> RemoteError {
    if e.is_timeout() {
        RemoteError::Transport("Request timeout".to_string())
    } else if e.is_connect() {
        RemoteError::Transport(format!("Connection failed: {}", e))
    } else {
        RemoteError::Transport(e.to_string())
    }
}
