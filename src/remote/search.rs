//! Web search client used to derive a seed account from a free-text query
//!
//! Speaks the custom-search JSON API (`?key=&cx=&q=&lr=`) and reads `items[].link`.

use crate::config::{read_env_secret, SearchConfig};
use crate::remote::{build_http_client, RemoteError, RemoteResult, SearchClient, SearchResult};
use crate::GeoflockError;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use url::Url;

/// Search API client backed by reqwest
pub struct HttpSearchClient {
    client: Client,
    base_url: Url,
    key: String,
    engine_id: String,
}

impl HttpSearchClient {
    pub fn new(
        config: &SearchConfig,
        key: String,
        user_agent: &str,
    ) -> Result<Self, GeoflockError> {
        let base_url = Url::parse(&config.base_url).map_err(|e| {
            crate::ConfigError::InvalidUrl(format!("Invalid search.base_url: {}", e))
        })?;

        Ok(Self {
            client: build_http_client(user_agent)?,
            base_url,
            key,
            engine_id: config.engine_id.clone(),
        })
    }

    /// Creates a client reading the API key from the environment variable named in the config
    pub fn from_config(config: &SearchConfig, user_agent: &str) -> Result<Self, GeoflockError> {
        let key = read_env_secret(&config.key_env)?;
        Self::new(config, key, user_agent)
    }
}

#[async_trait]
impl SearchClient for HttpSearchClient {
    async fn search(&self, query: &str, locale: &str) -> RemoteResult<Vec<SearchResult>> {
        let mut url = self.base_url.clone();
        url.query_pairs_mut()
            .append_pair("key", &self.key)
            .append_pair("cx", &self.engine_id)
            .append_pair("q", query)
            .append_pair("lr", locale);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| RemoteError::Transport(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(RemoteError::RateLimited { reset_at: None });
        }
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(RemoteError::Http {
                status: status.as_u16(),
                message,
            });
        }

        let payload: SearchPayload = response
            .json()
            .await
            .map_err(|e| RemoteError::Decode(e.to_string()))?;

        tracing::debug!(
            "Search '{}' ({}) returned {} results",
            query,
            locale,
            payload.items.len()
        );
        Ok(payload.items)
    }
}

/// Wire format of a search response; `items` is absent when nothing matched
#[derive(Debug, Deserialize)]
struct SearchPayload {
    #[serde(default)]
    items: Vec<SearchResult>,
}

/// Extracts the account identifier from a profile link
///
/// The identifier is the first path segment, so
/// `https://twitter.com/alice/status/1` yields `alice`.
/// Returns None for links without a path segment or that fail to parse.
pub fn identifier_from_link(link: &str) -> Option<String> {
    let url = Url::parse(link).ok()?;
    let segment = url.path_segments()?.find(|s| !s.is_empty())?;
    let identifier = segment.trim_start_matches('@');
    (!identifier.is_empty()).then(|| identifier.to_string())
}
