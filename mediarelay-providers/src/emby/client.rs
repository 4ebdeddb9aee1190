//! Emby/Jellyfin HTTP Client

use std::time::Duration;

use reqwest::{Client, header::{HeaderMap, HeaderValue, CONTENT_TYPE}};

use super::error::EmbyError;
use super::types::{ItemsResponse, JobItemsResponse};
use crate::error::read_json;

const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Emby/Jellyfin HTTP Client
#[derive(Clone)]
pub struct EmbyClient {
    host: String,
    client: Client,
}

impl EmbyClient {
    /// Create a new Emby client with default timeouts
    pub fn new(host: impl Into<String>) -> Result<Self, EmbyError> {
        Self::with_timeouts(host, DEFAULT_CONNECT_TIMEOUT, DEFAULT_TIMEOUT)
    }

    /// Create a new Emby client with explicit connect and total timeouts
    pub fn with_timeouts(
        host: impl Into<String>,
        connect_timeout: Duration,
        timeout: Duration,
    ) -> Result<Self, EmbyError> {
        let client = Client::builder()
            .connect_timeout(connect_timeout)
            .timeout(timeout)
            .pool_max_idle_per_host(10)
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| EmbyError::Client(e.to_string()))?;

        Ok(Self {
            host: host.into().trim_end_matches('/').to_string(),
            client,
        })
    }

    /// Build request headers
    fn build_headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            CONTENT_TYPE,
            HeaderValue::from_static("application/json;charset=utf-8"),
        );
        headers
    }

    /// Look up items by id, asking for their path and media sources.
    ///
    /// `GET /Items?Ids={ids}&Fields=Path,MediaSources&Limit=1&api_key={key}`
    pub async fn get_items(&self, ids: &str, api_key: &str) -> Result<ItemsResponse, EmbyError> {
        let url = format!("{}/Items", self.host);
        tracing::debug!(ids, "Looking up library item");

        let response = self
            .client
            .get(&url)
            .headers(Self::build_headers())
            .query(&[
                ("Ids", ids),
                ("Fields", "Path,MediaSources"),
                ("Limit", "1"),
                ("api_key", api_key),
            ])
            .send()
            .await?;

        Ok(read_json(response).await?)
    }

    /// List sync job items.
    ///
    /// `GET /Sync/JobItems?api_key={key}`
    pub async fn get_job_items(&self, api_key: &str) -> Result<JobItemsResponse, EmbyError> {
        let url = format!("{}/Sync/JobItems", self.host);

        let response = self
            .client
            .get(&url)
            .headers(Self::build_headers())
            .query(&[("api_key", api_key)])
            .send()
            .await?;

        Ok(read_json(response).await?)
    }

    /// Get host URL
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }
}
