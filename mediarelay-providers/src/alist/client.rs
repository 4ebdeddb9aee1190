//! Alist HTTP Client
//!
//! Pure HTTP client for the Alist storage backend.

use std::time::Duration;

use reqwest::{Client, StatusCode, header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE, LOCATION}};
use serde_json::json;

use super::error::AlistError;
use super::types::{AlistResp, HttpFsGetResp};
use crate::error::read_json;

const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Request headers never copied onto the redirect probe: the client's own
/// host, body framing and credentials, plus connection-scoped headers.
const SKIPPED_FORWARD_HEADERS: &[&str] = &[
    "host",
    "content-length",
    "authorization",
    "connection",
    "keep-alive",
    "proxy-authorization",
    "proxy-connection",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
];

/// Alist HTTP Client
///
/// Redirects are never followed: the download route's `Location` header is
/// the value callers are after.
#[derive(Clone)]
pub struct AlistClient {
    host: String,
    token: Option<String>,
    client: Client,
}

impl AlistClient {
    /// Create a new Alist client with token
    pub fn with_token(host: impl Into<String>, token: impl Into<String>) -> Result<Self, AlistError> {
        Self::build(host.into(), token.into(), DEFAULT_CONNECT_TIMEOUT, DEFAULT_TIMEOUT)
    }

    /// Create a new Alist client with token and explicit timeouts
    pub fn with_timeouts(
        host: impl Into<String>,
        token: impl Into<String>,
        connect_timeout: Duration,
        timeout: Duration,
    ) -> Result<Self, AlistError> {
        Self::build(host.into(), token.into(), connect_timeout, timeout)
    }

    fn build(
        host: String,
        token: String,
        connect_timeout: Duration,
        timeout: Duration,
    ) -> Result<Self, AlistError> {
        let client = Client::builder()
            .connect_timeout(connect_timeout)
            .timeout(timeout)
            .pool_max_idle_per_host(10)
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| AlistError::Client(e.to_string()))?;

        Ok(Self {
            host: host.trim_end_matches('/').to_string(),
            token: Some(token).filter(|t| !t.is_empty()),
            client,
        })
    }

    /// Get current host
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    fn authorization(&self) -> Result<Option<HeaderValue>, AlistError> {
        self.token
            .as_deref()
            .map(HeaderValue::from_str)
            .transpose()
            .map_err(Into::into)
    }

    /// Issue a non-following GET to a signed download URL and return where
    /// Alist redirects to.
    ///
    /// `forwarded` carries the original client request headers; the token is
    /// sent as `Authorization`.
    pub async fn redirect_location(
        &self,
        download_url: &str,
        forwarded: &HeaderMap,
    ) -> Result<String, AlistError> {
        let mut headers = HeaderMap::new();
        for (name, value) in forwarded {
            if SKIPPED_FORWARD_HEADERS.contains(&name.as_str()) {
                continue;
            }
            headers.append(name.clone(), value.clone());
        }
        if let Some(auth) = self.authorization()? {
            headers.insert(AUTHORIZATION, auth);
        }

        let response = self.client.get(download_url).headers(headers).send().await?;
        let status = response.status();
        tracing::debug!(url = download_url, %status, "Storage redirect probe");

        if !matches!(
            status,
            StatusCode::MOVED_PERMANENTLY
                | StatusCode::FOUND
                | StatusCode::SEE_OTHER
                | StatusCode::TEMPORARY_REDIRECT
                | StatusCode::PERMANENT_REDIRECT
        ) {
            return Err(AlistError::UnexpectedStatus {
                status,
                url: download_url.to_string(),
            });
        }

        let location = response
            .headers()
            .get(LOCATION)
            .and_then(|v| v.to_str().ok())
            .filter(|v| !v.is_empty())
            .ok_or_else(|| AlistError::MissingLocation { url: download_url.to_string() })?;

        // Relative locations are resolved against the probed URL
        let resolved = response
            .url()
            .join(location)
            .map_err(|_| AlistError::MissingLocation { url: download_url.to_string() })?;

        Ok(resolved.to_string())
    }

    /// Get file information, including the provider's `raw_url`
    ///
    /// # Arguments
    /// * `path` - File path relative to the Alist root
    /// * `password` - Optional password for protected directories
    pub async fn fs_get(&self, path: &str, password: Option<&str>) -> Result<HttpFsGetResp, AlistError> {
        let url = format!("{}/api/fs/get", self.host);
        let body = json!({
            "path": path,
            "password": password.unwrap_or(""),
        });

        let mut request = self
            .client
            .post(&url)
            .header(CONTENT_TYPE, "application/json;charset=utf-8")
            .json(&body);
        if let Some(auth) = self.authorization()? {
            request = request.header(AUTHORIZATION, auth);
        }

        let resp: AlistResp<HttpFsGetResp> = read_json(request.send().await?).await?;

        if resp.code != 200 {
            return Err(AlistError::Api {
                code: resp.code,
                message: resp.message,
            });
        }

        resp.data.ok_or_else(|| AlistError::MissingData("data in fs_get response".to_string()))
    }
}
