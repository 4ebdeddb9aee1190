//! Passthrough forwarding to the media library server
//!
//! Everything the relay does not handle itself is replayed against the
//! library server: same method, path, query, headers and body, with the
//! response streamed back untouched. Upstream redirects are returned to the
//! client rather than followed.

use std::time::Duration;

use axum::{
    body::{Body, HttpBody},
    http::{HeaderMap, HeaderName, Request, StatusCode, Uri},
    response::{IntoResponse, Response},
};
use bytes::{Bytes, BytesMut};
use futures::TryStreamExt;
use thiserror::Error;

/// Largest body [`Forwarder::fetch_buffered`] reads into memory (16 MiB)
pub const MAX_BUFFERED_BODY: usize = 16 * 1024 * 1024;

/// Headers that describe a single connection and are never forwarded.
const HOP_BY_HOP_HEADERS: &[&str] = &[
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "proxy-connection",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
];

#[derive(Debug, Error)]
pub enum ForwardError {
    #[error("Invalid upstream URL: {0}")]
    InvalidUrl(String),

    #[error("Failed to build HTTP client: {0}")]
    Client(String),

    #[error("Upstream request failed: {0}")]
    Upstream(#[from] reqwest::Error),

    #[error("Upstream body of {size} bytes exceeds {MAX_BUFFERED_BODY} bytes")]
    BodyTooLarge { size: u64 },
}

/// Whether a header is connection-scoped
#[must_use]
pub fn is_hop_by_hop(name: &HeaderName) -> bool {
    HOP_BY_HOP_HEADERS.contains(&name.as_str())
}

/// Copy `headers` without hop-by-hop headers or any name in `skip`
#[must_use]
pub fn forwardable_headers(headers: &HeaderMap, skip: &[&str]) -> HeaderMap {
    let mut out = HeaderMap::with_capacity(headers.len());
    for (name, value) in headers {
        if is_hop_by_hop(name) || skip.contains(&name.as_str()) {
            continue;
        }
        out.append(name.clone(), value.clone());
    }
    out
}

/// A fully read upstream response
#[derive(Debug)]
pub struct BufferedResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl IntoResponse for BufferedResponse {
    fn into_response(self) -> Response {
        let mut response = Response::new(Body::from(self.body));
        *response.status_mut() = self.status;
        *response.headers_mut() = forwardable_headers(&self.headers, &[]);
        response
    }
}

/// Reverse proxy to a single upstream base URL
#[derive(Clone)]
pub struct Forwarder {
    base: String,
    client: reqwest::Client,
}

impl Forwarder {
    /// Only the connect phase is bounded; streams may run for hours.
    pub fn new(base: &str, connect_timeout: Duration) -> Result<Self, ForwardError> {
        let parsed = url::Url::parse(base).map_err(|e| ForwardError::InvalidUrl(format!("{base}: {e}")))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ForwardError::InvalidUrl(base.to_string()));
        }

        let client = reqwest::Client::builder()
            .connect_timeout(connect_timeout)
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| ForwardError::Client(e.to_string()))?;

        Ok(Self {
            base: base.trim_end_matches('/').to_string(),
            client,
        })
    }

    /// Upstream URL for an inbound request URI (path and query preserved)
    pub fn upstream_url(&self, uri: &Uri) -> Result<url::Url, ForwardError> {
        let path_and_query = uri.path_and_query().map_or("/", |pq| pq.as_str());
        let target = format!("{}{}", self.base, path_and_query);
        url::Url::parse(&target).map_err(|e| ForwardError::InvalidUrl(format!("{target}: {e}")))
    }

    fn build_request(&self, request: Request<Body>, skip: &[&str]) -> Result<reqwest::RequestBuilder, ForwardError> {
        let (parts, body) = request.into_parts();
        let url = self.upstream_url(&parts.uri)?;

        let mut skipped = vec!["host"];
        skipped.extend_from_slice(skip);
        let headers = forwardable_headers(&parts.headers, &skipped);

        let builder = self.client.request(parts.method, url).headers(headers);
        // Empty bodies stay empty instead of going out chunked
        if body.is_end_stream() {
            return Ok(builder);
        }
        Ok(builder.body(reqwest::Body::wrap_stream(body.into_data_stream())))
    }

    /// Forward a request and stream the upstream response back.
    ///
    /// Never fails: an unreachable upstream becomes `502 Bad Gateway`.
    pub async fn forward(&self, request: Request<Body>) -> Response {
        let method = request.method().clone();
        let path = request.uri().path().to_string();

        let upstream = match self.build_request(request, &[]) {
            Ok(builder) => builder.send().await.map_err(ForwardError::from),
            Err(e) => Err(e),
        };

        match upstream {
            Ok(upstream) => {
                tracing::debug!(%method, %path, status = %upstream.status(), "Forwarded request");
                stream_response(upstream)
            }
            Err(e) => {
                tracing::error!(%method, %path, error = %e, "Failed to forward request");
                (StatusCode::BAD_GATEWAY, "Bad Gateway").into_response()
            }
        }
    }

    /// Forward a request and read the whole response body.
    ///
    /// `Accept-Encoding` is dropped so the body arrives uncompressed. Bodies
    /// over [`MAX_BUFFERED_BODY`] are rejected, by declared length up front
    /// and by bytes read otherwise.
    pub async fn fetch_buffered(&self, request: Request<Body>) -> Result<BufferedResponse, ForwardError> {
        let mut upstream = self
            .build_request(request, &["accept-encoding"])?
            .send()
            .await?;

        let status = upstream.status();
        let headers = upstream.headers().clone();
        if let Some(size) = upstream.content_length().filter(|len| *len > MAX_BUFFERED_BODY as u64) {
            return Err(ForwardError::BodyTooLarge { size });
        }

        let mut body = BytesMut::new();
        while let Some(chunk) = upstream.chunk().await? {
            let size = body.len() + chunk.len();
            if size > MAX_BUFFERED_BODY {
                return Err(ForwardError::BodyTooLarge { size: size as u64 });
            }
            body.extend_from_slice(&chunk);
        }

        Ok(BufferedResponse {
            status,
            headers,
            body: body.freeze(),
        })
    }
}

fn stream_response(upstream: reqwest::Response) -> Response {
    let status = upstream.status();
    let headers = forwardable_headers(upstream.headers(), &[]);
    let url = upstream.url().clone();

    let stream = upstream
        .bytes_stream()
        .inspect_err(move |e| tracing::warn!(%url, error = %e, "Upstream body stream ended with error"));

    let mut response = Response::new(Body::from_stream(stream));
    *response.status_mut() = status;
    *response.headers_mut() = headers;
    response
}
