//! Stream redirect pipeline
//!
//! cache lookup → library lookup → storage resolution → cache store

use http::{HeaderMap, Uri};
use mediarelay_providers::{AlistClient, EmbyClient};

use super::metadata::MetadataResolver;
use super::redirect::RedirectResolver;
use crate::cache::{cache_key, RedirectCache};
use crate::config::Config;
use crate::error::Result;
use crate::models::MediaItemReference;

/// Where a stream request should be redirected
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamResolution {
    /// Served from the redirect cache
    Cached(String),
    /// Freshly resolved and now cached
    Resolved(String),
}

impl StreamResolution {
    #[must_use]
    pub fn url(&self) -> &str {
        match self {
            Self::Cached(url) | Self::Resolved(url) => url,
        }
    }
}

/// Resolves stream requests to storage URLs, caching the result
#[derive(Clone)]
pub struct PlaybackService {
    cache: RedirectCache,
    metadata: MetadataResolver,
    resolver: RedirectResolver,
    default_api_key: String,
}

impl PlaybackService {
    /// Build the pipeline and its upstream clients from configuration.
    pub fn new(config: &Config) -> Result<Self> {
        let redirect = &config.redirect;
        let emby = EmbyClient::with_timeouts(
            &config.emby.url,
            redirect.connect_timeout(),
            redirect.upstream_timeout(),
        )?;
        let alist = AlistClient::with_timeouts(
            &config.alist.url,
            &config.alist.token,
            redirect.connect_timeout(),
            redirect.upstream_timeout(),
        )?;

        Ok(Self::with_parts(
            RedirectCache::new(redirect.cache_ttl(), redirect.cache_capacity),
            MetadataResolver::new(emby),
            RedirectResolver::new(config, alist),
            config.emby.api_key.clone(),
        ))
    }

    #[must_use]
    pub fn with_parts(
        cache: RedirectCache,
        metadata: MetadataResolver,
        resolver: RedirectResolver,
        default_api_key: impl Into<String>,
    ) -> Self {
        Self {
            cache,
            metadata,
            resolver,
            default_api_key: default_api_key.into(),
        }
    }

    #[must_use]
    pub const fn cache(&self) -> &RedirectCache {
        &self.cache
    }

    /// Resolve a classified stream request.
    ///
    /// Any error means the request should be passed through to the library.
    pub async fn resolve_stream(
        &self,
        uri: &Uri,
        video_id: &str,
        user_agent: &str,
        headers: &HeaderMap,
    ) -> Result<StreamResolution> {
        let key = cache_key(uri, user_agent);
        if let Some(url) = self.cache.get(&key) {
            tracing::info!(%url, "Serving stream redirect from cache");
            return Ok(StreamResolution::Cached(url));
        }

        let reference = MediaItemReference::from_request(uri, video_id, &self.default_api_key);
        let record = self.metadata.resolve(&reference).await?;
        tracing::info!(item_id = video_id, path = %record.storage_path, "Library path");

        let url = self
            .resolver
            .resolve(&record.storage_path, user_agent, headers)
            .await?;

        self.cache.set(key, url.clone());
        Ok(StreamResolution::Resolved(url))
    }
}
