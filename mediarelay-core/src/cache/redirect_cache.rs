//! Resolved redirect cache (Moka in-memory)
//!
//! Maps a request fingerprint (see [`cache_key`](super::cache_key)) to the
//! URL the client was last redirected to. Entries expire after a fixed TTL
//! and are never invalidated explicitly.

use std::time::Duration;

/// Redirect cache shared by all in-flight requests
#[derive(Clone)]
pub struct RedirectCache {
    inner: moka::sync::Cache<String, String>,
}

impl RedirectCache {
    /// Create a new `RedirectCache`
    ///
    /// # Arguments
    /// * `ttl` - How long a resolved URL is reused
    /// * `max_capacity` - Maximum number of entries kept
    #[must_use]
    pub fn new(ttl: Duration, max_capacity: u64) -> Self {
        let inner = moka::sync::Cache::builder()
            .max_capacity(max_capacity)
            .time_to_live(ttl)
            .build();

        Self { inner }
    }

    /// Cached URL for `key`, if still within its TTL
    #[must_use]
    pub fn get(&self, key: &str) -> Option<String> {
        let hit = self.inner.get(key);
        tracing::debug!(key, hit = hit.is_some(), "Redirect cache lookup");
        hit
    }

    pub fn set(&self, key: impl Into<String>, url: impl Into<String>) {
        self.inner.insert(key.into(), url.into());
    }
}
