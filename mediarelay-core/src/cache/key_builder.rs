//! Redirect cache key construction
//!
//! Seeks and range requests against one stream differ only in their query
//! string, so the key is the bare request path plus the lower-cased client
//! identifier. Different clients may resolve to different URLs (public vs
//! internal), hence the identifier.

use http::Uri;

/// Build the cache key for a stream request.
#[must_use]
pub fn cache_key(uri: &Uri, user_agent: &str) -> String {
    format!("{}{}", uri.path(), user_agent.to_lowercase())
}
