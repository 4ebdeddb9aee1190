//! Request-local media models

use http::Uri;
use mediarelay_providers::emby::MediaSource;

const MEDIA_SOURCE_PREFIX: &str = "mediasource_";

/// First non-empty value of `name` in a raw query string
pub(crate) fn query_param(query: &str, name: &str) -> Option<String> {
    url::form_urlencoded::parse(query.as_bytes())
        .find(|(k, _)| k == name)
        .map(|(_, v)| v.into_owned())
        .filter(|v| !v.is_empty())
}

/// Which library endpoint describes the item
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupKind {
    /// `/Items?Ids=...`
    Item,
    /// `/Sync/JobItems`, for downloads made through a sync job
    JobItem,
}

/// Identifies which asset, and which of its media sources, a request is about
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaItemReference {
    pub item_id: String,
    pub media_source_id: Option<String>,
    pub etag: Option<String>,
    pub api_key: String,
    pub lookup: LookupKind,
}

impl MediaItemReference {
    /// Build a reference from a stream request.
    ///
    /// Recognized query parameters: `MediaSourceId` / `mediaSourceId`, `Tag`,
    /// and `X-Emby-Token` / `api_key`. Without a client token the configured
    /// library key is used.
    #[must_use]
    pub fn from_request(uri: &Uri, item_id: &str, default_api_key: &str) -> Self {
        let query = uri.query().unwrap_or_default();
        let param = |name: &str| query_param(query, name);

        let media_source_id = param("MediaSourceId").or_else(|| param("mediaSourceId"));
        let api_key = param("X-Emby-Token")
            .or_else(|| param("api_key"))
            .unwrap_or_else(|| default_api_key.to_string());
        let lookup = if uri.to_string().contains("JobItems") {
            LookupKind::JobItem
        } else {
            LookupKind::Item
        };

        Self {
            item_id: item_id.to_string(),
            media_source_id,
            etag: param("Tag"),
            api_key,
            lookup,
        }
    }

    /// Id to pass as `Ids=`: the media source id without its `mediasource_`
    /// prefix when one was given, otherwise the item id.
    #[must_use]
    pub fn lookup_id(&self) -> &str {
        match self.media_source_id.as_deref() {
            Some(id) => id.strip_prefix(MEDIA_SOURCE_PREFIX).unwrap_or(id),
            None => &self.item_id,
        }
    }

    /// Whether `id` names the requested media source, with or without prefix
    #[must_use]
    pub fn matches_media_source(&self, id: &str) -> bool {
        self.media_source_id
            .as_deref()
            .is_some_and(|wanted| wanted == id || wanted.strip_prefix(MEDIA_SOURCE_PREFIX) == Some(id))
    }
}

/// One playable rendition, normalized from the library's media source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaSourceRecord {
    pub protocol: Option<String>,
    pub storage_path: String,
    pub direct_stream_url: Option<String>,
    pub container: Option<String>,
    pub is_infinite_stream: bool,
    pub supports_direct_play: bool,
    pub supports_direct_stream: bool,
    pub supports_transcoding: bool,
}

impl MediaSourceRecord {
    /// Record for `source`, falling back to the owning item's path.
    /// `None` when neither has a path.
    #[must_use]
    pub fn from_source(source: &MediaSource, item_path: Option<&str>) -> Option<Self> {
        let storage_path = source
            .path
            .as_deref()
            .or(item_path)
            .filter(|p| !p.is_empty())?
            .to_string();

        Some(Self {
            protocol: source.protocol.clone(),
            storage_path,
            direct_stream_url: source.direct_stream_url.clone(),
            container: source.container.clone(),
            is_infinite_stream: source.is_infinite_stream,
            supports_direct_play: source.supports_direct_play,
            supports_direct_stream: source.supports_direct_stream,
            supports_transcoding: source.supports_transcoding,
        })
    }

    /// Record for an item that reports no media sources
    #[must_use]
    pub fn from_item_path(path: &str) -> Self {
        Self {
            protocol: Some("File".to_string()),
            storage_path: path.to_string(),
            direct_stream_url: None,
            container: None,
            is_infinite_stream: false,
            supports_direct_play: false,
            supports_direct_stream: false,
            supports_transcoding: false,
        }
    }
}
