//! Media library lookups
//!
//! Turns a [`MediaItemReference`] into the storage path of the rendition the
//! client asked for.

use mediarelay_providers::emby::{EmbyClient, MediaSource};
use percent_encoding::percent_decode_str;

use crate::error::{Error, Result};
use crate::models::{LookupKind, MediaItemReference, MediaSourceRecord};

const STRM_EXTENSION: &str = ".strm";

/// Resolves item references against the library API
#[derive(Clone)]
pub struct MetadataResolver {
    emby: EmbyClient,
}

impl MetadataResolver {
    #[must_use]
    pub const fn new(emby: EmbyClient) -> Self {
        Self { emby }
    }

    /// Look up the media source `reference` points at.
    ///
    /// Network failures, error statuses, malformed JSON and empty results
    /// surface as distinct errors.
    pub async fn resolve(&self, reference: &MediaItemReference) -> Result<MediaSourceRecord> {
        let mut record = match reference.lookup {
            LookupKind::Item => self.resolve_item(reference).await?,
            LookupKind::JobItem => self.resolve_job_item(reference).await?,
        };

        record.storage_path = decode_strm_path(&record.storage_path);
        tracing::debug!(
            item_id = %reference.item_id,
            path = %record.storage_path,
            "Resolved media source"
        );
        Ok(record)
    }

    async fn resolve_item(&self, reference: &MediaItemReference) -> Result<MediaSourceRecord> {
        let ids = reference.lookup_id();
        let response = self.emby.get_items(ids, &reference.api_key).await?;
        let item = response
            .items
            .into_iter()
            .next()
            .ok_or_else(|| Error::NotFound(format!("item {ids}")))?;

        if item.media_sources.is_empty() {
            return item
                .path
                .as_deref()
                .filter(|p| !p.is_empty())
                .map(MediaSourceRecord::from_item_path)
                .ok_or_else(|| Error::NotFound(format!("path of item {ids}")));
        }

        let source = select_media_source(&item.media_sources, reference)
            .ok_or_else(|| Error::NotFound(format!("media source of item {ids}")))?;
        MediaSourceRecord::from_source(source, item.path.as_deref())
            .ok_or_else(|| Error::NotFound(format!("path of item {ids}")))
    }

    async fn resolve_job_item(&self, reference: &MediaItemReference) -> Result<MediaSourceRecord> {
        let response = self.emby.get_job_items(&reference.api_key).await?;
        let source = response
            .items
            .iter()
            .filter(|job| job.id.as_deref() == Some(reference.item_id.as_str()))
            .find_map(|job| job.media_source.as_ref())
            .ok_or_else(|| Error::NotFound(format!("job item {}", reference.item_id)))?;

        MediaSourceRecord::from_source(source, None)
            .ok_or_else(|| Error::NotFound(format!("path of job item {}", reference.item_id)))
    }
}

/// Pick the source matching the request's etag, then its media source id,
/// then the first one.
#[must_use]
pub fn select_media_source<'a>(
    sources: &'a [MediaSource],
    reference: &MediaItemReference,
) -> Option<&'a MediaSource> {
    let by_etag = reference.etag.as_deref().and_then(|etag| {
        sources
            .iter()
            .find(|source| source.etag.as_deref() == Some(etag))
    });
    let by_id = || {
        sources.iter().find(|source| {
            source
                .id
                .as_deref()
                .is_some_and(|id| reference.matches_media_source(id))
        })
    };

    by_etag.or_else(by_id).or_else(|| sources.first())
}

/// `.strm` paths come form-encoded; decoding failures keep the raw path.
#[must_use]
pub fn decode_strm_path(path: &str) -> String {
    if !path.ends_with(STRM_EXTENSION) {
        return path.to_string();
    }

    let plus_decoded = path.replace('+', " ");
    match percent_decode_str(&plus_decoded).decode_utf8() {
        Ok(decoded) => decoded.into_owned(),
        Err(e) => {
            tracing::warn!(path, error = %e, "Failed to decode strm path, using it as is");
            path.to_string()
        }
    }
}
