//! Emby/Jellyfin API Data Structures

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// `/Items` response
#[derive(Debug, Deserialize)]
pub struct ItemsResponse {
    #[serde(rename = "Items")]
    pub items: Vec<Item>,
}

/// Media item information (only the fields requested with `Fields=Path,MediaSources`)
#[derive(Debug, Deserialize, Clone)]
pub struct Item {
    #[serde(rename = "Id", default)]
    pub id: Option<String>,
    #[serde(rename = "Path", default)]
    pub path: Option<String>,
    #[serde(rename = "MediaSources", default)]
    pub media_sources: Vec<MediaSource>,
}

/// One playable rendition of an item
#[derive(Debug, Deserialize, Clone, Default)]
pub struct MediaSource {
    #[serde(rename = "Id", default)]
    pub id: Option<String>,
    #[serde(rename = "Path", default)]
    pub path: Option<String>,
    #[serde(rename = "Protocol", default)]
    pub protocol: Option<String>,
    #[serde(rename = "Container", default)]
    pub container: Option<String>,
    #[serde(rename = "IsInfiniteStream", default, deserialize_with = "null_as_false")]
    pub is_infinite_stream: bool,
    #[serde(rename = "etag", alias = "ETag", default)]
    pub etag: Option<String>,
    #[serde(rename = "DirectStreamUrl", default)]
    pub direct_stream_url: Option<String>,
    #[serde(rename = "SupportsDirectPlay", default, deserialize_with = "null_as_false")]
    pub supports_direct_play: bool,
    #[serde(rename = "SupportsDirectStream", default, deserialize_with = "null_as_false")]
    pub supports_direct_stream: bool,
    #[serde(rename = "SupportsTranscoding", default, deserialize_with = "null_as_false")]
    pub supports_transcoding: bool,
}

/// `/Sync/JobItems` response
#[derive(Debug, Deserialize)]
pub struct JobItemsResponse {
    #[serde(rename = "Items")]
    pub items: Vec<JobItem>,
}

/// Sync job item
#[derive(Debug, Deserialize, Clone)]
pub struct JobItem {
    /// Emby reports job item ids as numbers, older builds as strings.
    #[serde(rename = "Id", default, deserialize_with = "string_or_number")]
    pub id: Option<String>,
    #[serde(rename = "MediaSource", default)]
    pub media_source: Option<MediaSource>,
}

fn null_as_false<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<bool>::deserialize(deserializer)?.unwrap_or(false))
}

fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}
