//! PlaybackInfo response rewriting
//!
//! Media sources whose `Path` lies under the mount path are steered to a
//! proxy-owned `/Videos/{id}/stream.{container}` URL so the client requests
//! the stream from us, where it can be redirected to storage. Every other
//! entry, and every field we do not touch, is left exactly as the library
//! server sent it.

use serde_json::{Map, Value};
use thiserror::Error;

use super::classifier::playback_info_pattern;

const REMOVED_FIELDS: &[&str] = &["TranscodingUrl", "TranscodingSubProtocol", "TranscodingContainer"];

/// Why a body was forwarded unmodified
#[derive(Debug, Error)]
pub enum RewriteError {
    #[error("Request path is not a PlaybackInfo path: {0}")]
    NotPlaybackInfoPath(String),

    #[error("Body is not JSON: {0}")]
    NotJson(#[from] serde_json::Error),

    #[error("Body is not a JSON object")]
    NotAnObject,

    #[error("Body has no MediaSources array")]
    MissingMediaSources,

    #[error("Body has no PlaySessionId")]
    MissingPlaySessionId,
}

/// Rewrites PlaybackInfo bodies for sources under `mount_path`
#[derive(Debug, Clone)]
pub struct PlaybackInfoRewriter {
    mount_path: String,
}

impl PlaybackInfoRewriter {
    #[must_use]
    pub fn new(mount_path: impl Into<String>) -> Self {
        Self {
            mount_path: mount_path.into(),
        }
    }

    /// Whether a library path is served from storage
    #[must_use]
    pub fn is_eligible(&self, path: &str) -> bool {
        path.starts_with(&self.mount_path)
    }

    /// Rewrite a buffered PlaybackInfo body.
    ///
    /// `request_path` is the path of the intercepted request (no query). On
    /// error the caller forwards the original body.
    pub fn rewrite(&self, request_path: &str, body: &[u8]) -> Result<Vec<u8>, RewriteError> {
        let captures = playback_info_pattern()
            .captures(request_path)
            .ok_or_else(|| RewriteError::NotPlaybackInfoPath(request_path.to_string()))?;
        let (Some(whole), Some(item_id)) = (captures.get(0), captures.get(1)) else {
            return Err(RewriteError::NotPlaybackInfoPath(request_path.to_string()));
        };
        let prefix = &request_path[..whole.start()];

        let mut response: Value = serde_json::from_slice(body)?;
        let object = response.as_object_mut().ok_or(RewriteError::NotAnObject)?;

        let play_session_id = object
            .get("PlaySessionId")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(str::to_string);

        let sources = object
            .get_mut("MediaSources")
            .and_then(Value::as_array_mut)
            .ok_or(RewriteError::MissingMediaSources)?;

        let mut rewritten = 0usize;
        for entry in sources.iter_mut() {
            let Some(fields) = entry.as_object_mut() else {
                continue;
            };
            let Some(source) = SourceFields::read(fields) else {
                continue;
            };
            if !self.is_eligible(&source.path) {
                tracing::debug!(path = %source.path, "Skipping media source outside mount path");
                continue;
            }
            let Some(play_session_id) = play_session_id.as_deref() else {
                return Err(RewriteError::MissingPlaySessionId);
            };

            let url = stream_url(prefix, item_id.as_str(), &source, play_session_id);
            steer_to_stream(fields, url);
            rewritten += 1;
        }

        object.insert("302".to_string(), Value::String("true".to_string()));
        tracing::debug!(path = request_path, rewritten, "Rewrote PlaybackInfo");

        Ok(serde_json::to_vec(&response)?)
    }
}

/// The handful of media source fields the rewrite reads. Anything else in the
/// entry, including values of unexpected types, is never looked at.
struct SourceFields {
    path: String,
    id: String,
    container: String,
    is_infinite_stream: bool,
}

impl SourceFields {
    /// `None` unless the entry has a non-empty `Path` and `Id`
    fn read(fields: &Map<String, Value>) -> Option<Self> {
        let path = fields.get("Path").and_then(Value::as_str).filter(|p| !p.is_empty())?;
        let id = match fields.get("Id") {
            Some(Value::String(id)) if !id.is_empty() => id.clone(),
            Some(Value::Number(id)) => id.to_string(),
            _ => return None,
        };

        Some(Self {
            path: path.to_string(),
            id,
            container: fields
                .get("Container")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            is_infinite_stream: fields
                .get("IsInfiniteStream")
                .and_then(Value::as_bool)
                .unwrap_or(false),
        })
    }
}

fn steer_to_stream(fields: &mut Map<String, Value>, url: String) {
    let original = fields.get("DirectStreamUrl").cloned().unwrap_or(Value::Null);
    fields.insert("XOriginDirectStreamUrl".to_string(), original);
    fields.insert("SupportsDirectPlay".to_string(), Value::Bool(true));
    fields.insert("SupportsTranscoding".to_string(), Value::Bool(false));
    fields.insert("SupportsDirectStream".to_string(), Value::Bool(true));
    for name in REMOVED_FIELDS {
        fields.remove(*name);
    }
    fields.insert("DirectStreamUrl".to_string(), Value::String(url));
}

/// `{prefix}/Videos/{id}/{segment}.{ext}?MediaSourceId=..&PlaySessionId=..&Static=true`
fn stream_url(prefix: &str, item_id: &str, source: &SourceFields, play_session_id: &str) -> String {
    let container = source.container.as_str();
    let segment = if source.is_infinite_stream { "master" } else { "stream" };
    let extension = if source.is_infinite_stream && (container.is_empty() || container == "hls") {
        "m3u8"
    } else {
        container
    };

    let file = if extension.is_empty() {
        segment.to_string()
    } else {
        format!("{segment}.{extension}")
    };
    let query = url::form_urlencoded::Serializer::new(String::new())
        .append_pair("MediaSourceId", &source.id)
        .append_pair("PlaySessionId", play_session_id)
        .append_pair("Static", "true")
        .finish();

    format!("{prefix}/Videos/{item_id}/{file}?{query}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn rewriter() -> PlaybackInfoRewriter {
        PlaybackInfoRewriter::new("/mnt/cloud")
    }

    fn rewrite_json(path: &str, body: &Value) -> Value {
        let out = rewriter().rewrite(path, &serde_json::to_vec(body).unwrap()).unwrap();
        serde_json::from_slice(&out).unwrap()
    }

    #[test]
    fn test_eligible_source_is_steered_to_stream() {
        let body = json!({
            "PlaySessionId": "sess1",
            "MediaSources": [{
                "Id": "ms1",
                "Path": "/mnt/cloud/movie.mkv",
                "Container": "mkv",
                "IsInfiniteStream": false,
                "DirectStreamUrl": "/Videos/42/original.mkv?api_key=k",
                "SupportsDirectPlay": false,
                "SupportsTranscoding": true,
                "SupportsDirectStream": false,
                "TranscodingUrl": "/videos/42/master.m3u8",
                "TranscodingSubProtocol": "hls",
                "TranscodingContainer": "ts"
            }]
        });

        let out = rewrite_json("/Items/42/PlaybackInfo", &body);
        let source = &out["MediaSources"][0];

        assert_eq!(
            source["DirectStreamUrl"],
            "/Videos/42/stream.mkv?MediaSourceId=ms1&PlaySessionId=sess1&Static=true"
        );
        assert_eq!(source["XOriginDirectStreamUrl"], "/Videos/42/original.mkv?api_key=k");
        assert_eq!(source["SupportsDirectPlay"], true);
        assert_eq!(source["SupportsTranscoding"], false);
        assert_eq!(source["SupportsDirectStream"], true);
        for field in REMOVED_FIELDS {
            assert!(source.get(*field).is_none(), "{field} should be removed");
        }
        assert_eq!(out["302"], "true");
    }

    #[test]
    fn test_ineligible_source_is_untouched() {
        let untouched = json!({
            "Id": "ms2",
            "Path": "/data/local/movie.mkv",
            "Container": "mkv",
            "SupportsTranscoding": true,
            "TranscodingUrl": "/videos/42/master.m3u8",
            "Custom": {"nested": [1, 2, 3]}
        });
        let body = json!({
            "PlaySessionId": "sess1",
            "MediaSources": [
                untouched.clone(),
                {"Id": "ms1", "Path": "/mnt/cloud/a.mp4", "Container": "mp4"}
            ]
        });

        let out = rewrite_json("/Items/42/PlaybackInfo", &body);
        assert_eq!(out["MediaSources"][0], untouched);
        assert_eq!(out["MediaSources"][1]["SupportsDirectPlay"], true);
    }

    #[test]
    fn test_loosely_typed_entry_is_still_steered() {
        let body = json!({
            "PlaySessionId": "s",
            "MediaSources": [{
                "Id": 7,
                "Path": "/mnt/cloud/a.mkv",
                "Container": "mkv",
                "IsInfiniteStream": null,
                "SupportsDirectPlay": null,
                "SupportsTranscoding": true,
                "TranscodingUrl": "/t"
            }]
        });

        let out = rewrite_json("/Items/42/PlaybackInfo", &body);
        let source = &out["MediaSources"][0];
        assert_eq!(
            source["DirectStreamUrl"],
            "/Videos/42/stream.mkv?MediaSourceId=7&PlaySessionId=s&Static=true"
        );
        assert_eq!(source["SupportsTranscoding"], false);
        assert_eq!(source["SupportsDirectPlay"], true);
        assert!(source.get("TranscodingUrl").is_none());
    }

    #[test]
    fn test_infinite_stream_uses_master_playlist() {
        let body = json!({
            "PlaySessionId": "s",
            "MediaSources": [
                {"Id": "a", "Path": "/mnt/cloud/live", "IsInfiniteStream": true, "Container": "hls"},
                {"Id": "b", "Path": "/mnt/cloud/live2", "IsInfiniteStream": true},
                {"Id": "c", "Path": "/mnt/cloud/live3", "IsInfiniteStream": true, "Container": "ts"}
            ]
        });

        let out = rewrite_json("/emby/Items/7/PlaybackInfo", &body);
        let url = |i: usize| out["MediaSources"][i]["DirectStreamUrl"].as_str().unwrap().to_string();
        assert!(url(0).starts_with("/emby/Videos/7/master.m3u8?"));
        assert!(url(1).starts_with("/emby/Videos/7/master.m3u8?"));
        assert!(url(2).starts_with("/emby/Videos/7/master.ts?"));
    }

    #[test]
    fn test_missing_container_has_no_extension() {
        let body = json!({
            "PlaySessionId": "s",
            "MediaSources": [{"Id": "a", "Path": "/mnt/cloud/file"}]
        });
        let out = rewrite_json("/Items/7/PlaybackInfo", &body);
        assert_eq!(
            out["MediaSources"][0]["DirectStreamUrl"],
            "/Videos/7/stream?MediaSourceId=a&PlaySessionId=s&Static=true"
        );
    }

    #[test]
    fn test_lowercase_request_path() {
        let body = json!({
            "PlaySessionId": "s",
            "MediaSources": [{"Id": "a", "Path": "/mnt/cloud/a.mp4", "Container": "mp4"}]
        });
        let out = rewrite_json("/items/7/playbackinfo", &body);
        assert_eq!(
            out["MediaSources"][0]["DirectStreamUrl"],
            "/Videos/7/stream.mp4?MediaSourceId=a&PlaySessionId=s&Static=true"
        );
    }

    #[test]
    fn test_malformed_bodies_are_rejected() {
        let rewriter = rewriter();
        let path = "/Items/1/PlaybackInfo";

        assert!(matches!(rewriter.rewrite(path, b"<html>"), Err(RewriteError::NotJson(_))));
        assert!(matches!(rewriter.rewrite(path, b"[1, 2]"), Err(RewriteError::NotAnObject)));
        assert!(matches!(
            rewriter.rewrite(path, br#"{"PlaySessionId": "s"}"#),
            Err(RewriteError::MissingMediaSources)
        ));
        assert!(matches!(
            rewriter.rewrite(path, br#"{"MediaSources": [{"Id": "a", "Path": "/mnt/cloud/a.mkv"}]}"#),
            Err(RewriteError::MissingPlaySessionId)
        ));
        assert!(matches!(
            rewriter.rewrite("/Items/1/Images", b"{}"),
            Err(RewriteError::NotPlaybackInfoPath(_))
        ));
    }

    #[test]
    fn test_no_eligible_sources_only_adds_marker() {
        let body = json!({
            "MediaSources": [{"Id": "a", "Path": "/data/a.mkv"}]
        });
        let out = rewrite_json("/Items/1/PlaybackInfo", &body);
        assert_eq!(out["MediaSources"], body["MediaSources"]);
        assert_eq!(out["302"], "true");
    }
}
