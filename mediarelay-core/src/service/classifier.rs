//! Request classification
//!
//! Decides, from the request path and query alone, whether a request is a
//! PlaybackInfo call to intercept, a stream to redirect, or anything else.
//! Classification cannot fail: no match is the `Passthrough` disposition.

use std::sync::LazyLock;

use http::Uri;
use regex::Regex;

use crate::models::media::query_param;

/// What to do with an inbound request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Disposition {
    /// `/Items/{id}/PlaybackInfo`
    PlaybackInfo { item_id: String },
    /// `/Videos/{id}/(stream|original|master)` with a media source id
    Stream { video_id: String, media_source_id: String },
    /// Forward untouched
    Passthrough,
}

#[derive(Debug, Clone, Copy)]
enum RouteKind {
    PlaybackInfo,
    Stream,
}

struct Route {
    kind: RouteKind,
    pattern: Regex,
}

/// Ordered route table, first match wins.
static ROUTES: LazyLock<Vec<Route>> = LazyLock::new(|| {
    [
        (RouteKind::PlaybackInfo, r"(?i)/Items/([^/]+)/PlaybackInfo/?$"),
        (RouteKind::Stream, r"(?i)/Videos/([^/]+)/(?:stream|original|master)(?:\.[^/]*)?$"),
    ]
    .into_iter()
    .map(|(kind, pattern)| Route {
        kind,
        pattern: Regex::new(pattern).expect("route patterns are valid"),
    })
    .collect()
});

/// Pattern matching a PlaybackInfo path; the rewriter builds stream URLs from it.
pub(crate) fn playback_info_pattern() -> &'static Regex {
    &ROUTES[0].pattern
}

/// Classify a request by its URI.
#[must_use]
pub fn classify(uri: &Uri) -> Disposition {
    let path = uri.path();

    for route in ROUTES.iter() {
        let Some(captures) = route.pattern.captures(path) else {
            continue;
        };
        let id = captures.get(1).map_or("", |m| m.as_str());
        if id.is_empty() {
            return Disposition::Passthrough;
        }

        return match route.kind {
            RouteKind::PlaybackInfo => Disposition::PlaybackInfo {
                item_id: id.to_string(),
            },
            RouteKind::Stream => media_source_id(uri).map_or(Disposition::Passthrough, |media_source_id| {
                Disposition::Stream {
                    video_id: id.to_string(),
                    media_source_id,
                }
            }),
        };
    }

    Disposition::Passthrough
}

/// Non-empty `MediaSourceId`, falling back to `mediaSourceId`
fn media_source_id(uri: &Uri) -> Option<String> {
    let query = uri.query()?;
    query_param(query, "MediaSourceId").or_else(|| query_param(query, "mediaSourceId"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classify_str(uri: &str) -> Disposition {
        classify(&uri.parse::<Uri>().unwrap())
    }

    #[test]
    fn test_playback_info() {
        assert_eq!(
            classify_str("/Items/123/PlaybackInfo?UserId=u&StartTimeTicks=0"),
            Disposition::PlaybackInfo { item_id: "123".to_string() }
        );
        assert_eq!(
            classify_str("/emby/items/123/playbackinfo"),
            Disposition::PlaybackInfo { item_id: "123".to_string() }
        );
    }

    #[test]
    fn test_stream_variants() {
        for path in [
            "/Videos/123/stream?MediaSourceId=abc",
            "/videos/123/stream.mkv?MediaSourceId=abc&Static=true",
            "/emby/Videos/123/original.mp4?MediaSourceId=abc",
            "/Videos/123/master.m3u8?mediaSourceId=abc",
        ] {
            assert_eq!(
                classify_str(path),
                Disposition::Stream {
                    video_id: "123".to_string(),
                    media_source_id: "abc".to_string(),
                },
                "{path}"
            );
        }
    }

    #[test]
    fn test_stream_prefers_capitalized_parameter() {
        assert_eq!(
            classify_str("/Videos/123/stream?mediaSourceId=lower&MediaSourceId=upper"),
            Disposition::Stream {
                video_id: "123".to_string(),
                media_source_id: "upper".to_string(),
            }
        );
    }

    #[test]
    fn test_stream_without_media_source_is_passthrough() {
        assert_eq!(classify_str("/Videos/123/stream"), Disposition::Passthrough);
        assert_eq!(classify_str("/Videos/123/stream?MediaSourceId="), Disposition::Passthrough);
        assert_eq!(
            classify_str("/Videos/123/stream?MediaSourceId=&mediaSourceId="),
            Disposition::Passthrough
        );
    }

    #[test]
    fn test_other_paths_are_passthrough() {
        for path in [
            "/",
            "/web/index.html",
            "/Users/abc/Items?ParentId=1",
            "/Items/123/Images/Primary",
            "/Videos/123/hls1/main/0.ts?MediaSourceId=abc",
            "/Videos/123/Subtitles/3/Stream.srt?MediaSourceId=abc",
        ] {
            assert_eq!(classify_str(path), Disposition::Passthrough, "{path}");
        }
    }

    #[test]
    fn test_query_string_is_not_matched() {
        assert_eq!(
            classify_str("/web/index.html?next=/Items/1/PlaybackInfo"),
            Disposition::Passthrough
        );
    }
}
