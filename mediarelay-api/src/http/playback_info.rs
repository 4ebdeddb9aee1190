//! `/Items/{id}/PlaybackInfo` interception
//!
//! The request goes to the library server as usual; the buffered answer is
//! rewritten so storage-backed sources point at our stream route. If the
//! body cannot be rewritten the client gets it exactly as received.

use axum::{
    body::Body,
    extract::Request,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use mediarelay_proxy::forwardable_headers;

use super::AppState;

pub async fn handle(state: &AppState, item_id: &str, request: Request) -> Response {
    let path = request.uri().path().to_string();

    let upstream = match state.forwarder.fetch_buffered(request).await {
        Ok(upstream) => upstream,
        Err(e) => {
            tracing::error!(item_id, error = %e, "Failed to fetch PlaybackInfo");
            return (StatusCode::BAD_GATEWAY, "Bad Gateway").into_response();
        }
    };

    if !upstream.status.is_success() {
        tracing::debug!(item_id, status = %upstream.status, "PlaybackInfo not rewritten");
        return upstream.into_response();
    }

    match state.rewriter.rewrite(&path, &upstream.body) {
        Ok(body) => {
            let mut response = Response::new(Body::from(body));
            *response.status_mut() = upstream.status;
            *response.headers_mut() = forwardable_headers(&upstream.headers, &["content-length"]);
            response
        }
        Err(e) => {
            tracing::warn!(item_id, error = %e, "Forwarding PlaybackInfo unmodified");
            upstream.into_response()
        }
    }
}
