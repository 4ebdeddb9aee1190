//! `/Videos/{id}/stream` redirection

use axum::{
    extract::Request,
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};

use super::AppState;

/// Redirect to storage, or pass the request through when that is not possible.
pub async fn handle(state: &AppState, video_id: &str, request: Request) -> Response {
    let user_agent = request
        .headers()
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();

    let resolved = state
        .playback
        .resolve_stream(request.uri(), video_id, &user_agent, request.headers())
        .await;

    match resolved {
        Ok(resolution) => match HeaderValue::from_str(resolution.url()) {
            Ok(location) => (StatusCode::FOUND, [(header::LOCATION, location)]).into_response(),
            Err(e) => {
                tracing::warn!(url = resolution.url(), error = %e, "Resolved URL is not a valid header");
                state.forwarder.forward(request).await
            }
        },
        Err(e) => {
            tracing::warn!(video_id, error = %e, "Stream redirect failed, passing through");
            state.forwarder.forward(request).await
        }
    }
}
