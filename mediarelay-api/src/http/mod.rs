// Module: http
// Every inbound request lands on one fallback handler, which classifies it
// and dispatches to PlaybackInfo rewriting, stream redirection or passthrough.

pub mod playback_info;
pub mod stream;

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    response::Response,
    Router,
};
use mediarelay_core::service::{classify, Disposition, PlaybackInfoRewriter, PlaybackService};
use mediarelay_core::Config;
use mediarelay_proxy::Forwarder;
use tower_http::trace::TraceLayer;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub playback: PlaybackService,
    pub rewriter: PlaybackInfoRewriter,
    pub forwarder: Forwarder,
}

impl AppState {
    /// Build every service from configuration
    pub fn new(config: Arc<Config>) -> anyhow::Result<Self> {
        let playback = PlaybackService::new(&config)?;
        let rewriter = PlaybackInfoRewriter::new(config.redirect.mount_path.clone());
        let forwarder = Forwarder::new(&config.emby.url, config.redirect.connect_timeout())?;

        Ok(Self {
            config,
            playback,
            rewriter,
            forwarder,
        })
    }
}

/// Create the HTTP router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .fallback(relay)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn relay(State(state): State<AppState>, request: Request) -> Response {
    match classify(request.uri()) {
        Disposition::PlaybackInfo { item_id } => playback_info::handle(&state, &item_id, request).await,
        Disposition::Stream { video_id, .. } => stream::handle(&state, &video_id, request).await,
        Disposition::Passthrough => state.forwarder.forward(request).await,
    }
}
