mod server;

use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing::info;

use mediarelay_api::AppState;
use mediarelay_core::{bootstrap::load_config, logging};

use server::RelayServer;

#[derive(Parser, Debug)]
#[command(name = "mediarelay")]
#[command(about = "Redirects Emby/Jellyfin playback to Alist storage", long_about = None)]
struct Args {
    /// Config file (YAML)
    #[arg(short, long)]
    config: Option<String>,

    /// Listen port, overrides `server.port`
    #[arg(short, long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // 1. Load configuration
    let mut config = load_config(args.config.as_deref())?;
    if let Some(port) = args.port {
        config.server.port = port;
    }

    // 2. Initialize logging
    logging::init_logging(&config.logging)?;
    info!("mediarelay starting...");
    info!(
        library = %config.emby.url,
        storage = %config.alist.url,
        public_storage = config.alist.public_url().unwrap_or("-"),
        mount_path = %config.redirect.mount_path,
        "Upstreams configured"
    );

    // 3. Build services
    let state = AppState::new(Arc::new(config))?;

    // 4. Serve until shutdown
    RelayServer::new(state).start().await
}
