//! Server lifecycle management
//!
//! Binds the listener, serves the relay router and drains in-flight requests
//! on Ctrl+C or SIGTERM.

use anyhow::Result;
use tracing::{error, info};

use mediarelay_api::{create_router, AppState};

pub struct RelayServer {
    state: AppState,
}

impl RelayServer {
    pub const fn new(state: AppState) -> Self {
        Self { state }
    }

    /// Serve until a shutdown signal arrives
    pub async fn start(self) -> Result<()> {
        let address = self.state.config.listen_address();
        let listener = tokio::net::TcpListener::bind(&address).await.map_err(|e| {
            error!("Failed to bind HTTP address {}: {}", address, e);
            anyhow::anyhow!("Failed to bind {address}: {e}")
        })?;
        info!("HTTP server listening on {}", address);

        let router = create_router(self.state);
        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        info!("HTTP server shut down gracefully");
        Ok(())
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => { info!("Received Ctrl+C"); }
        () = terminate => { info!("Received SIGTERM"); }
    }
}
