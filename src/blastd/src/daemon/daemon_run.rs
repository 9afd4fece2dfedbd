use crate::client::exporters::event_forward::ActivityForward;
use crate::client::{SyncManager, SyncSettings};
use crate::config::Config;
use crate::daemon::rate_limiter::RateLimiter;
use crate::daemon::server::DaemonServer;
use crate::daemon::state::DaemonState;
use crate::storage::ActivityBuffer;
use anyhow::{Context, Result};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// Runs the daemon until SIGINT or SIGTERM.
pub async fn run(config: Config) -> Result<()> {
    let cancellation_token = CancellationToken::new();
    tokio::spawn(wait_for_shutdown_signal(cancellation_token.clone()));
    serve(&config, cancellation_token).await
}

/// Opens the buffer, binds the socket and drives the sync loop until
/// `cancellation_token` fires. Returns after the final drain.
pub async fn serve(config: &Config, cancellation_token: CancellationToken) -> Result<()> {
    let buffer = ActivityBuffer::open(&config.db_path)
        .await
        .context("Failed to open activity buffer")?;

    let forward = ActivityForward::new(&config.server_url, &config.api_token);
    if !forward.has_credential() {
        warn!("No API token configured, activities will only be buffered locally");
    }

    let sync_manager = Arc::new(SyncManager::new(
        buffer.clone(),
        forward,
        SyncSettings::from(config),
        cancellation_token.clone(),
    ));

    let state = DaemonState::new(
        buffer.clone(),
        &config.machine,
        sync_manager.clone(),
        Arc::new(RateLimiter::default()),
    );
    let server = DaemonServer::bind(&config.socket_path, state)?;
    let server = tokio::spawn(server.run(cancellation_token.clone()));

    info!("blastd started (machine: {})", config.machine);
    sync_manager.run().await;

    if let Err(e) = server.await {
        error!("Intake listener task failed: {}", e);
    }
    buffer.close().await;

    info!("blastd stopped");
    Ok(())
}

async fn wait_for_shutdown_signal(cancellation_token: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for SIGINT: {}", e);
            std::future::pending::<()>().await;
        }
    };

    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    tokio::select! {
        _ = ctrl_c => info!("Received SIGINT"),
        _ = terminate => info!("Received SIGTERM"),
        _ = cancellation_token.cancelled() => return,
    }

    cancellation_token.cancel();
}
