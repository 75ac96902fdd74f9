use anyhow::Context;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use tokio::signal;
use tracing::info;
use tracing_subscriber::EnvFilter;

use directory_core::SessionTracker;
use directory_persistence::{
    connection::connect_and_migrate,
    repositories::{PlayerRepository, ServerRepository},
};
use directory_server::{config::Config, coordinator::DirectoryCoordinator, create_routes};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Starting game directory...");

    let config = Config::from_env()?;

    // Initialize database connection and run migrations
    let db = connect_and_migrate(&config.database_url)
        .await
        .with_context(|| format!("Failed to open database {}", config.database_url))?;

    let player_repository = Arc::new(PlayerRepository::new(db.clone()));
    let server_repository = Arc::new(ServerRepository::new(db));
    let sessions = Arc::new(SessionTracker::new());

    let coordinator = Arc::new(DirectoryCoordinator::new(
        player_repository,
        server_repository,
        sessions.clone(),
        &config,
    ));

    let host: IpAddr = config
        .host
        .parse()
        .with_context(|| format!("Invalid HOST: {:?}", config.host))?;
    let bind_addr = SocketAddr::new(host, config.port);

    let routes = create_routes(coordinator, Arc::new(config));

    let (addr, server) = warp::serve(routes).try_bind_with_graceful_shutdown(bind_addr, async {
        // Wait for SIGINT (Ctrl+C) or SIGTERM
        #[cfg(unix)]
        {
            let (mut sigint, mut sigterm) = match (
                signal::unix::signal(signal::unix::SignalKind::interrupt()),
                signal::unix::signal(signal::unix::SignalKind::terminate()),
            ) {
                (Ok(sigint), Ok(sigterm)) => (sigint, sigterm),
                _ => {
                    tracing::error!("Failed to install signal handlers");
                    std::future::pending::<()>().await;
                    return;
                }
            };

            tokio::select! {
                _ = sigint.recv() => {
                    info!("Received SIGINT, shutting down gracefully...");
                }
                _ = sigterm.recv() => {
                    info!("Received SIGTERM, shutting down gracefully...");
                }
            }
        }

        #[cfg(not(unix))]
        {
            if signal::ctrl_c().await.is_err() {
                tracing::error!("Failed to listen for ctrl+c");
                std::future::pending::<()>().await;
            }
            info!("Received Ctrl+C, shutting down gracefully...");
        }
    })
    .with_context(|| format!("Failed to bind {}", bind_addr))?;

    info!(
        "Game directory listening on {}. Press Ctrl+C to stop.",
        addr
    );
    server.await;

    // Sessions live in memory only; report what is dropped
    info!(
        "Shutdown complete, {} active sessions discarded.",
        sessions.active_count()
    );
    Ok(())
}
