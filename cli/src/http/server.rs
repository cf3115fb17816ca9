//! Server lifecycle: bind, serve, graceful shutdown and the state file that
//! lets other tools find a running instance.

use crate::http::{
    middleware::{cors_layer, request_logger},
    routes::create_router,
    AppState,
};
use axum::middleware;
use std::fs;
use std::io::Write;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use tokio::signal;
use tracing::{info, warn};

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 8080,
        }
    }
}

/// Serves until Ctrl+C, SIGTERM or `POST /api/v1/shutdown`. Operations
/// still streaming are not awaited past shutdown.
pub async fn start_server_with_config(
    session_id: String,
    config: ServerConfig,
    state: AppState,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let servers_dir = get_servers_dir()?;
    start_server_in(session_id, config, state, &servers_dir).await
}

async fn start_server_in(
    session_id: String,
    config: ServerConfig,
    state: AppState,
    servers_dir: &Path,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let mut shutdown_rx = state.shutdown_tx.subscribe();
    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    let bound = listener.local_addr()?;

    let state_file_path = create_state_file(servers_dir, &session_id, bound.port())?;
    info!(
        target: "docstream.http",
        state_file = %state_file_path.display(),
        "state file created"
    );

    let app = create_router(state.clone())
        .layer(middleware::from_fn(request_logger))
        .layer(cors_layer());

    info!(
        target: "docstream.http",
        session_id = %session_id,
        "HTTP server listening on http://{}",
        bound
    );

    let served = axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            tokio::select! {
                _ = signal::ctrl_c() => {
                    info!(target: "docstream.http", "Received Ctrl+C signal");
                }
                _ = shutdown_rx.recv() => {
                    info!(target: "docstream.http", "Received shutdown signal from API");
                }
                _ = wait_for_sigterm() => {
                    info!(target: "docstream.http", "Received SIGTERM signal");
                }
            }
            info!(target: "docstream.http", "Starting graceful shutdown...");
        })
        .await;

    if let Err(e) = fs::remove_file(&state_file_path) {
        warn!(target: "docstream.http", error = %e, "Failed to remove state file");
    }

    served?;
    info!(target: "docstream.http", "Server shutdown complete");
    Ok(())
}

fn create_state_file(
    servers_dir: &Path,
    session_id: &str,
    port: u16,
) -> Result<PathBuf, std::io::Error> {
    fs::create_dir_all(servers_dir)?;

    let state_file = servers_dir.join(format!("http-{}.pid", port));
    let mut file = fs::File::create(&state_file)?;
    writeln!(file, "session_id={}", session_id)?;
    writeln!(file, "port={}", port)?;
    writeln!(file, "pid={}", std::process::id())?;
    writeln!(file, "start_time={}", chrono::Local::now().to_rfc3339())?;

    Ok(state_file)
}

/// `~/.docstream/servers`
fn get_servers_dir() -> Result<PathBuf, std::io::Error> {
    let home_dir = dirs::home_dir().ok_or_else(|| {
        std::io::Error::new(std::io::ErrorKind::NotFound, "Home directory not found")
    })?;

    Ok(home_dir.join(".docstream").join("servers"))
}

#[cfg(unix)]
async fn wait_for_sigterm() {
    use tokio::signal::unix::{signal, SignalKind};

    match signal(SignalKind::terminate()) {
        Ok(mut sigterm) => {
            sigterm.recv().await;
        }
        Err(e) => {
            warn!(target: "docstream.http", error = %e, "SIGTERM handler unavailable");
            std::future::pending::<()>().await
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_sigterm() {
    std::future::pending::<()>().await
}
