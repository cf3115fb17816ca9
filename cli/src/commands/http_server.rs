use tokio::sync::broadcast;
use uuid::Uuid;

use docstream_core::api::{AppContext, CliError};

use crate::commands::cli::HttpServerArgs;
use crate::http::{server, AppState};

/// Handles `docstream serve`. Flags override `[http_server]` from config.
pub async fn handle_http_server(args: HttpServerArgs, ctx: &AppContext) -> Result<(), CliError> {
    let session_id = args
        .session_id
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    let config = &ctx.cfg().http_server;
    let server_config = server::ServerConfig {
        host: args.host.unwrap_or_else(|| config.host.clone()),
        port: args.port.unwrap_or(config.port),
    };

    let services = ctx.build_services()?;
    let (shutdown_tx, _) = broadcast::channel(1);
    let state = AppState::new(
        session_id.clone(),
        services,
        ctx.cfg().stream.clone(),
        shutdown_tx,
    );

    tracing::info!(
        target: "docstream.cli",
        host = %server_config.host,
        port = server_config.port,
        session_id = %session_id,
        "starting HTTP server"
    );

    server::start_server_with_config(session_id, server_config, state)
        .await
        .map_err(|e| CliError::Server(e.to_string()))
}
