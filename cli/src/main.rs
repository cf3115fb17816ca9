use std::path::Path;
use std::sync::Arc;

use clap::Parser;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use docstream_core::api::{AppConfig, AppContext, CliError, LoggingConfig};
use docstream_core::config;
use docstream_plugins::services::PluginServicesFactory;

mod commands;
mod http;

use commands::cli;

#[tokio::main]
async fn main() -> Result<(), CliError> {
    let args = cli::Args::parse();

    let cfg = load_config(args.config.as_deref())?;
    let _log_guard = init_logging(&cfg.logging);

    let ctx = AppContext::new(cfg, Arc::new(PluginServicesFactory)).await?;
    let result = dispatch(args.command, &ctx).await;
    ctx.shutdown().await;
    result
}

fn load_config(path: Option<&str>) -> Result<AppConfig, CliError> {
    match path {
        Some(p) => config::load_from_path(Path::new(p)),
        None => config::load_default(),
    }
    .map_err(CliError::Config)
}

/// `RUST_LOG` wins over `logging.level`. Logs go to stderr so stdout stays
/// clean for streamed documents, or to a daily file when `logging.dir` is set.
fn init_logging(cfg: &LoggingConfig) -> Option<WorkerGuard> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cfg.level));

    match cfg.dir.as_deref().filter(|d| !d.trim().is_empty()) {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "docstream.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(writer)
                .with_ansi(false)
                .init();
            Some(guard)
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();
            None
        }
    }
}

async fn dispatch(cmd: cli::Commands, ctx: &AppContext) -> Result<(), CliError> {
    match cmd {
        cli::Commands::Serve(args) => commands::http_server::handle_http_server(args, ctx).await,
        cli::Commands::Create(args) => commands::document::handle_create(args, ctx).await,
        cli::Commands::Update(args) => commands::document::handle_update(args, ctx).await,
        cli::Commands::Show(args) => commands::document::handle_show(args, ctx).await,
    }
}
