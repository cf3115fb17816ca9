use clap::{Args as ClapArgs, Parser, Subcommand};

#[derive(Parser, Debug, Clone)]
#[command(name = "docstream", version)]
pub struct Args {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to a config.toml; defaults to ./config.toml when present.
    #[arg(long, global = true)]
    pub config: Option<String>,
}

#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Raw document text as it streams.
    Text,
    /// One JSON delta per line.
    Jsonl,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct HttpServerArgs {
    /// Overrides `http_server.port`.
    #[arg(long)]
    pub port: Option<u16>,

    /// Overrides `http_server.host`.
    #[arg(long)]
    pub host: Option<String>,

    #[arg(long)]
    pub session_id: Option<String>,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct CreateArgs {
    /// text, code, sheet or image
    #[arg(long)]
    pub kind: String,

    #[arg(long)]
    pub title: String,

    #[arg(long, default_value = "local")]
    pub owner: String,

    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct UpdateArgs {
    #[arg(long)]
    pub id: String,

    /// What to change.
    #[arg(long)]
    pub description: String,

    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct ShowArgs {
    #[arg(long)]
    pub id: String,

    /// Print every stored snapshot, oldest first.
    #[arg(long, default_value_t = false)]
    pub versions: bool,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Serve the HTTP API.
    Serve(HttpServerArgs),
    /// Generate a new document and stream it to stdout.
    Create(CreateArgs),
    /// Rewrite an existing document and stream it to stdout.
    Update(UpdateArgs),
    /// Print a stored document.
    Show(ShowArgs),
}
