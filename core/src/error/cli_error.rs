use thiserror::Error;

use super::DocumentError;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("config error")]
    Config(#[source] anyhow::Error),

    #[error("failed to build services")]
    Services(#[source] anyhow::Error),

    #[error(transparent)]
    Document(#[from] DocumentError),

    #[error("store error")]
    Store(#[from] super::StoreError),

    #[error("server error: {0}")]
    Server(String),

    #[error("io error")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Command(String),
}
