pub mod cli;
pub mod document;
pub mod http_server;
