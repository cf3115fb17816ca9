mod cli_error;
mod document_error;
mod store_error;
mod stream_error;

pub use cli_error::CliError;
pub use document_error::DocumentError;
pub use store_error::StoreError;
pub use stream_error::StreamError;
