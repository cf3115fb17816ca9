mod traits;
mod types;

pub use traits::{SourceStream, TokenSource};
pub use types::{text_deltas, SourceEvent, SourceRequest};
