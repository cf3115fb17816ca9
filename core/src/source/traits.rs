use async_trait::async_trait;
use futures::stream::BoxStream;

use crate::error::StreamError;

use super::{SourceEvent, SourceRequest};

/// Events from one open session. Dropping the stream closes the session.
pub type SourceStream = BoxStream<'static, Result<SourceEvent, StreamError>>;

/// Hosted model endpoint producing incremental content for a prompt pair.
#[async_trait]
pub trait TokenSource: Send + Sync {
    fn name(&self) -> &str;

    async fn open(&self, request: SourceRequest) -> Result<SourceStream, StreamError>;
}
