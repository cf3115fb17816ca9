//! Stable re-exports for consumers (`cli`, `plugins`, and external crates).
//!
//! Prefer importing from `docstream_core::api` instead of reaching into internal modules.

pub use crate::accumulator::{accumulate, DeltaAccumulator};
pub use crate::channel::LiveChannel;
pub use crate::config::{
    AppConfig, EventsOutConfig, FileStoreConfig, HttpServerConfig, LoggingConfig, ModelConfig,
    OpenAiModelConfig, ReplayModelConfig, StoreConfig, StreamConfig,
};
pub use crate::context::AppContext;
pub use crate::coordinator::{CreateDocument, DocumentCoordinator, UpdateDocument};
pub use crate::delta::{smooth_words, DeltaFrame, StreamDelta};
pub use crate::document::{Document, DocumentKind, UnknownKind};
pub use crate::error::{CliError, DocumentError, StoreError, StreamError};
pub use crate::events_out::{write_audit_event, AuditEvent, EventsOutTx};
pub use crate::registry::{HandlerDescriptor, HandlerOp, HandlerRegistry, HandlerRequest, RegistryBuilder};
pub use crate::services::{Services, ServicesFactory};
pub use crate::source::{text_deltas, SourceEvent, SourceRequest, SourceStream, TokenSource};
pub use crate::store::DocumentStore;
pub use tokio_util::sync::CancellationToken;
