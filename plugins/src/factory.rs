use std::sync::Arc;

use anyhow::Result;

use docstream_core::api::{
    AppConfig, DocumentStore, HandlerRegistry, ModelConfig, StoreConfig, TokenSource,
};

use crate::handlers::register_builtin_handlers;
use crate::source::{OpenAiTokenSource, ReplayTokenSource};
use crate::store::{FileDocumentStore, MemoryDocumentStore};

pub fn build_source(cfg: &AppConfig) -> Result<Arc<dyn TokenSource>> {
    match &cfg.model {
        ModelConfig::OpenAi(m) => Ok(Arc::new(OpenAiTokenSource::new(
            m.base_url.clone(),
            m.api_key.clone(),
            m.connect_timeout_ms,
        )?)),
        ModelConfig::Replay(r) => Ok(Arc::new(ReplayTokenSource::new(r.events_file.clone()))),
    }
}

pub fn build_store(cfg: &AppConfig) -> Arc<dyn DocumentStore> {
    match &cfg.store {
        StoreConfig::Memory => Arc::new(MemoryDocumentStore::new()),
        StoreConfig::File(f) => Arc::new(FileDocumentStore::new(f.resolved_dir())),
    }
}

pub fn build_registry(cfg: &AppConfig, source: Arc<dyn TokenSource>) -> HandlerRegistry {
    register_builtin_handlers(
        HandlerRegistry::builder(),
        source,
        cfg.model.artifact_model(),
        &cfg.stream,
    )
    .build()
}
