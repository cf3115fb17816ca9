use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use docstream_core::api::{Document, DocumentStore, StoreError};

/// Process-local store; history is lost on exit.
#[derive(Default)]
pub struct MemoryDocumentStore {
    versions: RwLock<HashMap<String, Vec<Document>>>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    fn name(&self) -> &str {
        "memory"
    }

    async fn save_document(&self, document: &Document) -> Result<(), StoreError> {
        self.versions
            .write()
            .await
            .entry(document.id.clone())
            .or_default()
            .push(document.clone());
        Ok(())
    }

    async fn load_document(&self, id: &str) -> Result<Option<Document>, StoreError> {
        Ok(self
            .versions
            .read()
            .await
            .get(id)
            .and_then(|v| v.last().cloned()))
    }

    async fn list_versions(&self, id: &str) -> Result<Vec<Document>, StoreError> {
        Ok(self.versions.read().await.get(id).cloned().unwrap_or_default())
    }
}
