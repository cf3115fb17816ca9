use async_trait::async_trait;

use crate::document::Document;
use crate::error::StoreError;

/// Append-only snapshot store for documents.
///
/// A save either lands completely or not at all.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    fn name(&self) -> &str;

    async fn save_document(&self, document: &Document) -> Result<(), StoreError>;

    /// Latest snapshot for `id`.
    async fn load_document(&self, id: &str) -> Result<Option<Document>, StoreError>;

    /// All snapshots for `id`, oldest first.
    async fn list_versions(&self, id: &str) -> Result<Vec<Document>, StoreError>;
}
