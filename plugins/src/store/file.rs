//! JSONL-backed store: one `<id>.jsonl` file per document, one snapshot per line.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use std::io::SeekFrom;

use tokio::io::{AsyncReadExt, AsyncSeekExt, AsyncWriteExt};
use tokio::sync::Mutex;

use docstream_core::api::{Document, DocumentStore, StoreError};

pub struct FileDocumentStore {
    dir: PathBuf,
    write_lock: Mutex<()>,
}

impl FileDocumentStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, id: &str) -> Result<PathBuf, StoreError> {
        let valid = !id.is_empty()
            && id != "."
            && id != ".."
            && !id.contains(['/', '\\'])
            && !id.contains('\0');
        if !valid {
            return Err(StoreError::Backend(format!("invalid document id: {id:?}")));
        }
        Ok(self.dir.join(format!("{id}.jsonl")))
    }

    async fn read_versions(&self, id: &str) -> Result<Vec<Document>, StoreError> {
        let path = self.path_for(id)?;
        let raw = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut out = Vec::new();
        let lines = raw
            .split(|b| *b == b'\n')
            .filter(|l| !l.iter().all(u8::is_ascii_whitespace));
        for line in lines {
            match serde_json::from_slice::<Document>(line) {
                Ok(doc) => out.push(doc),
                // Torn line from an interrupted save; that save never completed.
                Err(e) => {
                    tracing::warn!(
                        target: "docstream.store",
                        path = %path.display(),
                        error = %e,
                        "skipping incomplete snapshot line"
                    );
                }
            }
        }
        Ok(out)
    }
}

#[async_trait]
impl DocumentStore for FileDocumentStore {
    fn name(&self) -> &str {
        "file"
    }

    async fn save_document(&self, document: &Document) -> Result<(), StoreError> {
        let path = self.path_for(&document.id)?;
        let mut line = serde_json::to_string(document)?;
        line.push('\n');

        let _guard = self.write_lock.lock().await;
        tokio::fs::create_dir_all(&self.dir).await?;

        let mut f = tokio::fs::OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(&path)
            .await?;

        // Start on a fresh line if an earlier write was cut short.
        let len = f.metadata().await?.len();
        if len > 0 {
            let mut last = [0u8; 1];
            f.seek(SeekFrom::Start(len - 1)).await?;
            f.read_exact(&mut last).await?;
            if last[0] != b'\n' {
                line.insert(0, '\n');
            }
        }

        f.write_all(line.as_bytes()).await?;
        f.flush().await?;
        f.sync_data().await?;

        tracing::debug!(
            target: "docstream.store",
            id = %document.id,
            path = %path.display(),
            "snapshot appended"
        );
        Ok(())
    }

    async fn load_document(&self, id: &str) -> Result<Option<Document>, StoreError> {
        Ok(self.read_versions(id).await?.pop())
    }

    async fn list_versions(&self, id: &str) -> Result<Vec<Document>, StoreError> {
        self.read_versions(id).await
    }
}
