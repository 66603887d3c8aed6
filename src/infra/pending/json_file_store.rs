// Short-lived file store for a request parked across a consent redirect.
// The CLI writes it before printing the consent URL and a later `resume`
// run reads it back. Entries older than the TTL count as absent.

use async_trait::async_trait;
use chrono::Utc;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::core::presentation::{
    PendingOperation, PendingOperationStore, PendingStoreError, PENDING_OPERATION_KEY,
};

pub const DEFAULT_PENDING_TTL: Duration = Duration::from_secs(60 * 60);

pub struct JsonFilePendingStore {
    path: PathBuf,
    ttl: Duration,
}

impl JsonFilePendingStore {
    /// Stores the entry as `<dir>/googleSlidesData.json`.
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        Self {
            path: dir.as_ref().join(format!("{PENDING_OPERATION_KEY}.json")),
            ttl: DEFAULT_PENDING_TTL,
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn is_expired(&self, operation: &PendingOperation) -> bool {
        let age = Utc::now().signed_duration_since(operation.saved_at);
        age.to_std().map(|age| age > self.ttl).unwrap_or(false)
    }
}

#[async_trait]
impl PendingOperationStore for JsonFilePendingStore {
    async fn save(&self, operation: &PendingOperation) -> Result<(), PendingStoreError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        let json = serde_json::to_string_pretty(operation)?;
        tokio::fs::write(&self.path, json).await?;
        tracing::debug!(path = ?self.path, "Pending presentation request saved");
        Ok(())
    }

    async fn load(&self) -> Result<Option<PendingOperation>, PendingStoreError> {
        let text = match tokio::fs::read_to_string(&self.path).await {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let operation: PendingOperation = serde_json::from_str(&text)?;
        if self.is_expired(&operation) {
            tracing::info!(saved_at = %operation.saved_at, "Discarding expired pending request");
            self.clear().await?;
            return Ok(None);
        }
        Ok(Some(operation))
    }

    async fn clear(&self) -> Result<(), PendingStoreError> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
