use crate::core::ai::{AiError, UsageRecord, UsageStore};
use async_trait::async_trait;
use std::path::PathBuf;
use tokio::sync::RwLock;

/// Keeps the monthly call counter in a small JSON file so the quota survives restarts.
pub struct JsonUsageStore {
    path: PathBuf,
    cache: RwLock<Option<UsageRecord>>,
}

impl JsonUsageStore {
    /// Opens the ledger at `path`. A missing or unreadable file starts a fresh count.
    pub async fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let record = match tokio::fs::read_to_string(&path).await {
            Ok(text) => serde_json::from_str(&text)
                .map_err(|e| tracing::warn!("Ignoring unreadable usage ledger {:?}: {}", path, e))
                .ok(),
            Err(_) => None,
        };

        Self {
            path,
            cache: RwLock::new(record),
        }
    }

    async fn persist(&self, record: &UsageRecord) -> Result<(), AiError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| AiError::Usage(e.to_string()))?;
        }
        let json =
            serde_json::to_string_pretty(record).map_err(|e| AiError::Usage(e.to_string()))?;
        tokio::fs::write(&self.path, json)
            .await
            .map_err(|e| AiError::Usage(e.to_string()))
    }
}

#[async_trait]
impl UsageStore for JsonUsageStore {
    async fn load(&self) -> Result<Option<UsageRecord>, AiError> {
        Ok(*self.cache.read().await)
    }

    async fn save(&self, record: UsageRecord) -> Result<(), AiError> {
        let mut cache = self.cache.write().await;
        *cache = Some(record);
        drop(cache); // Release lock before persisting
        self.persist(&record).await
    }
}

/// Process-local counter, for tests and one-off runs.
#[derive(Default)]
pub struct InMemoryUsageStore {
    record: RwLock<Option<UsageRecord>>,
}

impl InMemoryUsageStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UsageStore for InMemoryUsageStore {
    async fn load(&self) -> Result<Option<UsageRecord>, AiError> {
        Ok(*self.record.read().await)
    }

    async fn save(&self, record: UsageRecord) -> Result<(), AiError> {
        *self.record.write().await = Some(record);
        Ok(())
    }
}
