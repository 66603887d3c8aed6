// Session-scoped storage: lives exactly as long as the process, like a
// browser tab's session storage. Values are kept as JSON under their key.

use async_trait::async_trait;
use dashmap::DashMap;

use crate::core::presentation::{
    PendingOperation, PendingOperationStore, PendingStoreError, PENDING_OPERATION_KEY,
};

#[derive(Default)]
pub struct InMemoryPendingStore {
    entries: DashMap<String, String>,
}

impl InMemoryPendingStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PendingOperationStore for InMemoryPendingStore {
    async fn save(&self, operation: &PendingOperation) -> Result<(), PendingStoreError> {
        let json = serde_json::to_string(operation)?;
        self.entries.insert(PENDING_OPERATION_KEY.to_string(), json);
        Ok(())
    }

    async fn load(&self) -> Result<Option<PendingOperation>, PendingStoreError> {
        // Clone out of the map so no shard lock is held while parsing.
        let json = self
            .entries
            .get(PENDING_OPERATION_KEY)
            .map(|entry| entry.value().clone());
        json.map(|j| serde_json::from_str(&j))
            .transpose()
            .map_err(PendingStoreError::from)
    }

    async fn clear(&self) -> Result<(), PendingStoreError> {
        self.entries.remove(PENDING_OPERATION_KEY);
        Ok(())
    }
}
