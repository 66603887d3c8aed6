use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::slides::{MaterializationTarget, SlideDraft};

/// Storage key for the stashed request, shared by every store implementation.
pub const PENDING_OPERATION_KEY: &str = "googleSlidesData";

/// A materialize request parked while the user goes through a consent redirect.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingOperation {
    pub slide_data: Vec<SlideDraft>,
    pub presentation_title: String,
    pub subject_name: String,
    pub unit_name: String,
    /// Stashes written without a timestamp load as fresh.
    #[serde(default = "Utc::now")]
    pub saved_at: DateTime<Utc>,
}

impl PendingOperation {
    pub fn new(slides: &[SlideDraft], target: &MaterializationTarget) -> Self {
        Self {
            slide_data: slides.to_vec(),
            presentation_title: target.presentation_title.clone(),
            subject_name: target.subject_name.clone(),
            unit_name: target.unit_name.clone(),
            saved_at: Utc::now(),
        }
    }

    pub fn target(&self) -> MaterializationTarget {
        MaterializationTarget::new(
            self.presentation_title.clone(),
            self.subject_name.clone(),
            self.unit_name.clone(),
        )
    }
}

#[derive(Debug, Error)]
pub enum PendingStoreError {
    #[error("Pending operation I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("Pending operation is not valid JSON: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[async_trait]
pub trait PendingOperationStore: Send + Sync {
    async fn save(&self, operation: &PendingOperation) -> Result<(), PendingStoreError>;
    async fn load(&self) -> Result<Option<PendingOperation>, PendingStoreError>;
    async fn clear(&self) -> Result<(), PendingStoreError>;
}
