//! Checkpoint manager
//!
//! Thin layer over a [`CheckpointStorage`] backend that adds logging.

use crate::adapters::database::traits::CheckpointStorage;
use crate::core::state::checkpoint::Checkpoint;
use crate::domain::ids::CheckpointName;
use crate::domain::Result;
use std::sync::Arc;

/// Checkpoint manager
///
/// Append-only access to the checkpoint history of every configured type.
pub struct CheckpointManager {
    storage: Arc<dyn CheckpointStorage + Send + Sync>,
}

impl CheckpointManager {
    /// Create a new CheckpointManager with a storage backend
    pub fn new_with_storage(storage: Arc<dyn CheckpointStorage + Send + Sync>) -> Self {
        Self { storage }
    }

    /// Load the resumption point for a type
    ///
    /// # Returns
    ///
    /// Returns `Ok(Some(Checkpoint))` with the greatest `to_time`, or
    /// `Ok(None)` if the type has never been processed.
    pub async fn find_latest(&self, name: &CheckpointName) -> Result<Option<Checkpoint>> {
        let latest = self.storage.find_latest(name).await?;
        tracing::debug!(
            checkpoint = %name,
            to_time = ?latest.as_ref().map(|c| c.to_time),
            "Loaded latest checkpoint"
        );
        Ok(latest)
    }

    /// Append a checkpoint after a completed pass
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    pub async fn append(&self, checkpoint: &Checkpoint) -> Result<()> {
        tracing::info!(
            checkpoint = %checkpoint.name,
            from_time = ?checkpoint.from_time,
            to_time = %checkpoint.to_time,
            records_processed = checkpoint.records_processed,
            "Appending checkpoint"
        );

        self.storage.append(checkpoint).await
    }

    /// Latest checkpoint of every name, ordered by name
    pub async fn latest_per_name(&self) -> Result<Vec<Checkpoint>> {
        self.storage.latest_per_name().await
    }

    /// All checkpoints of one name, newest first
    pub async fn history(&self, name: &CheckpointName) -> Result<Vec<Checkpoint>> {
        self.storage.history(name).await
    }
}
