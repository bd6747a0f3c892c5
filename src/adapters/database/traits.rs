//! Storage abstraction traits
//!
//! This module defines the traits the run orchestrator uses to reach storage.
//! Every trait has a PostgreSQL or filesystem implementation in this crate and
//! in-memory implementations in the integration tests.

use crate::core::selection::Selection;
use crate::core::state::Checkpoint;
use crate::domain::ids::CheckpointName;
use crate::domain::{Asset, Record, ResourceRef, Result};
use async_trait::async_trait;

/// Record storage for one record family
#[async_trait]
pub trait RecordRepository: Send + Sync {
    /// Check whether a configured type name refers to an existing type
    ///
    /// # Returns
    ///
    /// Returns `Ok(false)` for unknown types; errors are reserved for failed
    /// lookups.
    async fn resolve_type(&self, type_name: &str) -> Result<bool>;

    /// Load every record matching the selection
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or the window field does not exist.
    async fn find_records(&self, selection: &Selection) -> Result<Vec<Box<dyn Record>>>;

    /// Persist the changed fields of a record
    ///
    /// # Errors
    ///
    /// Returns an error if the record was not produced by this repository or
    /// the write fails.
    async fn update_record(&self, record: &dyn Record) -> Result<()>;
}

/// Checkpoint storage trait
///
/// Checkpoints are append-only; no method updates or deletes a row.
#[async_trait]
pub trait CheckpointStorage: Send + Sync {
    /// Create the backing table if necessary
    async fn ensure_schema(&self) -> Result<()> {
        Ok(())
    }

    /// Checkpoint with the greatest `to_time` for a name
    ///
    /// # Returns
    ///
    /// Returns `Ok(None)` if the name has no checkpoint with a `to_time`.
    async fn find_latest(&self, name: &CheckpointName) -> Result<Option<Checkpoint>>;

    /// Append a checkpoint
    async fn append(&self, checkpoint: &Checkpoint) -> Result<()>;

    /// Latest checkpoint of every name, ordered by name
    async fn latest_per_name(&self) -> Result<Vec<Checkpoint>>;

    /// All checkpoints of one name, newest first
    async fn history(&self, name: &CheckpointName) -> Result<Vec<Checkpoint>>;
}

/// Binary resource storage
#[async_trait]
pub trait ResourceStore: Send + Sync {
    /// Store `content` under the given filename and collection
    ///
    /// # Returns
    ///
    /// Returns a reference to the stored resource.
    async fn import_resource(
        &self,
        content: Vec<u8>,
        filename: &str,
        collection: &str,
    ) -> Result<ResourceRef>;
}

/// Media asset storage
#[async_trait]
pub trait AssetRepository: Send + Sync {
    /// Persist an asset whose resource was replaced
    async fn update_asset(&self, asset: &Asset) -> Result<()>;
}
