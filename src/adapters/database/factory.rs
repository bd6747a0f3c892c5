//! Storage factory
//!
//! This module wires up the concrete storage backends from configuration.

use crate::adapters::database::traits::{CheckpointStorage, RecordRepository};
use crate::adapters::postgresql::{
    PostgreSQLAssetRepository, PostgreSQLCheckpointStorage, PostgreSQLClient,
    PostgreSQLEntityRepository, PostgreSQLNodeRepository,
};
use crate::adapters::resources::FileSystemResourceStore;
use crate::config::schema::AnonymizerConfig;
use crate::core::run::Collaborators;
use crate::core::state::CheckpointManager;
use crate::domain::ids::RecordFamily;
use crate::domain::Result;
use std::sync::Arc;

async fn connect(config: &AnonymizerConfig) -> Result<Arc<PostgreSQLClient>> {
    tracing::info!("Creating PostgreSQL client");
    let client = PostgreSQLClient::new(config.database.clone()).await?;
    client.test_connection().await?;
    Ok(Arc::new(client))
}

/// Checkpoint storage; `migrate` creates the table, otherwise no DDL runs
async fn checkpoint_storage(
    client: Arc<PostgreSQLClient>,
    migrate: bool,
) -> Result<Arc<dyn CheckpointStorage + Send + Sync>> {
    if !migrate {
        return Ok(Arc::new(PostgreSQLCheckpointStorage::without_migration(client).await?));
    }
    let storage = PostgreSQLCheckpointStorage::new(client);
    storage.ensure_schema().await?;
    Ok(Arc::new(storage))
}

/// Create read-only checkpoint storage for status reporting
///
/// # Errors
///
/// Returns an error if the database is unreachable.
pub async fn create_checkpoint_storage(
    config: &AnonymizerConfig,
) -> Result<Arc<dyn CheckpointStorage + Send + Sync>> {
    let client = connect(config).await?;
    checkpoint_storage(client, false).await
}

/// Create every collaborator a run over `family` needs
///
/// All database-backed collaborators share one connection pool. A dry run
/// executes no DDL; the checkpoint table is only created for real runs.
///
/// # Errors
///
/// Returns an error if the database is unreachable or the checkpoint table
/// cannot be created.
pub async fn create_collaborators(
    config: &AnonymizerConfig,
    family: RecordFamily,
    dry_run: bool,
) -> Result<Collaborators> {
    let client = connect(config).await?;
    let assets = Arc::new(PostgreSQLAssetRepository::new(client.clone()));

    let records: Arc<dyn RecordRepository + Send + Sync> = match family {
        RecordFamily::NodeType => Arc::new(PostgreSQLNodeRepository::new(
            client.clone(),
            assets.clone(),
        )?),
        RecordFamily::DomainModel => {
            Arc::new(PostgreSQLEntityRepository::new(client.clone(), assets.clone()))
        }
    };

    let checkpoints = CheckpointManager::new_with_storage(checkpoint_storage(client, !dry_run).await?);

    tracing::debug!(
        family = %family,
        resources = %config.resources.path.display(),
        "Storage collaborators ready"
    );

    Ok(Collaborators {
        records,
        checkpoints: Arc::new(checkpoints),
        resources: Arc::new(FileSystemResourceStore::new(config.resources.path.clone())),
        assets,
    })
}
