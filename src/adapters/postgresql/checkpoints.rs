//! PostgreSQL checkpoint storage

use super::client::PostgreSQLClient;
use super::models::{PostgreSQLCheckpoint, CHECKPOINT_COLUMNS};
use crate::adapters::database::traits::CheckpointStorage;
use crate::core::state::Checkpoint;
use crate::domain::ids::CheckpointName;
use crate::domain::{AnonymizerError, Result};
use async_trait::async_trait;
use std::sync::Arc;

/// Append-only checkpoint table
pub struct PostgreSQLCheckpointStorage {
    client: Arc<PostgreSQLClient>,

    /// Set when opened without migration on a database lacking the table
    table_missing: bool,
}

impl PostgreSQLCheckpointStorage {
    pub fn new(client: Arc<PostgreSQLClient>) -> Self {
        Self {
            client,
            table_missing: false,
        }
    }

    /// Opens the storage without executing any DDL
    ///
    /// If the checkpoint table does not exist yet, reads return nothing and
    /// appends fail.
    pub async fn without_migration(client: Arc<PostgreSQLClient>) -> Result<Self> {
        let table_missing = !client.checkpoint_table_exists().await?;
        if table_missing {
            tracing::debug!("Checkpoint table does not exist yet");
        }
        Ok(Self {
            client,
            table_missing,
        })
    }

    fn to_domain(rows: Vec<tokio_postgres::Row>) -> Result<Vec<Checkpoint>> {
        rows.iter()
            .map(|row| PostgreSQLCheckpoint::from_row(row)?.to_domain())
            .collect()
    }
}

#[async_trait]
impl CheckpointStorage for PostgreSQLCheckpointStorage {
    async fn ensure_schema(&self) -> Result<()> {
        self.client.ensure_checkpoint_schema().await
    }

    async fn find_latest(&self, name: &CheckpointName) -> Result<Option<Checkpoint>> {
        if self.table_missing {
            return Ok(None);
        }
        let query = format!(
            "SELECT {CHECKPOINT_COLUMNS} FROM anonymization_checkpoints \
             WHERE name = $1 AND to_time IS NOT NULL \
             ORDER BY to_time DESC, id DESC LIMIT 1"
        );
        let rows = self.client.query(&query, &[&name.as_str()]).await?;

        Self::to_domain(rows).map(|checkpoints| checkpoints.into_iter().next())
    }

    async fn append(&self, checkpoint: &Checkpoint) -> Result<()> {
        let row = PostgreSQLCheckpoint::from_domain(checkpoint);
        if self.table_missing {
            return Err(AnonymizerError::Checkpoint(format!(
                "Cannot append checkpoint {}: checkpoint table does not exist",
                row.name
            )));
        }

        let inserted = self
            .client
            .execute(
                "INSERT INTO anonymization_checkpoints \
                 (name, from_time, to_time, executed_at, records_processed) \
                 VALUES ($1, $2, $3, $4, $5)",
                &[
                    &row.name,
                    &row.from_time,
                    &row.to_time,
                    &row.executed_at,
                    &row.records_processed,
                ],
            )
            .await
            .map_err(|e| {
                AnonymizerError::Checkpoint(format!("Failed to append checkpoint {}: {e}", row.name))
            })?;

        if inserted != 1 {
            return Err(AnonymizerError::Checkpoint(format!(
                "Checkpoint {} was not stored",
                row.name
            )));
        }
        Ok(())
    }

    async fn latest_per_name(&self) -> Result<Vec<Checkpoint>> {
        if self.table_missing {
            return Ok(Vec::new());
        }
        let query = format!(
            "SELECT DISTINCT ON (name) {CHECKPOINT_COLUMNS} FROM anonymization_checkpoints \
             WHERE to_time IS NOT NULL \
             ORDER BY name, to_time DESC, id DESC"
        );
        let rows = self.client.query(&query, &[]).await?;
        Self::to_domain(rows)
    }

    async fn history(&self, name: &CheckpointName) -> Result<Vec<Checkpoint>> {
        if self.table_missing {
            return Ok(Vec::new());
        }
        let query = format!(
            "SELECT {CHECKPOINT_COLUMNS} FROM anonymization_checkpoints \
             WHERE name = $1 AND to_time IS NOT NULL \
             ORDER BY to_time DESC, id DESC"
        );
        let rows = self.client.query(&query, &[&name.as_str()]).await?;
        Self::to_domain(rows)
    }
}
