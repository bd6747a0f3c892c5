//! PostgreSQL asset repository
//!
//! Assets live in a single table with their resource reference flattened into
//! `resource_*` columns.

use super::client::{quote_ident, PostgreSQLClient};
use crate::adapters::database::traits::AssetRepository;
use crate::domain::{AnonymizerError, Asset, ResourceRef, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio_postgres::Row;

const ASSET_COLUMNS: &str = "persistence_object_identifier, media_type, resource_sha256, \
                             resource_filename, resource_collection";

/// Asset rows of the configured asset table
pub struct PostgreSQLAssetRepository {
    client: Arc<PostgreSQLClient>,
    table: String,
}

impl PostgreSQLAssetRepository {
    pub fn new(client: Arc<PostgreSQLClient>) -> Self {
        let table = quote_ident(&client.config().asset_table);
        Self { client, table }
    }

    /// Load assets by identifier; unknown identifiers are absent from the map
    pub async fn find_assets(&self, identifiers: &[String]) -> Result<HashMap<String, Asset>> {
        if identifiers.is_empty() {
            return Ok(HashMap::new());
        }

        let query = format!(
            "SELECT {ASSET_COLUMNS} FROM {} WHERE persistence_object_identifier = ANY($1)",
            self.table
        );
        let rows = self.client.query(&query, &[&identifiers]).await?;

        rows.iter()
            .map(|row| {
                let asset = asset_from_row(row)?;
                Ok((asset.identifier.clone(), asset))
            })
            .collect()
    }
}

fn asset_from_row(row: &Row) -> Result<Asset> {
    Ok(Asset {
        identifier: row.try_get("persistence_object_identifier")?,
        media_type: row.try_get("media_type")?,
        resource: ResourceRef {
            sha256: row.try_get("resource_sha256")?,
            filename: row.try_get("resource_filename")?,
            collection: row.try_get("resource_collection")?,
        },
    })
}

#[async_trait]
impl AssetRepository for PostgreSQLAssetRepository {
    async fn update_asset(&self, asset: &Asset) -> Result<()> {
        let statement = format!(
            "UPDATE {} SET resource_sha256 = $1, resource_filename = $2, resource_collection = $3 \
             WHERE persistence_object_identifier = $4",
            self.table
        );

        let updated = self
            .client
            .execute(
                &statement,
                &[
                    &asset.resource.sha256,
                    &asset.resource.filename,
                    &asset.resource.collection,
                    &asset.identifier,
                ],
            )
            .await?;

        if updated == 0 {
            return Err(AnonymizerError::Database(format!(
                "Asset {} not found",
                asset.identifier
            )));
        }

        tracing::debug!(asset = %asset.identifier, "Updated asset resource");
        Ok(())
    }
}
