//! PostgreSQL node repository
//!
//! Nodes are rows of the node table whose `properties` JSONB column holds the
//! property bag. Date properties are filtered on their `date` key directly in
//! SQL.

use super::assets::PostgreSQLAssetRepository;
use super::client::{quote_ident, PostgreSQLClient};
use super::models::{decode_property, encode_property, StoredProperty};
use crate::adapters::database::traits::RecordRepository;
use crate::core::selection::Selection;
use crate::domain::{AnonymizerError, FieldValue, NodeRecord, Record, Result};
use async_trait::async_trait;
use regex::Regex;
use serde_json::{Map, Value};
use std::sync::Arc;
use tokio_postgres::types::ToSql;

/// `Vendor.Package:Name`
const NODE_TYPE_PATTERN: &str = r"^[A-Za-z0-9]+(\.[A-Za-z0-9]+)*:[A-Za-z0-9]+(\.[A-Za-z0-9]+)*$";

/// Node storage
pub struct PostgreSQLNodeRepository {
    client: Arc<PostgreSQLClient>,
    assets: Arc<PostgreSQLAssetRepository>,
    table: String,
    node_type_pattern: Regex,
}

impl PostgreSQLNodeRepository {
    pub fn new(client: Arc<PostgreSQLClient>, assets: Arc<PostgreSQLAssetRepository>) -> Result<Self> {
        let node_type_pattern = Regex::new(NODE_TYPE_PATTERN)
            .map_err(|e| AnonymizerError::Other(format!("Invalid node type pattern: {e}")))?;
        let table = quote_ident(&client.config().node_table);

        Ok(Self {
            client,
            assets,
            table,
            node_type_pattern,
        })
    }

    /// Select statement for a selection, parameters numbered in window order
    fn select_statement(&self, selection: &Selection) -> String {
        let mut query = format!(
            "SELECT persistence_object_identifier, identifier, node_type, properties \
             FROM {} WHERE node_type = $1",
            self.table
        );

        if let Some(window) = &selection.window {
            let field = "(properties -> $2::text ->> 'date')::timestamp";
            if window.from.is_some() {
                query.push_str(&format!(" AND {field} >= $3 AND {field} < $4"));
            } else {
                query.push_str(&format!(" AND {field} < $3"));
            }
        }

        query.push_str(" ORDER BY persistence_object_identifier");
        query
    }
}

#[async_trait]
impl RecordRepository for PostgreSQLNodeRepository {
    async fn resolve_type(&self, type_name: &str) -> Result<bool> {
        Ok(self.node_type_pattern.is_match(type_name))
    }

    async fn find_records(&self, selection: &Selection) -> Result<Vec<Box<dyn Record>>> {
        let query = self.select_statement(selection);

        let mut params: Vec<&(dyn ToSql + Sync)> = vec![&selection.type_name];
        if let Some(window) = &selection.window {
            params.push(&window.field);
            if let Some(from) = &window.from {
                params.push(from);
            }
            params.push(&window.until);
        }

        let rows = self.client.query(&query, &params).await?;

        let mut loaded = Vec::with_capacity(rows.len());
        let mut asset_ids = Vec::new();
        for row in &rows {
            let persistence_id: String = row.try_get("persistence_object_identifier")?;
            let identifier: String = row.try_get("identifier")?;
            let node_type: String = row.try_get("node_type")?;
            let properties: Value = row.try_get("properties")?;

            let raw = match properties {
                Value::Object(map) => map,
                Value::Null => Map::new(),
                other => {
                    return Err(AnonymizerError::Serialization(format!(
                        "Properties of node {identifier} are not an object: {other}"
                    )))
                }
            };

            let decoded: Vec<(String, StoredProperty)> = raw
                .iter()
                .map(|(name, value)| (name.clone(), decode_property(value)))
                .collect();
            for (_, property) in &decoded {
                if let StoredProperty::AssetReference { identifier } = property {
                    asset_ids.push(identifier.clone());
                }
            }

            loaded.push((persistence_id, identifier, node_type, raw, decoded));
        }

        asset_ids.sort();
        asset_ids.dedup();
        let assets = self.assets.find_assets(&asset_ids).await?;

        let records = loaded
            .into_iter()
            .map(|(persistence_id, identifier, node_type, raw, decoded)| {
                let mut node = NodeRecord::new(persistence_id, identifier, node_type);
                for (name, property) in decoded {
                    let value = match property {
                        StoredProperty::Value(value) => value,
                        StoredProperty::AssetReference { identifier } => match assets.get(&identifier) {
                            Some(asset) => FieldValue::Asset(asset.clone()),
                            None => {
                                tracing::warn!(
                                    node = %node.identifier,
                                    property = %name,
                                    asset = %identifier,
                                    "Referenced asset not found, property left untouched"
                                );
                                FieldValue::Other(raw.get(&name).cloned().unwrap_or(Value::Null))
                            }
                        },
                    };
                    node = node.with_property(name, value);
                }
                node.raw_properties = raw;
                Box::new(node) as Box<dyn Record>
            })
            .collect();

        Ok(records)
    }

    async fn update_record(&self, record: &dyn Record) -> Result<()> {
        let node = record.as_any().downcast_ref::<NodeRecord>().ok_or_else(|| {
            AnonymizerError::Database(format!("{} is not a node record", record.identifier()))
        })?;

        let mut properties = node.raw_properties.clone();
        for field in node.changed_fields() {
            let value = node.properties.get(field).unwrap_or(&FieldValue::Null);
            let encoded = encode_property(value, node.raw_properties.get(field));
            properties.insert(field.to_string(), encoded);
        }

        let statement = format!(
            "UPDATE {} SET properties = $1 WHERE persistence_object_identifier = $2",
            self.table
        );
        let updated = self
            .client
            .execute(&statement, &[&Value::Object(properties), &node.persistence_id])
            .await?;

        if updated == 0 {
            return Err(AnonymizerError::Database(format!(
                "Node {} no longer exists",
                node.identifier
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::PostgreSQLConfig;
    use crate::config::secret_string;
    use crate::core::selection::TimeWindow;
    use chrono::NaiveDate;
    use test_case::test_case;

    async fn repository() -> PostgreSQLNodeRepository {
        let config = PostgreSQLConfig {
            connection_string: secret_string("postgresql://u:p@localhost/cms".to_string()),
            max_connections: 1,
            connection_timeout_seconds: 1,
            statement_timeout_seconds: 1,
            ssl_mode: "disable".to_string(),
            node_table: "node_data".to_string(),
            asset_table: "assets".to_string(),
            entity_identifier_column: "persistence_object_identifier".to_string(),
        };
        let client = Arc::new(PostgreSQLClient::new(config).await.unwrap());
        let assets = Arc::new(PostgreSQLAssetRepository::new(client.clone()));
        PostgreSQLNodeRepository::new(client, assets).unwrap()
    }

    #[test_case("Acme.Site:Comment", true ; "vendor package and name")]
    #[test_case("Neos.Neos:Document", true ; "core type")]
    #[test_case("Comment", false ; "missing package")]
    #[test_case("Acme.Site:", false ; "missing name")]
    #[test_case("Acme Site:Comment", false ; "whitespace")]
    #[tokio::test]
    async fn test_resolve_type(name: &str, expected: bool) {
        assert_eq!(repository().await.resolve_type(name).await.unwrap(), expected);
    }

    #[tokio::test]
    async fn test_select_statement_window() {
        let repository = repository().await;
        let until = NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();

        let unbounded = Selection {
            type_name: "Acme.Site:Comment".to_string(),
            window: None,
        };
        let sql = repository.select_statement(&unbounded);
        assert!(sql.contains("FROM \"node_data\" WHERE node_type = $1 ORDER BY"));

        let first_run = Selection {
            type_name: "Acme.Site:Comment".to_string(),
            window: Some(TimeWindow {
                field: "createdAt".to_string(),
                from: None,
                until,
            }),
        };
        let sql = repository.select_statement(&first_run);
        assert!(sql.contains("< $3"));
        assert!(!sql.contains("$4"));

        let resumed = Selection {
            window: Some(TimeWindow {
                field: "createdAt".to_string(),
                from: Some(until - chrono::Duration::days(1)),
                until,
            }),
            ..first_run
        };
        let sql = repository.select_statement(&resumed);
        assert!(sql.contains(">= $3"));
        assert!(sql.contains("< $4"));
    }
}
