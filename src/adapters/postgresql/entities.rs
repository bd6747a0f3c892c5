//! PostgreSQL domain model repository
//!
//! A domain model is any table of the database. Column kinds are discovered
//! from `information_schema` on first use and cached for the lifetime of the
//! repository. Rows are read and written as JSON so no per-table row mapping
//! is needed.

use super::assets::PostgreSQLAssetRepository;
use super::client::{quote_ident, PostgreSQLClient};
use super::models::{format_timestamp, parse_timestamp, split_year, with_year};
use crate::adapters::database::traits::RecordRepository;
use crate::core::selection::Selection;
use crate::domain::{AnonymizerError, EntityRecord, FieldValue, Record, Result};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Local, NaiveDateTime, TimeZone};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio_postgres::types::ToSql;

const COLUMNS_QUERY: &str = "\
SELECT c.column_name::text AS column_name,
       c.data_type::text AS data_type,
       EXISTS (
           SELECT 1
           FROM information_schema.table_constraints tc
           JOIN information_schema.key_column_usage k
             ON k.constraint_name = tc.constraint_name
            AND k.constraint_schema = tc.constraint_schema
           JOIN information_schema.constraint_column_usage u
             ON u.constraint_name = tc.constraint_name
            AND u.constraint_schema = tc.constraint_schema
           WHERE tc.constraint_type = 'FOREIGN KEY'
             AND k.table_schema = c.table_schema
             AND k.table_name = c.table_name
             AND k.column_name = c.column_name
             AND u.table_name = $2
       ) AS references_asset
FROM information_schema.columns c
WHERE c.table_schema = current_schema()
  AND c.table_name = $1
ORDER BY c.ordinal_position";

/// Storage kind of a column, as far as masking is concerned
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Text,
    /// `timestamp without time zone`
    Timestamp,
    /// `timestamp with time zone`, handled in local time
    TimestampTz,
    /// Foreign key into the asset table
    AssetReference,
    Other,
}

impl ColumnKind {
    fn from_information_schema(data_type: &str, references_asset: bool) -> Self {
        if references_asset {
            return Self::AssetReference;
        }
        match data_type {
            "text" | "character varying" | "character" => Self::Text,
            "timestamp without time zone" => Self::Timestamp,
            "timestamp with time zone" => Self::TimestampTz,
            _ => Self::Other,
        }
    }
}

/// Column layout of one table
#[derive(Debug, Clone, Default)]
pub struct TableSchema {
    pub columns: BTreeMap<String, ColumnKind>,
}

/// `timestamp` column format after the year, as written by `to_jsonb`
const TIMESTAMP_FORMAT: &str = "-%m-%dT%H:%M:%S%.f";

/// `timestamptz` values are written in UTC
const TIMESTAMPTZ_FORMAT: &str = "-%m-%dT%H:%M:%S%.f+00:00";

/// Row value before asset references are resolved
enum Decoded {
    Value(FieldValue),
    AssetReference(String),
}

fn decode_column(kind: ColumnKind, value: &Value) -> Decoded {
    let decoded = match (kind, value) {
        (_, Value::Null) => FieldValue::Null,
        (ColumnKind::Text, Value::String(text)) => FieldValue::Text(text.clone()),
        (ColumnKind::Timestamp, Value::String(text)) => match parse_timestamp(text, TIMESTAMP_FORMAT) {
            Some(ts) => FieldValue::Timestamp(ts),
            None => FieldValue::Other(value.clone()),
        },
        (ColumnKind::TimestampTz, Value::String(text)) => match parse_timestamptz(text) {
            Some(ts) => FieldValue::Timestamp(ts),
            None => FieldValue::Other(value.clone()),
        },
        (ColumnKind::AssetReference, Value::String(identifier)) => {
            return Decoded::AssetReference(identifier.clone())
        }
        _ => FieldValue::Other(value.clone()),
    };
    Decoded::Value(decoded)
}

fn encode_column(kind: ColumnKind, value: &FieldValue) -> Value {
    match value {
        FieldValue::Null => Value::Null,
        FieldValue::Text(text) => Value::String(text.clone()),
        FieldValue::Timestamp(ts) => {
            let encoded = match kind {
                ColumnKind::TimestampTz => Local
                    .from_local_datetime(ts)
                    .earliest()
                    .map(|local| format_timestamp(&local.naive_utc(), TIMESTAMPTZ_FORMAT)),
                _ => None,
            };
            Value::String(encoded.unwrap_or_else(|| format_timestamp(ts, TIMESTAMP_FORMAT)))
        }
        FieldValue::Asset(asset) => Value::String(asset.identifier.clone()),
        FieldValue::Other(value) => value.clone(),
    }
}

/// Local wall-clock time of a `timestamptz` rendered by `to_jsonb`
fn parse_timestamptz(text: &str) -> Option<NaiveDateTime> {
    let (year, body) = split_year(text)?;
    let parsed = DateTime::parse_from_rfc3339(&format!("2000{body}")).ok()?;
    let wall = with_year(&parsed.naive_local(), year)?;
    let utc = wall.checked_sub_signed(Duration::seconds(i64::from(
        parsed.offset().local_minus_utc(),
    )))?;
    Some(Local.from_utc_datetime(&utc).naive_local())
}

fn identifier_text(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::Null => None,
        Value::String(text) => Some(text.clone()),
        other => Some(other.to_string()),
    }
}

/// Domain model storage
pub struct PostgreSQLEntityRepository {
    client: Arc<PostgreSQLClient>,
    assets: Arc<PostgreSQLAssetRepository>,
    identifier_column: String,
    schemas: RwLock<HashMap<String, Arc<TableSchema>>>,
}

impl PostgreSQLEntityRepository {
    pub fn new(client: Arc<PostgreSQLClient>, assets: Arc<PostgreSQLAssetRepository>) -> Self {
        let identifier_column = client.config().entity_identifier_column.clone();
        Self {
            client,
            assets,
            identifier_column,
            schemas: RwLock::new(HashMap::new()),
        }
    }

    /// Column layout of `table`, empty if the table does not exist
    pub async fn table_schema(&self, table: &str) -> Result<Arc<TableSchema>> {
        if let Some(schema) = self.schemas.read().await.get(table) {
            return Ok(schema.clone());
        }

        let asset_table = &self.client.config().asset_table;
        let rows = self.client.query(COLUMNS_QUERY, &[&table, asset_table]).await?;

        let mut schema = TableSchema::default();
        for row in &rows {
            let name: String = row.try_get("column_name")?;
            let data_type: String = row.try_get("data_type")?;
            let references_asset: bool = row.try_get("references_asset")?;
            schema
                .columns
                .insert(name, ColumnKind::from_information_schema(&data_type, references_asset));
        }

        tracing::debug!(table = %table, columns = schema.columns.len(), "Loaded table schema");

        let schema = Arc::new(schema);
        self.schemas
            .write()
            .await
            .insert(table.to_string(), schema.clone());
        Ok(schema)
    }

    fn select_statement(&self, selection: &Selection) -> String {
        let mut query = format!(
            "SELECT to_jsonb(t) AS row FROM {} AS t",
            quote_ident(&selection.type_name)
        );

        if let Some(window) = &selection.window {
            let field = format!("t.{}", quote_ident(&window.field));
            if window.from.is_some() {
                query.push_str(&format!(
                    " WHERE {field} >= $1::timestamp AND {field} < $2::timestamp"
                ));
            } else {
                query.push_str(&format!(" WHERE {field} < $1::timestamp"));
            }
        }

        query.push_str(&format!(" ORDER BY t.{}", quote_ident(&self.identifier_column)));
        query
    }

    fn update_statement(&self, table: &str, columns: &[&str]) -> String {
        let assignments = columns
            .iter()
            .map(|column| {
                let column = quote_ident(column);
                format!("{column} = r.{column}")
            })
            .collect::<Vec<_>>()
            .join(", ");
        let table = quote_ident(table);

        format!(
            "UPDATE {table} AS t SET {assignments} \
             FROM jsonb_populate_record(NULL::{table}, $1::jsonb) AS r \
             WHERE t.{}::text = $2",
            quote_ident(&self.identifier_column)
        )
    }
}

#[async_trait]
impl RecordRepository for PostgreSQLEntityRepository {
    async fn resolve_type(&self, type_name: &str) -> Result<bool> {
        let schema = self.table_schema(type_name).await?;
        if schema.columns.is_empty() {
            return Ok(false);
        }
        if !schema.columns.contains_key(&self.identifier_column) {
            tracing::warn!(
                table = %type_name,
                column = %self.identifier_column,
                "Table has no identifier column"
            );
            return Ok(false);
        }
        Ok(true)
    }

    async fn find_records(&self, selection: &Selection) -> Result<Vec<Box<dyn Record>>> {
        let table = &selection.type_name;
        let schema = self.table_schema(table).await?;

        if let Some(window) = &selection.window {
            match schema.columns.get(&window.field) {
                Some(ColumnKind::Timestamp | ColumnKind::TimestampTz) => {}
                Some(_) => {
                    return Err(AnonymizerError::Validation(format!(
                        "Column {table}.{} is not a timestamp",
                        window.field
                    )))
                }
                None => {
                    return Err(AnonymizerError::Validation(format!(
                        "Column {table}.{} does not exist",
                        window.field
                    )))
                }
            }
        }

        let mut params: Vec<&(dyn ToSql + Sync)> = Vec::new();
        if let Some(window) = &selection.window {
            if let Some(from) = &window.from {
                params.push(from);
            }
            params.push(&window.until);
        }

        let rows = self
            .client
            .query(&self.select_statement(selection), &params)
            .await?;

        let mut loaded = Vec::with_capacity(rows.len());
        let mut asset_ids = Vec::new();
        for row in &rows {
            let json: Value = row.try_get("row")?;
            let Value::Object(columns) = json else {
                continue;
            };

            let identifier = identifier_text(columns.get(&self.identifier_column)).ok_or_else(|| {
                AnonymizerError::Database(format!(
                    "Row of {table} has no {} value",
                    self.identifier_column
                ))
            })?;

            let mut decoded = Vec::with_capacity(schema.columns.len());
            for (column, kind) in &schema.columns {
                let value = columns.get(column).unwrap_or(&Value::Null);
                let field = decode_column(*kind, value);
                if let Decoded::AssetReference(asset_id) = &field {
                    asset_ids.push(asset_id.clone());
                }
                decoded.push((column.clone(), field));
            }
            loaded.push((identifier, decoded));
        }

        asset_ids.sort();
        asset_ids.dedup();
        let assets = self.assets.find_assets(&asset_ids).await?;

        let records = loaded
            .into_iter()
            .map(|(identifier, decoded)| {
                let mut entity = EntityRecord::new(table.clone(), identifier);
                for (column, field) in decoded {
                    let value = match field {
                        Decoded::Value(value) => value,
                        Decoded::AssetReference(asset_id) => match assets.get(&asset_id) {
                            Some(asset) => FieldValue::Asset(asset.clone()),
                            None => FieldValue::Other(Value::String(asset_id)),
                        },
                    };
                    entity = entity.with_field(column, value);
                }
                Box::new(entity) as Box<dyn Record>
            })
            .collect();

        Ok(records)
    }

    async fn update_record(&self, record: &dyn Record) -> Result<()> {
        let entity = record.as_any().downcast_ref::<EntityRecord>().ok_or_else(|| {
            AnonymizerError::Database(format!("{} is not a domain model record", record.identifier()))
        })?;

        let changed = entity.changed_fields();
        if changed.is_empty() {
            return Ok(());
        }

        let schema = self.table_schema(&entity.table).await?;
        let mut values = Map::new();
        for column in &changed {
            let kind = schema.columns.get(*column).copied().unwrap_or(ColumnKind::Other);
            let value = entity.fields.get(*column).unwrap_or(&FieldValue::Null);
            values.insert((*column).to_string(), encode_column(kind, value));
        }

        let statement = self.update_statement(&entity.table, &changed);
        let updated = self
            .client
            .execute(&statement, &[&Value::Object(values), &entity.identifier])
            .await?;

        if updated == 0 {
            return Err(AnonymizerError::Database(format!(
                "{} row {} no longer exists",
                entity.table, entity.identifier
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, NaiveDate};
    use serde_json::json;
    use test_case::test_case;

    #[test_case("character varying", false, ColumnKind::Text)]
    #[test_case("timestamp without time zone", false, ColumnKind::Timestamp)]
    #[test_case("timestamp with time zone", false, ColumnKind::TimestampTz)]
    #[test_case("character varying", true, ColumnKind::AssetReference)]
    #[test_case("integer", false, ColumnKind::Other)]
    fn test_column_kind(data_type: &str, references_asset: bool, expected: ColumnKind) {
        assert_eq!(
            ColumnKind::from_information_schema(data_type, references_asset),
            expected
        );
    }

    #[test]
    fn test_timestamp_column_codec() {
        let ts = NaiveDate::from_ymd_opt(2023, 10, 9)
            .unwrap()
            .and_hms_opt(8, 38, 22)
            .unwrap();

        let encoded = encode_column(ColumnKind::Timestamp, &FieldValue::Timestamp(ts));
        assert_eq!(encoded, json!("2023-10-09T08:38:22"));
        match decode_column(ColumnKind::Timestamp, &encoded) {
            Decoded::Value(FieldValue::Timestamp(back)) => assert_eq!(back, ts),
            _ => panic!("timestamp not decoded"),
        }
    }

    #[test]
    fn test_timestamp_before_year_one() {
        let ts = NaiveDate::from_ymd_opt(0, 3, 7)
            .unwrap()
            .and_hms_opt(4, 0, 57)
            .unwrap();

        let encoded = encode_column(ColumnKind::Timestamp, &FieldValue::Timestamp(ts));
        assert_eq!(encoded, json!("0001-03-07T04:00:57 BC"));
        match decode_column(ColumnKind::Timestamp, &encoded) {
            Decoded::Value(FieldValue::Timestamp(back)) => assert_eq!(back, ts),
            _ => panic!("BC timestamp not decoded"),
        }
    }

    #[test]
    fn test_timestamptz_round_trip() {
        for ts in [
            NaiveDate::from_ymd_opt(2023, 10, 9).unwrap().and_hms_opt(8, 38, 22).unwrap(),
            NaiveDate::from_ymd_opt(-1, 6, 1).unwrap().and_hms_opt(12, 0, 0).unwrap(),
        ] {
            let encoded = encode_column(ColumnKind::TimestampTz, &FieldValue::Timestamp(ts));
            let text = encoded.as_str().unwrap();
            assert!(text.contains("+00:00"));
            assert_eq!(text.ends_with(" BC"), ts.year() <= 0);
            match decode_column(ColumnKind::TimestampTz, &encoded) {
                Decoded::Value(FieldValue::Timestamp(back)) => assert_eq!(back, ts),
                _ => panic!("timestamptz not decoded"),
            }
        }
        assert!(parse_timestamptz("2023-10-09T08:38:22+02:00").is_some());
    }

    #[test]
    fn test_decode_by_kind() {
        assert!(matches!(
            decode_column(ColumnKind::Text, &json!("Main St")),
            Decoded::Value(FieldValue::Text(_))
        ));
        assert!(matches!(
            decode_column(ColumnKind::Text, &Value::Null),
            Decoded::Value(FieldValue::Null)
        ));
        assert!(matches!(
            decode_column(ColumnKind::AssetReference, &json!("a-1")),
            Decoded::AssetReference(id) if id == "a-1"
        ));
        assert!(matches!(
            decode_column(ColumnKind::Other, &json!(42)),
            Decoded::Value(FieldValue::Other(_))
        ));
    }

    #[test]
    fn test_identifier_text() {
        assert_eq!(identifier_text(Some(&json!("abc"))), Some("abc".to_string()));
        assert_eq!(identifier_text(Some(&json!(42))), Some("42".to_string()));
        assert_eq!(identifier_text(Some(&Value::Null)), None);
        assert_eq!(identifier_text(None), None);
    }
}
