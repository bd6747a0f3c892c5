//! PostgreSQL row models
//!
//! This module defines the checkpoint row structure and the JSON encoding of
//! node properties as they are stored in the `properties` JSONB column.

use crate::core::state::Checkpoint;
use crate::domain::ids::CheckpointName;
use crate::domain::{AnonymizerError, FieldValue, Result};
use chrono::{Datelike, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tokio_postgres::Row;

/// Checkpoint row
///
/// This structure maps to the `anonymization_checkpoints` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostgreSQLCheckpoint {
    /// Surrogate key, absent before insert
    pub id: Option<i64>,

    /// Prefixed type name
    pub name: String,

    pub from_time: Option<NaiveDateTime>,

    /// Nullable in the schema; rows without it are ignored on resumption
    pub to_time: Option<NaiveDateTime>,

    pub executed_at: NaiveDateTime,

    pub records_processed: i64,
}

impl PostgreSQLCheckpoint {
    /// Convert from domain Checkpoint to a row
    pub fn from_domain(checkpoint: &Checkpoint) -> Self {
        Self {
            id: None,
            name: checkpoint.name.to_string(),
            from_time: checkpoint.from_time,
            to_time: Some(checkpoint.to_time),
            executed_at: checkpoint.executed_at,
            records_processed: i64::try_from(checkpoint.records_processed).unwrap_or(i64::MAX),
        }
    }

    /// Read a row selected with [`CHECKPOINT_COLUMNS`]
    pub fn from_row(row: &Row) -> Result<Self> {
        Ok(Self {
            id: Some(row.try_get("id")?),
            name: row.try_get("name")?,
            from_time: row.try_get("from_time")?,
            to_time: row.try_get("to_time")?,
            executed_at: row.try_get("executed_at")?,
            records_processed: row.try_get("records_processed")?,
        })
    }

    /// Convert to domain Checkpoint
    ///
    /// # Errors
    ///
    /// Returns an error if the row has no `to_time` or an invalid name.
    pub fn to_domain(&self) -> Result<Checkpoint> {
        let name = CheckpointName::new(self.name.clone()).map_err(AnonymizerError::Checkpoint)?;
        let to_time = self.to_time.ok_or_else(|| {
            AnonymizerError::Checkpoint(format!("Checkpoint {} has no to_time", self.name))
        })?;

        Ok(Checkpoint {
            name,
            from_time: self.from_time,
            to_time,
            executed_at: self.executed_at,
            records_processed: u64::try_from(self.records_processed).unwrap_or(0),
        })
    }
}

/// Column list of checkpoint selects
pub const CHECKPOINT_COLUMNS: &str = "id, name, from_time, to_time, executed_at, records_processed";

/// Key holding the wall-clock part of an encoded datetime
const DATE_KEY: &str = "date";

/// Format of the `date` key after the year, microsecond precision
const DATE_FORMAT: &str = "-%m-%d %H:%M:%S%.6f";

const DATE_PARSE_FORMAT: &str = "-%m-%d %H:%M:%S%.f";

/// Suffix PostgreSQL uses for years before 1 AD
const BC_SUFFIX: &str = " BC";

const IDENTIFIER_KEY: &str = "__identifier";
const OBJECT_TYPE_KEY: &str = "__flow_object_type";

/// Object type written for asset references that had none
pub const DEFAULT_ASSET_OBJECT_TYPE: &str = "Neos\\Media\\Domain\\Model\\Asset";

/// Decoded node property before asset references are resolved
#[derive(Debug, Clone, PartialEq)]
pub enum StoredProperty {
    Value(FieldValue),
    /// Reference to an asset row that still has to be loaded
    AssetReference { identifier: String },
}

/// Decode a single property from its JSON encoding
///
/// Strings become text, `{date, timezone_type, timezone}` objects become
/// timestamps and `{__identifier, __flow_object_type}` objects become asset
/// references. Everything else is carried verbatim.
pub fn decode_property(value: &Value) -> StoredProperty {
    match value {
        Value::Null => StoredProperty::Value(FieldValue::Null),
        Value::String(text) => StoredProperty::Value(FieldValue::Text(text.clone())),
        Value::Object(object) => {
            if let Some(ts) = decode_datetime(object) {
                return StoredProperty::Value(FieldValue::Timestamp(ts));
            }
            if let (Some(Value::String(identifier)), Some(Value::String(object_type))) =
                (object.get(IDENTIFIER_KEY), object.get(OBJECT_TYPE_KEY))
            {
                if object_type.contains("Media") {
                    return StoredProperty::AssetReference {
                        identifier: identifier.clone(),
                    };
                }
            }
            StoredProperty::Value(FieldValue::Other(value.clone()))
        }
        other => StoredProperty::Value(FieldValue::Other(other.clone())),
    }
}

fn decode_datetime(object: &Map<String, Value>) -> Option<NaiveDateTime> {
    if !object.contains_key("timezone") {
        return None;
    }
    let date = object.get(DATE_KEY)?.as_str()?;
    parse_timestamp(date, DATE_PARSE_FORMAT)
}

/// Formats a timestamp the way PostgreSQL reads it back
///
/// `rest` is the chrono format of everything after the year. PostgreSQL has no
/// year 0, so an astronomical year `y <= 0` is written as `1 - y` with a ` BC`
/// suffix.
pub fn format_timestamp(ts: &NaiveDateTime, rest: &str) -> String {
    let year = ts.year();
    let body = ts.format(rest);
    if year > 0 {
        format!("{year:04}{body}")
    } else {
        format!("{:04}{body}{BC_SUFFIX}", 1 - year)
    }
}

/// Parses text written by [`format_timestamp`] or by PostgreSQL
pub fn parse_timestamp(text: &str, rest: &str) -> Option<NaiveDateTime> {
    let (year, body) = split_year(text)?;
    // 2000 is a leap year, so any month and day parse before the real year is set
    let parsed = NaiveDateTime::parse_from_str(&format!("2000{body}"), &format!("%Y{rest}")).ok()?;
    with_year(&parsed, year)
}

/// Splits `text` into its astronomical year and the remainder after the year
pub fn split_year(text: &str) -> Option<(i32, &str)> {
    let (text, bc) = match text.strip_suffix(BC_SUFFIX) {
        Some(text) => (text, true),
        None => (text, false),
    };
    let end = text.find(|c: char| !c.is_ascii_digit())?;
    let year: i32 = text[..end].parse().ok()?;
    Some((if bc { 1 - year } else { year }, &text[end..]))
}

/// `ts` moved to `year`, keeping month, day and time
pub fn with_year(ts: &NaiveDateTime, year: i32) -> Option<NaiveDateTime> {
    Some(NaiveDate::from_ymd_opt(year, ts.month(), ts.day())?.and_time(ts.time()))
}

/// Encode a property value for storage
///
/// `original` is the value as it was loaded; time zone metadata of datetimes
/// and the object type of asset references are taken from it.
pub fn encode_property(value: &FieldValue, original: Option<&Value>) -> Value {
    match value {
        FieldValue::Null => Value::Null,
        FieldValue::Text(text) => Value::String(text.clone()),
        FieldValue::Timestamp(ts) => {
            let mut object = match original {
                Some(Value::Object(object)) => object.clone(),
                _ => {
                    let mut object = Map::new();
                    object.insert("timezone_type".to_string(), json!(3));
                    object.insert("timezone".to_string(), json!("UTC"));
                    object
                }
            };
            object.insert(
                DATE_KEY.to_string(),
                Value::String(format_timestamp(ts, DATE_FORMAT)),
            );
            Value::Object(object)
        }
        FieldValue::Asset(asset) => {
            let object_type = original
                .and_then(|original| original.get(OBJECT_TYPE_KEY))
                .and_then(Value::as_str)
                .unwrap_or(DEFAULT_ASSET_OBJECT_TYPE);
            json!({
                IDENTIFIER_KEY: asset.identifier,
                OBJECT_TYPE_KEY: object_type,
            })
        }
        FieldValue::Other(value) => value.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::state::CheckpointBuilder;
    use crate::domain::ids::RecordFamily;
    use crate::domain::{Asset, ResourceRef};
    use chrono::NaiveDate;

    fn ts(h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2023, 10, 9)
            .unwrap()
            .and_hms_opt(h, m, s)
            .unwrap()
    }

    #[test]
    fn test_checkpoint_conversion() {
        let name = CheckpointName::for_type(RecordFamily::DomainModel, "orders").unwrap();
        let checkpoint = CheckpointBuilder::new(name, ts(12, 0, 0))
            .from_time(Some(ts(6, 0, 0)))
            .executed_at(ts(12, 0, 5))
            .records_processed(7)
            .build();

        let row = PostgreSQLCheckpoint::from_domain(&checkpoint);
        assert_eq!(row.name, "domainModel::orders");
        assert_eq!(row.records_processed, 7);
        assert_eq!(row.to_domain().unwrap(), checkpoint);
    }

    #[test]
    fn test_checkpoint_without_to_time_is_rejected() {
        let row = PostgreSQLCheckpoint {
            id: Some(1),
            name: "nodeType::A".to_string(),
            from_time: None,
            to_time: None,
            executed_at: ts(1, 0, 0),
            records_processed: 0,
        };
        assert!(matches!(row.to_domain(), Err(AnonymizerError::Checkpoint(_))));
    }

    #[test]
    fn test_decode_datetime_property() {
        let value = json!({
            "date": "2023-10-09 08:38:22.000000",
            "timezone_type": 3,
            "timezone": "Europe/Berlin"
        });
        assert_eq!(
            decode_property(&value),
            StoredProperty::Value(FieldValue::Timestamp(ts(8, 38, 22)))
        );
    }

    #[test]
    fn test_decode_asset_reference() {
        let value = json!({
            "__flow_object_type": "Neos\\Media\\Domain\\Model\\Image",
            "__identifier": "a-1"
        });
        assert_eq!(
            decode_property(&value),
            StoredProperty::AssetReference {
                identifier: "a-1".to_string()
            }
        );
    }

    #[test]
    fn test_decode_passthrough() {
        assert_eq!(
            decode_property(&json!(true)),
            StoredProperty::Value(FieldValue::Other(json!(true)))
        );
        let node_ref = json!({ "__flow_object_type": "Acme\\Thing", "__identifier": "x" });
        assert_eq!(
            decode_property(&node_ref),
            StoredProperty::Value(FieldValue::Other(node_ref.clone()))
        );
    }

    #[test]
    fn test_encode_datetime_keeps_timezone() {
        let original = json!({
            "date": "2023-10-09 08:38:22.000000",
            "timezone_type": 3,
            "timezone": "Europe/Berlin"
        });
        let encoded = encode_property(&FieldValue::Timestamp(ts(1, 2, 3)), Some(&original));
        assert_eq!(
            encoded,
            json!({
                "date": "2023-10-09 01:02:03.000000",
                "timezone_type": 3,
                "timezone": "Europe/Berlin"
            })
        );
    }

    #[test]
    fn test_years_before_one_use_bc_notation() {
        let year_zero = NaiveDate::from_ymd_opt(0, 3, 7)
            .unwrap()
            .and_hms_opt(4, 0, 57)
            .unwrap();
        let encoded = encode_property(&FieldValue::Timestamp(year_zero), None);
        assert_eq!(encoded["date"], json!("0001-03-07 04:00:57.000000 BC"));
        assert_eq!(
            decode_property(&encoded),
            StoredProperty::Value(FieldValue::Timestamp(year_zero))
        );

        // Year -1 is 2 BC; leap day of year 0 survives the round trip
        let leap_day = NaiveDate::from_ymd_opt(0, 2, 29)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let text = format_timestamp(&leap_day, DATE_FORMAT);
        assert_eq!(text, "0001-02-29 00:00:00.000000 BC");
        assert_eq!(parse_timestamp(&text, DATE_PARSE_FORMAT), Some(leap_day));

        let two_bc = NaiveDate::from_ymd_opt(-1, 11, 30)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        assert_eq!(
            format_timestamp(&two_bc, DATE_FORMAT),
            "0002-11-30 00:00:00.000000 BC"
        );
    }

    #[test]
    fn test_year_above_9999_has_no_sign() {
        let far = NaiveDate::from_ymd_opt(10008, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let text = format_timestamp(&far, DATE_FORMAT);
        assert_eq!(text, "10008-01-01 00:00:00.000000");
        assert_eq!(parse_timestamp(&text, DATE_PARSE_FORMAT), Some(far));
        assert_eq!(parse_timestamp("-0001-01-01 00:00:00", DATE_PARSE_FORMAT), None);
    }

    #[test]
    fn test_encode_asset_keeps_object_type() {
        let original = json!({
            "__flow_object_type": "Neos\\Media\\Domain\\Model\\Image",
            "__identifier": "a-1"
        });
        let asset = Asset {
            identifier: "a-1".into(),
            media_type: "image/png".into(),
            resource: ResourceRef {
                sha256: "new".into(),
                filename: "x.png".into(),
                collection: "persistent".into(),
            },
        };
        assert_eq!(encode_property(&FieldValue::Asset(asset), Some(&original)), original);
        assert_eq!(encode_property(&FieldValue::Null, Some(&original)), Value::Null);
    }
}
