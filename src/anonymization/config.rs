//! Per-type anonymization configuration
//!
//! Loaded once at startup and never mutated during a run.
//!
//! ```toml
//! [dummy_assets]
//! "image/jpeg" = "./dummies/portrait.jpg"
//!
//! [node_types."Acme.Site:Comment"]
//! date_time_filter = { property_name = "createdAt", older_than = -30 }
//!
//! [node_types."Acme.Site:Comment".properties]
//! email = { anonymize = true }
//! author = { shuffle = true }
//! ```

use super::timestamp;
use crate::domain::ids::{CheckpointName, RecordFamily};
use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

/// Masking policy for a single field
///
/// `shuffle` takes precedence over `anonymize`. Asset fields are substituted
/// regardless of either flag.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldPolicy {
    #[serde(default)]
    pub shuffle: bool,

    #[serde(default)]
    pub anonymize: bool,
}

impl FieldPolicy {
    pub fn shuffle() -> Self {
        Self {
            shuffle: true,
            anonymize: false,
        }
    }

    pub fn anonymize() -> Self {
        Self {
            shuffle: false,
            anonymize: true,
        }
    }
}

/// Largest accepted magnitude of a relative `older_than`, roughly 2700 years
pub const MAX_RELATIVE_DAYS: i64 = 1_000_000;

/// Upper bound of the selection window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawOlderThan", into = "RawOlderThan")]
pub enum OlderThan {
    /// Days relative to today 00:00:00, negative values lie in the past
    Days(i64),
    /// Absolute wall-clock timestamp
    At(NaiveDateTime),
}

impl OlderThan {
    /// Resolves the bound against the current wall-clock time
    ///
    /// Returns `None` when the relative offset leaves chrono's range.
    pub fn resolve(&self, now: NaiveDateTime) -> Option<NaiveDateTime> {
        match self {
            Self::Days(days) => now
                .date()
                .and_time(chrono::NaiveTime::MIN)
                .checked_add_signed(Duration::try_days(*days)?),
            Self::At(at) => Some(*at),
        }
    }
}

impl fmt::Display for OlderThan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Days(days) => write!(f, "{days}"),
            Self::At(at) => write!(f, "{}", at.format(crate::domain::value::DISPLAY_FORMAT)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum RawOlderThan {
    Days(i64),
    Literal(String),
}

impl TryFrom<RawOlderThan> for OlderThan {
    type Error = String;

    fn try_from(raw: RawOlderThan) -> Result<Self, Self::Error> {
        match raw {
            RawOlderThan::Days(days) => Ok(Self::Days(days)),
            RawOlderThan::Literal(literal) => {
                if let Ok(days) = literal.trim().parse::<i64>() {
                    return Ok(Self::Days(days));
                }
                timestamp::parse_literal(&literal)
                    .map(Self::At)
                    .ok_or_else(|| format!("Invalid older_than value: '{literal}'"))
            }
        }
    }
}

impl From<OlderThan> for RawOlderThan {
    fn from(value: OlderThan) -> Self {
        match value {
            OlderThan::Days(days) => Self::Days(days),
            OlderThan::At(_) => Self::Literal(value.to_string()),
        }
    }
}

/// Restricts selection to records whose timestamp field is older than a bound
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateTimeFilter {
    /// Timestamp field the window applies to
    pub property_name: String,

    pub older_than: OlderThan,
}

/// Configuration of one node type or domain model
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeConfig {
    #[serde(default)]
    pub date_time_filter: Option<DateTimeFilter>,

    /// Field name to masking policy
    #[serde(default)]
    pub properties: BTreeMap<String, FieldPolicy>,
}

/// Anonymization settings for both record families
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnonymizationConfig {
    /// Replacement files keyed by media type
    #[serde(default)]
    pub dummy_assets: BTreeMap<String, PathBuf>,

    #[serde(default)]
    pub node_types: Option<BTreeMap<String, TypeConfig>>,

    /// Keyed by table name
    #[serde(default)]
    pub domain_models: Option<BTreeMap<String, TypeConfig>>,
}

impl AnonymizationConfig {
    /// Configured types of one family, `None` if the section is absent
    pub fn types(&self, family: RecordFamily) -> Option<&BTreeMap<String, TypeConfig>> {
        match family {
            RecordFamily::NodeType => self.node_types.as_ref(),
            RecordFamily::DomainModel => self.domain_models.as_ref(),
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        for (media_type, path) in &self.dummy_assets {
            if !media_type.contains('/') {
                return Err(format!(
                    "dummy_assets key '{media_type}' is not a media type"
                ));
            }
            if path.as_os_str().is_empty() {
                return Err(format!("dummy_assets.\"{media_type}\" path cannot be empty"));
            }
        }

        if let Some(node_types) = &self.node_types {
            for (name, config) in node_types {
                if name.trim().is_empty() {
                    return Err("node_types cannot contain an empty name".to_string());
                }
                CheckpointName::for_type(RecordFamily::NodeType, name)
                    .map_err(|e| format!("node_types.\"{name}\": {e}"))?;
                config
                    .validate()
                    .map_err(|e| format!("node_types.\"{name}\": {e}"))?;
            }
        }

        if let Some(domain_models) = &self.domain_models {
            for (table, config) in domain_models {
                if !is_sql_identifier(table) {
                    return Err(format!(
                        "domain_models key '{table}' is not a valid table name"
                    ));
                }
                CheckpointName::for_type(RecordFamily::DomainModel, table)
                    .map_err(|e| format!("domain_models.\"{table}\": {e}"))?;
                config
                    .validate()
                    .map_err(|e| format!("domain_models.\"{table}\": {e}"))?;
            }
        }

        Ok(())
    }
}

impl TypeConfig {
    pub fn validate(&self) -> Result<(), String> {
        if let Some(filter) = &self.date_time_filter {
            if !is_sql_identifier(&filter.property_name) {
                return Err(format!(
                    "date_time_filter.property_name '{}' is not a valid identifier",
                    filter.property_name
                ));
            }
            if let OlderThan::Days(days) = filter.older_than {
                if !(-MAX_RELATIVE_DAYS..=MAX_RELATIVE_DAYS).contains(&days) {
                    return Err(format!(
                        "date_time_filter.older_than {days} exceeds {MAX_RELATIVE_DAYS} days"
                    ));
                }
            }
        }
        if self.properties.keys().any(|field| field.trim().is_empty()) {
            return Err("properties cannot contain an empty field name".to_string());
        }
        Ok(())
    }
}

/// Whether `name` matches `^[A-Za-z_][A-Za-z0-9_]*$`
pub fn is_sql_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}
