//! Field values carried by records
//!
//! The masker only distinguishes strings, timestamps and assets. Everything
//! else is kept as raw JSON and passes through untouched.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Display format used in report lines
pub const DISPLAY_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Reference to a stored binary resource
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceRef {
    /// SHA-256 of the resource content (hex)
    pub sha256: String,

    /// Filename presented to clients
    pub filename: String,

    /// Storage collection the resource lives in
    pub collection: String,
}

/// Media asset wrapping a binary resource
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Asset {
    /// Persistence identifier of the asset
    pub identifier: String,

    /// Media type, e.g. `image/jpeg`
    pub media_type: String,

    /// Underlying binary resource
    pub resource: ResourceRef,
}

impl Asset {
    /// Returns the asset with its resource replaced, keeping identity and media type
    pub fn with_resource(mut self, resource: ResourceRef) -> Self {
        self.resource = resource;
        self
    }
}

/// Value of a single record field
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// Empty / deleted value
    Null,
    /// String value
    Text(String),
    /// Wall-clock timestamp without time zone
    Timestamp(NaiveDateTime),
    /// Media asset reference
    Asset(Asset),
    /// Any other value, kept verbatim
    Other(Value),
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Text(text) => f.write_str(text),
            Self::Timestamp(ts) => write!(f, "{}", ts.format(DISPLAY_FORMAT)),
            Self::Asset(_) => f.write_str("Asset"),
            Self::Other(value) => write!(f, "{value}"),
        }
    }
}
