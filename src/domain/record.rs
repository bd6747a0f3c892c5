//! Record capability trait and the concrete record shapes
//!
//! The orchestrator only talks to [`Record`]; repositories downcast through
//! [`Record::as_any`] when they need the concrete shape back for persistence.

use super::value::FieldValue;
use serde_json::{Map, Value};
use std::any::Any;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Get/set-by-name access to a record's fields
pub trait Record: Send + Sync + fmt::Debug {
    /// Stable identifier used in report lines and persistence
    fn identifier(&self) -> &str;

    /// Returns the field value, or `None` when the record has no such field
    fn field(&self, name: &str) -> Option<&FieldValue>;

    /// Replaces a field value and marks it as changed
    fn set_field(&mut self, name: &str, value: FieldValue);

    /// Names of fields changed since the record was loaded
    fn changed_fields(&self) -> Vec<&str>;

    /// Downcast to Any for repository-specific persistence
    fn as_any(&self) -> &dyn Any;

    /// Whether any field was changed since the record was loaded
    fn is_changed(&self) -> bool {
        !self.changed_fields().is_empty()
    }
}

/// Content node with a free-form property bag
#[derive(Debug, Clone, PartialEq)]
pub struct NodeRecord {
    /// Persistence identifier of the node row
    pub persistence_id: String,

    /// Node identifier shown to users
    pub identifier: String,

    /// Node type name
    pub node_type: String,

    /// Decoded properties
    pub properties: BTreeMap<String, FieldValue>,

    /// Properties as they were encoded in storage
    pub raw_properties: Map<String, Value>,

    changed: BTreeSet<String>,
}

impl NodeRecord {
    pub fn new(
        persistence_id: impl Into<String>,
        identifier: impl Into<String>,
        node_type: impl Into<String>,
    ) -> Self {
        Self {
            persistence_id: persistence_id.into(),
            identifier: identifier.into(),
            node_type: node_type.into(),
            properties: BTreeMap::new(),
            raw_properties: Map::new(),
            changed: BTreeSet::new(),
        }
    }

    /// Adds a decoded property without marking it as changed
    pub fn with_property(mut self, name: impl Into<String>, value: FieldValue) -> Self {
        self.properties.insert(name.into(), value);
        self
    }
}

impl Record for NodeRecord {
    fn identifier(&self) -> &str {
        &self.identifier
    }

    fn field(&self, name: &str) -> Option<&FieldValue> {
        self.properties.get(name)
    }

    fn set_field(&mut self, name: &str, value: FieldValue) {
        self.properties.insert(name.to_string(), value);
        self.changed.insert(name.to_string());
    }

    fn changed_fields(&self) -> Vec<&str> {
        self.changed.iter().map(String::as_str).collect()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Row of an arbitrary domain model table
#[derive(Debug, Clone, PartialEq)]
pub struct EntityRecord {
    /// Table the row was loaded from
    pub table: String,

    /// Value of the identifier column
    pub identifier: String,

    /// Decoded column values
    pub fields: BTreeMap<String, FieldValue>,

    changed: BTreeSet<String>,
}

impl EntityRecord {
    pub fn new(table: impl Into<String>, identifier: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            identifier: identifier.into(),
            fields: BTreeMap::new(),
            changed: BTreeSet::new(),
        }
    }

    /// Adds a decoded column value without marking it as changed
    pub fn with_field(mut self, name: impl Into<String>, value: FieldValue) -> Self {
        self.fields.insert(name.into(), value);
        self
    }
}

impl Record for EntityRecord {
    fn identifier(&self) -> &str {
        &self.identifier
    }

    fn field(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    fn set_field(&mut self, name: &str, value: FieldValue) {
        self.fields.insert(name.to_string(), value);
        self.changed.insert(name.to_string());
    }

    fn changed_fields(&self) -> Vec<&str> {
        self.changed.iter().map(String::as_str).collect()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
