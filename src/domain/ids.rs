//! Record family and checkpoint identifier types
//!
//! Node types and domain models are tracked in the same checkpoint table, so
//! every checkpoint name carries a family prefix. Identically named node types
//! and domain models therefore never share a resumption point.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Maximum length of a checkpoint name (VARCHAR(255) column)
pub const MAX_CHECKPOINT_NAME_LEN: usize = 255;

/// The two independent record-type families handled by the anonymizer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordFamily {
    /// Structured content nodes, selected by node type name
    NodeType,
    /// Arbitrary domain entities, selected by table name
    DomainModel,
}

impl RecordFamily {
    /// Namespace prefix used in checkpoint names
    pub fn checkpoint_prefix(&self) -> &'static str {
        match self {
            Self::NodeType => "nodeType",
            Self::DomainModel => "domainModel",
        }
    }

    /// Human readable label used in report lines
    pub fn label(&self) -> &'static str {
        match self {
            Self::NodeType => "NodeType",
            Self::DomainModel => "Domain Model",
        }
    }

    /// Plural label used when the family has no configuration
    pub fn plural_label(&self) -> &'static str {
        match self {
            Self::NodeType => "NodeTypes",
            Self::DomainModel => "Domain Models",
        }
    }
}

impl fmt::Display for RecordFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Checkpoint name newtype wrapper
///
/// Format: `{family_prefix}::{type_name}`
///
/// # Examples
///
/// ```
/// use anonymizer::domain::ids::{CheckpointName, RecordFamily};
///
/// let name = CheckpointName::for_type(RecordFamily::NodeType, "Acme.Site:Comment").unwrap();
/// assert_eq!(name.as_str(), "nodeType::Acme.Site:Comment");
/// assert_eq!(name.type_name(), "Acme.Site:Comment");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CheckpointName(String);

impl CheckpointName {
    /// Creates a checkpoint name from an already prefixed string
    ///
    /// # Returns
    ///
    /// Returns `Err` if the name is empty or longer than 255 characters
    pub fn new(name: impl Into<String>) -> Result<Self, String> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err("Checkpoint name cannot be empty".to_string());
        }
        if name.chars().count() > MAX_CHECKPOINT_NAME_LEN {
            return Err(format!(
                "Checkpoint name exceeds {MAX_CHECKPOINT_NAME_LEN} characters: {name}"
            ));
        }
        Ok(Self(name))
    }

    /// Builds the checkpoint name for a configured type of the given family
    pub fn for_type(family: RecordFamily, type_name: &str) -> Result<Self, String> {
        if type_name.trim().is_empty() {
            return Err("Type name cannot be empty".to_string());
        }
        Self::new(format!("{}::{}", family.checkpoint_prefix(), type_name))
    }

    /// Returns the checkpoint name as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Type name without the family prefix
    pub fn type_name(&self) -> &str {
        self.0
            .split_once("::")
            .map(|(_, name)| name)
            .unwrap_or(&self.0)
    }
}

impl fmt::Display for CheckpointName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for CheckpointName {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl AsRef<str> for CheckpointName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
