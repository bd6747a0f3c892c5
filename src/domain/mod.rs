//! Domain models and types for the anonymizer.
//!
//! # Overview
//!
//! The domain layer provides:
//! - **Identifiers** ([`RecordFamily`], [`CheckpointName`])
//! - **Field values** ([`FieldValue`], [`Asset`], [`ResourceRef`])
//! - **Records** ([`Record`] capability trait, [`NodeRecord`], [`EntityRecord`])
//! - **Error types** ([`AnonymizerError`]) and the [`Result`] alias
//!
//! # Error Handling
//!
//! All fallible operations return [`Result<T, AnonymizerError>`]:
//!
//! ```rust
//! use anonymizer::domain::{AnonymizerError, Result};
//!
//! fn example() -> Result<()> {
//!     Err(AnonymizerError::Validation("no such table".to_string()))
//! }
//! ```

pub mod errors;
pub mod ids;
pub mod record;
pub mod result;
pub mod value;

// Re-export commonly used types for convenience
pub use errors::AnonymizerError;
pub use ids::{CheckpointName, RecordFamily};
pub use record::{EntityRecord, NodeRecord, Record};
pub use result::Result;
pub use value::{Asset, FieldValue, ResourceRef};
