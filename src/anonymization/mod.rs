//! Field-level anonymization
//!
//! # Architecture
//!
//! - **Configuration**: per-type field policies and time filters ([`config`])
//! - **Strategies**: shuffle and randomize ([`anonymizer`])
//! - **Masking**: policy resolution for a single field ([`FieldMasker`])
//! - **Reporting**: line sink for run output ([`Reporter`])
//!
//! # Usage
//!
//! ```rust
//! use anonymizer::anonymization::{FieldMasker, FieldPolicy, MaskedValue};
//! use anonymizer::domain::FieldValue;
//! use rand::{rngs::StdRng, SeedableRng};
//! use std::collections::BTreeMap;
//!
//! let mut masker = FieldMasker::with_rng(BTreeMap::new(), Box::new(StdRng::seed_from_u64(1)));
//! let masked = masker.mask("email", &FieldPolicy::anonymize(), &FieldValue::Text("a@b.c".into()));
//! assert!(matches!(masked, Some(MaskedValue::Anonymized(_))));
//! ```

pub mod anonymizer;
pub mod config;
pub mod masker;
pub mod report;
pub mod timestamp;

// Re-export main types
pub use config::{AnonymizationConfig, DateTimeFilter, FieldPolicy, OlderThan, TypeConfig};
pub use masker::{FieldMasker, MaskedValue};
pub use report::{BufferedReporter, ConsoleReporter, Reporter};
