//! Run summary and reporting
//!
//! This module defines structures for tracking the results of an
//! anonymization run.

use crate::core::state::Checkpoint;
use crate::domain::ids::RecordFamily;
use std::time::Duration;

/// Result of processing one configured type
#[derive(Debug, Clone, PartialEq)]
pub enum TypeOutcome {
    /// The type was processed
    Processed {
        /// Records selected by the window
        candidates: u64,

        /// Records written back
        records_updated: u64,

        /// Fields changed (or that would change in a dry run)
        fields_masked: u64,

        /// Checkpoint appended, `None` in a dry run
        checkpoint: Option<Checkpoint>,
    },
    /// The repository does not know the type
    Invalid,
}

/// Outcome for a single type
#[derive(Debug, Clone, PartialEq)]
pub struct TypeSummary {
    pub type_name: String,
    pub outcome: TypeOutcome,
}

/// Summary of an anonymization run over one record family
#[derive(Debug, Clone)]
pub struct RunSummary {
    /// Record family processed
    pub family: RecordFamily,

    /// Whether the run was a dry run
    pub dry_run: bool,

    /// Per-type outcomes in processing order
    pub types: Vec<TypeSummary>,

    /// Names passed via `--only` without configuration
    pub unknown_filters: Vec<String>,

    /// Duration of the run
    pub duration: Duration,
}

impl RunSummary {
    /// Create a new empty run summary
    pub fn new(family: RecordFamily, dry_run: bool) -> Self {
        Self {
            family,
            dry_run,
            types: Vec::new(),
            unknown_filters: Vec::new(),
            duration: Duration::from_secs(0),
        }
    }

    /// Set the duration
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    pub fn add(&mut self, type_name: impl Into<String>, outcome: TypeOutcome) {
        self.types.push(TypeSummary {
            type_name: type_name.into(),
            outcome,
        });
    }

    /// Outcome recorded for `type_name`
    pub fn outcome(&self, type_name: &str) -> Option<&TypeOutcome> {
        self.types
            .iter()
            .find(|summary| summary.type_name == type_name)
            .map(|summary| &summary.outcome)
    }

    /// Total candidate records over all processed types
    pub fn total_candidates(&self) -> u64 {
        self.processed().map(|(candidates, _, _)| candidates).sum()
    }

    /// Total records written back
    pub fn total_records_updated(&self) -> u64 {
        self.processed().map(|(_, updated, _)| updated).sum()
    }

    /// Total masked fields
    pub fn total_fields_masked(&self) -> u64 {
        self.processed().map(|(_, _, fields)| fields).sum()
    }

    /// Number of types rejected by the repository
    pub fn invalid_types(&self) -> usize {
        self.types
            .iter()
            .filter(|summary| summary.outcome == TypeOutcome::Invalid)
            .count()
    }

    /// Check if every configured type could be processed
    pub fn is_successful(&self) -> bool {
        self.invalid_types() == 0
    }

    fn processed(&self) -> impl Iterator<Item = (u64, u64, u64)> + '_ {
        self.types.iter().filter_map(|summary| match summary.outcome {
            TypeOutcome::Processed {
                candidates,
                records_updated,
                fields_masked,
                ..
            } => Some((candidates, records_updated, fields_masked)),
            TypeOutcome::Invalid => None,
        })
    }

    /// Log the summary
    pub fn log_summary(&self) {
        tracing::info!(
            family = %self.family,
            dry_run = self.dry_run,
            types = self.types.len(),
            candidates = self.total_candidates(),
            records_updated = self.total_records_updated(),
            fields_masked = self.total_fields_masked(),
            duration_secs = self.duration.as_secs(),
            "Anonymization run completed"
        );

        if !self.is_successful() {
            tracing::warn!(
                invalid_types = self.invalid_types(),
                "Anonymization run skipped invalid types"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn processed(candidates: u64, updated: u64, fields: u64) -> TypeOutcome {
        TypeOutcome::Processed {
            candidates,
            records_updated: updated,
            fields_masked: fields,
            checkpoint: None,
        }
    }

    #[test]
    fn test_run_summary_creation() {
        let summary = RunSummary::new(RecordFamily::NodeType, false);

        assert!(summary.types.is_empty());
        assert_eq!(summary.total_candidates(), 0);
        assert_eq!(summary.duration, Duration::from_secs(0));
        assert!(summary.is_successful());
    }

    #[test]
    fn test_totals_skip_invalid_types() {
        let mut summary = RunSummary::new(RecordFamily::DomainModel, false);
        summary.add("orders", processed(10, 8, 16));
        summary.add("customers", TypeOutcome::Invalid);
        summary.add("invoices", processed(2, 2, 2));

        assert_eq!(summary.total_candidates(), 12);
        assert_eq!(summary.total_records_updated(), 10);
        assert_eq!(summary.total_fields_masked(), 18);
        assert_eq!(summary.invalid_types(), 1);
        assert!(!summary.is_successful());
        assert_eq!(summary.outcome("customers"), Some(&TypeOutcome::Invalid));
        assert_eq!(summary.outcome("missing"), None);
    }

    #[test]
    fn test_with_duration() {
        let summary =
            RunSummary::new(RecordFamily::NodeType, true).with_duration(Duration::from_secs(5));
        assert_eq!(summary.duration, Duration::from_secs(5));
        assert!(summary.dry_run);
    }
}
