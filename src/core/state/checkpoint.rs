//! Checkpoint model for tracking anonymization progress
//!
//! One checkpoint is appended per type after every successful, non-dry-run
//! pass. Rows are never updated; the checkpoint with the greatest `to_time`
//! for a name is the point the next run resumes from.

use crate::domain::ids::CheckpointName;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Completed anonymization pass over one record type
///
/// # Examples
///
/// ```
/// use anonymizer::core::state::checkpoint::CheckpointBuilder;
/// use anonymizer::domain::ids::{CheckpointName, RecordFamily};
/// use chrono::NaiveDate;
///
/// let to = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap().and_hms_opt(0, 0, 0).unwrap();
/// let name = CheckpointName::for_type(RecordFamily::NodeType, "Acme:Comment").unwrap();
///
/// let checkpoint = CheckpointBuilder::new(name, to)
///     .records_processed(12)
///     .build();
///
/// assert_eq!(checkpoint.from_time, None);
/// assert_eq!(checkpoint.records_processed, 12);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checkpoint {
    /// Prefixed type name
    pub name: CheckpointName,

    /// Lower bound of the processed window, absent on the first run
    pub from_time: Option<NaiveDateTime>,

    /// Upper bound of the processed window
    pub to_time: NaiveDateTime,

    /// Wall-clock time the pass completed
    pub executed_at: NaiveDateTime,

    /// Number of candidate records selected in the pass
    pub records_processed: u64,
}

impl Checkpoint {
    /// Length of the processed window, if it had a lower bound
    pub fn window_length(&self) -> Option<chrono::Duration> {
        self.from_time.map(|from| self.to_time - from)
    }
}

/// Builder for creating Checkpoint instances
pub struct CheckpointBuilder {
    name: CheckpointName,
    from_time: Option<NaiveDateTime>,
    to_time: NaiveDateTime,
    executed_at: Option<NaiveDateTime>,
    records_processed: u64,
}

impl CheckpointBuilder {
    pub fn new(name: CheckpointName, to_time: NaiveDateTime) -> Self {
        Self {
            name,
            from_time: None,
            to_time,
            executed_at: None,
            records_processed: 0,
        }
    }

    pub fn from_time(mut self, from_time: Option<NaiveDateTime>) -> Self {
        self.from_time = from_time;
        self
    }

    pub fn executed_at(mut self, executed_at: NaiveDateTime) -> Self {
        self.executed_at = Some(executed_at);
        self
    }

    pub fn records_processed(mut self, count: u64) -> Self {
        self.records_processed = count;
        self
    }

    /// Build the Checkpoint
    ///
    /// `executed_at` defaults to `to_time` when not set.
    pub fn build(self) -> Checkpoint {
        Checkpoint {
            name: self.name,
            from_time: self.from_time,
            to_time: self.to_time,
            executed_at: self.executed_at.unwrap_or(self.to_time),
            records_processed: self.records_processed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ids::RecordFamily;
    use chrono::{Duration, NaiveDate};

    #[test]
    fn test_builder_fields() {
        let to = NaiveDate::from_ymd_opt(2024, 2, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let from = to - Duration::days(31);
        let name = CheckpointName::for_type(RecordFamily::DomainModel, "orders").unwrap();

        let checkpoint = CheckpointBuilder::new(name.clone(), to)
            .from_time(Some(from))
            .executed_at(to + Duration::hours(3))
            .records_processed(7)
            .build();

        assert_eq!(checkpoint.name, name);
        assert_eq!(checkpoint.window_length(), Some(Duration::days(31)));
        assert_eq!(checkpoint.executed_at - checkpoint.to_time, Duration::hours(3));
        assert_eq!(checkpoint.records_processed, 7);
    }

    #[test]
    fn test_serializes_with_plain_name() {
        let to = NaiveDate::from_ymd_opt(2024, 2, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let name = CheckpointName::for_type(RecordFamily::NodeType, "A").unwrap();
        let json = serde_json::to_value(CheckpointBuilder::new(name, to).build()).unwrap();

        assert_eq!(json["name"], "nodeType::A");
        assert!(json["from_time"].is_null());
    }
}
