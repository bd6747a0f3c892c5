//! Selection planning
//!
//! Turns a type's date/time filter and its last checkpoint into the window of
//! records the current run processes. The lower bound is inclusive and the
//! upper bound exclusive, so a record whose timestamp equals a previous
//! `to_time` can be selected twice. Processing is at-least-once.

use crate::anonymization::config::DateTimeFilter;
use crate::core::state::Checkpoint;
use crate::domain::{AnonymizerError, Result};
use chrono::NaiveDateTime;

/// Half-open time range over one timestamp field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeWindow {
    /// Timestamp field the window applies to
    pub field: String,

    /// Inclusive lower bound, absent before the first checkpoint
    pub from: Option<NaiveDateTime>,

    /// Exclusive upper bound
    pub until: NaiveDateTime,
}

impl TimeWindow {
    pub fn contains(&self, value: &NaiveDateTime) -> bool {
        self.from.map_or(true, |from| *value >= from) && *value < self.until
    }
}

/// Records of one type to select
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub type_name: String,

    /// `None` selects every record of the type
    pub window: Option<TimeWindow>,
}

/// Planned selection plus the resolved upper bound
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionPlan {
    pub selection: Selection,

    /// Resolved `older_than`, `None` without a filter
    pub upper_bound: Option<NaiveDateTime>,
}

impl SelectionPlan {
    /// Lower bound taken from the last checkpoint
    pub fn lower_bound(&self) -> Option<NaiveDateTime> {
        self.selection.window.as_ref().and_then(|w| w.from)
    }
}

/// Computes the selection for one type
///
/// Without a filter every record of the type is selected and the checkpoint is
/// not consulted.
///
/// # Errors
///
/// Returns a configuration error if `older_than` cannot be resolved to a
/// representable timestamp.
pub fn plan(
    type_name: &str,
    filter: Option<&DateTimeFilter>,
    last: Option<&Checkpoint>,
    now: NaiveDateTime,
) -> Result<SelectionPlan> {
    let Some(filter) = filter else {
        return Ok(SelectionPlan {
            selection: Selection {
                type_name: type_name.to_string(),
                window: None,
            },
            upper_bound: None,
        });
    };

    let until = filter.older_than.resolve(now).ok_or_else(|| {
        AnonymizerError::Configuration(format!(
            "older_than {} of {type_name} is out of range",
            filter.older_than
        ))
    })?;
    Ok(SelectionPlan {
        selection: Selection {
            type_name: type_name.to_string(),
            window: Some(TimeWindow {
                field: filter.property_name.clone(),
                from: last.map(|checkpoint| checkpoint.to_time),
                until,
            }),
        },
        upper_bound: Some(until),
    })
}
