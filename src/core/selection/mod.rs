// Selection windows for incremental runs

pub mod planner;

pub use planner::{plan, Selection, SelectionPlan, TimeWindow};
