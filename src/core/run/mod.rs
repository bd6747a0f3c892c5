// Run orchestration and reporting

pub mod orchestrator;
pub mod summary;

pub use orchestrator::{preflight, AnonymizationCoordinator, Collaborators, RunOptions, RunOutcome};
pub use summary::{RunSummary, TypeOutcome, TypeSummary};
