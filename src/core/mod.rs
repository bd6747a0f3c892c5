//! Core business logic for the anonymizer.
//!
//! # Modules
//!
//! - [`state`] - Checkpoints recording which time windows were processed
//! - [`selection`] - Window planning for incremental runs
//! - [`run`] - Run orchestration and summaries
//! - [`clock`] - Injectable wall-clock source
//!
//! # Run Workflow
//!
//! For every configured type of a record family:
//!
//! 1. **Resolve**: Ask the repository whether the type exists
//! 2. **Load Checkpoint**: Find the latest checkpoint for the type
//! 3. **Plan**: Compute the window `[last.to_time, older_than)`
//! 4. **Select**: Query candidate records in the window
//! 5. **Mask**: Apply the field policies to every candidate
//! 6. **Persist**: Write each changed record back immediately
//! 7. **Checkpoint**: Append a checkpoint for the window
//!
//! # Example
//!
//! ```rust,no_run
//! use anonymizer::adapters::database::create_collaborators;
//! use anonymizer::anonymization::ConsoleReporter;
//! use anonymizer::config::load_config;
//! use anonymizer::core::run::{AnonymizationCoordinator, RunOptions, RunOutcome};
//! use anonymizer::domain::RecordFamily;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("anonymizer.toml")?;
//! let collaborators = create_collaborators(&config, RecordFamily::NodeType, true).await?;
//!
//! let mut coordinator = AnonymizationCoordinator::new(
//!     RecordFamily::NodeType,
//!     &config.anonymization,
//!     collaborators,
//!     Arc::new(ConsoleReporter),
//! );
//!
//! let options = RunOptions { test: true, ..Default::default() };
//! if let RunOutcome::Completed(summary) = coordinator.run(&options).await? {
//!     println!("Candidates: {}", summary.total_candidates());
//! }
//! # Ok(())
//! # }
//! ```

pub mod clock;
pub mod run;
pub mod selection;
pub mod state;
