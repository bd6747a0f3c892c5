//! Anonymize command implementation
//!
//! This module implements the `node-types` and `domain-models` commands. Both
//! share their arguments and differ only in the record family they process.

use crate::adapters::database::create_collaborators;
use crate::anonymization::report::ConsoleReporter;
use crate::config::load_config;
use crate::core::run::{preflight, AnonymizationCoordinator, RunOptions, RunOutcome};
use crate::domain::ids::RecordFamily;
use crate::log_error_with_context;
use clap::Args;
use std::sync::Arc;

/// Arguments for the anonymize commands
#[derive(Args, Debug, Clone, Default)]
pub struct AnonymizeArgs {
    /// Only process these types (comma-separated)
    #[arg(long)]
    pub only: Option<String>,

    /// Dry run: report every change without persisting anything
    #[arg(long)]
    pub test: bool,

    /// Report every changed field
    #[arg(short, long)]
    pub verbose: bool,

    /// Persist the changes
    #[arg(long)]
    pub force: bool,
}

impl AnonymizeArgs {
    pub fn run_options(&self) -> RunOptions {
        RunOptions {
            only: RunOptions::parse_only(self.only.as_deref()),
            test: self.test,
            verbose: self.verbose,
            force: self.force,
        }
    }

    /// Execute an anonymization run over `family`
    pub async fn execute(&self, config_path: &str, family: RecordFamily) -> anyhow::Result<i32> {
        tracing::info!(family = %family, "Starting anonymize command");

        let config = match load_config(config_path) {
            Ok(c) => c,
            Err(e) => {
                log_error_with_context!(&e, "Failed to load configuration");
                eprintln!("Failed to load configuration: {e}");
                return Ok(2); // Configuration error exit code
            }
        };

        if let Err(e) = config.validate() {
            tracing::error!(error = %e, "Configuration validation failed");
            eprintln!("Configuration validation failed: {e}");
            return Ok(2);
        }

        let options = self.run_options();
        let reporter = Arc::new(ConsoleReporter);

        if preflight(
            family,
            config.anonymization.types(family).is_some(),
            &options,
            reporter.as_ref(),
        )
        .is_some()
        {
            return Ok(0);
        }

        let collaborators = match create_collaborators(&config, family, options.test).await {
            Ok(c) => c,
            Err(e) => {
                log_error_with_context!(&e, "Failed to connect to database");
                eprintln!("Failed to connect to database: {e}");
                return Ok(4); // Connection error exit code
            }
        };

        let mut coordinator =
            AnonymizationCoordinator::new(family, &config.anonymization, collaborators, reporter);

        match coordinator.run(&options).await {
            Ok(RunOutcome::Completed(summary)) => {
                tracing::info!(
                    types = summary.types.len(),
                    records_updated = summary.total_records_updated(),
                    duration_secs = summary.duration.as_secs_f64(),
                    "Anonymize command finished"
                );
                Ok(0)
            }
            Ok(_) => Ok(0),
            Err(e) => {
                log_error_with_context!(&e, "Anonymization run aborted");
                eprintln!("Anonymization aborted: {e}");
                Ok(5) // Fatal error exit code
            }
        }
    }
}
