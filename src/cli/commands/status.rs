//! Status command implementation
//!
//! This module implements the `status` command for displaying the checkpoint
//! of every anonymized type.

use crate::adapters::database::create_checkpoint_storage;
use crate::config::load_config;
use crate::core::state::{Checkpoint, CheckpointManager};
use crate::domain::ids::CheckpointName;
use crate::domain::value::DISPLAY_FORMAT;
use clap::Args;

/// Arguments for the status command
#[derive(Args, Debug, Default)]
pub struct StatusArgs {
    /// Show the full history of one checkpoint, e.g. `nodeType::Acme.Site:Comment`
    #[arg(long)]
    pub name: Option<String>,
}

impl StatusArgs {
    /// Execute the status command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!("Checking anonymization status");

        let name = match self.name.as_deref().map(CheckpointName::new).transpose() {
            Ok(name) => name,
            Err(e) => {
                eprintln!("Invalid checkpoint name: {e}");
                return Ok(2);
            }
        };

        let config = match load_config(config_path) {
            Ok(c) => c,
            Err(e) => {
                println!("❌ Failed to load configuration file");
                println!("   Error: {e}");
                return Ok(2); // Configuration error exit code
            }
        };

        let storage = match create_checkpoint_storage(&config).await {
            Ok(s) => s,
            Err(e) => {
                println!("❌ Failed to connect to database");
                println!("   Error: {e}");
                return Ok(4); // Connection error exit code
            }
        };

        let manager = CheckpointManager::new_with_storage(storage);

        let checkpoints = match &name {
            Some(name) => manager.history(name).await,
            None => manager.latest_per_name().await,
        };
        let checkpoints = match checkpoints {
            Ok(c) => c,
            Err(e) => {
                println!("❌ Failed to load checkpoints");
                println!("   Error: {e}");
                return Ok(5); // Fatal error exit code
            }
        };

        if checkpoints.is_empty() {
            println!("No anonymization history found.");
            println!("Run 'anonymizer node-types' or 'anonymizer domain-models' to start.");
            return Ok(0);
        }

        println!("Found {} checkpoint(s):", checkpoints.len());
        println!();
        println!("{}", format_header());
        println!("{}", "-".repeat(120));
        for checkpoint in &checkpoints {
            println!("{}", format_row(checkpoint));
        }
        println!();

        Ok(0)
    }
}

fn format_header() -> String {
    format!(
        "{:<48} {:<20} {:<20} {:<20} {:>8}",
        "Name", "From", "To", "Executed", "Records"
    )
}

fn format_row(checkpoint: &Checkpoint) -> String {
    let from = checkpoint
        .from_time
        .map(|from| from.format(DISPLAY_FORMAT).to_string())
        .unwrap_or_else(|| "-".to_string());

    format!(
        "{:<48} {:<20} {:<20} {:<20} {:>8}",
        checkpoint.name.as_str(),
        from,
        checkpoint.to_time.format(DISPLAY_FORMAT).to_string(),
        checkpoint.executed_at.format(DISPLAY_FORMAT).to_string(),
        checkpoint.records_processed
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::state::CheckpointBuilder;
    use crate::domain::ids::RecordFamily;
    use chrono::NaiveDate;

    #[test]
    fn test_format_row_first_run() {
        let to = NaiveDate::from_ymd_opt(2024, 2, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let name = CheckpointName::for_type(RecordFamily::NodeType, "Acme.Site:Comment").unwrap();
        let checkpoint = CheckpointBuilder::new(name, to).records_processed(3).build();

        let row = format_row(&checkpoint);
        assert!(row.starts_with("nodeType::Acme.Site:Comment"));
        assert!(row.contains(" -  "));
        assert!(row.contains("2024-02-01 00:00:00"));
        assert!(row.trim_end().ends_with('3'));
    }

    #[test]
    fn test_status_args_defaults() {
        assert!(StatusArgs::default().name.is_none());
    }
}
