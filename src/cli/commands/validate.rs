//! Validate config command implementation
//!
//! This module implements the `validate-config` command for validating
//! the anonymizer configuration file.

use crate::anonymization::config::TypeConfig;
use crate::config::load_config;
use crate::domain::ids::RecordFamily;
use clap::Args;
use secrecy::ExposeSecret;
use std::collections::BTreeMap;

/// Arguments for the validate-config command
#[derive(Args, Debug)]
pub struct ValidateArgs {}

impl ValidateArgs {
    /// Execute the validate-config command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!(config_path = %config_path, "Validating configuration");

        println!("🔍 Validating configuration file: {config_path}");
        println!();

        let config = match load_config(config_path) {
            Ok(c) => {
                println!("✅ Configuration file loaded successfully");
                c
            }
            Err(e) => {
                println!("❌ Failed to load configuration file");
                println!("   Error: {e}");
                return Ok(2); // Configuration error exit code
            }
        };

        if let Err(e) = config.validate() {
            println!("❌ Configuration validation failed");
            println!("   Error: {e}");
            println!();
            return Ok(2);
        }

        println!("✅ Configuration is valid");
        println!();
        println!("Configuration Summary:");
        println!("  Log Level: {}", config.application.log_level);
        println!(
            "  PostgreSQL Connection: {}",
            config
                .database
                .connection_string
                .expose_secret()
                .after_credentials()
                .unwrap_or("***")
        );
        println!("  Max Connections: {}", config.database.max_connections);
        println!("  Resources: {}", config.resources.path.display());
        println!("  Dummy Assets: {}", config.anonymization.dummy_assets.len());
        for family in [RecordFamily::NodeType, RecordFamily::DomainModel] {
            println!(
                "  {}: {}",
                family.plural_label(),
                describe_types(config.anonymization.types(family))
            );
        }
        println!();

        Ok(0)
    }
}

fn describe_types(types: Option<&BTreeMap<String, TypeConfig>>) -> String {
    match types {
        None => "not configured".to_string(),
        Some(types) if types.is_empty() => "none".to_string(),
        Some(types) => types.keys().cloned().collect::<Vec<_>>().join(", "),
    }
}
