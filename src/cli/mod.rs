//! CLI interface and argument parsing
//!
//! This module provides the command-line interface for the anonymizer using clap.

pub mod commands;

use clap::{Parser, Subcommand};

/// Anonymizer - Incremental record anonymization tool
#[derive(Parser, Debug)]
#[command(name = "anonymizer")]
#[command(version, about, long_about = None)]
#[command(author = "Anonymizer Contributors")]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "anonymizer.toml", env = "ANONYMIZER_CONFIG")]
    pub config: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "ANONYMIZER_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Anonymize configured node types
    NodeTypes(commands::anonymize::AnonymizeArgs),

    /// Anonymize configured domain models
    DomainModels(commands::anonymize::AnonymizeArgs),

    /// Show anonymization checkpoints
    Status(commands::status::StatusArgs),

    /// Validate configuration file
    ValidateConfig(commands::validate::ValidateArgs),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse_node_types() {
        let cli = Cli::parse_from(["anonymizer", "node-types", "--test"]);
        assert_eq!(cli.config, "anonymizer.toml");
        match cli.command {
            Commands::NodeTypes(args) => {
                assert!(args.test);
                assert!(!args.force);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_cli_parse_domain_models_with_only() {
        let cli = Cli::parse_from([
            "anonymizer",
            "domain-models",
            "--only",
            "orders,customers",
            "--force",
            "-v",
        ]);
        match cli.command {
            Commands::DomainModels(args) => {
                assert_eq!(args.only.as_deref(), Some("orders,customers"));
                assert!(args.force);
                assert!(args.verbose);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_cli_parse_with_config() {
        let cli = Cli::parse_from(["anonymizer", "--config", "custom.toml", "node-types"]);
        assert_eq!(cli.config, "custom.toml");
    }

    #[test]
    fn test_cli_parse_with_log_level() {
        let cli = Cli::parse_from(["anonymizer", "--log-level", "debug", "validate-config"]);
        assert_eq!(cli.log_level, Some("debug".to_string()));
        assert!(matches!(cli.command, Commands::ValidateConfig(_)));
    }

    #[test]
    fn test_cli_parse_status() {
        let cli = Cli::parse_from(["anonymizer", "status", "--name", "domainModel::orders"]);
        match cli.command {
            Commands::Status(args) => assert_eq!(args.name.as_deref(), Some("domainModel::orders")),
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
