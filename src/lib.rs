// Anonymizer - Incremental record anonymization tool
// Copyright (c) 2025 Anonymizer Contributors
// Licensed under the MIT License

//! # Anonymizer
//!
//! Incremental, checkpointed anonymization of content nodes and domain records
//! stored in PostgreSQL.
//!
//! ## Overview
//!
//! For every configured node type or domain model a run:
//! - **Plans** a selection window from the type's date filter and its last checkpoint
//! - **Masks** the configured fields of every selected record (shuffle, anonymize,
//!   dummy asset substitution)
//! - **Persists** changed records and appends a new checkpoint
//!
//! Because every run continues where the previous one stopped, repeated runs
//! never mask the same record twice.
//!
//! ## Architecture
//!
//! - [`cli`] - Command-line interface and argument parsing
//! - [`core`] - Run orchestration, selection planning and checkpoint state
//! - [`anonymization`] - Field masking strategies and per-type configuration
//! - [`adapters`] - Storage integrations (PostgreSQL, filesystem resources)
//! - [`domain`] - Core domain types and errors
//! - [`config`] - Configuration management
//! - [`logging`] - Structured logging
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use anonymizer::adapters::database::create_collaborators;
//! use anonymizer::anonymization::ConsoleReporter;
//! use anonymizer::config::load_config;
//! use anonymizer::core::run::{AnonymizationCoordinator, RunOptions};
//! use anonymizer::domain::RecordFamily;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = load_config("anonymizer.toml")?;
//!     let collaborators = create_collaborators(&config, RecordFamily::DomainModel, true).await?;
//!
//!     let mut coordinator = AnonymizationCoordinator::new(
//!         RecordFamily::DomainModel,
//!         &config.anonymization,
//!         collaborators,
//!         Arc::new(ConsoleReporter),
//!     );
//!
//!     let options = RunOptions { test: true, ..Default::default() };
//!     coordinator.run(&options).await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Error Handling
//!
//! All library errors are [`domain::AnonymizerError`]; the CLI maps them to
//! exit codes.

pub mod adapters;
pub mod anonymization;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod logging;
