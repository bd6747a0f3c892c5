//! Configuration management for the anonymizer.
//!
//! # Overview
//!
//! The anonymizer uses a TOML configuration file with support for:
//! - Environment variable substitution (`${VAR_NAME}`)
//! - `ANONYMIZER_<SECTION>_<KEY>` overrides
//! - Default values for optional settings
//! - Validation on load
//!
//! # Example Configuration
//!
//! ```toml
//! [application]
//! log_level = "info"
//!
//! [database]
//! connection_string = "${ANONYMIZER_DATABASE_DSN}"
//!
//! [resources]
//! path = "./data/resources"
//!
//! [dummy_assets]
//! "image/jpeg" = "./dummies/portrait.jpg"
//!
//! [node_types."Acme.Site:Comment"]
//! date_time_filter = { property_name = "createdAt", older_than = -30 }
//!
//! [node_types."Acme.Site:Comment".properties]
//! email = { anonymize = true }
//! author = { shuffle = true }
//!
//! [domain_models.orders.properties]
//! street = { shuffle = true }
//! ```
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use anonymizer::config::load_config;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("anonymizer.toml")?;
//! println!("Node types: {:?}", config.anonymization.node_types.map(|t| t.len()));
//! # Ok(())
//! # }
//! ```

pub mod loader;
pub mod schema;
pub mod secret;

// Re-export commonly used types
pub use loader::load_config;
pub use schema::{
    AnonymizerConfig, ApplicationConfig, LoggingConfig, PostgreSQLConfig, ResourcesConfig,
};
pub use secret::{secret_string, SecretString, SecretValue};
