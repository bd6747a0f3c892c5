//! External system integrations for the anonymizer.
//!
//! - [`database`] - Storage traits used by the run orchestrator, plus the factory
//! - [`postgresql`] - PostgreSQL implementation of the record, asset and checkpoint storage
//! - [`resources`] - Content-addressed binary resource storage
//!
//! # Design Pattern
//!
//! Adapters isolate external dependencies behind the traits in
//! [`database::traits`], so the orchestrator can be driven by in-memory
//! implementations in tests.

pub mod database;
pub mod postgresql;
pub mod resources;
