//! CLI command implementations
//!
//! This module contains all CLI command implementations.

pub mod anonymize;
pub mod status;
pub mod validate;
