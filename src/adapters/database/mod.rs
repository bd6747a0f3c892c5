//! Storage abstraction layer
//!
//! This module provides the trait-based abstraction between the run
//! orchestrator and storage, plus the factory that wires up the concrete
//! backends from configuration.

pub mod factory;
pub mod traits;

pub use factory::{create_checkpoint_storage, create_collaborators};
pub use traits::{AssetRepository, CheckpointStorage, RecordRepository, ResourceStore};
