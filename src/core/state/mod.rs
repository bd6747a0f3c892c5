// Checkpoint model and persistence

pub mod checkpoint;
pub mod manager;

pub use checkpoint::{Checkpoint, CheckpointBuilder};
pub use manager::CheckpointManager;
