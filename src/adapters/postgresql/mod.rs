//! PostgreSQL database integration
//!
//! This module provides the PostgreSQL backends of the storage traits: node
//! records, domain model tables, assets and the checkpoint table.

pub mod assets;
pub mod checkpoints;
pub mod client;
pub mod entities;
pub mod models;
pub mod nodes;

pub use assets::PostgreSQLAssetRepository;
pub use checkpoints::PostgreSQLCheckpointStorage;
pub use client::PostgreSQLClient;
pub use entities::PostgreSQLEntityRepository;
pub use models::PostgreSQLCheckpoint;
pub use nodes::PostgreSQLNodeRepository;
