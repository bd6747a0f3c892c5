//! Binary resource storage backends

pub mod filesystem;

pub use filesystem::FileSystemResourceStore;
