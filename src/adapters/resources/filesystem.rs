//! Content-addressed resource storage on the local filesystem
//!
//! Resources are stored as `<root>/<collection>/<sha256>`. Importing the same
//! content twice yields the same reference and writes the file only once.

use crate::adapters::database::traits::ResourceStore;
use crate::domain::{AnonymizerError, ResourceRef, Result};
use async_trait::async_trait;
use sha2::{Digest, Sha256};
use std::path::PathBuf;

/// Filesystem resource store
#[derive(Debug, Clone)]
pub struct FileSystemResourceStore {
    root: PathBuf,
}

impl FileSystemResourceStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Location of a resource with the given hash
    pub fn resource_path(&self, collection: &str, sha256: &str) -> PathBuf {
        self.root.join(collection).join(sha256)
    }
}

/// Hex encoded SHA-256 of `content`
pub fn sha256_hex(content: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content);
    format!("{:x}", hasher.finalize())
}

fn is_safe_segment(segment: &str) -> bool {
    !segment.is_empty()
        && segment != "."
        && segment != ".."
        && !segment.contains(['/', '\\'])
}

#[async_trait]
impl ResourceStore for FileSystemResourceStore {
    async fn import_resource(
        &self,
        content: Vec<u8>,
        filename: &str,
        collection: &str,
    ) -> Result<ResourceRef> {
        if !is_safe_segment(collection) {
            return Err(AnonymizerError::Resource(format!(
                "Invalid resource collection name: '{collection}'"
            )));
        }

        let sha256 = sha256_hex(&content);
        let path = self.resource_path(collection, &sha256);

        if tokio::fs::try_exists(&path).await? {
            tracing::debug!(sha256 = %sha256, collection = %collection, "Resource already stored");
        } else {
            if let Some(parent) = path.parent() {
                tokio::fs::create_dir_all(parent).await.map_err(|e| {
                    AnonymizerError::Resource(format!(
                        "Failed to create resource directory {}: {e}",
                        parent.display()
                    ))
                })?;
            }
            tokio::fs::write(&path, &content).await.map_err(|e| {
                AnonymizerError::Resource(format!(
                    "Failed to write resource {}: {e}",
                    path.display()
                ))
            })?;
            tracing::debug!(
                sha256 = %sha256,
                collection = %collection,
                bytes = content.len(),
                "Imported resource"
            );
        }

        Ok(ResourceRef {
            sha256,
            filename: filename.to_string(),
            collection: collection.to_string(),
        })
    }
}
