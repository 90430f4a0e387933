//! Factory functions for constructing storage collaborators from config

use crate::{LocalObjectStore, MemoryMetadataStore, MemoryObjectStore, MetadataStore, ObjectStore};
use recvault_core::config::{StorageConfig, StorageProvider};
use recvault_core::{Error, Result};
use std::sync::Arc;
use tracing::info;

/// Build the object store selected by configuration
pub fn create_object_store(config: &StorageConfig) -> Result<Arc<dyn ObjectStore>> {
    let max = config.max_object_size_bytes();
    match config.provider {
        StorageProvider::Local => {
            let root = config.local_root.clone().ok_or_else(|| {
                Error::config("storage.local_root is required for the local provider")
            })?;
            info!(?root, "using local object store");
            Ok(Arc::new(LocalObjectStore::new(root, max)))
        }
        StorageProvider::Memory => {
            info!("using in-memory object store");
            Ok(Arc::new(MemoryObjectStore::new(max)))
        }
    }
}

/// Build the metadata store selected by configuration
///
/// Only the in-memory implementation ships with this crate; a relational
/// backend plugs in through the `MetadataStore` trait.
pub fn create_metadata_store(_config: &StorageConfig) -> Result<Arc<dyn MetadataStore>> {
    Ok(Arc::new(MemoryMetadataStore::new()))
}
