//! Object store backed by a local directory tree
//!
//! Objects land at `<root>/<key>` and are addressed with `file://` URLs.
//! Useful for single-host deployments and as the default backend when no
//! remote store is configured.

use crate::{check_object_size, ObjectStore};
use async_trait::async_trait;
use recvault_core::{Error, Result};
use std::path::PathBuf;
use tracing::debug;

pub struct LocalObjectStore {
    root: PathBuf,
    max_object_size: u64,
}

impl LocalObjectStore {
    pub fn new(root: impl Into<PathBuf>, max_object_size: u64) -> Self {
        Self {
            root: root.into(),
            max_object_size,
        }
    }

    fn object_path(&self, key: &str) -> Result<PathBuf> {
        // Keys are generated internally, but reject traversal anyway.
        if key.split('/').any(|part| part == ".." || part.is_empty()) {
            return Err(Error::storage(format!("invalid object key: {key}")));
        }
        Ok(self.root.join(key))
    }
}

#[async_trait]
impl ObjectStore for LocalObjectStore {
    async fn put(&self, key: &str, bytes: Vec<u8>, _content_type: &str) -> Result<String> {
        check_object_size(key, bytes.len() as u64, self.max_object_size)?;

        let path = self.object_path(key)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| Error::storage(format!("creating {parent:?}: {e}")))?;
        }

        tokio::fs::write(&path, bytes)
            .await
            .map_err(|e| Error::storage(format!("writing {path:?}: {e}")))?;

        debug!(key, ?path, "stored object");
        Ok(format!("file://{}", path.display()))
    }

    fn max_object_size(&self) -> u64 {
        self.max_object_size
    }
}
