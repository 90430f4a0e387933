#![deny(warnings)]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]

//! Storage collaborator contracts for the recording ingestion core
//!
//! The ingestion coordinator talks to two narrow interfaces: an object
//! store that accepts recording payloads, and a metadata store that
//! upserts recording rows keyed by recording id. Everything behind those
//! interfaces (bucket layout, schema, transport) lives elsewhere.

mod factory;
mod local;
mod memory;

pub use factory::{create_metadata_store, create_object_store};
pub use local::LocalObjectStore;
pub use memory::{MemoryMetadataStore, MemoryObjectStore};

use async_trait::async_trait;
use recvault_core::{Error, RecordingMetadata, Result};
use std::path::Path;

// ==== Traits ====

/// Durable object storage for recording payloads
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Store `bytes` under `key` and return a URL for the stored object
    ///
    /// Implementations must reject payloads larger than their configured
    /// maximum before touching the network or disk.
    async fn put(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> Result<String>;

    /// Largest payload this store accepts, in bytes
    fn max_object_size(&self) -> u64;
}

/// Relational persistence for recording metadata
#[async_trait]
pub trait MetadataStore: Send + Sync {
    /// Insert or update the row keyed by `recording_id`
    ///
    /// Idempotent: repeating the call with identical input must not
    /// create a duplicate.
    async fn upsert_recording(&self, metadata: &RecordingMetadata) -> Result<()>;

    /// Fetch one recording row, if present
    async fn get_recording(&self, recording_id: &str) -> Result<Option<RecordingMetadata>>;

    /// List all stored recordings
    async fn list_recordings(&self) -> Result<Vec<RecordingMetadata>>;
}

// ==== Helpers ====

/// Fast-fail size check shared by all object store implementations
pub(crate) fn check_object_size(key: &str, len: u64, max: u64) -> Result<()> {
    if len > max {
        return Err(Error::storage(format!(
            "payload for {key} is {len} bytes, exceeds maximum {max}"
        )));
    }
    Ok(())
}

/// Guess a MIME content type from a file extension
pub fn content_type_for(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .as_deref()
    {
        Some("mp4") => "video/mp4",
        Some("webm") => "video/webm",
        Some("m4a") => "audio/mp4",
        Some("mp3") => "audio/mpeg",
        Some("wav") => "audio/wav",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn content_type_known_extensions() {
        assert_eq!(content_type_for(Path::new("a.MP4")), "video/mp4");
        assert_eq!(content_type_for(Path::new("a.m4a")), "audio/mp4");
        assert_eq!(
            content_type_for(&PathBuf::from("noext")),
            "application/octet-stream"
        );
    }

    #[test]
    fn size_check_rejects_oversized() {
        assert!(check_object_size("k", 10, 100).is_ok());
        assert!(check_object_size("k", 101, 100).is_err());
    }
}
