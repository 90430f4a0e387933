//! In-memory storage implementations
//!
//! Used by tests and dry runs. Both stores support injecting a number of
//! upcoming failures so retry behavior can be exercised without a real
//! backend.

use crate::{check_object_size, MetadataStore, ObjectStore};
use async_trait::async_trait;
use dashmap::DashMap;
use recvault_core::{Error, RecordingMetadata, Result};
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};

pub struct MemoryObjectStore {
    objects: DashMap<String, Vec<u8>>,
    max_object_size: u64,
    fail_remaining: AtomicU32,
    put_calls: AtomicU64,
}

impl MemoryObjectStore {
    pub fn new(max_object_size: u64) -> Self {
        Self {
            objects: DashMap::new(),
            max_object_size,
            fail_remaining: AtomicU32::new(0),
            put_calls: AtomicU64::new(0),
        }
    }

    /// Make the next `n` put calls fail with a storage error
    pub fn fail_next(&self, n: u32) {
        self.fail_remaining.store(n, Ordering::SeqCst);
    }

    /// Total put calls observed, including failed ones
    pub fn put_calls(&self) -> u64 {
        self.put_calls.load(Ordering::SeqCst)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.objects.contains_key(key)
    }

    pub fn object_count(&self) -> usize {
        self.objects.len()
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn put(&self, key: &str, bytes: Vec<u8>, _content_type: &str) -> Result<String> {
        self.put_calls.fetch_add(1, Ordering::SeqCst);
        check_object_size(key, bytes.len() as u64, self.max_object_size)?;

        let remaining = self.fail_remaining.load(Ordering::SeqCst);
        if remaining > 0 {
            self.fail_remaining.store(remaining - 1, Ordering::SeqCst);
            return Err(Error::storage(format!("injected failure for {key}")));
        }

        self.objects.insert(key.to_string(), bytes);
        Ok(format!("memory://{key}"))
    }

    fn max_object_size(&self) -> u64 {
        self.max_object_size
    }
}

#[derive(Default)]
pub struct MemoryMetadataStore {
    rows: DashMap<String, RecordingMetadata>,
    fail_remaining: AtomicU32,
    upsert_calls: AtomicU64,
}

impl MemoryMetadataStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `n` upserts fail with a persistence error
    pub fn fail_next(&self, n: u32) {
        self.fail_remaining.store(n, Ordering::SeqCst);
    }

    /// Total upsert calls observed, including failed ones
    pub fn upsert_calls(&self) -> u64 {
        self.upsert_calls.load(Ordering::SeqCst)
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}

#[async_trait]
impl MetadataStore for MemoryMetadataStore {
    async fn upsert_recording(&self, metadata: &RecordingMetadata) -> Result<()> {
        self.upsert_calls.fetch_add(1, Ordering::SeqCst);

        let remaining = self.fail_remaining.load(Ordering::SeqCst);
        if remaining > 0 {
            self.fail_remaining.store(remaining - 1, Ordering::SeqCst);
            return Err(Error::persistence(format!(
                "injected failure for {}",
                metadata.recording_id
            )));
        }

        self.rows
            .insert(metadata.recording_id.clone(), metadata.clone());
        Ok(())
    }

    async fn get_recording(&self, recording_id: &str) -> Result<Option<RecordingMetadata>> {
        Ok(self.rows.get(recording_id).map(|r| r.clone()))
    }

    async fn list_recordings(&self) -> Result<Vec<RecordingMetadata>> {
        Ok(self.rows.iter().map(|r| r.clone()).collect())
    }
}
