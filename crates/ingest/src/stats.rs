//! Ingestion statistics
//!
//! Counters mutated only by the coordinator's terminal transitions.
//! Monotonically non-decreasing for the lifetime of the process.

use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

pub struct Statistics {
    files_processed: AtomicU64,
    files_failed: AtomicU64,
    started_at: DateTime<Utc>,
    last_file_time: Mutex<Option<DateTime<Utc>>>,
}

impl Statistics {
    pub fn new() -> Self {
        Self {
            files_processed: AtomicU64::new(0),
            files_failed: AtomicU64::new(0),
            started_at: Utc::now(),
            last_file_time: Mutex::new(None),
        }
    }

    /// Record one successfully completed ingestion
    pub fn record_processed(&self) {
        self.files_processed.fetch_add(1, Ordering::Relaxed);
        if let Ok(mut last) = self.last_file_time.lock() {
            *last = Some(Utc::now());
        }
    }

    /// Record one abandoned ingestion (retries exhausted)
    pub fn record_failed(&self) {
        self.files_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn files_processed(&self) -> u64 {
        self.files_processed.load(Ordering::Relaxed)
    }

    pub fn files_failed(&self) -> u64 {
        self.files_failed.load(Ordering::Relaxed)
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn last_file_time(&self) -> Option<DateTime<Utc>> {
        self.last_file_time.lock().ok().and_then(|last| *last)
    }
}

impl Default for Statistics {
    fn default() -> Self {
        Self::new()
    }
}
