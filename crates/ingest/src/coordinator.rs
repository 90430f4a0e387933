//! Ingestion coordinator
//!
//! Drives one candidate file from discovered to done or abandoned:
//! stability wait, metadata extraction, upload, metadata persistence.
//! Retryable failures are classified here and reported to the caller as a
//! deferred re-submission; they never propagate to whatever triggered
//! detection.

use crate::metadata::extract_metadata;
use crate::stats::Statistics;
use crate::tracker::InFlightGuard;
use chrono::Utc;
use dashmap::DashSet;
use recvault_core::config::{RetryConfig, StabilityConfig};
use recvault_core::{Error, Result};
use recvault_storage::{content_type_for, MetadataStore, ObjectStore};
use recvault_watcher::{await_stability, CandidateFile, StabilityOutcome};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Per-path ingestion states, in pipeline order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestionState {
    Discovered,
    AwaitingStability,
    ExtractingMetadata,
    Uploading,
    PersistingMetadata,
    Done,
    Failed,
    Abandoned,
}

/// Terminal result of one coordinator run for a path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestOutcome {
    /// Uploaded and persisted; path added to the processed set
    Done,
    /// File disappeared before upload; abandoned without counting a failure
    Gone,
    /// Retryable failure; caller should re-submit as `attempt` after `delay`
    Retry { attempt: u32, delay: Duration },
    /// Retries exhausted; `files_failed` incremented
    Abandoned,
    /// Already processed; nothing to do
    Skipped,
}

/// Runs the per-file ingestion state machine
pub struct IngestionCoordinator {
    object_store: Arc<dyn ObjectStore>,
    metadata_store: Arc<dyn MetadataStore>,
    processed: Arc<DashSet<PathBuf>>,
    stats: Arc<Statistics>,
    stability: StabilityConfig,
    retry: RetryConfig,
    user_id: String,
    storage_prefix: String,
}

impl IngestionCoordinator {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        object_store: Arc<dyn ObjectStore>,
        metadata_store: Arc<dyn MetadataStore>,
        processed: Arc<DashSet<PathBuf>>,
        stats: Arc<Statistics>,
        stability: StabilityConfig,
        retry: RetryConfig,
        user_id: String,
        storage_prefix: String,
    ) -> Self {
        Self {
            object_store,
            metadata_store,
            processed,
            stats,
            stability,
            retry,
            user_id,
            storage_prefix,
        }
    }

    /// Ingest one candidate as attempt number `attempt` (1-based)
    ///
    /// The in-flight guard is held for the whole run and released when
    /// this returns, so a scheduled retry re-enters as a fresh acquisition.
    pub async fn ingest(
        &self,
        candidate: &CandidateFile,
        attempt: u32,
        guard: InFlightGuard,
    ) -> IngestOutcome {
        let path = &candidate.path;
        debug_assert_eq!(guard.path(), path.as_path());

        if self.processed.contains(path) {
            debug!(?path, "already processed, skipping");
            return IngestOutcome::Skipped;
        }

        debug!(?path, attempt, state = ?IngestionState::AwaitingStability, "ingestion started");
        match await_stability(path, &self.stability).await {
            StabilityOutcome::Stable => {}
            StabilityOutcome::TimedOut => {
                warn!(?path, "stability wait timed out, proceeding with upload anyway");
            }
            StabilityOutcome::Gone => {
                info!(?path, state = ?IngestionState::Abandoned, "file vanished, abandoning attempt");
                return IngestOutcome::Gone;
            }
        }

        match self.run_attempt(path).await {
            Ok(recording_id) => {
                self.processed.insert(path.clone());
                self.stats.record_processed();
                info!(?path, recording_id, state = ?IngestionState::Done, "recording ingested");
                IngestOutcome::Done
            }
            Err(e) => {
                // Treated as fresh on the next attempt.
                self.processed.remove(path);

                let retries_done = attempt.saturating_sub(1);
                if e.is_retryable() && retries_done < self.retry.max_attempts {
                    let delay = self.retry.delay_for_attempt(attempt);
                    warn!(
                        ?path,
                        attempt,
                        error = %e,
                        retry_in_ms = delay.as_millis() as u64,
                        state = ?IngestionState::Failed,
                        "ingestion failed, retry scheduled"
                    );
                    IngestOutcome::Retry {
                        attempt: attempt + 1,
                        delay,
                    }
                } else {
                    self.stats.record_failed();
                    error!(
                        ?path,
                        attempt,
                        error = %e,
                        state = ?IngestionState::Abandoned,
                        "ingestion abandoned after exhausting retries"
                    );
                    IngestOutcome::Abandoned
                }
            }
        }
    }

    /// One pass through extract -> upload -> persist
    async fn run_attempt(&self, path: &Path) -> Result<String> {
        debug!(?path, state = ?IngestionState::ExtractingMetadata, "extracting metadata");
        let mut metadata = extract_metadata(path, &self.user_id).await?;

        // Fail fast before reading the payload, let alone any network call.
        let max = self.object_store.max_object_size();
        if metadata.file_size > max {
            return Err(Error::storage(format!(
                "{} is {} bytes, exceeds maximum {max}",
                path.display(),
                metadata.file_size
            )));
        }

        debug!(
            ?path,
            size = metadata.file_size,
            state = ?IngestionState::Uploading,
            "uploading recording"
        );
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| Error::storage(format!("reading {}: {e}", path.display())))?;
        let key = metadata.storage_key(&self.storage_prefix);
        let url = self
            .object_store
            .put(&key, bytes, content_type_for(path))
            .await?;

        metadata.file_url = Some(url);
        metadata.uploaded_at = Some(Utc::now());

        debug!(?path, state = ?IngestionState::PersistingMetadata, "persisting metadata");
        self.metadata_store.upsert_recording(&metadata).await?;

        Ok(metadata.recording_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracker::InFlightTracker;
    use pretty_assertions::assert_eq;
    use recvault_storage::{MemoryMetadataStore, MemoryObjectStore};
    use recvault_watcher::DiscoveryKind;

    struct Harness {
        coordinator: IngestionCoordinator,
        tracker: Arc<InFlightTracker>,
        object_store: Arc<MemoryObjectStore>,
        metadata_store: Arc<MemoryMetadataStore>,
        processed: Arc<DashSet<PathBuf>>,
        stats: Arc<Statistics>,
    }

    fn harness(max_retries: u32) -> Harness {
        let object_store = Arc::new(MemoryObjectStore::new(1024 * 1024));
        let metadata_store = Arc::new(MemoryMetadataStore::new());
        let processed = Arc::new(DashSet::new());
        let stats = Arc::new(Statistics::new());

        let coordinator = IngestionCoordinator::new(
            Arc::clone(&object_store) as Arc<dyn ObjectStore>,
            Arc::clone(&metadata_store) as Arc<dyn MetadataStore>,
            Arc::clone(&processed),
            Arc::clone(&stats),
            StabilityConfig {
                poll_interval_ms: 10,
                required_stable_polls: 1,
                max_wait_ms: 500,
            },
            RetryConfig {
                max_attempts: max_retries,
                base_delay_ms: 1,
                cooldown_ms: 1,
            },
            "local_user".to_string(),
            "recordings".to_string(),
        );

        Harness {
            coordinator,
            tracker: InFlightTracker::new(),
            object_store,
            metadata_store,
            processed,
            stats,
        }
    }

    fn candidate(dir: &Path, name: &str) -> CandidateFile {
        let path = dir.join(name);
        std::fs::write(&path, b"recording payload").expect("write");
        CandidateFile::new(path, DiscoveryKind::Created)
    }

    /// Run the retry loop to a terminal outcome, counting attempts
    async fn drive(h: &Harness, candidate: &CandidateFile) -> (IngestOutcome, u32) {
        let mut attempt = 1;
        loop {
            let guard = h
                .tracker
                .acquire(&candidate.path)
                .expect("fresh acquisition per attempt");
            match h.coordinator.ingest(candidate, attempt, guard).await {
                IngestOutcome::Retry { attempt: next, .. } => attempt = next,
                terminal => return (terminal, attempt),
            }
        }
    }

    #[tokio::test]
    async fn happy_path_uploads_and_persists_once() {
        let dir = tempfile::tempdir().expect("tempdir");
        let h = harness(3);
        let candidate = candidate(dir.path(), "standup.mp4");

        let (outcome, attempts) = drive(&h, &candidate).await;
        assert_eq!(outcome, IngestOutcome::Done);
        assert_eq!(attempts, 1);
        assert_eq!(h.metadata_store.upsert_calls(), 1);
        assert_eq!(h.object_store.object_count(), 1);
        assert_eq!(h.stats.files_processed(), 1);
        assert_eq!(h.stats.files_failed(), 0);
        assert!(h.processed.contains(&candidate.path));

        let rows = h.metadata_store.list_recordings().await.expect("list");
        assert_eq!(rows.len(), 1);
        assert!(rows[0].file_url.as_deref().is_some_and(|u| u.starts_with("memory://")));
        assert!(rows[0].uploaded_at.is_some());
    }

    #[tokio::test]
    async fn upload_failing_twice_succeeds_on_third_attempt() {
        let dir = tempfile::tempdir().expect("tempdir");
        let h = harness(3);
        let candidate = candidate(dir.path(), "retro.mp4");
        h.object_store.fail_next(2);

        let (outcome, attempts) = drive(&h, &candidate).await;
        assert_eq!(outcome, IngestOutcome::Done);
        assert_eq!(attempts, 3);
        assert_eq!(h.object_store.put_calls(), 3);
        assert_eq!(h.stats.files_processed(), 1);
        assert_eq!(h.stats.files_failed(), 0);
    }

    #[tokio::test]
    async fn always_failing_upload_is_abandoned_after_retry_budget() {
        let dir = tempfile::tempdir().expect("tempdir");
        let h = harness(2);
        let candidate = candidate(dir.path(), "doomed.mp4");
        h.object_store.fail_next(u32::MAX);

        let (outcome, _) = drive(&h, &candidate).await;
        assert_eq!(outcome, IngestOutcome::Abandoned);
        // Initial attempt plus exactly max_retries retries.
        assert_eq!(h.object_store.put_calls(), 3);
        assert_eq!(h.stats.files_failed(), 1);
        assert_eq!(h.stats.files_processed(), 0);
        assert!(!h.processed.contains(&candidate.path));
    }

    #[tokio::test]
    async fn persistence_failure_retries_and_reuploads() {
        let dir = tempfile::tempdir().expect("tempdir");
        let h = harness(3);
        let candidate = candidate(dir.path(), "sync.mp4");
        h.metadata_store.fail_next(1);

        let (outcome, attempts) = drive(&h, &candidate).await;
        assert_eq!(outcome, IngestOutcome::Done);
        assert_eq!(attempts, 2);
        assert_eq!(h.metadata_store.upsert_calls(), 2);
        // Same recording id both times, so a single row results.
        assert_eq!(h.metadata_store.row_count(), 1);
    }

    #[tokio::test]
    async fn vanished_file_is_gone_not_failed() {
        let dir = tempfile::tempdir().expect("tempdir");
        let h = harness(3);
        let candidate = CandidateFile::new(dir.path().join("ghost.mp4"), DiscoveryKind::Created);

        let guard = h.tracker.acquire(&candidate.path).expect("acquire");
        let outcome = h.coordinator.ingest(&candidate, 1, guard).await;
        assert_eq!(outcome, IngestOutcome::Gone);
        assert_eq!(h.stats.files_failed(), 0);
        assert_eq!(h.object_store.put_calls(), 0);
    }

    #[tokio::test]
    async fn processed_path_is_skipped() {
        let dir = tempfile::tempdir().expect("tempdir");
        let h = harness(3);
        let candidate = candidate(dir.path(), "done.mp4");
        h.processed.insert(candidate.path.clone());

        let guard = h.tracker.acquire(&candidate.path).expect("acquire");
        let outcome = h.coordinator.ingest(&candidate, 1, guard).await;
        assert_eq!(outcome, IngestOutcome::Skipped);
        assert_eq!(h.object_store.put_calls(), 0);
    }

    #[tokio::test]
    async fn oversized_payload_fails_before_any_store_call() {
        let dir = tempfile::tempdir().expect("tempdir");
        let object_store = Arc::new(MemoryObjectStore::new(4));
        let metadata_store = Arc::new(MemoryMetadataStore::new());
        let coordinator = IngestionCoordinator::new(
            Arc::clone(&object_store) as Arc<dyn ObjectStore>,
            Arc::clone(&metadata_store) as Arc<dyn MetadataStore>,
            Arc::new(DashSet::new()),
            Arc::new(Statistics::new()),
            StabilityConfig {
                poll_interval_ms: 10,
                required_stable_polls: 1,
                max_wait_ms: 500,
            },
            RetryConfig {
                max_attempts: 0,
                base_delay_ms: 1,
                cooldown_ms: 1,
            },
            "local_user".to_string(),
            "recordings".to_string(),
        );
        let tracker = InFlightTracker::new();
        let candidate = candidate(dir.path(), "huge.mp4");

        let guard = tracker.acquire(&candidate.path).expect("acquire");
        let outcome = coordinator.ingest(&candidate, 1, guard).await;
        assert_eq!(outcome, IngestOutcome::Abandoned);
        assert_eq!(object_store.put_calls(), 0);
    }
}
