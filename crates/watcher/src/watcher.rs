//! Directory watcher built on OS change notifications
//!
//! Subscribes to create/modify events on a root path, recursively, and
//! feeds classified candidate files into an mpsc channel. Duplicate and
//! uninteresting events are dropped here so the ingestion side only ever
//! sees plausible recordings.

use crate::classify::PathClassifier;
use crate::events::{CandidateFile, DiscoveryKind};
use notify::{
    Config as NotifyConfig, Event as NotifyEvent, EventKind, RecommendedWatcher, RecursiveMode,
    Watcher as NotifyWatcher,
};
use recvault_core::config::WatcherConfig;
use recvault_core::{Error, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace, warn};

/// Recursive file system watcher producing candidate recording events
pub struct DirectoryWatcher {
    config: Arc<WatcherConfig>,
    classifier: Arc<PathClassifier>,
    /// Active notify watcher; kept alive for the duration of the watch
    watcher: Option<RecommendedWatcher>,
    watched_path: Option<PathBuf>,
    cancellation_token: CancellationToken,
}

impl DirectoryWatcher {
    pub fn new(config: WatcherConfig) -> Self {
        let classifier = PathClassifier::new(&config);
        Self {
            config: Arc::new(config),
            classifier: Arc::new(classifier),
            watcher: None,
            watched_path: None,
            cancellation_token: CancellationToken::new(),
        }
    }

    /// Start watching `path` and return the stream of candidate files
    pub async fn watch(&mut self, path: impl AsRef<Path>) -> Result<mpsc::Receiver<CandidateFile>> {
        let path = path.as_ref().to_path_buf();

        let (notify_tx, notify_rx) = mpsc::channel(self.config.max_queue_size);
        let (candidate_tx, candidate_rx) = mpsc::channel(self.config.max_queue_size);

        self.start_event_processor(notify_rx, candidate_tx);

        let mut watcher = self.init_watcher_with_retry(notify_tx).await?;
        watcher
            .watch(&path, RecursiveMode::Recursive)
            .map_err(|e| Error::watcher(format!("Failed to watch path {path:?}: {e}")))?;

        info!("Watching path: {:?} (recursive)", path);
        self.watcher = Some(watcher);
        self.watched_path = Some(path);

        Ok(candidate_rx)
    }

    /// Initialize the notify watcher with retry logic
    async fn init_watcher_with_retry(
        &self,
        tx: mpsc::Sender<NotifyEvent>,
    ) -> Result<RecommendedWatcher> {
        let mut attempts = 0;
        let max_attempts = self.config.max_init_retries;

        loop {
            attempts += 1;

            match Self::create_notify_watcher(tx.clone()) {
                Ok(watcher) => {
                    info!("File watcher initialized successfully");
                    return Ok(watcher);
                }
                Err(e) if attempts < max_attempts => {
                    warn!(
                        "Failed to initialize watcher (attempt {}/{}): {}",
                        attempts, max_attempts, e
                    );
                    tokio::time::sleep(self.config.init_retry_delay()).await;
                }
                Err(e) => {
                    error!("Failed to initialize watcher after {} attempts", attempts);
                    return Err(Error::watcher(format!(
                        "Watcher initialization failed: {e}"
                    )));
                }
            }
        }
    }

    fn create_notify_watcher(tx: mpsc::Sender<NotifyEvent>) -> Result<RecommendedWatcher> {
        let watcher = RecommendedWatcher::new(
            move |res: std::result::Result<NotifyEvent, notify::Error>| match res {
                Ok(event) => {
                    if let Err(e) = tx.try_send(event) {
                        error!("Failed to send notify event: {}", e);
                    }
                }
                Err(e) => {
                    error!("Notify error: {}", e);
                }
            },
            NotifyConfig::default(),
        )
        .map_err(|e| Error::watcher(format!("Failed to create watcher: {e}")))?;

        Ok(watcher)
    }

    /// Spawn the task that converts notify events into candidate files
    fn start_event_processor(
        &self,
        mut notify_rx: mpsc::Receiver<NotifyEvent>,
        candidate_tx: mpsc::Sender<CandidateFile>,
    ) {
        let classifier = Arc::clone(&self.classifier);
        let cancel_token = self.cancellation_token.clone();

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = cancel_token.cancelled() => {
                        debug!("Event processor shutting down");
                        break;
                    }
                    event = notify_rx.recv() => {
                        let Some(event) = event else { break };
                        trace!("Received notify event: {:?}", event);
                        for candidate in Self::convert_notify_event(event, &classifier) {
                            if candidate_tx.send(candidate).await.is_err() {
                                debug!("Candidate channel closed, stopping event processor");
                                return;
                            }
                        }
                    }
                }
            }
        });
    }

    /// Convert one notify event into zero or more candidate files
    fn convert_notify_event(
        event: NotifyEvent,
        classifier: &PathClassifier,
    ) -> Vec<CandidateFile> {
        let kind = match event.kind {
            EventKind::Create(_) => DiscoveryKind::Created,
            EventKind::Modify(_) => DiscoveryKind::Modified,
            _ => return Vec::new(),
        };

        event
            .paths
            .into_iter()
            .filter(|path| {
                let qualifies = classifier.is_candidate(path);
                if !qualifies {
                    trace!(?path, "ignoring non-candidate path");
                }
                qualifies
            })
            .map(|path| CandidateFile::new(path, kind))
            .collect()
    }

    /// Stop watching; pending events in the channel are dropped
    pub fn stop(&mut self) {
        self.cancellation_token.cancel();
        if let Some(mut watcher) = self.watcher.take() {
            if let Some(path) = self.watched_path.take() {
                if let Err(e) = watcher.unwatch(&path) {
                    debug!(?path, error = %e, "unwatch failed during stop");
                }
            }
            info!("File watcher stopped");
        }
    }

    /// The path currently being watched, if any
    pub fn watched_path(&self) -> Option<&Path> {
        self.watched_path.as_deref()
    }
}

impl Drop for DirectoryWatcher {
    fn drop(&mut self) {
        self.cancellation_token.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::CreateKind;

    fn classifier() -> PathClassifier {
        PathClassifier::new(&WatcherConfig::default())
    }

    #[test]
    fn non_create_modify_events_are_dropped() {
        let event = NotifyEvent::new(EventKind::Remove(notify::event::RemoveKind::File))
            .add_path(PathBuf::from("gone.mp4"));
        assert!(DirectoryWatcher::convert_notify_event(event, &classifier()).is_empty());
    }

    #[test]
    fn create_event_for_missing_file_is_dropped() {
        // Classification stats the path; a path that no longer exists is
        // not a candidate even when the extension matches.
        let event = NotifyEvent::new(EventKind::Create(CreateKind::File))
            .add_path(PathBuf::from("/not/present.mp4"));
        assert!(DirectoryWatcher::convert_notify_event(event, &classifier()).is_empty());
    }

    #[test]
    fn create_event_for_real_recording_is_forwarded() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("meeting.mp4");
        std::fs::write(&path, b"data").expect("write");

        let event =
            NotifyEvent::new(EventKind::Create(CreateKind::File)).add_path(path.clone());
        let candidates = DirectoryWatcher::convert_notify_event(event, &classifier());
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].path, path);
        assert_eq!(candidates[0].kind, DiscoveryKind::Created);
    }
}
