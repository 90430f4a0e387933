//! Reconciliation scan
//!
//! Walks the watched tree for qualifying files modified within a recency
//! window. Runs at watch start and on explicit request; it recovers files
//! that arrived while the watcher was not running. Steady-state detection
//! stays with the notification stream.

use crate::classify::PathClassifier;
use crate::events::{CandidateFile, DiscoveryKind};
use recvault_core::{Error, Result};
use std::path::Path;
use std::time::{Duration, SystemTime};
use tracing::{debug, info, warn};

/// Walk `root` for candidate recordings modified within `recency_window`
///
/// Unreadable subdirectories are skipped with a warning; only a failure to
/// read the root itself is an error.
pub async fn scan_recent_files(
    root: &Path,
    classifier: &PathClassifier,
    recency_window: Duration,
) -> Result<Vec<CandidateFile>> {
    let now = SystemTime::now();
    let mut found = Vec::new();
    let mut pending = vec![root.to_path_buf()];
    let mut first_level = true;

    while let Some(dir) = pending.pop() {
        let mut entries = match tokio::fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if first_level => {
                return Err(Error::watcher(format!("scanning {dir:?}: {e}")));
            }
            Err(e) => {
                warn!(?dir, error = %e, "skipping unreadable directory");
                continue;
            }
        };
        first_level = false;

        loop {
            let entry = match entries.next_entry().await {
                Ok(Some(entry)) => entry,
                Ok(None) => break,
                Err(e) => {
                    warn!(?dir, error = %e, "error reading directory entry");
                    break;
                }
            };

            let path = entry.path();
            let Ok(file_type) = entry.file_type().await else {
                continue;
            };

            if file_type.is_dir() {
                pending.push(path);
                continue;
            }

            if !classifier.is_candidate(&path) {
                continue;
            }

            let Ok(metadata) = entry.metadata().await else {
                continue;
            };
            let Ok(modified) = metadata.modified() else {
                continue;
            };

            match now.duration_since(modified) {
                Ok(age) if age > recency_window => {
                    debug!(?path, "outside recency window, skipping");
                }
                // Files modified "in the future" still qualify; clock skew
                // between the recorder and this host is common.
                _ => found.push(CandidateFile::new(path, DiscoveryKind::Scanned)),
            }
        }
    }

    info!(root = ?root, count = found.len(), "reconciliation scan complete");
    Ok(found)
}

#[cfg(test)]
mod tests {
    use super::*;
    use recvault_core::config::WatcherConfig;

    fn classifier() -> PathClassifier {
        PathClassifier::new(&WatcherConfig::default())
    }

    #[tokio::test]
    async fn finds_recent_recordings_recursively() {
        let dir = tempfile::tempdir().expect("tempdir");
        let nested = dir.path().join("2024").join("march");
        std::fs::create_dir_all(&nested).expect("mkdir");
        std::fs::write(nested.join("standup.mp4"), b"a").expect("write");
        std::fs::write(dir.path().join("notes.txt"), b"b").expect("write");
        std::fs::write(dir.path().join("retro.webm"), b"c").expect("write");

        let mut found =
            scan_recent_files(dir.path(), &classifier(), Duration::from_secs(3600))
                .await
                .expect("scan");
        found.sort_by(|a, b| a.path.cmp(&b.path));

        let names: Vec<_> = found
            .iter()
            .map(|c| c.path.file_name().map(|n| n.to_owned()))
            .collect();
        assert_eq!(found.len(), 2);
        assert!(names.iter().flatten().any(|n| n == "standup.mp4"));
        assert!(names.iter().flatten().any(|n| n == "retro.webm"));
        assert!(found.iter().all(|c| c.kind == DiscoveryKind::Scanned));
    }

    #[tokio::test]
    async fn old_files_are_excluded() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join("ancient.mp4"), b"a").expect("write");
        tokio::time::sleep(Duration::from_millis(80)).await;

        let found = scan_recent_files(dir.path(), &classifier(), Duration::from_millis(10))
            .await
            .expect("scan");
        assert!(found.is_empty());
    }

    #[tokio::test]
    async fn missing_root_is_an_error() {
        let result = scan_recent_files(
            Path::new("/no/such/root"),
            &classifier(),
            Duration::from_secs(60),
        )
        .await;
        assert!(result.is_err());
    }
}
