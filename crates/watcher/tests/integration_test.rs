//! End-to-end tests for the directory watcher against a real filesystem

use recvault_core::config::WatcherConfig;
use recvault_watcher::{DirectoryWatcher, DiscoveryKind};
use std::time::Duration;

#[tokio::test]
async fn watcher_reports_new_recording_files() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut watcher = DirectoryWatcher::new(WatcherConfig::default());
    let mut candidates = watcher.watch(dir.path()).await.expect("watch starts");

    // Give the OS watcher a moment to register before writing.
    tokio::time::sleep(Duration::from_millis(200)).await;

    let file = dir.path().join("standup.mp4");
    tokio::fs::write(&file, b"recording bytes")
        .await
        .expect("write recording");

    let candidate = tokio::time::timeout(Duration::from_secs(10), async {
        loop {
            let c = candidates.recv().await.expect("channel open");
            if c.path == file {
                return c;
            }
        }
    })
    .await
    .expect("candidate observed before timeout");

    assert!(matches!(
        candidate.kind,
        DiscoveryKind::Created | DiscoveryKind::Modified
    ));

    watcher.stop();
}

#[tokio::test]
async fn watcher_ignores_unrelated_files() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut watcher = DirectoryWatcher::new(WatcherConfig::default());
    let mut candidates = watcher.watch(dir.path()).await.expect("watch starts");

    tokio::time::sleep(Duration::from_millis(200)).await;

    tokio::fs::write(dir.path().join("notes.txt"), b"not a recording")
        .await
        .expect("write file");

    let received = tokio::time::timeout(Duration::from_millis(800), candidates.recv()).await;
    assert!(received.is_err(), "no candidate expected for .txt files");

    watcher.stop();
}
