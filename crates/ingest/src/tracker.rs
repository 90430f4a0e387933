//! In-flight path tracking
//!
//! Process-wide set of paths currently undergoing ingestion. Acquisition
//! is scoped: the returned guard releases the path on drop, so every exit
//! path (including task cancellation) releases its entry.

use dashmap::DashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::trace;

/// Set of paths with an ingestion attempt currently running
#[derive(Default)]
pub struct InFlightTracker {
    paths: DashSet<PathBuf>,
}

impl InFlightTracker {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Try to claim `path` for ingestion
    ///
    /// Returns `None` when another attempt is already in flight for the
    /// exact path; the caller must drop the event. The insert on the
    /// concurrent set is the atomic check-and-act.
    pub fn acquire(self: &Arc<Self>, path: &Path) -> Option<InFlightGuard> {
        if self.paths.insert(path.to_path_buf()) {
            trace!(?path, "acquired in-flight entry");
            Some(InFlightGuard {
                tracker: Arc::clone(self),
                path: path.to_path_buf(),
            })
        } else {
            trace!(?path, "path already in flight, dropping event");
            None
        }
    }

    /// Whether an attempt is currently running for `path`
    pub fn contains(&self, path: &Path) -> bool {
        self.paths.contains(path)
    }

    /// Number of paths currently in flight
    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    fn release(&self, path: &Path) {
        self.paths.remove(path);
        trace!(?path, "released in-flight entry");
    }
}

/// Scoped ownership of one path's ingestion slot
pub struct InFlightGuard {
    tracker: Arc<InFlightTracker>,
    path: PathBuf,
}

impl InFlightGuard {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.tracker.release(&self.path);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_acquire_for_same_path_fails() {
        let tracker = InFlightTracker::new();
        let path = Path::new("/rec/a.mp4");

        let guard = tracker.acquire(path);
        assert!(guard.is_some());
        assert!(tracker.acquire(path).is_none());

        drop(guard);
        assert!(tracker.acquire(path).is_some());
    }

    #[test]
    fn distinct_paths_do_not_contend() {
        let tracker = InFlightTracker::new();
        let a = tracker.acquire(Path::new("/rec/a.mp4"));
        let b = tracker.acquire(Path::new("/rec/b.mp4"));
        assert!(a.is_some() && b.is_some());
        assert_eq!(tracker.len(), 2);
    }

    #[tokio::test]
    async fn concurrent_acquires_grant_exactly_one() {
        let tracker = InFlightTracker::new();
        let path = PathBuf::from("/rec/contested.mp4");

        let mut handles = Vec::new();
        for _ in 0..32 {
            let tracker = Arc::clone(&tracker);
            let path = path.clone();
            handles.push(tokio::spawn(async move {
                tracker.acquire(&path).is_some()
            }));
        }

        let mut granted = 0;
        for handle in handles {
            if handle.await.expect("task join") {
                granted += 1;
            }
        }
        assert_eq!(granted, 1);
        assert_eq!(tracker.len(), 1);
    }

    #[test]
    fn guard_releases_on_panic_unwind() {
        let tracker = InFlightTracker::new();
        let path = PathBuf::from("/rec/a.mp4");

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe({
            let tracker = Arc::clone(&tracker);
            let path = path.clone();
            move || {
                let _guard = tracker.acquire(&path);
                panic!("attempt blew up");
            }
        }));
        assert!(result.is_err());
        assert!(!tracker.contains(&path));
    }
}
