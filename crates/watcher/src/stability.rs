//! File stability detection
//!
//! A file is considered stable once its size has stopped changing across a
//! required number of consecutive polls. This is a heuristic for "fully
//! written": recording software writes large container files over many
//! seconds, and uploading a half-written file produces a corrupt object.

use recvault_core::config::StabilityConfig;
use std::io::ErrorKind;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, trace, warn};

/// Result of waiting for a file to stop growing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StabilityOutcome {
    /// Size unchanged for the required number of consecutive polls
    Stable,
    /// The wait cap elapsed first; callers proceed anyway
    TimedOut,
    /// The file disappeared mid-poll (moved or deleted)
    Gone,
}

/// Wait until `path` has finished being written
///
/// Polls the file size on a fixed interval. Transient stat errors other
/// than NotFound leave the stable-poll counter untouched rather than
/// resetting the wait.
pub async fn await_stability(path: &Path, config: &StabilityConfig) -> StabilityOutcome {
    let started = Instant::now();

    let mut last_size = match tokio::fs::metadata(path).await {
        Ok(meta) => meta.len(),
        Err(e) if e.kind() == ErrorKind::NotFound => return StabilityOutcome::Gone,
        Err(e) => {
            warn!(?path, error = %e, "initial stat failed, waiting for file to settle");
            u64::MAX
        }
    };
    let mut stable_polls = 0u32;

    loop {
        if started.elapsed() >= config.max_wait() {
            debug!(?path, "stability wait capped, proceeding anyway");
            return StabilityOutcome::TimedOut;
        }

        tokio::time::sleep(config.poll_interval()).await;

        match tokio::fs::metadata(path).await {
            Ok(meta) => {
                let size = meta.len();
                if size == last_size {
                    stable_polls += 1;
                    trace!(?path, size, stable_polls, "size unchanged");
                    if stable_polls >= config.required_stable_polls {
                        debug!(
                            ?path,
                            size,
                            elapsed_ms = started.elapsed().as_millis() as u64,
                            "file appears complete"
                        );
                        return StabilityOutcome::Stable;
                    }
                } else {
                    trace!(?path, last_size, size, "file still growing");
                    last_size = size;
                    stable_polls = 0;
                }
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(?path, "file vanished while awaiting stability");
                return StabilityOutcome::Gone;
            }
            Err(e) => {
                // File may be momentarily inaccessible; keep the counter.
                trace!(?path, error = %e, "stat failed, retrying");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn fast_config() -> StabilityConfig {
        StabilityConfig {
            poll_interval_ms: 20,
            required_stable_polls: 3,
            max_wait_ms: 2000,
        }
    }

    #[tokio::test]
    async fn quiescent_file_becomes_stable() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("done.mp4");
        std::fs::write(&path, b"complete").expect("write");

        let started = Instant::now();
        let outcome = await_stability(&path, &fast_config()).await;
        assert_eq!(outcome, StabilityOutcome::Stable);
        // Needs at least required_stable_polls * poll_interval of quiet time.
        assert!(started.elapsed() >= Duration::from_millis(60));
    }

    #[tokio::test]
    async fn growing_file_times_out() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("growing.mp4");
        std::fs::write(&path, b"start").expect("write");

        let config = StabilityConfig {
            poll_interval_ms: 20,
            required_stable_polls: 3,
            max_wait_ms: 200,
        };

        let writer_path = path.clone();
        let writer = tokio::spawn(async move {
            for i in 0..30u32 {
                let mut contents = vec![0u8; (i as usize + 1) * 10];
                contents.fill(7);
                let _ = tokio::fs::write(&writer_path, contents).await;
                tokio::time::sleep(Duration::from_millis(15)).await;
            }
        });

        let outcome = await_stability(&path, &config).await;
        writer.abort();
        assert_eq!(outcome, StabilityOutcome::TimedOut);
    }

    #[tokio::test]
    async fn vanished_file_reports_gone() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("fleeting.mp4");
        std::fs::write(&path, b"here").expect("write");

        let remove_path = path.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(30)).await;
            let _ = tokio::fs::remove_file(&remove_path).await;
        });

        let outcome = await_stability(&path, &fast_config()).await;
        assert_eq!(outcome, StabilityOutcome::Gone);
    }

    #[tokio::test]
    async fn missing_file_is_gone_immediately() {
        let outcome = await_stability(Path::new("/no/such/file.mp4"), &fast_config()).await;
        assert_eq!(outcome, StabilityOutcome::Gone);
    }
}
