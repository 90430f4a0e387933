//! Metadata extraction from recording files
//!
//! Stat-only: no network I/O happens here. The derived recording id is a
//! pure function of the path and mtime, so retries of the same file
//! produce the same id and the database upsert stays idempotent.

use chrono::{DateTime, Utc};
use recvault_core::recording::{meeting_title_for, recording_id_for};
use recvault_core::{Error, RecordingMetadata, RecordingSource, Result};
use std::path::Path;

/// Derive `RecordingMetadata` from a file's path and stat info
pub async fn extract_metadata(path: &Path, user_id: &str) -> Result<RecordingMetadata> {
    let stat = tokio::fs::metadata(path)
        .await
        .map_err(|e| Error::metadata(path.display().to_string(), format!("stat failed: {e}")))?;

    let modified = stat
        .modified()
        .map_err(|e| Error::metadata(path.display().to_string(), format!("no mtime: {e}")))?;
    let meeting_date: DateTime<Utc> = modified.into();

    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .ok_or_else(|| Error::metadata(path.display().to_string(), "unusable file name"))?;
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| Error::metadata(path.display().to_string(), "unusable file name"))?;

    Ok(RecordingMetadata {
        recording_id: recording_id_for(stem, meeting_date),
        user_id: user_id.to_string(),
        meeting_title: meeting_title_for(path),
        file_name: file_name.to_string(),
        file_size: stat.len(),
        meeting_date,
        uploaded_at: None,
        file_url: None,
        source: RecordingSource::LocalFolder,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn extraction_is_idempotent_for_unchanged_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("Weekly_Sync_video.mp4");
        std::fs::write(&path, b"0123456789").expect("write");

        let first = extract_metadata(&path, "local_user").await.expect("first");
        let second = extract_metadata(&path, "local_user").await.expect("second");

        assert_eq!(first.recording_id, second.recording_id);
        assert_eq!(first.file_size, 10);
        assert_eq!(first.meeting_title, "Weekly Sync");
        assert_eq!(first.file_name, "Weekly_Sync_video.mp4");
        assert!(first.recording_id.starts_with("local_"));
        assert!(first.recording_id.ends_with("_Weekly_Sync_video"));
    }

    #[tokio::test]
    async fn vanished_file_is_a_metadata_error() {
        let err = extract_metadata(Path::new("/no/such/file.mp4"), "local_user")
            .await
            .expect_err("must fail");
        assert!(err.is_retryable());
    }
}
