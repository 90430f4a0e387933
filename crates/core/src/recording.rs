//! Recording metadata model and derivation helpers
//!
//! Metadata is derived deterministically from a file's path and stat info
//! so that retrying the same file produces the same recording id.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Where a recording entered the system
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordingSource {
    /// Picked up from a watched local directory
    LocalFolder,
    /// Uploaded through an API surface
    Upload,
}

/// Metadata for one ingested recording file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordingMetadata {
    /// Stable identifier, derived from mtime and file stem
    pub recording_id: String,
    /// Owner of the recording
    pub user_id: String,
    /// Display title extracted from the file name
    pub meeting_title: String,
    /// Original file name
    pub file_name: String,
    /// Size in bytes
    pub file_size: u64,
    /// Source-file modification time, treated as the meeting date
    pub meeting_date: DateTime<Utc>,
    /// When the file landed in object storage
    pub uploaded_at: Option<DateTime<Utc>>,
    /// URL returned by the object store after upload
    pub file_url: Option<String>,
    /// Origin of the recording
    pub source: RecordingSource,
}

impl RecordingMetadata {
    /// Storage key for this recording's payload
    pub fn storage_key(&self, prefix: &str) -> String {
        format!(
            "{prefix}/{}/{}/{}",
            self.user_id, self.recording_id, self.file_name
        )
    }
}

/// Derive the stable recording id for a file
///
/// Recomputing for the same stem and mtime yields an identical id, which
/// keeps the database upsert idempotent across retries of the same file.
pub fn recording_id_for(stem: &str, mtime: DateTime<Utc>) -> String {
    format!("local_{}_{stem}", mtime.format("%Y%m%d_%H%M%S"))
}

/// Suffixes that recording software appends to per-track files
const TRACK_SUFFIXES: &[&str] = &["_video", "_audio_only", "_chat", "_transcript"];

/// Extract a human-readable meeting title from a recording path
///
/// Strips per-track suffixes, converts separators to spaces, and falls
/// back to the parent directory name when the result looks like a bare
/// counter or timestamp fragment.
pub fn meeting_title_for(path: &Path) -> String {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();

    let mut name = stem.as_str();
    for suffix in TRACK_SUFFIXES {
        if let Some(trimmed) = name.strip_suffix(suffix) {
            name = trimmed;
            break;
        }
    }

    let mut title = normalize_title(name);

    if title.len() < 5 || title.chars().all(|c| c.is_ascii_digit()) {
        title = path
            .parent()
            .and_then(|p| p.file_name())
            .map(|n| normalize_title(&n.to_string_lossy()))
            .unwrap_or_default();
    }

    if title.is_empty() {
        "Meeting Recording".to_string()
    } else {
        title
    }
}

fn normalize_title(raw: &str) -> String {
    raw.replace(['_', '-'], " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}
