//! Candidate path classification
//!
//! A path qualifies as a candidate recording when it names a regular file
//! whose extension is on the configured allow-list. Classification never
//! errors; anything unreadable is simply not a candidate.

use recvault_core::config::WatcherConfig;
use std::path::Path;

/// Pure predicate over filesystem paths
#[derive(Debug, Clone)]
pub struct PathClassifier {
    /// Allowed extensions, lowercase, without the dot
    extensions: Vec<String>,
}

impl PathClassifier {
    pub fn new(config: &WatcherConfig) -> Self {
        Self {
            extensions: config
                .allowed_extensions
                .iter()
                .map(|e| e.trim_start_matches('.').to_ascii_lowercase())
                .collect(),
        }
    }

    /// Whether `path` names a regular file with an allowed extension
    ///
    /// The only I/O is a stat to confirm regular-file-ness; a
    /// symlink-to-directory or a vanished path classifies as false.
    pub fn is_candidate(&self, path: &Path) -> bool {
        if !self.has_allowed_extension(path) {
            return false;
        }
        path.metadata().map(|m| m.is_file()).unwrap_or(false)
    }

    /// Extension check alone, without touching the filesystem
    pub fn has_allowed_extension(&self, path: &Path) -> bool {
        let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
            return false;
        };
        let ext = ext.to_ascii_lowercase();
        self.extensions.iter().any(|allowed| *allowed == ext)
    }
}
