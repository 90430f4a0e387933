//! Candidate recording events produced by the watcher and scanner

use std::path::PathBuf;
use std::time::SystemTime;

/// How a candidate file came to the system's attention
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscoveryKind {
    /// A create notification from the OS watcher
    Created,
    /// A modify notification from the OS watcher
    Modified,
    /// Found by a reconciliation scan
    Scanned,
}

/// A path that passed classification and may represent a recording
///
/// Ephemeral: produced by the watcher or scanner, consumed once by the
/// ingestion side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateFile {
    /// Absolute path to the file
    pub path: PathBuf,
    /// Discovery event kind
    pub kind: DiscoveryKind,
    /// When the event was observed
    pub discovered_at: SystemTime,
}

impl CandidateFile {
    pub fn new(path: PathBuf, kind: DiscoveryKind) -> Self {
        Self {
            path,
            kind,
            discovered_at: SystemTime::now(),
        }
    }
}
