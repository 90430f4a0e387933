#![deny(warnings)]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]

//! File system watching for recording discovery
//!
//! This crate turns OS-level change notifications and directory walks into
//! a stream of candidate recording files:
//! - Extension/regular-file classification of paths
//! - Size-polling stability detection for files still being written
//! - A notify-based recursive watcher with initialization retry
//! - A reconciliation scan that recovers files which arrived while the
//!   watcher was not running
//!
//! # Example
//!
//! ```no_run
//! use recvault_core::config::WatcherConfig;
//! use recvault_watcher::DirectoryWatcher;
//! use std::path::PathBuf;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = WatcherConfig::default();
//! let mut watcher = DirectoryWatcher::new(config);
//!
//! let mut candidates = watcher.watch(PathBuf::from("/srv/recordings")).await?;
//! while let Some(candidate) = candidates.recv().await {
//!     println!("discovered: {:?}", candidate.path);
//! }
//! # Ok(())
//! # }
//! ```

mod classify;
mod events;
mod scan;
mod stability;
mod watcher;

pub use classify::PathClassifier;
pub use events::{CandidateFile, DiscoveryKind};
pub use scan::scan_recent_files;
pub use stability::{await_stability, StabilityOutcome};
pub use watcher::DirectoryWatcher;
