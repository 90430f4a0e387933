#![deny(warnings)]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]

//! Recording ingestion pipeline
//!
//! Drives candidate files from discovery to durable storage exactly once:
//! - An in-flight tracker enforces at-most-one concurrent ingestion per path
//! - The coordinator runs the per-file state machine (stability, metadata,
//!   upload, persist) and classifies failures
//! - A retry scheduler re-submits failed paths with linear backoff
//! - `RecordingMonitor` ties the watcher, a bounded worker pool, and the
//!   status register together behind a small API

mod coordinator;
mod metadata;
mod monitor;
mod retry;
mod stats;
mod tracker;

pub use coordinator::{IngestOutcome, IngestionCoordinator, IngestionState};
pub use metadata::extract_metadata;
pub use monitor::{MonitorStatus, RecordingMonitor, ScanReport};
pub use stats::Statistics;
pub use tracker::{InFlightGuard, InFlightTracker};
