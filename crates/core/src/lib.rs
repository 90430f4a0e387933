#![deny(warnings)]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]

//! Shared types for the recvault recording ingestion system
//!
//! This crate holds the pieces every other crate depends on: the error
//! type, configuration loading, and the recording metadata model with its
//! pure derivation helpers.

pub mod config;
pub mod error;
pub mod recording;

pub use config::Config;
pub use error::{Error, Result};
pub use recording::{RecordingMetadata, RecordingSource};
