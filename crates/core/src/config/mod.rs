//! Configuration for the recvault system
//!
//! Configuration is loaded from a TOML file with environment variable
//! overrides. All tuning values here are knobs, not fixed constants.

mod defaults;
mod loading;

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use defaults::*;

/// Returns the path to the global configuration file
///
/// The global config is stored at `~/.recvault/config.toml`.
pub fn global_config_path() -> Result<PathBuf> {
    let home_dir = dirs::home_dir()
        .ok_or_else(|| Error::config("Unable to determine home directory".to_string()))?;
    Ok(home_dir.join(".recvault").join("config.toml"))
}

/// Main configuration structure for the recvault system
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Monitor configuration
    #[serde(default)]
    pub monitor: MonitorConfig,

    /// File watcher configuration
    #[serde(default)]
    pub watcher: WatcherConfig,

    /// Stability detector configuration
    #[serde(default)]
    pub stability: StabilityConfig,

    /// Retry policy configuration
    #[serde(default)]
    pub retry: RetryConfig,

    /// Storage collaborator configuration
    #[serde(default)]
    pub storage: StorageConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            monitor: MonitorConfig::default(),
            watcher: WatcherConfig::default(),
            stability: StabilityConfig::default(),
            retry: RetryConfig::default(),
            storage: StorageConfig::default(),
        }
    }
}

/// Configuration for the recording monitor surface
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// Directory tree to watch for recordings
    #[serde(default)]
    pub recordings_path: Option<PathBuf>,

    /// Owner recorded on ingested files
    #[serde(default = "default_user_id")]
    pub user_id: String,

    /// Key prefix for uploaded payloads
    #[serde(default = "default_storage_prefix")]
    pub storage_prefix: String,

    /// Reconciliation scan only considers files modified within this window
    #[serde(default = "default_recency_window_days")]
    pub recency_window_days: u64,

    /// Interval for the periodic backstop rescan, in seconds (0 disables)
    #[serde(default = "default_rescan_interval_secs")]
    pub rescan_interval_secs: u64,

    /// Number of concurrent ingestion workers
    #[serde(default = "default_ingest_workers")]
    pub ingest_workers: usize,

    /// Bound on how long `stop_monitoring` waits for workers to drain
    #[serde(default = "default_drain_timeout_secs")]
    pub drain_timeout_secs: u64,
}

impl MonitorConfig {
    pub fn recency_window(&self) -> Duration {
        Duration::from_secs(self.recency_window_days * 24 * 60 * 60)
    }

    pub fn rescan_interval(&self) -> Option<Duration> {
        (self.rescan_interval_secs > 0).then(|| Duration::from_secs(self.rescan_interval_secs))
    }

    pub fn drain_timeout(&self) -> Duration {
        Duration::from_secs(self.drain_timeout_secs)
    }
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            recordings_path: None,
            user_id: default_user_id(),
            storage_prefix: default_storage_prefix(),
            recency_window_days: default_recency_window_days(),
            rescan_interval_secs: default_rescan_interval_secs(),
            ingest_workers: default_ingest_workers(),
            drain_timeout_secs: default_drain_timeout_secs(),
        }
    }
}

/// Configuration for the directory watcher
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatcherConfig {
    /// File extensions that qualify as recordings (lowercase, no dot)
    #[serde(default = "default_allowed_extensions")]
    pub allowed_extensions: Vec<String>,

    /// Maximum number of queued candidate events
    #[serde(default = "default_max_queue_size")]
    pub max_queue_size: usize,

    /// Maximum retry attempts for watcher initialization
    #[serde(default = "default_max_init_retries")]
    pub max_init_retries: u32,

    /// Delay between watcher initialization retries, in milliseconds
    #[serde(default = "default_init_retry_delay_ms")]
    pub init_retry_delay_ms: u64,
}

impl WatcherConfig {
    pub fn init_retry_delay(&self) -> Duration {
        Duration::from_millis(self.init_retry_delay_ms)
    }
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            allowed_extensions: default_allowed_extensions(),
            max_queue_size: default_max_queue_size(),
            max_init_retries: default_max_init_retries(),
            init_retry_delay_ms: default_init_retry_delay_ms(),
        }
    }
}

/// Configuration for the file stability detector
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StabilityConfig {
    /// Interval between size polls, in milliseconds
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Consecutive unchanged polls required before a file counts as stable
    #[serde(default = "default_required_stable_polls")]
    pub required_stable_polls: u32,

    /// Cap on total wait before giving up and proceeding anyway, in milliseconds
    #[serde(default = "default_max_wait_ms")]
    pub max_wait_ms: u64,
}

impl StabilityConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn max_wait(&self) -> Duration {
        Duration::from_millis(self.max_wait_ms)
    }
}

impl Default for StabilityConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
            required_stable_polls: default_required_stable_polls(),
            max_wait_ms: default_max_wait_ms(),
        }
    }
}

/// Retry policy for failed ingestion attempts
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum automatic retries after the initial attempt
    #[serde(default = "default_max_retry_attempts")]
    pub max_attempts: u32,

    /// Base delay for linear backoff (delay = base x attempt), in milliseconds
    #[serde(default = "default_retry_base_delay_ms")]
    pub base_delay_ms: u64,

    /// Fixed cooldown before the first retry is scheduled, in milliseconds
    #[serde(default = "default_retry_cooldown_ms")]
    pub cooldown_ms: u64,
}

impl RetryConfig {
    pub fn base_delay(&self) -> Duration {
        Duration::from_millis(self.base_delay_ms)
    }

    pub fn cooldown(&self) -> Duration {
        Duration::from_millis(self.cooldown_ms)
    }

    /// Delay before the given retry attempt (1-based) runs
    ///
    /// Linear backoff, with the fixed cooldown applied only ahead of the
    /// first retry to absorb transient storage outages.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let backoff = self.base_delay() * attempt;
        if attempt == 1 {
            self.cooldown() + backoff
        } else {
            backoff
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_retry_attempts(),
            base_delay_ms: default_retry_base_delay_ms(),
            cooldown_ms: default_retry_cooldown_ms(),
        }
    }
}

/// Object store provider selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageProvider {
    /// Files copied under a local directory (file:// URLs)
    Local,
    /// In-memory store, only useful for tests and dry runs
    Memory,
}

/// Configuration for the storage collaborators
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Which object store backend to use
    #[serde(default = "default_storage_provider")]
    pub provider: StorageProvider,

    /// Root directory for the local object store
    #[serde(default)]
    pub local_root: Option<PathBuf>,

    /// Maximum accepted payload size in megabytes
    #[serde(default = "default_max_object_size_mb")]
    pub max_object_size_mb: u64,
}

impl StorageConfig {
    pub fn max_object_size_bytes(&self) -> u64 {
        self.max_object_size_mb * 1024 * 1024
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            provider: default_storage_provider(),
            local_root: None,
            max_object_size_mb: default_max_object_size_mb(),
        }
    }
}
