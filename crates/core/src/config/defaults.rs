//! Default values for configuration fields

use super::StorageProvider;

pub(super) fn default_user_id() -> String {
    "local_user".to_string()
}

pub(super) fn default_storage_prefix() -> String {
    "recordings".to_string()
}

pub(super) fn default_recency_window_days() -> u64 {
    7
}

pub(super) fn default_rescan_interval_secs() -> u64 {
    900
}

pub(super) fn default_ingest_workers() -> usize {
    4
}

pub(super) fn default_drain_timeout_secs() -> u64 {
    5
}

pub(super) fn default_allowed_extensions() -> Vec<String> {
    ["mp4", "m4a", "mp3", "wav", "webm"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

pub(super) fn default_max_queue_size() -> usize {
    4096
}

pub(super) fn default_max_init_retries() -> u32 {
    3
}

pub(super) fn default_init_retry_delay_ms() -> u64 {
    1000
}

pub(super) fn default_poll_interval_ms() -> u64 {
    5000
}

pub(super) fn default_required_stable_polls() -> u32 {
    3
}

pub(super) fn default_max_wait_ms() -> u64 {
    300_000
}

pub(super) fn default_max_retry_attempts() -> u32 {
    3
}

pub(super) fn default_retry_base_delay_ms() -> u64 {
    5000
}

pub(super) fn default_retry_cooldown_ms() -> u64 {
    60_000
}

pub(super) fn default_storage_provider() -> StorageProvider {
    StorageProvider::Local
}

pub(super) fn default_max_object_size_mb() -> u64 {
    500
}
