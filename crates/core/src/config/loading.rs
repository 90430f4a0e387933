//! Configuration loading from files and environment variables

use crate::error::{Error, Result};
use config::{Config as ConfigLib, Environment, File};
use std::path::Path;

use super::Config;

impl Config {
    /// Loads configuration from a TOML file with environment variable overrides
    ///
    /// Environment variables are prefixed with `RECVAULT_` and use double
    /// underscores for nested values. For example:
    /// - `RECVAULT_MONITOR__RECORDINGS_PATH=/srv/recordings`
    /// - `RECVAULT_RETRY__MAX_ATTEMPTS=5`
    pub fn from_file(path: &Path) -> Result<Self> {
        let mut builder = ConfigLib::builder();

        if path.exists() {
            builder = builder.add_source(File::from(path));
        }

        builder = builder.add_source(
            Environment::with_prefix("RECVAULT")
                .separator("__")
                .try_parsing(true),
        );

        // Legacy environment variable from the original deployment
        if let Ok(dir) = std::env::var("RECORDINGS_PATH") {
            builder = builder
                .set_override("monitor.recordings_path", dir)
                .map_err(|e| Error::config(format!("Failed to set RECORDINGS_PATH: {e}")))?;
        }

        let settings = builder
            .build()
            .map_err(|e| Error::config(format!("Failed to build configuration: {e}")))?;

        settings
            .try_deserialize()
            .map_err(|e| Error::config(format!("Failed to parse configuration: {e}")))
    }

    /// Loads the global configuration, falling back to defaults when absent
    pub fn load_global() -> Result<Self> {
        let path = super::global_config_path()?;
        Self::from_file(&path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StorageProvider;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    #[test]
    fn missing_file_yields_defaults() {
        let config =
            Config::from_file(Path::new("/nonexistent/recvault.toml")).expect("defaults load");
        assert_eq!(config.retry.max_attempts, 3);
        assert_eq!(config.stability.required_stable_polls, 3);
        assert_eq!(config.monitor.user_id, "local_user");
        assert!(config.watcher.allowed_extensions.contains(&"mp4".into()));
    }

    #[test]
    fn toml_overrides_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.toml");
        let mut file = std::fs::File::create(&path).expect("create config");
        writeln!(
            file,
            r#"
[monitor]
recordings_path = "/srv/recordings"
recency_window_days = 3

[retry]
max_attempts = 5

[storage]
provider = "memory"
"#
        )
        .expect("write config");

        let config = Config::from_file(&path).expect("load config");
        assert_eq!(
            config.monitor.recordings_path.as_deref(),
            Some(Path::new("/srv/recordings"))
        );
        assert_eq!(config.monitor.recency_window_days, 3);
        assert_eq!(config.retry.max_attempts, 5);
        assert_eq!(config.storage.provider, StorageProvider::Memory);
        // Untouched sections keep defaults
        assert_eq!(config.stability.poll_interval_ms, 5000);
    }

    #[test]
    fn retry_delay_is_linear_with_cooldown_on_first() {
        let config = Config::default();
        let first = config.retry.delay_for_attempt(1);
        let second = config.retry.delay_for_attempt(2);
        let third = config.retry.delay_for_attempt(3);

        assert_eq!(first, config.retry.cooldown() + config.retry.base_delay());
        assert_eq!(second, config.retry.base_delay() * 2);
        assert_eq!(third, config.retry.base_delay() * 3);
    }
}
