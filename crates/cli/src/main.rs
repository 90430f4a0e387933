//! recvault - local meeting-recording vault
//!
//! Watches a recordings folder and ships finished files to the configured
//! object store, recording their metadata as it goes.

#![deny(warnings)]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use recvault_core::config::{Config, StorageProvider};
use recvault_ingest::RecordingMonitor;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::info;

#[derive(Parser)]
#[command(name = "recvault")]
#[command(about = "Watch a folder and archive meeting recordings")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Configuration file path
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Watch the recordings folder until interrupted
    Watch {
        /// Folder to watch, overriding the configured path
        #[arg(long)]
        path: Option<PathBuf>,
    },
    /// Ingest existing recordings once, then exit
    Scan {
        /// Folder to scan, overriding the configured path
        #[arg(long)]
        path: Option<PathBuf>,

        /// Seconds of pipeline inactivity before the scan is considered done
        #[arg(long, default_value_t = 10)]
        settle_secs: u64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    match cli.command {
        Some(Commands::Watch { path }) => watch(cli.config.as_deref(), path).await,
        Some(Commands::Scan { path, settle_secs }) => {
            scan(cli.config.as_deref(), path, settle_secs).await
        }
        None => {
            println!("Run 'recvault watch' to start watching, or --help for more options");
            Ok(())
        }
    }
}

fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };

    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "recvault={level},recvault_core={level},recvault_storage={level},\
             recvault_watcher={level},recvault_ingest={level}"
        ))
        .init();
}

fn load_config(config_path: Option<&Path>) -> Result<Config> {
    let mut config = match config_path {
        Some(path) => Config::from_file(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => Config::load_global().context("failed to load global config")?,
    };

    // The local provider needs somewhere to put objects; fall back to a
    // directory under the user's home when the config leaves it unset.
    if matches!(config.storage.provider, StorageProvider::Local)
        && config.storage.local_root.is_none()
    {
        config.storage.local_root =
            dirs::home_dir().map(|home| home.join(".recvault").join("objects"));
    }

    Ok(config)
}

fn build_monitor(config: Config) -> Result<RecordingMonitor> {
    let object_store = recvault_storage::create_object_store(&config.storage)?;
    let metadata_store = recvault_storage::create_metadata_store(&config.storage)?;
    Ok(RecordingMonitor::new(config, object_store, metadata_store))
}

/// Watch the recordings folder until Ctrl-C
async fn watch(config_path: Option<&Path>, path: Option<PathBuf>) -> Result<()> {
    let config = load_config(config_path)?;
    let monitor = build_monitor(config)?;

    monitor.start_monitoring(path).await?;
    let status = monitor.get_status().await;
    info!(
        path = ?status.monitored_path,
        "watching for recordings, press Ctrl-C to stop"
    );

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for shutdown signal")?;
    info!("shutdown requested");

    monitor.stop_monitoring().await?;
    print_status(&monitor).await
}

/// Run the reconciliation scan, wait for the pipeline to settle, then exit
async fn scan(config_path: Option<&Path>, path: Option<PathBuf>, settle_secs: u64) -> Result<()> {
    let config = load_config(config_path)?;
    let monitor = build_monitor(config)?;

    monitor.start_monitoring(path).await?;
    let status = monitor.get_status().await;
    info!(path = ?status.monitored_path, "scanning for recordings");

    // The startup scan submits everything eligible; we are done once the
    // counters stop moving for the settle window. Long retry backoffs can
    // outlast it, so bump --settle-secs when scanning with a slow backend.
    let mut last_counts = (0u64, 0u64);
    let mut quiet_since = Instant::now();
    loop {
        tokio::time::sleep(Duration::from_millis(500)).await;
        let status = monitor.get_status().await;
        let counts = (status.files_processed, status.files_failed);
        if counts != last_counts {
            last_counts = counts;
            quiet_since = Instant::now();
        } else if quiet_since.elapsed() >= Duration::from_secs(settle_secs) {
            break;
        }
    }

    monitor.stop_monitoring().await?;
    print_status(&monitor).await
}

async fn print_status(monitor: &RecordingMonitor) -> Result<()> {
    let status = monitor.get_status().await;
    let rendered =
        serde_json::to_string_pretty(&status).context("failed to render monitor status")?;
    println!("{rendered}");
    Ok(())
}
