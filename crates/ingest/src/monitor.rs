//! Recording monitor surface
//!
//! Owns the watch session: the directory watcher, the reconciliation
//! scans, a bounded pool of ingestion workers, the retry scheduler, and
//! the status counters. All mutable ingestion state (processed set,
//! in-flight set, statistics) lives behind this component's API.

use crate::coordinator::{IngestOutcome, IngestionCoordinator};
use crate::retry::{RetryScheduler, RetryTicket};
use crate::stats::Statistics;
use crate::tracker::{InFlightGuard, InFlightTracker};
use chrono::{DateTime, Utc};
use dashmap::DashSet;
use recvault_core::config::Config;
use recvault_core::{Error, Result};
use recvault_storage::{MetadataStore, ObjectStore};
use recvault_watcher::{scan_recent_files, CandidateFile, DirectoryWatcher, PathClassifier};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Read-only snapshot of the watch state and cumulative counters
#[derive(Debug, Clone, Serialize)]
pub struct MonitorStatus {
    pub active: bool,
    pub monitored_path: Option<PathBuf>,
    pub watch_started_at: Option<DateTime<Utc>>,
    pub last_scan_time: Option<DateTime<Utc>>,
    pub started_at: DateTime<Utc>,
    pub files_processed: u64,
    pub files_failed: u64,
    pub last_file_time: Option<DateTime<Utc>>,
}

/// Result of an explicit reconciliation scan
#[derive(Debug, Clone, Serialize)]
pub struct ScanReport {
    /// Candidates submitted for ingestion by this scan
    pub files_submitted: usize,
    pub scan_time: DateTime<Utc>,
}

/// One unit of work for the ingestion workers
struct IngestJob {
    candidate: CandidateFile,
    attempt: u32,
    guard: InFlightGuard,
}

/// Shared submission path for watcher events, scans, and retries
///
/// Dedup happens here, before enqueue: already-processed paths are
/// dropped, and the in-flight tracker is the dedup key for everything
/// else. Duplicate submissions while an attempt is in flight are silently
/// coalesced.
#[derive(Clone)]
struct Submitter {
    job_tx: mpsc::Sender<IngestJob>,
    tracker: Arc<InFlightTracker>,
    processed: Arc<DashSet<PathBuf>>,
}

impl Submitter {
    async fn submit(&self, candidate: CandidateFile, attempt: u32) -> bool {
        if self.processed.contains(&candidate.path) {
            debug!(path = ?candidate.path, "already processed, dropping submission");
            return false;
        }
        let Some(guard) = self.tracker.acquire(&candidate.path) else {
            debug!(path = ?candidate.path, "attempt in flight, coalescing duplicate event");
            return false;
        };
        // A send failure means the pipeline is shutting down; the guard
        // drop releases the in-flight entry.
        self.job_tx
            .send(IngestJob {
                candidate,
                attempt,
                guard,
            })
            .await
            .is_ok()
    }
}

/// State held only while a watch session is active
struct ActiveWatch {
    root: PathBuf,
    started_at: DateTime<Utc>,
    classifier: PathClassifier,
    watcher: DirectoryWatcher,
    cancel: CancellationToken,
    submitter: Submitter,
    tasks: Vec<JoinHandle<()>>,
}

/// Public entry point for recording ingestion
pub struct RecordingMonitor {
    config: Config,
    coordinator: Arc<IngestionCoordinator>,
    tracker: Arc<InFlightTracker>,
    processed: Arc<DashSet<PathBuf>>,
    stats: Arc<Statistics>,
    active: Mutex<Option<ActiveWatch>>,
    path_override: StdMutex<Option<PathBuf>>,
    last_scan_time: Arc<StdMutex<Option<DateTime<Utc>>>>,
}

impl RecordingMonitor {
    pub fn new(
        config: Config,
        object_store: Arc<dyn ObjectStore>,
        metadata_store: Arc<dyn MetadataStore>,
    ) -> Self {
        let tracker = InFlightTracker::new();
        let processed = Arc::new(DashSet::new());
        let stats = Arc::new(Statistics::new());

        let coordinator = Arc::new(IngestionCoordinator::new(
            object_store,
            metadata_store,
            Arc::clone(&processed),
            Arc::clone(&stats),
            config.stability.clone(),
            config.retry.clone(),
            config.monitor.user_id.clone(),
            config.monitor.storage_prefix.clone(),
        ));

        Self {
            config,
            coordinator,
            tracker,
            processed,
            stats,
            active: Mutex::new(None),
            path_override: StdMutex::new(None),
            last_scan_time: Arc::new(StdMutex::new(None)),
        }
    }

    /// Start watching for recordings
    ///
    /// Uses `path` when given, otherwise the configured recordings path.
    /// Starting while already active is a no-op that reports success.
    /// A missing root directory is created; a root that exists but is not
    /// a directory is a configuration error.
    pub async fn start_monitoring(&self, path: Option<PathBuf>) -> Result<()> {
        let mut active = self.active.lock().await;
        if active.is_some() {
            warn!("file monitoring is already active");
            return Ok(());
        }

        let root = path
            .or_else(|| self.path_override.lock().ok().and_then(|p| p.clone()))
            .or_else(|| self.config.monitor.recordings_path.clone())
            .ok_or_else(|| Error::config("no recordings path configured"))?;

        if !root.exists() {
            info!(?root, "creating monitoring directory");
            std::fs::create_dir_all(&root)
                .map_err(|e| Error::config(format!("cannot create {root:?}: {e}")))?;
        }
        let root = root
            .canonicalize()
            .map_err(|e| Error::config(format!("cannot resolve {root:?}: {e}")))?;
        if !root.is_dir() {
            return Err(Error::config(format!("path is not a directory: {root:?}")));
        }

        let classifier = PathClassifier::new(&self.config.watcher);
        let mut watcher = DirectoryWatcher::new(self.config.watcher.clone());
        let candidate_rx = watcher.watch(&root).await?;

        let cancel = CancellationToken::new();
        let (job_tx, job_rx) = mpsc::channel(self.config.watcher.max_queue_size);
        let submitter = Submitter {
            job_tx,
            tracker: Arc::clone(&self.tracker),
            processed: Arc::clone(&self.processed),
        };

        let mut tasks = Vec::new();

        // Retry scheduler feeds due tickets back into the dispatcher.
        let (retry_due_tx, retry_due_rx) = mpsc::channel(self.config.watcher.max_queue_size);
        let (retry_scheduler, retry_task) = RetryScheduler::spawn(retry_due_tx, cancel.clone());
        tasks.push(retry_task);

        // Bounded worker pool.
        let job_rx = Arc::new(Mutex::new(job_rx));
        for worker_id in 0..self.config.monitor.ingest_workers.max(1) {
            tasks.push(tokio::spawn(run_worker(
                worker_id,
                Arc::clone(&job_rx),
                Arc::clone(&self.coordinator),
                retry_scheduler.clone(),
            )));
        }

        // Dispatcher: watcher events, due retries, periodic backstop scans.
        tasks.push(tokio::spawn(run_dispatcher(DispatcherCtx {
            root: root.clone(),
            classifier: classifier.clone(),
            recency_window: self.config.monitor.recency_window(),
            rescan_interval: self.config.monitor.rescan_interval(),
            submitter: submitter.clone(),
            last_scan_time: Arc::clone(&self.last_scan_time),
            cancel: cancel.clone(),
            candidate_rx,
            retry_due_rx,
        })));

        let started_at = Utc::now();
        *active = Some(ActiveWatch {
            root: root.clone(),
            started_at,
            classifier: classifier.clone(),
            watcher,
            cancel,
            submitter: submitter.clone(),
            tasks,
        });
        drop(active);

        // Initial reconciliation: pick up files that arrived while no
        // watcher was running.
        match run_scan(
            &root,
            &classifier,
            self.config.monitor.recency_window(),
            &submitter,
            &self.last_scan_time,
        )
        .await
        {
            Ok(submitted) => {
                info!(?root, scan_submitted = submitted, "started monitoring recordings");
                Ok(())
            }
            Err(e) => {
                self.stop_monitoring().await?;
                Err(e)
            }
        }
    }

    /// Stop watching
    ///
    /// New filesystem events stop being accepted immediately. Ingestion
    /// attempts already running are not aborted; they get a bounded drain
    /// window and are detached if still going after it.
    pub async fn stop_monitoring(&self) -> Result<()> {
        let Some(mut watch) = self.active.lock().await.take() else {
            return Ok(());
        };

        watch.watcher.stop();
        watch.cancel.cancel();
        drop(watch.submitter);

        let drain = self.config.monitor.drain_timeout();
        let joined = tokio::time::timeout(drain, futures::future::join_all(watch.tasks)).await;
        if joined.is_err() {
            warn!(
                drain_secs = drain.as_secs(),
                "ingestion tasks still running after drain window, detaching"
            );
        }

        info!("stopped monitoring recordings");
        Ok(())
    }

    /// Change the watched directory
    ///
    /// Stops the current watch (in-flight attempts run to completion),
    /// swaps the path, and restarts with a fresh reconciliation scan if a
    /// session was active.
    pub async fn update_path(&self, new_path: PathBuf) -> Result<()> {
        let was_active = self.active.lock().await.is_some();

        if was_active {
            self.stop_monitoring().await?;
        }

        if let Ok(mut path_override) = self.path_override.lock() {
            *path_override = Some(new_path.clone());
        }

        if was_active {
            self.start_monitoring(None).await?;
        }

        info!(?new_path, "updated monitoring path");
        Ok(())
    }

    /// Walk the watched tree now, submitting anything missed
    pub async fn force_scan(&self) -> Result<ScanReport> {
        let active = self.active.lock().await;
        let watch = active
            .as_ref()
            .ok_or_else(|| Error::invalid_input("no path is being monitored"))?;

        let files_submitted = run_scan(
            &watch.root,
            &watch.classifier,
            self.config.monitor.recency_window(),
            &watch.submitter,
            &self.last_scan_time,
        )
        .await?;

        Ok(ScanReport {
            files_submitted,
            scan_time: Utc::now(),
        })
    }

    /// Current watch state and cumulative counters; no side effects
    pub async fn get_status(&self) -> MonitorStatus {
        let active = self.active.lock().await;
        MonitorStatus {
            active: active.is_some(),
            monitored_path: active.as_ref().map(|w| w.root.clone()),
            watch_started_at: active.as_ref().map(|w| w.started_at),
            last_scan_time: self.last_scan_time.lock().ok().and_then(|t| *t),
            started_at: self.stats.started_at(),
            files_processed: self.stats.files_processed(),
            files_failed: self.stats.files_failed(),
            last_file_time: self.stats.last_file_time(),
        }
    }
}

/// Scan the tree and submit qualifying candidates; returns how many were accepted
async fn run_scan(
    root: &std::path::Path,
    classifier: &PathClassifier,
    recency_window: Duration,
    submitter: &Submitter,
    last_scan_time: &Arc<StdMutex<Option<DateTime<Utc>>>>,
) -> Result<usize> {
    let candidates = scan_recent_files(root, classifier, recency_window).await?;

    let mut submitted = 0;
    for candidate in candidates {
        if submitter.submit(candidate, 1).await {
            submitted += 1;
        }
    }

    if let Ok(mut last) = last_scan_time.lock() {
        *last = Some(Utc::now());
    }
    Ok(submitted)
}

struct DispatcherCtx {
    root: PathBuf,
    classifier: PathClassifier,
    recency_window: Duration,
    rescan_interval: Option<Duration>,
    submitter: Submitter,
    last_scan_time: Arc<StdMutex<Option<DateTime<Utc>>>>,
    cancel: CancellationToken,
    candidate_rx: mpsc::Receiver<CandidateFile>,
    retry_due_rx: mpsc::Receiver<RetryTicket>,
}

/// Funnel all candidate sources through the submitter
async fn run_dispatcher(mut ctx: DispatcherCtx) {
    let mut rescan =
        tokio::time::interval(ctx.rescan_interval.unwrap_or(Duration::from_secs(3600)));
    rescan.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    // The first tick fires immediately; the start-of-watch scan already ran.
    rescan.tick().await;

    loop {
        tokio::select! {
            _ = ctx.cancel.cancelled() => break,
            candidate = ctx.candidate_rx.recv() => {
                let Some(candidate) = candidate else { break };
                ctx.submitter.submit(candidate, 1).await;
            }
            ticket = ctx.retry_due_rx.recv() => {
                let Some(ticket) = ticket else { break };
                ctx.submitter.submit(ticket.candidate, ticket.attempt).await;
            }
            _ = rescan.tick(), if ctx.rescan_interval.is_some() => {
                debug!("periodic reconciliation scan");
                if let Err(e) = run_scan(
                    &ctx.root,
                    &ctx.classifier,
                    ctx.recency_window,
                    &ctx.submitter,
                    &ctx.last_scan_time,
                )
                .await
                {
                    warn!(error = %e, "periodic scan failed");
                }
            }
        }
    }
    debug!("dispatcher stopped");
}

/// One ingestion worker: pull jobs, run the coordinator, schedule retries
async fn run_worker(
    worker_id: usize,
    job_rx: Arc<Mutex<mpsc::Receiver<IngestJob>>>,
    coordinator: Arc<IngestionCoordinator>,
    retry: RetryScheduler,
) {
    loop {
        let job = {
            let mut rx = job_rx.lock().await;
            rx.recv().await
        };
        let Some(IngestJob {
            candidate,
            attempt,
            guard,
        }) = job
        else {
            break;
        };

        if let IngestOutcome::Retry { attempt, delay } =
            coordinator.ingest(&candidate, attempt, guard).await
        {
            retry.schedule(candidate, attempt, delay);
        }
    }
    debug!(worker_id, "ingest worker stopped");
}
